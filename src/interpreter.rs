use crate::ast::Node;
use crate::builtins::Builtin;
use crate::infix;

mod error;
mod scope;
mod value;

pub use error::RuntimeError;
pub use value::Value;

use scope::Scope;

/// Tree-walking evaluator with a stack of call-frame scopes.
///
/// Variable bindings are lazy-by-node: a definition stores the unevaluated
/// initializer, and every read re-evaluates it, side effects included.
/// Builtin print output is buffered so callers can assert on it.
pub struct Interpreter {
    scopes: Vec<Scope>,
    output: Vec<String>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new()],
            output: Vec::new(),
        }
    }

    /// Evaluates a program from a fresh global frame and returns the
    /// buffered builtin output, joined with newlines.
    pub fn run(&mut self, program: &Node) -> Result<String, RuntimeError> {
        self.scopes.clear();
        self.scopes.push(Scope::new());
        self.output.clear();
        self.eval(program)?;
        Ok(self.output.join("\n"))
    }

    /// Output lines buffered so far, including those from a failed run.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    fn eval(&mut self, node: &Node) -> Result<Value, RuntimeError> {
        match node {
            Node::TopLevel(children)
            | Node::Block(children)
            | Node::ArgList(children)
            | Node::GroupedExpr(children) => self.eval_sequence(children),
            Node::ModuleDef(_) | Node::UseStmt(_) => Ok(Value::Nothing),
            Node::VarDef { name, value } => {
                self.current_scope().add_var(name, (**value).clone(), false);
                Ok(Value::Nothing)
            }
            Node::FixedVarDef { name, value } => {
                self.current_scope().add_var(name, (**value).clone(), true);
                Ok(Value::Nothing)
            }
            Node::VarAssignment { name, value } => {
                // Writes only touch the current frame: assigning over an
                // outer binding shadows it instead of mutating it.
                if !self.current_scope().set_var(name, (**value).clone()) {
                    return Err(RuntimeError::AssignmentToFixed { name: name.clone() });
                }
                Ok(Value::Nothing)
            }
            Node::Variable(name) => {
                let bound = self
                    .scopes
                    .iter()
                    .rev()
                    .find_map(|scope| scope.get_var(name))
                    .cloned()
                    .ok_or_else(|| RuntimeError::UndefinedVariable { name: name.clone() })?;
                self.eval(&bound)
            }
            Node::FuncDef { name, .. } => {
                self.current_scope().add_sub(name, node.clone());
                Ok(Value::Nothing)
            }
            Node::FuncCall { name, args } => self.eval_call(name, args),
            Node::BuiltinFuncCall { name, args } => self.eval_builtin_call(name, args),
            Node::BinaryExpr(text) => self.eval_binary_expr(text),
            Node::Op(symbol) => Err(RuntimeError::StrayOperator {
                symbol: symbol.clone(),
            }),
            Node::String(text) => Ok(Value::Str(text.clone())),
            Node::Number(value) => Ok(Value::Number(*value)),
            Node::ReturnStmt(value) => self.eval(value),
            Node::NoOp => Ok(Value::Number(0.0)),
        }
    }

    /// Sequence containers evaluate children in order and keep the last
    /// value. Neither blocks nor groups push a frame.
    fn eval_sequence(&mut self, children: &[Node]) -> Result<Value, RuntimeError> {
        let mut last = Value::Nothing;
        for child in children {
            last = self.eval(child)?;
        }
        Ok(last)
    }

    fn eval_call(&mut self, name: &str, args: &Node) -> Result<Value, RuntimeError> {
        let definition = self
            .scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get_sub(name))
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedFunction {
                name: name.to_string(),
            })?;
        let Node::FuncDef { params, body, .. } = definition else {
            return Err(RuntimeError::MalformedCall {
                name: name.to_string(),
                kind: definition.kind_name(),
            });
        };
        let Node::ArgList(arg_nodes) = args else {
            return Err(RuntimeError::MalformedCall {
                name: name.to_string(),
                kind: args.kind_name(),
            });
        };
        if params.len() != arg_nodes.len() {
            return Err(RuntimeError::FunctionArityMismatch {
                name: name.to_string(),
                expected: params.len(),
                found: arg_nodes.len(),
            });
        }

        let mut frame = Scope::new();
        for (param, arg) in params.iter().zip(arg_nodes) {
            let Node::Variable(param_name) = param else {
                return Err(RuntimeError::InvalidParameter {
                    name: name.to_string(),
                    kind: param.kind_name(),
                });
            };
            // Arguments bind unevaluated, like every other variable.
            frame.add_var(param_name, arg.clone(), false);
        }

        self.scopes.push(frame);
        let result = self.eval_body(&body);
        self.scopes.pop();
        result
    }

    /// Runs a function body: a `ReturnStmt` in the statement list
    /// short-circuits, otherwise the last statement's value is the result.
    fn eval_body(&mut self, body: &[Node]) -> Result<Value, RuntimeError> {
        let mut last = Value::Nothing;
        for statement in body {
            if let Node::ReturnStmt(value) = statement {
                return self.eval(value);
            }
            last = self.eval(statement)?;
        }
        Ok(last)
    }

    fn eval_builtin_call(&mut self, name: &str, args: &Node) -> Result<Value, RuntimeError> {
        let Node::ArgList(arg_nodes) = args else {
            return Err(RuntimeError::MalformedCall {
                name: name.to_string(),
                kind: args.kind_name(),
            });
        };
        // Builtins receive concrete values: arguments are evaluated
        // eagerly, unlike user function arguments.
        let mut values = Vec::with_capacity(arg_nodes.len());
        for arg in arg_nodes {
            values.push(self.eval(arg)?);
        }
        let builtin = Builtin::from_name(name).ok_or_else(|| RuntimeError::UnknownBuiltin {
            name: name.to_string(),
        })?;
        Ok(builtin.call(&values, &mut self.output)?)
    }

    /// Substitutes every identifier run in the stored expression text with
    /// the variable's numeric value, then delegates the arithmetic.
    fn eval_binary_expr(&mut self, text: &str) -> Result<Value, RuntimeError> {
        let mut substituted = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if !c.is_alphabetic() && c != '_' {
                substituted.push(c);
                continue;
            }
            let mut name = String::from(c);
            while let Some(&next) = chars.peek() {
                if next.is_alphanumeric() || next == '_' {
                    name.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            match self.eval(&Node::Variable(name.clone()))? {
                Value::Number(value) => substituted.push_str(&value.to_string()),
                other => {
                    return Err(RuntimeError::NonNumericOperand {
                        name,
                        type_name: other.type_name(),
                    });
                }
            }
        }
        Ok(Value::Number(infix::calculate(&substituted)?))
    }

    fn current_scope(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn program(source: &str) -> Node {
        parse(lex(source)).expect("parse failed")
    }

    fn run(source: &str) -> String {
        Interpreter::new().run(&program(source)).expect("run failed")
    }

    fn run_error(source: &str) -> RuntimeError {
        Interpreter::new()
            .run(&program(source))
            .expect_err("expected runtime error")
    }

    #[test]
    fn prints_a_variable_through_a_builtin() {
        assert_eq!(run("let x = 1; let y = 2; @println(x);"), "1");
    }

    #[test]
    fn arrow_function_returns_its_expression_value() {
        assert_eq!(
            run("sub add(a, b) -> a + b; let r = add(2, 3); @println(r);"),
            "5"
        );
    }

    #[test]
    fn definitions_evaluate_nothing_until_read() {
        let source = indoc! {r#"
            sub f() -> {
                @println("effect");
                return 3;
            }
            let a = f();
        "#};
        assert_eq!(run(source), "");
    }

    #[test]
    fn every_read_re_evaluates_the_stored_node() {
        let source = indoc! {r#"
            sub f() -> {
                @println("effect");
                return 3;
            }
            let a = f();
            let b = a;
            @println(b);
            @println(b);
        "#};
        assert_eq!(run(source), "effect\n3\neffect\n3");
    }

    #[test]
    fn assignment_to_fixed_fails_and_leaves_the_binding_untouched() {
        let mut interpreter = Interpreter::new();
        let error = interpreter
            .eval(&program("fixed x = 1; x = 2;"))
            .expect_err("expected fixed violation");
        assert_eq!(
            error,
            RuntimeError::AssignmentToFixed {
                name: "x".to_string(),
            }
        );
        let value = interpreter
            .eval(&Node::Variable("x".to_string()))
            .expect("read failed");
        assert_eq!(value, Value::Number(1.0));
    }

    #[test]
    fn parameters_shadow_outer_fixed_variables() {
        let source = indoc! {r#"
            fixed x = 1;
            sub f(x) -> {
                x = 5;
                @println(x);
            }
            f(10);
            @println(x);
        "#};
        assert_eq!(run(source), "5\n1");
    }

    #[test]
    fn assignment_shadow_writes_instead_of_mutating_outer_frames() {
        let source = indoc! {r#"
            let x = 1;
            sub f() -> {
                x = 5;
                @println(x);
            }
            f();
            @println(x);
        "#};
        assert_eq!(run(source), "5\n1");
    }

    #[test]
    fn call_frames_are_popped_after_the_call() {
        let mut interpreter = Interpreter::new();
        interpreter
            .eval(&program("sub f() -> 1 + 2; let r = f(); @println(r);"))
            .expect("run failed");
        assert_eq!(interpreter.scopes.len(), 1);
    }

    #[test]
    fn call_frames_are_popped_on_the_error_path_too() {
        let mut interpreter = Interpreter::new();
        let error = interpreter
            .eval(&program("sub f() -> missing; let r = f(); @println(r);"))
            .expect_err("expected undefined variable");
        assert_eq!(
            error,
            RuntimeError::UndefinedVariable {
                name: "missing".to_string(),
            }
        );
        assert_eq!(interpreter.scopes.len(), 1);
    }

    #[test]
    fn function_locals_do_not_leak_into_the_global_frame() {
        let source = indoc! {r#"
            sub f() -> {
                let y = 7;
            }
            f();
            @println(y);
        "#};
        assert_eq!(
            run_error(source),
            RuntimeError::UndefinedVariable {
                name: "y".to_string(),
            }
        );
    }

    #[test]
    fn functions_are_visible_from_nested_frames() {
        let source = indoc! {r#"
            sub inc(n) -> n + 1;
            sub twice(n) -> inc(inc(n));
            let r = twice(3);
            @println(r);
        "#};
        assert_eq!(run(source), "5");
    }

    #[test]
    fn return_short_circuits_the_rest_of_the_body() {
        let source = indoc! {r#"
            sub f() -> {
                return 1;
                @println("unreachable");
            }
            let x = f();
            @println(x);
        "#};
        assert_eq!(run(source), "1");
    }

    #[test]
    fn brace_body_without_return_yields_the_last_statement_value() {
        let source = indoc! {r#"
            sub f() -> {
                @println("hi");
            }
            @println(f());
        "#};
        assert_eq!(run(source), "hi\nnothing");
    }

    #[test]
    fn blocks_do_not_push_a_frame() {
        let source = indoc! {r#"
            {
                let a = 1;
            }
            @println(a);
        "#};
        assert_eq!(run(source), "1");
    }

    #[test]
    fn binary_expressions_substitute_variables_lazily() {
        assert_eq!(run("let x = 4; let y = x * 2 + 1; @println(y);"), "9");
    }

    #[test]
    fn grouped_expressions_evaluate_to_their_last_child() {
        assert_eq!(run("let g = (1); @println(g);"), "1");
    }

    #[test]
    fn module_and_use_statements_are_no_ops() {
        assert_eq!(run(r#"module m; use "lib"; @println(1);"#), "1");
    }

    #[test]
    fn noop_evaluates_to_zero() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.eval(&Node::NoOp), Ok(Value::Number(0.0)));
    }

    #[test]
    fn stray_operators_are_runtime_errors() {
        let mut interpreter = Interpreter::new();
        assert_eq!(
            interpreter.eval(&Node::Op("+".to_string())),
            Err(RuntimeError::StrayOperator {
                symbol: "+".to_string(),
            })
        );
    }

    #[test]
    fn errors_on_undefined_variable() {
        assert_eq!(
            run_error("@println(missing);"),
            RuntimeError::UndefinedVariable {
                name: "missing".to_string(),
            }
        );
    }

    #[test]
    fn errors_on_undefined_function() {
        assert_eq!(
            run_error("missing();"),
            RuntimeError::UndefinedFunction {
                name: "missing".to_string(),
            }
        );
    }

    #[test]
    fn errors_on_arity_mismatch() {
        assert_eq!(
            run_error("sub f(a) -> a; let x = f(); @println(x);"),
            RuntimeError::FunctionArityMismatch {
                name: "f".to_string(),
                expected: 1,
                found: 0,
            }
        );
    }

    #[test]
    fn errors_on_unknown_builtin() {
        assert_eq!(
            run_error("@nope();"),
            RuntimeError::UnknownBuiltin {
                name: "nope".to_string(),
            }
        );
    }

    #[test]
    fn errors_on_string_operand_in_arithmetic() {
        assert_eq!(
            run_error(r#"let s = "x"; let y = s + 1; @println(y);"#),
            RuntimeError::NonNumericOperand {
                name: "s".to_string(),
                type_name: "string",
            }
        );
    }

    #[test]
    fn output_is_preserved_up_to_a_failure() {
        let mut interpreter = Interpreter::new();
        let result = interpreter.run(&program("@println(1); @println(missing);"));
        assert!(result.is_err());
        assert_eq!(interpreter.output(), ["1"]);
    }

    #[test]
    fn state_is_cleared_between_runs() {
        let mut interpreter = Interpreter::new();
        interpreter
            .run(&program("let x = 1; @println(x);"))
            .expect("first run failed");
        let error = interpreter
            .run(&program("@println(x);"))
            .expect_err("expected undefined variable");
        assert_eq!(
            error,
            RuntimeError::UndefinedVariable {
                name: "x".to_string(),
            }
        );
    }
}
