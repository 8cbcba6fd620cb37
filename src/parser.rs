use thiserror::Error;

use crate::ast::Node;
use crate::infix::{self, InfixError};
use crate::token::{Token, TokenKind};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at line {line} col {column}, got '{got}', expected '{expected}'")]
    UnexpectedToken {
        line: usize,
        column: usize,
        got: String,
        expected: String,
    },
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Invalid number literal '{text}' at line {line} col {column}")]
    InvalidNumber {
        text: String,
        line: usize,
        column: usize,
    },
    #[error("Expected an operator at line {line} col {column}")]
    ExpectedOperator { line: usize, column: usize },
    #[error("Function call '{name}' is not allowed inside an operator expression")]
    CallInOperatorExpression { name: String },
    #[error("Invalid operator expression '{expression}': {source}")]
    InvalidOperatorExpression {
        expression: String,
        #[source]
        source: InfixError,
    },
}

/// Recursive-descent parser with one token of lookahead.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::EndOfInput, "\0", 1, 1));
        }
        Self { tokens, pos: 0 }
    }

    pub fn parse_program(mut self) -> Result<Node, ParseError> {
        let mut statements = Vec::new();
        while self.current().kind != TokenKind::EndOfInput {
            statements.push(self.parse_statement()?);
        }
        Ok(Node::TopLevel(statements))
    }

    /// Keyword identifiers win over the call/assignment lookahead.
    fn parse_statement(&mut self) -> Result<Node, ParseError> {
        match self.current().kind {
            TokenKind::Identifier => match self.current().text.as_str() {
                "module" => self.parse_module_def(),
                "use" => self.parse_use_stmt(),
                "let" => self.parse_var_def(false),
                "fixed" => self.parse_var_def(true),
                "sub" => self.parse_func_def(),
                "return" => self.parse_return(),
                _ => {
                    if self.peek_is(TokenKind::Punctuation, "(") {
                        let call = self.parse_call_expr()?;
                        self.expect_text(TokenKind::Punctuation, ";")?;
                        Ok(call)
                    } else if self.peek_is(TokenKind::Punctuation, "=") {
                        self.parse_assignment()
                    } else {
                        Err(self.unexpected("statement"))
                    }
                }
            },
            TokenKind::BuiltinIdentifier => self.parse_builtin_call(),
            TokenKind::Punctuation => match self.current().text.as_str() {
                "@" => self.parse_builtin_call(),
                "{" => self.parse_block(),
                ";" => {
                    self.advance();
                    Ok(Node::NoOp)
                }
                _ => Err(self.unexpected("statement")),
            },
            _ => Err(self.unexpected("statement")),
        }
    }

    fn parse_module_def(&mut self) -> Result<Node, ParseError> {
        self.advance();
        let name = self.expect(TokenKind::Identifier)?.text;
        self.expect_text(TokenKind::Punctuation, ";")?;
        Ok(Node::ModuleDef(name))
    }

    fn parse_use_stmt(&mut self) -> Result<Node, ParseError> {
        self.advance();
        let path = self.expect(TokenKind::String)?.text;
        self.expect_text(TokenKind::Punctuation, ";")?;
        Ok(Node::UseStmt(path))
    }

    fn parse_var_def(&mut self, fixed: bool) -> Result<Node, ParseError> {
        self.advance();
        let name = self.expect(TokenKind::Identifier)?.text;
        self.expect_text(TokenKind::Punctuation, "=")?;
        let value = Box::new(self.parse_body()?);
        self.expect_text(TokenKind::Punctuation, ";")?;
        if fixed {
            Ok(Node::FixedVarDef { name, value })
        } else {
            Ok(Node::VarDef { name, value })
        }
    }

    fn parse_assignment(&mut self) -> Result<Node, ParseError> {
        let name = self.expect(TokenKind::Identifier)?.text;
        self.expect_text(TokenKind::Punctuation, "=")?;
        let value = Box::new(self.parse_body()?);
        self.expect_text(TokenKind::Punctuation, ";")?;
        Ok(Node::VarAssignment { name, value })
    }

    fn parse_return(&mut self) -> Result<Node, ParseError> {
        self.advance();
        let value = Box::new(self.parse_body()?);
        self.expect_text(TokenKind::Punctuation, ";")?;
        Ok(Node::ReturnStmt(value))
    }

    fn parse_func_def(&mut self) -> Result<Node, ParseError> {
        self.advance();
        let name = self.expect(TokenKind::Identifier)?.text;
        let params = self.parse_paren_list()?;
        self.expect_text(TokenKind::Punctuation, "->")?;
        let body = if self.eat_text(TokenKind::Punctuation, "{") {
            let body = self.parse_statements_until_brace()?;
            self.expect_text(TokenKind::Punctuation, "}")?;
            body
        } else {
            // An arrow body implicitly returns its value.
            let value = self.parse_body()?;
            self.expect_text(TokenKind::Punctuation, ";")?;
            vec![Node::ReturnStmt(Box::new(value))]
        };
        Ok(Node::FuncDef { name, params, body })
    }

    fn parse_call_expr(&mut self) -> Result<Node, ParseError> {
        let name = self.expect(TokenKind::Identifier)?.text;
        let args = Node::ArgList(self.parse_paren_list()?);
        Ok(Node::FuncCall {
            name,
            args: Box::new(args),
        })
    }

    fn parse_builtin_call(&mut self) -> Result<Node, ParseError> {
        let name = if self.current().kind == TokenKind::BuiltinIdentifier {
            self.advance().text.replace('@', "")
        } else {
            self.expect_text(TokenKind::Punctuation, "@")?;
            self.expect(TokenKind::Identifier)?.text
        };
        let args = Node::ArgList(self.parse_paren_list()?);
        self.expect_text(TokenKind::Punctuation, ";")?;
        Ok(Node::BuiltinFuncCall {
            name,
            args: Box::new(args),
        })
    }

    /// Parses a parenthesized expression list. Commas are separators and
    /// never produce nodes; arguments are single expressions, so arithmetic
    /// arguments need grouping parentheses.
    fn parse_paren_list(&mut self) -> Result<Vec<Node>, ParseError> {
        self.expect_text(TokenKind::Punctuation, "(")?;
        let mut items = Vec::new();
        loop {
            if self.at_text(TokenKind::Punctuation, ")") {
                break;
            }
            if self.current().kind == TokenKind::EndOfInput {
                return Err(ParseError::UnexpectedEnd);
            }
            if self.eat_text(TokenKind::Punctuation, ",") {
                continue;
            }
            items.push(self.parse_expr()?);
        }
        self.expect_text(TokenKind::Punctuation, ")")?;
        Ok(items)
    }

    fn parse_block(&mut self) -> Result<Node, ParseError> {
        self.expect_text(TokenKind::Punctuation, "{")?;
        let statements = self.parse_statements_until_brace()?;
        self.expect_text(TokenKind::Punctuation, "}")?;
        Ok(Node::Block(statements))
    }

    fn parse_statements_until_brace(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut statements = Vec::new();
        while !self.at_text(TokenKind::Punctuation, "}") {
            if self.current().kind == TokenKind::EndOfInput {
                return Err(ParseError::UnexpectedEnd);
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    /// Collects expression fragments until a token that cannot continue the
    /// body, then folds them: any operator fragment turns the whole body
    /// into a `BinaryExpr` over the concatenated fragment texts.
    fn parse_body(&mut self) -> Result<Node, ParseError> {
        let mut fragments = vec![self.parse_expr()?];
        let mut second_at = None;
        loop {
            let token = self.current();
            let continues = match token.kind {
                TokenKind::Operator
                | TokenKind::String
                | TokenKind::Number
                | TokenKind::Identifier => true,
                TokenKind::Punctuation => token.text == "(",
                _ => false,
            };
            if !continues {
                break;
            }
            if second_at.is_none() {
                second_at = Some((token.line, token.column));
            }
            fragments.push(self.parse_expr()?);
        }
        self.fold_fragments(fragments, second_at)
    }

    fn fold_fragments(
        &self,
        mut fragments: Vec<Node>,
        second_at: Option<(usize, usize)>,
    ) -> Result<Node, ParseError> {
        if fragments.iter().any(|fragment| matches!(fragment, Node::Op(_))) {
            let mut text = String::new();
            for fragment in &fragments {
                text.push_str(&fragment_text(fragment)?);
            }
            return fold_operator_expression(text);
        }
        if fragments.len() == 1 {
            return Ok(fragments.remove(0));
        }
        let (line, column) = second_at.expect("multi-fragment body has a second fragment");
        Err(ParseError::ExpectedOperator { line, column })
    }

    fn parse_expr(&mut self) -> Result<Node, ParseError> {
        match self.current().kind {
            TokenKind::String => Ok(Node::String(self.advance().text)),
            TokenKind::Number => {
                let token = self.advance();
                let value = token.text.parse().map_err(|_| ParseError::InvalidNumber {
                    text: token.text.clone(),
                    line: token.line,
                    column: token.column,
                })?;
                Ok(Node::Number(value))
            }
            TokenKind::Operator => Ok(Node::Op(self.advance().text)),
            TokenKind::Identifier => {
                if self.peek_is(TokenKind::Punctuation, "(") {
                    self.parse_call_expr()
                } else {
                    Ok(Node::Variable(self.advance().text))
                }
            }
            TokenKind::Punctuation if self.current().text == "(" => self.parse_group(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_group(&mut self) -> Result<Node, ParseError> {
        self.expect_text(TokenKind::Punctuation, "(")?;
        let mut children = Vec::new();
        loop {
            if self.at_text(TokenKind::Punctuation, ")") {
                break;
            }
            if self.current().kind == TokenKind::EndOfInput {
                return Err(ParseError::UnexpectedEnd);
            }
            children.push(self.parse_expr()?);
        }
        self.expect_text(TokenKind::Punctuation, ")")?;
        // A group with an operator child folds here, parentheses kept, so
        // the enclosing body fold sees a single textual fragment.
        if children.iter().any(|child| matches!(child, Node::Op(_))) {
            return fold_operator_expression(group_text(&children)?);
        }
        Ok(Node::GroupedExpr(children))
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn peek_is(&self, kind: TokenKind, text: &str) -> bool {
        let token = self.peek();
        token.kind == kind && token.text == text
    }

    fn at_text(&self, kind: TokenKind, text: &str) -> bool {
        let token = self.current();
        token.kind == kind && token.text == text
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind_label(kind)))
        }
    }

    fn expect_text(&mut self, kind: TokenKind, text: &str) -> Result<Token, ParseError> {
        if self.at_text(kind, text) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(text))
        }
    }

    fn eat_text(&mut self, kind: TokenKind, text: &str) -> bool {
        if self.at_text(kind, text) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> ParseError {
        let token = self.current();
        if token.kind == TokenKind::EndOfInput {
            return ParseError::UnexpectedEnd;
        }
        ParseError::UnexpectedToken {
            line: token.line,
            column: token.column,
            got: token.text.clone(),
            expected: expected.into(),
        }
    }
}

fn fold_operator_expression(text: String) -> Result<Node, ParseError> {
    let normalized =
        infix::transform(&text).map_err(|source| ParseError::InvalidOperatorExpression {
            expression: text,
            source,
        })?;
    Ok(Node::BinaryExpr(normalized))
}

fn group_text(children: &[Node]) -> Result<String, ParseError> {
    let mut text = String::from("(");
    for child in children {
        text.push_str(&fragment_text(child)?);
    }
    text.push(')');
    Ok(text)
}

fn fragment_text(node: &Node) -> Result<String, ParseError> {
    match node {
        Node::Number(value) => Ok(value.to_string()),
        Node::String(text) | Node::Op(text) | Node::Variable(text) | Node::BinaryExpr(text) => {
            Ok(text.clone())
        }
        Node::GroupedExpr(children) => group_text(children),
        Node::FuncCall { name, .. } => Err(ParseError::CallInOperatorExpression {
            name: name.clone(),
        }),
        other => unreachable!("{} node cannot appear in an operator fold", other.kind_name()),
    }
}

fn kind_label(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Identifier => "identifier",
        TokenKind::BuiltinIdentifier => "builtin identifier",
        TokenKind::Number => "number",
        TokenKind::String => "string",
        TokenKind::Punctuation => "punctuation",
        TokenKind::Operator => "operator",
        TokenKind::EndOfInput => "end of input",
    }
}

/// Parses a full token sequence into a `TopLevel` node.
pub fn parse(tokens: Vec<Token>) -> Result<Node, ParseError> {
    Parser::new(tokens).parse_program()
}
