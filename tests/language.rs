use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indoc::indoc;

use sable::interpreter::{Interpreter, RuntimeError};
use sable::parser::ParseError;
use sable::{lexer, parser, preprocess};

fn run(source: &str) -> Result<String> {
    let program = parser::parse(lexer::lex(source))?;
    Ok(Interpreter::new().run(&program)?)
}

#[test]
fn prints_a_defined_variable() -> Result<()> {
    let output = run("let x = 1; let y = 2; @println(x);")?;
    assert_eq!(output, "1");
    Ok(())
}

#[test]
fn calls_an_arrow_function_and_prints_the_result() -> Result<()> {
    let output = run("sub add(a, b) -> a + b; let r = add(2, 3); @println(r);")?;
    assert_eq!(output, "5");
    Ok(())
}

#[test]
fn mixes_strings_and_numbers_in_print_output() -> Result<()> {
    let source = indoc! {r#"
        module report;

        fixed label = "total:";
        sub total(a, b) -> (a + b) * 2;

        let t = total(3, 4);
        @println(label, t);
    "#};
    assert_eq!(run(source)?, "total: 14");
    Ok(())
}

#[test]
fn lazy_bindings_re_run_side_effects_on_every_read() -> Result<()> {
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
    assert_eq!(run(source)?, "effect\n3\neffect\n3");
    Ok(())
}

#[test]
fn shadowed_fixed_variables_stay_fixed_outside_the_call() -> Result<()> {
    let source = indoc! {r#"
        fixed limit = 10;
        sub bump(limit) -> {
            limit = 99;
            return limit;
        }
        let bumped = bump(4);
        @println(bumped);
        @println(limit);
    "#};
    assert_eq!(run(source)?, "99\n10");
    Ok(())
}

#[test]
fn fixed_violations_surface_as_runtime_errors() {
    let error = run("fixed x = 1; x = 2;").expect_err("expected fixed violation");
    let error = error
        .downcast::<RuntimeError>()
        .expect("expected a runtime error");
    assert_eq!(
        error,
        RuntimeError::AssignmentToFixed {
            name: "x".to_string(),
        }
    );
}

#[test]
fn undefined_names_surface_as_runtime_errors() {
    let error = run("@println(missing);").expect_err("expected undefined variable");
    assert_eq!(error.to_string(), "Undefined variable 'missing'");
}

#[test]
fn parse_errors_name_the_offending_position() {
    let error = run("let x 5;").expect_err("expected parse error");
    let error = error.downcast::<ParseError>().expect("expected a parse error");
    assert_eq!(
        error.to_string(),
        "Unexpected token at line 1 col 7, got '5', expected '='"
    );
}

#[test]
fn inlines_use_directives_before_running() -> Result<()> {
    let dir = Path::new("tests/programs");
    let source = fs::read_to_string(dir.join("main.sable")).context("Reading main.sable")?;
    let source = preprocess::preprocess(&source, dir)?;
    assert_eq!(run(&source)?, "42");
    Ok(())
}
