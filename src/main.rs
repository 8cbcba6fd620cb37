use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use sable::interpreter::Interpreter;
use sable::{lexer, parser, preprocess};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut dump_ast = false;
    let mut input_path: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ast" => dump_ast = true,
            flag if flag.starts_with('-') => bail!("Unknown flag '{flag}'"),
            _ => {
                input_path = Some(arg);
                if args.next().is_some() {
                    bail!("Only one input file is supported");
                }
                break;
            }
        }
    }

    let (source, base_dir) = match &input_path {
        Some(path) => {
            let source = fs::read_to_string(path).with_context(|| format!("Reading {path}"))?;
            let base_dir = Path::new(path)
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            (source, base_dir)
        }
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Reading stdin")?;
            (buffer, PathBuf::from("."))
        }
    };

    let source = preprocess::preprocess(&source, &base_dir)?;
    let program = parser::parse(lexer::lex(&source))?;

    if dump_ast {
        println!("{program:#?}");
        return Ok(());
    }

    let mut interpreter = Interpreter::new();
    let output = interpreter.run(&program)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
