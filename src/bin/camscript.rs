//! Run a pseudocode program from a file
//!
//! Usage: camscript [--dump-ast] <program.txt>
//!
//! `--dump-ast` prints the parsed syntax tree as JSON instead of executing.

use std::env;
use std::fs;
use std::process;

use anyhow::{Context, Result};

use camscript::{parse_program, tokenize, Interpreter};

fn main() {
    let args: Vec<String> = env::args().collect();
    let (dump_ast, file_path) = match parse_args(&args) {
        Some(parsed) => parsed,
        None => {
            eprintln!("Usage: camscript [--dump-ast] <program.txt>");
            process::exit(2);
        }
    };

    if let Err(err) = run(file_path, dump_ast) {
        // Lex/parse errors carry a 0-based source position worth surfacing
        if let Some(source_err) = err.downcast_ref::<camscript::Error>() {
            if let Some((line, column)) = source_err.location() {
                eprintln!("Error at line {line}, column {column}: {source_err}");
                process::exit(1);
            }
        }
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Option<(bool, &str)> {
    match args {
        [_, path] => Some((false, path)),
        [_, flag, path] if flag == "--dump-ast" => Some((true, path)),
        _ => None,
    }
}

fn run(file_path: &str, dump_ast: bool) -> Result<()> {
    let code = fs::read_to_string(file_path)
        .with_context(|| format!("reading program file '{file_path}'"))?;

    let tokens = tokenize(&code)?;
    let program = parse_program(tokens)?;

    if dump_ast {
        let json = serde_json::to_string_pretty(&program).context("serialising syntax tree")?;
        println!("{json}");
        return Ok(());
    }

    let mut interpreter = Interpreter::new();
    interpreter.execute(&program)?;
    Ok(())
}
