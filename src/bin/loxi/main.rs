use std::{io::Write, path::Path};

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loxwalk::{
    ast::printer::AstPrinter, cmdline::CommandLineOptions, interpreter::Interpreter, lexer::Scanner, ErrorKind, LoxError,
};

fn main() {
    let opts = CommandLineOptions::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(opts.log_filter()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut interpreter = Interpreter::default();

    let result = match &opts.file {
        Some(file) => run_file(file, &mut interpreter, &opts),
        None => run_prompt(&mut interpreter, &opts),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(74);
        }
    }
}

fn run_file(path: &Path, interpreter: &mut Interpreter, opts: &CommandLineOptions) -> Result<i32, LoxError> {
    let content = std::fs::read_to_string(path)?;
    tracing::info!(path = %path.display(), "running script");

    let errs = run(&content, interpreter, opts);
    for err in &errs {
        eprintln!("{}", err);
    }

    Ok(exit_code(&errs))
}

fn run_prompt(interpreter: &mut Interpreter, opts: &CommandLineOptions) -> Result<i32, LoxError> {
    let mut buffer = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        buffer.clear();
        if std::io::stdin().read_line(&mut buffer)? == 0 || buffer.trim() == "exit" {
            break;
        }

        for err in run(&buffer, interpreter, opts) {
            eprintln!("{}", err);
        }
    }

    Ok(0)
}

/// Scans, parses and then resolves and runs a chunk of source against the
/// interpreter's globals. Nothing runs if the source has static errors.
fn run(source: &str, interpreter: &mut Interpreter, opts: &CommandLineOptions) -> Vec<LoxError> {
    let mut errs = Vec::new();

    let tokens = Scanner::new(source)
        .filter_map(|t| t.map_err(|e| errs.push(e)).ok())
        .collect::<Vec<_>>();

    let (stmts, parse_errs) = loxwalk::ast::Parser::parse(tokens);
    errs.extend(parse_errs);

    if !errs.is_empty() {
        return errs;
    }

    if opts.ast {
        for stmt in &stmts {
            eprintln!("{}", AstPrinter {}.stmt(stmt));
        }
    }

    interpreter.interpret(&stmts)
}

fn exit_code(errs: &[LoxError]) -> i32 {
    if errs.iter().any(|e| e.is(ErrorKind::Runtime)) {
        70
    } else if errs.iter().any(|e| e.is(ErrorKind::Language) || e.is(ErrorKind::Resolution)) {
        65
    } else if errs.is_empty() {
        0
    } else {
        74
    }
}
