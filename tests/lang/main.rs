use loxwalk::{ast::Parser, interpreter::Interpreter, lexer::Scanner, CaptureOutput, ErrorKind, LoxError};
use regex::Regex;

include!(concat!(env!("OUT_DIR"), "/tests/lang.rs"));

/// Runs a Lox program and checks it against the expectations written in its
/// comments:
///
/// - `// expect: <line>` for each line of output, in order;
/// - `// [line N] Error: <message>` for each static error;
/// - `// expect runtime error: <message>` for the runtime error which stops it.
fn run_file(path: &str) -> Result<(), LoxError> {
    let content = std::fs::read_to_string(path)?;

    let expect_output = Regex::new(r"// expect: ?(.*)").expect("regex should compile correctly");
    let expect_error = Regex::new(r"// \[line (\d+)\] Error: (.*)").expect("regex should compile correctly");
    let expect_runtime = Regex::new(r"// expect runtime error: (.*)").expect("regex should compile correctly");

    let expected_output: String = expect_output
        .captures_iter(&content)
        .map(|c| format!("{}\n", &c[1]))
        .collect();

    let expected_errors: Vec<String> = expect_error
        .captures_iter(&content)
        .map(|c| format!("[line {}] Error: {}", &c[1], &c[2]))
        .collect();

    let expected_runtime: Option<String> = expect_runtime.captures(&content).map(|c| c[1].to_string());

    let mut errs = Vec::new();
    let tokens = Scanner::new(&content)
        .filter_map(|t| t.map_err(|e| errs.push(e)).ok())
        .collect::<Vec<_>>();
    let (stmts, parse_errs) = Parser::parse(tokens);
    errs.extend(parse_errs);

    let output = CaptureOutput::new();
    if errs.is_empty() {
        let mut interpreter = Interpreter::default().with_output(Box::new(output.clone()));
        errs.extend(interpreter.interpret(&stmts));
    }

    let static_errors: Vec<String> = errs
        .iter()
        .filter(|e| e.is(ErrorKind::Language) || e.is(ErrorKind::Resolution))
        .map(|e| format!("[{}] Error: {}", e.loc(), e.description()))
        .collect();
    assert_eq!(static_errors, expected_errors, "{}: static errors should match", path);

    let runtime_errors: Vec<&LoxError> = errs.iter().filter(|e| e.is(ErrorKind::Runtime)).collect();
    match &expected_runtime {
        Some(message) => {
            assert_eq!(runtime_errors.len(), 1, "{}: expected exactly one runtime error, got {:?}", path, runtime_errors);
            assert_eq!(runtime_errors[0].description(), message, "{}: runtime error should match", path);
        }
        None => assert!(runtime_errors.is_empty(), "{}: did not expect a runtime error, got {:?}", path, runtime_errors),
    }

    assert!(
        !errs.iter().any(|e| e.is(ErrorKind::User) || e.is(ErrorKind::System)),
        "{}: unexpected internal errors {:?}",
        path,
        errs
    );

    assert_eq!(output.contents(), expected_output, "{}: output should match", path);

    Ok(())
}
