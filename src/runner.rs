use crate::error::SyntaxError;
use crate::evaluator::Evaluator;
use crate::features::{EvaluationContext, LanguageFeatures};
use crate::frame::{Frame, LogLine};
use crate::lexer::Lexer;
use crate::parser::{self, Parser};
use crate::value::Value;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CompileResult {
    pub success: bool,
    pub error: Option<SyntaxError>,
}

/// Scans and parses without running anything, for live syntax checking.
pub fn compile(source: &str, context: &EvaluationContext) -> CompileResult {
    match parser::parse(source, &context.language_features) {
        Ok(_) => CompileResult {
            success: true,
            error: None,
        },
        Err(error) => CompileResult {
            success: false,
            error: Some(error),
        },
    }
}

/// Outcome of a full run. `error` is only ever a syntax error; runtime
/// errors live on the last frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretResult {
    pub frames: Vec<Frame>,
    pub log_lines: Vec<LogLine>,
    pub error: Option<SyntaxError>,
    pub success: bool,
}

/// Parses and executes `source` with a fresh environment.
pub fn interpret(source: &str, context: &EvaluationContext) -> InterpretResult {
    let statements = match parser::parse(source, &context.language_features) {
        Ok(statements) => statements,
        Err(error) => {
            tracing::debug!(error = %error, "compilation failed");
            return InterpretResult {
                frames: Vec::new(),
                log_lines: Vec::new(),
                error: Some(error),
                success: false,
            };
        }
    };

    let result = Evaluator::new(source, context).execute(&statements);
    InterpretResult {
        frames: result.frames,
        log_lines: result.log_lines,
        error: None,
        success: result.success,
    }
}

/// Outcome of calling one function of a program. Frames cover the top-level
/// run followed by the call; a runtime error is on the last frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateFunctionResult {
    pub value: Option<Value>,
    pub frames: Vec<Frame>,
    pub log_lines: Vec<LogLine>,
    pub success: bool,
}

/// Runs `source`, then calls its top-level function `name` with `args`.
/// Only a syntax error is returned as `Err`.
pub fn evaluate_function(
    source: &str,
    context: &EvaluationContext,
    name: &str,
    args: &[Value],
) -> Result<EvaluateFunctionResult, SyntaxError> {
    let statements = parser::parse(source, &context.language_features)?;

    let mut evaluator = Evaluator::new(source, context);
    let mut result = evaluator.execute(&statements);
    if !result.success {
        return Ok(EvaluateFunctionResult {
            value: None,
            frames: result.frames,
            log_lines: result.log_lines,
            success: false,
        });
    }

    let (value, call) = evaluator.call_function(name, args.to_vec());
    result.frames.extend(call.frames);
    result.log_lines.extend(call.log_lines);
    Ok(EvaluateFunctionResult {
        value,
        frames: result.frames,
        log_lines: result.log_lines,
        success: call.success,
    })
}

/// Every syntax error in `source`, recovering after each one.
pub fn check(source: &str, features: &LanguageFeatures) -> Vec<SyntaxError> {
    let tokens = match Lexer::new(source).scan_tokens() {
        Ok(tokens) => tokens,
        Err(error) => return vec![error],
    };
    let (_, errors) = Parser::new(tokens, features).parse_all();
    errors
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub check_only: bool,
    pub trace: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct FrameView<'a> {
    #[serde(flatten)]
    frame: &'a Frame,
    description: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    success: bool,
    error: Option<&'a SyntaxError>,
    frames: Vec<FrameView<'a>>,
    log_lines: &'a [LogLine],
}

/// Runs a program for the terminal, reporting errors with source snippets.
/// Returns whether it compiled and ran without error.
pub fn run(
    source: &str,
    filename: Option<&str>,
    context: &EvaluationContext,
    options: RunOptions,
) -> bool {
    if options.check_only {
        let errors = check(source, &context.language_features);
        for error in &errors {
            error.report(source, filename);
        }
        return errors.is_empty();
    }

    let result = interpret(source, context);

    if options.json {
        let report = JsonReport {
            success: result.success,
            error: result.error.as_ref(),
            frames: result
                .frames
                .iter()
                .map(|frame| FrameView {
                    frame,
                    description: frame.generate_description(),
                })
                .collect(),
            log_lines: &result.log_lines,
        };
        return match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                println!("{}", json);
                result.success
            }
            Err(err) => {
                eprintln!("Error: could not serialize frames: {}", err);
                false
            }
        };
    }

    if let Some(error) = &result.error {
        error.report(source, filename);
        return false;
    }

    if options.trace {
        for frame in &result.frames {
            println!(
                "[{:>5}] line {:>3}: {}",
                frame.time,
                frame.line,
                frame.generate_description()
            );
        }
    } else {
        for line in &result.log_lines {
            println!("{}", line.output);
        }
    }

    if let Some(error) = result.frames.last().and_then(|frame| frame.error.as_ref()) {
        error.report(source, filename);
    }
    result.success
}
