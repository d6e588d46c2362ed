use crate::ast::NodeType;
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Byte range in the source plus the 1-based line/column of its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Location {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Span covering `from` through `to`, positioned at `from`.
    pub fn between(from: Location, to: Location) -> Self {
        Self {
            start: from.start,
            end: to.end.max(from.end),
            line: from.line,
            column: from.column,
        }
    }

    /// The source text this location covers.
    pub fn to_code<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }

    fn char_range(&self, source: &str) -> std::ops::Range<usize> {
        let to_chars = |byte: usize| {
            source
                .get(..byte.min(source.len()))
                .map(|prefix| prefix.chars().count())
                .unwrap_or(0)
        };
        let start = to_chars(self.start);
        let end = to_chars(self.end).max(start + 1);
        start..end
    }
}

/// Structured details attached to an error, keyed by name.
pub type ErrorContext = BTreeMap<String, String>;

pub fn error_context<const N: usize>(pairs: [(&str, String); N]) -> ErrorContext {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn ctx<'a>(context: &'a ErrorContext, key: &str) -> &'a str {
    context.get(key).map(String::as_str).unwrap_or("?")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorType {
    // Scanner
    UnexpectedCharacter,
    UnterminatedString,
    IndentationError,
    UnimplementedToken,
    GenericSyntaxError,
    MissingRightBraceInFString,

    // Parser
    MissingExpression,
    MissingRightParen,
    MissingRightBracket,
    MissingColon,
    MissingIdentifier,
    MissingIn,
    MissingEqual,
    MissingAttributeName,
    MissingIndent,
    MissingDedent,
    MissingFunctionName,
    MissingLeftParenthesisAfterFunctionName,
    MissingParameterName,
    MissingRightParenthesisAfterParameters,
    MissingColonAfterFunctionSignature,
    MissingRightParenthesisAfterFunctionCall,
    DuplicateParameterName,
    InvalidAssignmentTarget,
    UnexpectedIndentation,
    UnexpectedTokenAfterStatement,
    BreakOutsideLoop,
    ContinueOutsideLoop,
    NodeNotAllowed(NodeType),
}

impl SyntaxErrorType {
    /// Stable external name, e.g. `MissingColon` or `ForInStatementNotAllowed`.
    pub fn name(&self) -> String {
        match self {
            SyntaxErrorType::NodeNotAllowed(node) => format!("{}NotAllowed", node.name()),
            other => format!("{:?}", other),
        }
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            SyntaxErrorType::IndentationError => Some("Indent each level with exactly four spaces."),
            SyntaxErrorType::MissingColon | SyntaxErrorType::MissingColonAfterFunctionSignature => {
                Some("Lines that open a block end with ':'.")
            }
            SyntaxErrorType::MissingIndent => {
                Some("The body of a block goes on the next line, indented by four spaces.")
            }
            SyntaxErrorType::UnimplementedToken => {
                Some("This part of Python is not available in this exercise.")
            }
            _ => None,
        }
    }
}

impl fmt::Display for SyntaxErrorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for SyntaxErrorType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

fn syntax_message(error_type: &SyntaxErrorType, context: &ErrorContext) -> String {
    use SyntaxErrorType::*;
    match error_type {
        UnexpectedCharacter => format!("Unexpected character '{}'", ctx(context, "character")),
        UnterminatedString => "This string is missing its closing quote".to_string(),
        IndentationError => ctx(context, "details").to_string(),
        UnimplementedToken => format!(
            "'{}' is not something you can use yet",
            ctx(context, "lexeme")
        ),
        GenericSyntaxError => format!("Invalid syntax near '{}'", ctx(context, "lexeme")),
        MissingRightBraceInFString => "An f-string '{' is missing its closing '}'".to_string(),
        MissingExpression => format!("Expected an expression but found '{}'", ctx(context, "lexeme")),
        MissingRightParen => "Expected ')' to close the expression".to_string(),
        MissingRightBracket => "Expected ']' to close the brackets".to_string(),
        MissingColon => format!("Expected ':' after the {}", ctx(context, "after")),
        MissingIdentifier => "Expected a variable name".to_string(),
        MissingIn => "Expected 'in' after the loop variable".to_string(),
        MissingEqual => "Expected '=' in the assignment".to_string(),
        MissingAttributeName => "Expected a name after '.'".to_string(),
        MissingIndent => "Expected an indented block".to_string(),
        MissingDedent => "Expected the indented block to end".to_string(),
        MissingFunctionName => "Expected a function name after 'def'".to_string(),
        MissingLeftParenthesisAfterFunctionName => {
            format!("Expected '(' after the function name '{}'", ctx(context, "function"))
        }
        MissingParameterName => "Expected a parameter name".to_string(),
        MissingRightParenthesisAfterParameters => "Expected ')' after the parameters".to_string(),
        MissingColonAfterFunctionSignature => {
            "Expected ':' after the function signature".to_string()
        }
        MissingRightParenthesisAfterFunctionCall => format!(
            "Expected ')' to close the call to '{}'",
            ctx(context, "function")
        ),
        DuplicateParameterName => format!(
            "The parameter '{}' is listed more than once",
            ctx(context, "parameter")
        ),
        InvalidAssignmentTarget => "You can only assign to a variable or a list element".to_string(),
        UnexpectedIndentation => "This line is indented more than expected".to_string(),
        UnexpectedTokenAfterStatement => format!(
            "Unexpected '{}' after the end of the statement",
            ctx(context, "lexeme")
        ),
        BreakOutsideLoop => "'break' can only be used inside a loop".to_string(),
        ContinueOutsideLoop => "'continue' can only be used inside a loop".to_string(),
        NodeNotAllowed(node) => format!("{} cannot be used at this level", node.friendly_name()),
    }
}

/// Error raised while scanning or parsing. Compilation stops at the first one.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct SyntaxError {
    #[serde(rename = "type")]
    pub error_type: SyntaxErrorType,
    pub message: String,
    pub location: Location,
    pub context: ErrorContext,
}

impl SyntaxError {
    pub fn new(error_type: SyntaxErrorType, location: Location, context: ErrorContext) -> Self {
        Self {
            message: syntax_message(&error_type, &context),
            error_type,
            location,
            context,
        }
    }

    pub fn bare(error_type: SyntaxErrorType, location: Location) -> Self {
        Self::new(error_type, location, ErrorContext::new())
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        render_report(
            "Syntax Error",
            Color::Yellow,
            &self.error_type.name(),
            &self.message,
            self.error_type.help(),
            self.location,
            source,
            filename,
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuntimeErrorType {
    InvalidBinaryExpression,
    InvalidUnaryExpression,
    UndefinedVariable,
    UnsupportedOperation,
    TypeError,
    TruthinessDisabled,
    TypeCoercionNotAllowed,
    IndexError,
    NodeNotAllowed,
    FunctionNotFound,
    InvalidNumberOfArguments,
    FunctionExecutionError,
    LogicErrorInExecution,
    ReturnOutsideFunction,
    AttributeError,
    ValueError,
    ZeroDivisionError,
    RecursionError,
    MethodNotYetImplemented,
    MethodNotYetAvailable,
    MaxIterationsReached,
}

fn runtime_message(error_type: RuntimeErrorType, context: &ErrorContext) -> String {
    use RuntimeErrorType::*;
    match error_type {
        InvalidBinaryExpression => {
            format!("The operator '{}' cannot be used here", ctx(context, "operator"))
        }
        InvalidUnaryExpression => format!(
            "The operator '{}' cannot be used on {}",
            ctx(context, "operator"),
            ctx(context, "value")
        ),
        UndefinedVariable => format!("name '{}' is not defined", ctx(context, "name")),
        UnsupportedOperation => ctx(context, "details").to_string(),
        TruthinessDisabled => format!(
            "Expected True or False here, but got {}",
            ctx(context, "value")
        ),
        TypeCoercionNotAllowed => format!(
            "Cannot use '{}' with these types: {}",
            ctx(context, "operator"),
            ctx(context, "details")
        ),
        NodeNotAllowed => format!("{} cannot be used at this level", ctx(context, "nodeType")),
        FunctionNotFound => format!("There is no function called '{}'", ctx(context, "name")),
        InvalidNumberOfArguments => format!(
            "{}() expected {} argument(s) but got {}",
            ctx(context, "function"),
            ctx(context, "expected"),
            ctx(context, "got")
        ),
        FunctionExecutionError => format!(
            "Something went wrong running {}(): {}",
            ctx(context, "function"),
            ctx(context, "message")
        ),
        ReturnOutsideFunction => "'return' outside function".to_string(),
        AttributeError => format!(
            "'{}' object has no attribute '{}'",
            ctx(context, "type"),
            ctx(context, "attribute")
        ),
        MethodNotYetImplemented => format!(
            "'{}' has not been implemented yet",
            ctx(context, "method")
        ),
        MethodNotYetAvailable => format!(
            "'{}' is not available for you to use yet",
            ctx(context, "method")
        ),
        MaxIterationsReached => format!(
            "Your loops ran more than {} times in total. Is one of them infinite?",
            ctx(context, "max")
        ),
        RecursionError => format!(
            "maximum recursion depth exceeded ({} nested calls)",
            ctx(context, "max")
        ),
        TypeError | IndexError | ValueError | ZeroDivisionError | LogicErrorInExecution => {
            ctx(context, "message").to_string()
        }
    }
}

/// Error raised while executing a program. It ends up on the final frame.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct RuntimeError {
    #[serde(rename = "type")]
    pub error_type: RuntimeErrorType,
    pub message: String,
    pub location: Location,
    pub context: ErrorContext,
}

impl RuntimeError {
    pub fn new(error_type: RuntimeErrorType, location: Location, context: ErrorContext) -> Self {
        Self {
            message: runtime_message(error_type, &context),
            error_type,
            location,
            context,
        }
    }

    /// Error whose whole message is supplied by the caller.
    pub fn with_message(
        error_type: RuntimeErrorType,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self::new(error_type, location, error_context([("message", message.into())]))
    }

    pub fn type_error(location: Location, message: impl Into<String>) -> Self {
        Self::with_message(RuntimeErrorType::TypeError, location, message)
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        render_report(
            "Runtime Error",
            Color::Magenta,
            &format!("{:?}", self.error_type),
            &self.message,
            None,
            self.location,
            source,
            filename,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn render_report(
    kind_str: &str,
    color: Color,
    type_name: &str,
    message: &str,
    help: Option<&str>,
    location: Location,
    source: &str,
    filename: Option<&str>,
) {
    let filename = filename.unwrap_or("<input>");
    let range = location.char_range(source);

    let mut report_builder = Report::build(ReportKind::Error, filename, range.start)
        .with_message(format!("{} [{}]: {}", kind_str.fg(color), type_name, message))
        .with_label(
            Label::new((filename, range))
                .with_message(message)
                .with_color(color),
        );

    if let Some(help_text) = help {
        report_builder =
            report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
    }

    if let Err(err) = report_builder
        .finish()
        .eprint((filename, Source::from(source)))
    {
        tracing::warn!(error = %err, "failed to render diagnostic");
    }
}
