use crate::ast::NodeType;
use crate::error::{Location, RuntimeError};
use crate::stdlib::print_output;
use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Frame time advances by one per frame; this many units make a millisecond.
pub const TIME_SCALE_FACTOR: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogLine {
    pub time: u64,
    pub output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CallKind {
    Print,
    Function,
    External,
    Method,
}

/// The call an expression statement consisted of, kept for its description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallSummary {
    pub function: String,
    pub kind: CallKind,
    pub arguments: Vec<Value>,
}

/// What a step computed. Values are snapshots taken when the frame was recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EvaluationResult {
    Expression {
        value: Value,
        call: Option<CallSummary>,
    },
    Assignment {
        target: String,
        value: Value,
    },
    IfCondition {
        value: Value,
    },
    WhileCondition {
        value: Value,
    },
    ForStart {
        iterable: Value,
    },
    ForIteration {
        variable: String,
        value: Value,
        iteration: usize,
    },
    Break,
    Continue,
    Return {
        value: Value,
    },
}

/// One observable step of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub code: String,
    pub line: usize,
    pub location: Location,
    pub status: FrameStatus,
    pub time: u64,
    pub time_in_ms: u64,
    pub result: Option<EvaluationResult>,
    pub error: Option<RuntimeError>,
    pub context: NodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeMap<String, Value>>,
}

impl Frame {
    /// Learner-facing sentence for this step, built only from what was captured.
    pub fn generate_description(&self) -> String {
        if let Some(error) = &self.error {
            return format!("Python stopped here: {}", error.message);
        }
        match &self.result {
            Some(result) => describe(result),
            None => String::new(),
        }
    }
}

fn describe(result: &EvaluationResult) -> String {
    match result {
        EvaluationResult::Expression { value, call } => match call {
            Some(CallSummary {
                kind: CallKind::Print,
                arguments,
                ..
            }) => {
                if arguments.is_empty() {
                    "This printed a blank line.".to_string()
                } else {
                    format!("This printed {}.", print_output(arguments))
                }
            }
            Some(CallSummary {
                function,
                arguments,
                ..
            }) => {
                let arguments: Vec<String> = arguments.iter().map(Value::repr).collect();
                match value {
                    Value::None => format!("Python called {}({}).", function, arguments.join(", ")),
                    value => format!(
                        "Python called {}({}), which returned {}.",
                        function,
                        arguments.join(", "),
                        value.repr()
                    ),
                }
            }
            None => format!("Python evaluated this expression to {}.", value.repr()),
        },
        EvaluationResult::Assignment { target, value } => {
            format!("Python assigned {} to {}.", value.repr(), target)
        }
        EvaluationResult::IfCondition { value } => {
            let outcome = if value.is_truthy() {
                "ran"
            } else {
                "skipped"
            };
            format!(
                "The condition evaluated to {}, so Python {} the indented block.",
                value.repr(),
                outcome
            )
        }
        EvaluationResult::WhileCondition { value } => {
            if value.is_truthy() {
                format!(
                    "The while loop's condition evaluated to {}, so Python ran the loop body.",
                    value.repr()
                )
            } else {
                format!(
                    "The while loop's condition evaluated to {}, so the loop finished.",
                    value.repr()
                )
            }
        }
        EvaluationResult::ForStart { iterable } => {
            let empty = match iterable {
                Value::List(items) => items.borrow().is_empty(),
                Value::Str(s) => s.is_empty(),
                _ => false,
            };
            let mut description = format!("Python is starting a for loop over {}.", iterable.repr());
            if empty {
                description.push_str(" It is empty, so the loop body will not run.");
            }
            description
        }
        EvaluationResult::ForIteration {
            variable,
            value,
            iteration,
        } => format!(
            "This is the {} iteration of the loop. Python set {} to {}.",
            ordinal(*iteration),
            variable,
            value.repr()
        ),
        EvaluationResult::Break => "Python reached break, exiting the loop.".to_string(),
        EvaluationResult::Continue => {
            "Python reached continue, moving on to the next iteration of the loop.".to_string()
        }
        EvaluationResult::Return { value } => {
            format!("The function returned {}.", value.repr())
        }
    }
}

/// `1` → `1st`, `12` → `12th`, `22` → `22nd`.
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ordinals() {
        let words: Vec<_> = [1, 2, 3, 4, 11, 12, 13, 21, 102, 111].iter().map(|n| ordinal(*n)).collect();
        assert_eq!(
            words,
            vec!["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "102nd", "111th"]
        );
    }

    #[test]
    fn print_descriptions() {
        let printed = describe(&EvaluationResult::Expression {
            value: Value::None,
            call: Some(CallSummary {
                function: "print".to_string(),
                kind: CallKind::Print,
                arguments: vec![Value::Str("hi".to_string()), Value::Int(2)],
            }),
        });
        assert_eq!(printed, "This printed hi 2.");

        let blank = describe(&EvaluationResult::Expression {
            value: Value::None,
            call: Some(CallSummary {
                function: "print".to_string(),
                kind: CallKind::Print,
                arguments: vec![],
            }),
        });
        assert_eq!(blank, "This printed a blank line.");
    }
}
