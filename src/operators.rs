//! Binary and unary operator semantics.
//!
//! Whether mixed-type operands are accepted depends on the run's
//! [`LanguageFeatures`]: with coercion off only same-kind operands combine,
//! with it on `bool` counts as a number. Repeating a sequence by an int is
//! plain Python and never needs coercion.
//! `and`/`or` short-circuit, so the evaluator handles them directly using
//! [`verify_boolean`].

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::{error_context, Location, RuntimeError, RuntimeErrorType};
use crate::features::LanguageFeatures;
use crate::value::Value;
use std::cmp::Ordering;

/// A number operand after applying the coercion rules.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(n) => n,
        }
    }
}

fn numeric(value: &Value, features: &LanguageFeatures) -> Option<Num> {
    match value {
        Value::Int(n) => Some(Num::Int(*n)),
        Value::Float(n) => Some(Num::Float(*n)),
        Value::Bool(b) if features.allow_type_coercion => Some(Num::Int(i64::from(*b))),
        _ => None,
    }
}

/// Condition check for `if`, `while`, `and`, `or` and `not`.
pub fn verify_boolean(
    value: &Value,
    features: &LanguageFeatures,
    location: Location,
) -> Result<bool, RuntimeError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other if features.allow_truthiness => Ok(other.is_truthy()),
        other => Err(RuntimeError::new(
            RuntimeErrorType::TruthinessDisabled,
            location,
            error_context([("value", other.repr())]),
        )),
    }
}

/// Evaluates every binary operator except `and`/`or`.
pub fn evaluate_binary(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    features: &LanguageFeatures,
    location: Location,
) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            compare(op, left, right, features, location)
        }
        BinaryOp::Add => add(left, right, features, location),
        BinaryOp::Multiply => multiply(left, right, features, location),
        BinaryOp::Subtract
        | BinaryOp::Divide
        | BinaryOp::FloorDivide
        | BinaryOp::Modulo
        | BinaryOp::Power => match (numeric(left, features), numeric(right, features)) {
            (Some(a), Some(b)) => arithmetic(op, a, b, location),
            _ => Err(mismatch(op, left, right, features, location)),
        },
        BinaryOp::And | BinaryOp::Or => Err(RuntimeError::new(
            RuntimeErrorType::InvalidBinaryExpression,
            location,
            error_context([("operator", op.symbol().to_string())]),
        )),
    }
}

pub fn evaluate_unary(
    op: UnaryOp,
    operand: &Value,
    features: &LanguageFeatures,
    location: Location,
) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!verify_boolean(operand, features, location)?)),
        UnaryOp::Negate => match numeric(operand, features) {
            Some(Num::Int(n)) => Ok(n
                .checked_neg()
                .map(Value::Int)
                .unwrap_or(Value::Float(-(n as f64)))),
            Some(Num::Float(n)) => Ok(Value::Float(-n)),
            None if matches!(operand, Value::Bool(_)) => Err(coercion_error(
                "-",
                format!("'-' cannot be used on {} without type coercion", operand.repr()),
                location,
            )),
            None => Err(RuntimeError::new(
                RuntimeErrorType::InvalidUnaryExpression,
                location,
                error_context([
                    ("operator", "-".to_string()),
                    ("value", format!("a {}", operand.type_name())),
                ]),
            )),
        },
    }
}

fn add(
    left: &Value,
    right: &Value,
    features: &LanguageFeatures,
    location: Location,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::new_list(items))
        }
        // Python never joins text to anything else, coercion or not.
        (Value::Str(_), other) | (other, Value::Str(_)) => Err(coercion_error(
            "+",
            format!(
                "can only concatenate str (not \"{}\") to str",
                other.type_name()
            ),
            location,
        )),
        _ => match (numeric(left, features), numeric(right, features)) {
            (Some(a), Some(b)) => arithmetic(BinaryOp::Add, a, b, location),
            _ => Err(mismatch(BinaryOp::Add, left, right, features, location)),
        },
    }
}

fn multiply(
    left: &Value,
    right: &Value,
    features: &LanguageFeatures,
    location: Location,
) -> Result<Value, RuntimeError> {
    if let (Some(a), Some(b)) = (numeric(left, features), numeric(right, features)) {
        return arithmetic(BinaryOp::Multiply, a, b, location);
    }

    let (sequence, count) = match (left, right) {
        (Value::Str(_) | Value::List(_), count) => (left, count),
        (count, Value::Str(_) | Value::List(_)) => (right, count),
        _ => return Err(mismatch(BinaryOp::Multiply, left, right, features, location)),
    };

    let times = match numeric(count, features) {
        Some(Num::Int(n)) => usize::try_from(n).unwrap_or(0),
        _ => {
            return Err(RuntimeError::type_error(
                location,
                format!(
                    "can't multiply sequence by non-int of type '{}'",
                    count.type_name()
                ),
            ))
        }
    };

    match sequence {
        Value::Str(s) => Ok(Value::Str(s.repeat(times))),
        Value::List(items) => {
            let items = items.borrow();
            let mut repeated = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::new_list(repeated))
        }
        _ => Err(mismatch(BinaryOp::Multiply, left, right, features, location)),
    }
}

fn arithmetic(op: BinaryOp, a: Num, b: Num, location: Location) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => int_arithmetic(op, x, y, location),
        _ => float_arithmetic(op, a.as_f64(), b.as_f64(), location),
    }
}

fn int_arithmetic(op: BinaryOp, x: i64, y: i64, location: Location) -> Result<Value, RuntimeError> {
    // Results that overflow i64 continue as floats.
    let overflow = || float_arithmetic(op, x as f64, y as f64, location);

    match op {
        BinaryOp::Add => x.checked_add(y).map(Value::Int).map_or_else(overflow, Ok),
        BinaryOp::Subtract => x.checked_sub(y).map(Value::Int).map_or_else(overflow, Ok),
        BinaryOp::Multiply => x.checked_mul(y).map(Value::Int).map_or_else(overflow, Ok),
        BinaryOp::Divide => {
            if y == 0 {
                return Err(zero_division("division by zero", location));
            }
            Ok(Value::Float(x as f64 / y as f64))
        }
        BinaryOp::FloorDivide => {
            if y == 0 {
                return Err(zero_division("integer division or modulo by zero", location));
            }
            match x.checked_div(y) {
                Some(q) if x % y != 0 && ((x < 0) != (y < 0)) => Ok(Value::Int(q - 1)),
                Some(q) => Ok(Value::Int(q)),
                None => overflow(),
            }
        }
        BinaryOp::Modulo => {
            if y == 0 {
                return Err(zero_division("integer modulo by zero", location));
            }
            match x.checked_rem(y) {
                Some(r) if r != 0 && ((r < 0) != (y < 0)) => Ok(Value::Int(r + y)),
                Some(r) => Ok(Value::Int(r)),
                None => Ok(Value::Int(0)),
            }
        }
        BinaryOp::Power => {
            if y < 0 {
                return float_arithmetic(op, x as f64, y as f64, location);
            }
            u32::try_from(y)
                .ok()
                .and_then(|exp| x.checked_pow(exp))
                .map(Value::Int)
                .map_or_else(overflow, Ok)
        }
        _ => Err(RuntimeError::new(
            RuntimeErrorType::InvalidBinaryExpression,
            location,
            error_context([("operator", op.symbol().to_string())]),
        )),
    }
}

fn float_arithmetic(op: BinaryOp, x: f64, y: f64, location: Location) -> Result<Value, RuntimeError> {
    let value = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Subtract => x - y,
        BinaryOp::Multiply => x * y,
        BinaryOp::Divide => {
            if y == 0.0 {
                return Err(zero_division("float division by zero", location));
            }
            x / y
        }
        BinaryOp::FloorDivide => {
            if y == 0.0 {
                return Err(zero_division("float floor division by zero", location));
            }
            (x / y).floor()
        }
        BinaryOp::Modulo => {
            if y == 0.0 {
                return Err(zero_division("float modulo", location));
            }
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) {
                r + y
            } else {
                r
            }
        }
        BinaryOp::Power => {
            if x == 0.0 && y < 0.0 {
                return Err(zero_division(
                    "0.0 cannot be raised to a negative power",
                    location,
                ));
            }
            x.powf(y)
        }
        _ => {
            return Err(RuntimeError::new(
                RuntimeErrorType::InvalidBinaryExpression,
                location,
                error_context([("operator", op.symbol().to_string())]),
            ))
        }
    };
    Ok(Value::Float(value))
}

fn compare(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    features: &LanguageFeatures,
    location: Location,
) -> Result<Value, RuntimeError> {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => match (numeric(left, features), numeric(right, features)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Some(a.cmp(&b)),
            (Some(a), Some(b)) => a.as_f64().partial_cmp(&b.as_f64()),
            _ => return Err(mismatch(op, left, right, features, location)),
        },
    };

    // NaN compares false with everything.
    let result = match ordering {
        None => false,
        Some(ordering) => match op {
            BinaryOp::Less => ordering == Ordering::Less,
            BinaryOp::LessEqual => ordering != Ordering::Greater,
            BinaryOp::Greater => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        },
    };
    Ok(Value::Bool(result))
}

/// Error for operands the operator cannot combine.
fn mismatch(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    features: &LanguageFeatures,
    location: Location,
) -> RuntimeError {
    let is_comparison = matches!(
        op,
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual
    );
    if !is_comparison && !features.allow_type_coercion && left.category() != right.category() {
        return coercion_error(
            op.symbol(),
            format!(
                "'{}' cannot be used between {} and {} without type coercion",
                op.symbol(),
                left.repr(),
                right.repr()
            ),
            location,
        );
    }

    let message = if is_comparison {
        format!(
            "'{}' not supported between instances of '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )
    } else {
        format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        )
    };
    RuntimeError::type_error(location, message)
}

fn coercion_error(operator: &str, details: String, location: Location) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorType::TypeCoercionNotAllowed,
        location,
        error_context([("operator", operator.to_string()), ("details", details)]),
    )
}

fn zero_division(message: &str, location: Location) -> RuntimeError {
    RuntimeError::with_message(RuntimeErrorType::ZeroDivisionError, location, message)
}
