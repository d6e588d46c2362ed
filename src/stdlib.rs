//! Builtin functions and the declarative table of methods on builtin types.
//!
//! Attribute access on a value goes through [`resolve_attribute`], which finds
//! the value's category in a registry, checks the member against the run's
//! allow-list and hands back either a property value or a bound method.
//! Stub members are listed so learners get "not implemented yet" instead of
//! a misleading `AttributeError`.

use crate::error::{error_context, Location, RuntimeError, RuntimeErrorType};
use crate::features::{Arity, ExecutionContext, LanguageFeatures};
use crate::value::{BoundMethod, Callable, ListRef, Module, Value};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdlibCategory {
    List,
    String,
    Random,
}

impl StdlibCategory {
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::List(_) => Some(StdlibCategory::List),
            Value::Str(_) => Some(StdlibCategory::String),
            Value::Module(Module::Random) => Some(StdlibCategory::Random),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Method,
}

/// Argument contract checked before a method runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Any,
    Int,
    /// `int` or `float`, never `bool`.
    Number,
}

pub type PropertyFn = fn(&Value) -> Value;
pub type MethodFn =
    fn(&mut ExecutionContext, &Value, &[Value], Location) -> Result<Value, RuntimeError>;

#[derive(Debug)]
pub struct Property {
    pub name: &'static str,
    /// `None` marks a stub.
    pub get: Option<PropertyFn>,
}

#[derive(Debug)]
pub struct Method {
    pub name: &'static str,
    pub arity: Arity,
    pub arg_types: &'static [ArgType],
    /// `None` marks a stub.
    pub func: Option<MethodFn>,
}

impl Method {
    const fn stub(name: &'static str, arity: Arity) -> Self {
        Self {
            name,
            arity,
            arg_types: &[],
            func: None,
        }
    }
}

#[derive(Debug)]
pub struct Category {
    pub category: StdlibCategory,
    pub properties: &'static [Property],
    pub methods: &'static [Method],
}

const LIST_METHODS: &[Method] = &[
    Method {
        name: "__len__",
        arity: Arity::Exact(0),
        arg_types: &[],
        func: Some(list_len),
    },
    Method {
        name: "index",
        arity: Arity::Range(1, 3),
        arg_types: &[ArgType::Any, ArgType::Int, ArgType::Int],
        func: Some(list_index),
    },
    Method::stub("append", Arity::Exact(1)),
    Method::stub("extend", Arity::Exact(1)),
    Method::stub("insert", Arity::Exact(2)),
    Method::stub("remove", Arity::Exact(1)),
    Method::stub("pop", Arity::Range(0, 1)),
    Method::stub("clear", Arity::Exact(0)),
    Method::stub("sort", Arity::Exact(0)),
    Method::stub("reverse", Arity::Exact(0)),
    Method::stub("count", Arity::Exact(1)),
    Method::stub("copy", Arity::Exact(0)),
];

const STRING_METHODS: &[Method] = &[
    Method {
        name: "__len__",
        arity: Arity::Exact(0),
        arg_types: &[],
        func: Some(string_len),
    },
    Method {
        name: "upper",
        arity: Arity::Exact(0),
        arg_types: &[],
        func: Some(string_upper),
    },
    Method {
        name: "lower",
        arity: Arity::Exact(0),
        arg_types: &[],
        func: Some(string_lower),
    },
    Method::stub("split", Arity::Range(0, 2)),
    Method::stub("join", Arity::Exact(1)),
    Method::stub("strip", Arity::Range(0, 1)),
    Method::stub("replace", Arity::Range(2, 3)),
    Method::stub("find", Arity::Range(1, 3)),
    Method::stub("startswith", Arity::Range(1, 3)),
    Method::stub("endswith", Arity::Range(1, 3)),
];

const RANDOM_METHODS: &[Method] = &[Method {
    name: "randint",
    arity: Arity::Exact(2),
    arg_types: &[ArgType::Number, ArgType::Number],
    func: Some(random_randint),
}];

/// Members available on builtin types.
pub static STDLIB: &[Category] = &[
    Category {
        category: StdlibCategory::List,
        properties: &[],
        methods: LIST_METHODS,
    },
    Category {
        category: StdlibCategory::String,
        properties: &[],
        methods: STRING_METHODS,
    },
    Category {
        category: StdlibCategory::Random,
        properties: &[],
        methods: RANDOM_METHODS,
    },
];

/// Resolves `object.name` to a property value or a bound method.
pub fn resolve_attribute(
    registry: &'static [Category],
    features: &LanguageFeatures,
    object: &Value,
    name: &str,
    location: Location,
) -> Result<Value, RuntimeError> {
    let no_attributes = || {
        RuntimeError::type_error(
            location,
            format!("'{}' object has no attributes", object.type_name()),
        )
    };
    let kind = StdlibCategory::of(object).ok_or_else(no_attributes)?;
    let category = registry
        .iter()
        .find(|category| category.category == kind)
        .ok_or_else(no_attributes)?;

    if let Some(property) = category.properties.iter().find(|p| p.name == name) {
        guard_allowed(features, kind, MemberKind::Property, property.name, location)?;
        let get = property
            .get
            .ok_or_else(|| not_implemented(property.name, location))?;
        return Ok(get(object));
    }

    if let Some(method) = category.methods.iter().find(|m| m.name == name) {
        guard_allowed(features, kind, MemberKind::Method, method.name, location)?;
        return Ok(Value::Function(Rc::new(Callable::Method(BoundMethod {
            category: kind,
            method,
            receiver: object.clone(),
        }))));
    }

    Err(RuntimeError::new(
        RuntimeErrorType::AttributeError,
        location,
        error_context([
            ("attribute", name.to_string()),
            ("type", object.type_name().to_string()),
        ]),
    ))
}

/// Runs a bound method: stub check, then arity, then argument types.
pub fn call_method(
    ctx: &mut ExecutionContext,
    bound: &BoundMethod,
    args: &[Value],
    location: Location,
) -> Result<Value, RuntimeError> {
    let method = bound.method;
    let func = method
        .func
        .ok_or_else(|| not_implemented(method.name, location))?;
    guard_arity(method.name, method.arity, args, location)?;
    guard_arg_types(method.name, method.arg_types, args, location)?;
    tracing::trace!(category = ?bound.category, method = method.name, "calling stdlib method");
    func(ctx, &bound.receiver, args, location)
}

fn guard_allowed(
    features: &LanguageFeatures,
    category: StdlibCategory,
    kind: MemberKind,
    name: &str,
    location: Location,
) -> Result<(), RuntimeError> {
    if features.is_member_allowed(category, kind, name) {
        return Ok(());
    }
    Err(RuntimeError::new(
        RuntimeErrorType::MethodNotYetAvailable,
        location,
        error_context([("method", name.to_string())]),
    ))
}

fn not_implemented(name: &str, location: Location) -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorType::MethodNotYetImplemented,
        location,
        error_context([("method", name.to_string())]),
    )
}

pub fn guard_arity(
    function: &str,
    arity: Arity,
    args: &[Value],
    location: Location,
) -> Result<(), RuntimeError> {
    if arity.accepts(args.len()) {
        return Ok(());
    }
    let plural = |n: usize| if n == 1 { "argument" } else { "arguments" };
    let expected = match arity {
        Arity::Exact(n) => format!("exactly {} {}", n, plural(n)),
        Arity::Range(min, max) => format!("from {} to {} arguments", min, max),
        Arity::AtLeast(min) => format!("at least {} {}", min, plural(min)),
    };
    let message = format!("{}() takes {} ({} given)", function, expected, args.len());
    Err(RuntimeError::new(
        RuntimeErrorType::TypeError,
        location,
        error_context([
            ("message", message),
            ("function", function.to_string()),
            ("expected", arity.to_string()),
            ("received", args.len().to_string()),
        ]),
    ))
}

pub fn guard_arg_types(
    function: &str,
    types: &[ArgType],
    args: &[Value],
    location: Location,
) -> Result<(), RuntimeError> {
    for (position, (arg, expected)) in args.iter().zip(types).enumerate() {
        let (ok, wanted) = match expected {
            ArgType::Any => (true, "an object"),
            ArgType::Int => (matches!(arg, Value::Int(_)), "an integer"),
            ArgType::Number => (arg.is_number(), "a number"),
        };
        if !ok {
            return Err(RuntimeError::new(
                RuntimeErrorType::TypeError,
                location,
                error_context([
                    (
                        "message",
                        format!(
                            "'{}' object cannot be interpreted as {}",
                            arg.type_name(),
                            wanted
                        ),
                    ),
                    ("function", function.to_string()),
                    ("argument", (position + 1).to_string()),
                    ("expected", wanted.to_string()),
                    ("received", arg.type_name().to_string()),
                ]),
            ));
        }
    }
    Ok(())
}

fn receiver_list(receiver: &Value, location: Location) -> Result<ListRef, RuntimeError> {
    match receiver {
        Value::List(items) => Ok(Rc::clone(items)),
        other => Err(RuntimeError::type_error(
            location,
            format!("expected a list, got '{}'", other.type_name()),
        )),
    }
}

fn receiver_str(receiver: &Value, location: Location) -> Result<&str, RuntimeError> {
    match receiver {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::type_error(
            location,
            format!("expected a str, got '{}'", other.type_name()),
        )),
    }
}

fn list_len(
    _ctx: &mut ExecutionContext,
    receiver: &Value,
    _args: &[Value],
    location: Location,
) -> Result<Value, RuntimeError> {
    let items = receiver_list(receiver, location)?;
    let len = items.borrow().len();
    Ok(Value::Int(len as i64))
}

fn list_index(
    _ctx: &mut ExecutionContext,
    receiver: &Value,
    args: &[Value],
    location: Location,
) -> Result<Value, RuntimeError> {
    let items = receiver_list(receiver, location)?;
    let items = items.borrow();
    let len = items.len() as i64;

    // Slice bounds clamp like Python's, negatives counting from the end.
    let bound = |arg: Option<&Value>, default: i64| -> usize {
        let raw = match arg {
            Some(Value::Int(n)) => *n,
            _ => default,
        };
        let resolved = if raw < 0 { raw + len } else { raw };
        resolved.clamp(0, len) as usize
    };
    let start = bound(args.get(1), 0);
    let end = bound(args.get(2), len);

    let needle = &args[0];
    if start < end {
        if let Some(offset) = items[start..end].iter().position(|item| item == needle) {
            return Ok(Value::Int((start + offset) as i64));
        }
    }

    Err(RuntimeError::new(
        RuntimeErrorType::ValueError,
        location,
        error_context([
            ("message", format!("{} is not in list", needle.repr())),
            ("value", needle.repr()),
        ]),
    ))
}

fn string_len(
    _ctx: &mut ExecutionContext,
    receiver: &Value,
    _args: &[Value],
    location: Location,
) -> Result<Value, RuntimeError> {
    let s = receiver_str(receiver, location)?;
    Ok(Value::Int(s.chars().count() as i64))
}

fn string_upper(
    _ctx: &mut ExecutionContext,
    receiver: &Value,
    _args: &[Value],
    location: Location,
) -> Result<Value, RuntimeError> {
    Ok(Value::Str(receiver_str(receiver, location)?.to_uppercase()))
}

fn string_lower(
    _ctx: &mut ExecutionContext,
    receiver: &Value,
    _args: &[Value],
    location: Location,
) -> Result<Value, RuntimeError> {
    Ok(Value::Str(receiver_str(receiver, location)?.to_lowercase()))
}

fn random_randint(
    ctx: &mut ExecutionContext,
    _receiver: &Value,
    args: &[Value],
    location: Location,
) -> Result<Value, RuntimeError> {
    let truncate = |value: &Value| match value {
        Value::Float(n) => n.trunc() as i64,
        Value::Int(n) => *n,
        _ => 0,
    };
    let (low, high) = (truncate(&args[0]), truncate(&args[1]));
    if low > high {
        return Err(RuntimeError::with_message(
            RuntimeErrorType::ValueError,
            location,
            format!("empty range in randint({}, {})", low, high),
        ));
    }
    Ok(Value::Int(ctx.rng().gen_range(low..=high)))
}

/// Functions available everywhere without an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
}

impl Builtin {
    pub const ALL: &'static [Builtin] = &[Builtin::Print];

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Print => "print",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Builtin::Print => Arity::AtLeast(0),
        }
    }

    pub fn call(&self, ctx: &mut ExecutionContext, args: &[Value]) -> Result<Value, RuntimeError> {
        match self {
            Builtin::Print => {
                ctx.log(print_output(args));
                Ok(Value::None)
            }
        }
    }
}

/// What `print(*args)` writes: each argument's `str()` separated by spaces.
pub fn print_output(args: &[Value]) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::AllowedMembers;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn shout(value: &Value) -> Value {
        match value {
            Value::Str(s) => Value::Str(format!("{}!", s)),
            other => other.clone(),
        }
    }

    static TEST_REGISTRY: &[Category] = &[Category {
        category: StdlibCategory::String,
        properties: &[
            Property {
                name: "loud",
                get: Some(shout),
            },
            Property {
                name: "quiet",
                get: None,
            },
        ],
        methods: STRING_METHODS,
    }];

    fn resolve(registry: &'static [Category], features: &LanguageFeatures, object: &Value, name: &str) -> Result<Value, RuntimeError> {
        resolve_attribute(registry, features, object, name, Location::default())
    }

    fn call(object: Value, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let method = resolve(STDLIB, &LanguageFeatures::default(), &object, name)?;
        let Value::Function(callable) = method else {
            panic!("expected a bound method");
        };
        let Callable::Method(bound) = &*callable else {
            panic!("expected a bound method");
        };
        let mut ctx = ExecutionContext::new(Some(7));
        call_method(&mut ctx, bound, args, Location::default())
    }

    fn list(items: &[i64]) -> Value {
        Value::new_list(items.iter().map(|n| Value::Int(*n)).collect())
    }

    #[test]
    fn properties_are_read_eagerly() {
        let features = LanguageFeatures::default();
        let value = resolve(TEST_REGISTRY, &features, &Value::Str("hi".into()), "loud").unwrap();
        assert_eq!(value, Value::Str("hi!".into()));

        let error = resolve(TEST_REGISTRY, &features, &Value::Str("hi".into()), "quiet").unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::MethodNotYetImplemented);
    }

    #[test]
    fn allow_list_is_checked_before_stub_properties() {
        let mut allowed = BTreeMap::new();
        allowed.insert(
            StdlibCategory::String,
            AllowedMembers {
                properties: Some(vec!["loud".to_string()]),
                methods: None,
            },
        );
        let features = LanguageFeatures {
            allowed_stdlib: Some(allowed),
            ..LanguageFeatures::default()
        };

        let error = resolve(TEST_REGISTRY, &features, &Value::Str("hi".into()), "quiet").unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::MethodNotYetAvailable);
        assert_eq!(error.context["method"], "quiet");
        assert!(resolve(TEST_REGISTRY, &features, &Value::Str("hi".into()), "loud").is_ok());
    }

    #[test]
    fn values_without_a_category_have_no_attributes() {
        let error = resolve(STDLIB, &LanguageFeatures::default(), &Value::Int(3), "real").unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::TypeError);
        assert_eq!(error.message, "'int' object has no attributes");
    }

    #[test]
    fn unknown_members_raise_attribute_error() {
        let error = resolve(STDLIB, &LanguageFeatures::default(), &list(&[1]), "shuffle").unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::AttributeError);
        assert_eq!(error.context["attribute"], "shuffle");
        assert_eq!(error.context["type"], "list");
    }

    #[test]
    fn allow_list_restricts_members() {
        let mut allowed = BTreeMap::new();
        allowed.insert(
            StdlibCategory::List,
            AllowedMembers {
                properties: None,
                methods: Some(vec!["index".to_string()]),
            },
        );
        let features = LanguageFeatures {
            allowed_stdlib: Some(allowed),
            ..LanguageFeatures::default()
        };

        assert!(resolve(STDLIB, &features, &list(&[1]), "index").is_ok());
        let error = resolve(STDLIB, &features, &list(&[1]), "__len__").unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::MethodNotYetAvailable);
        assert_eq!(error.context["method"], "__len__");
        // Other categories stay unrestricted.
        assert!(resolve(STDLIB, &features, &Value::Str("a".into()), "upper").is_ok());
    }

    #[test]
    fn stub_methods_fail_only_when_called() {
        let error = call(list(&[1]), "append", &[Value::Int(2)]).unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::MethodNotYetImplemented);
        assert_eq!(error.context["method"], "append");
    }

    #[test]
    fn list_index_searches_a_clamped_range() {
        let items = list(&[5, 6, 5, 7]);
        assert_eq!(call(items.clone(), "index", &[Value::Int(5)]).unwrap(), Value::Int(0));
        assert_eq!(call(items.clone(), "index", &[Value::Int(5), Value::Int(1)]).unwrap(), Value::Int(2));
        assert_eq!(call(items.clone(), "index", &[Value::Int(7), Value::Int(-2)]).unwrap(), Value::Int(3));

        let error = call(items.clone(), "index", &[Value::Int(7), Value::Int(0), Value::Int(3)]).unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::ValueError);
        assert_eq!(error.message, "7 is not in list");

        let error = call(items, "index", &[Value::Int(99)]).unwrap_err();
        assert_eq!(error.context["value"], "99");
    }

    #[test]
    fn guards_report_python_style_type_errors() {
        let error = call(list(&[1]), "__len__", &[Value::Int(1)]).unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::TypeError);
        assert_eq!(error.message, "__len__() takes exactly 0 arguments (1 given)");

        let error = call(list(&[1]), "index", &[Value::Int(1), Value::Str("a".into())]).unwrap_err();
        assert_eq!(error.message, "'str' object cannot be interpreted as an integer");
    }

    #[test]
    fn string_methods() {
        assert_eq!(call(Value::Str("MiXed".into()), "upper", &[]).unwrap(), Value::Str("MIXED".into()));
        assert_eq!(call(Value::Str("MiXed".into()), "lower", &[]).unwrap(), Value::Str("mixed".into()));
        assert_eq!(call(Value::Str("héllo".into()), "__len__", &[]).unwrap(), Value::Int(5));
    }

    #[test]
    fn randint_validates_its_range() {
        let random = Value::Module(Module::Random);
        let value = call(random.clone(), "randint", &[Value::Int(1), Value::Float(3.9)]).unwrap();
        let Value::Int(n) = value else {
            panic!("randint returns an int");
        };
        assert!((1..=3).contains(&n));

        let error = call(random.clone(), "randint", &[Value::Int(5), Value::Int(1)]).unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::ValueError);

        let error = call(random.clone(), "randint", &[Value::Bool(true), Value::Int(1)]).unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::TypeError);

        let error = resolve(STDLIB, &LanguageFeatures::default(), &random, "notAMethod").unwrap_err();
        assert_eq!(error.error_type, RuntimeErrorType::AttributeError);
    }

    #[test]
    fn print_joins_arguments_with_spaces() {
        let mut ctx = ExecutionContext::new(None);
        Builtin::Print
            .call(&mut ctx, &[Value::Str("a".into()), Value::Int(1), Value::new_list(vec![Value::Str("b".into())])])
            .unwrap();
        Builtin::Print.call(&mut ctx, &[]).unwrap();
        let lines = ctx.take_log_lines();
        assert_eq!(lines[0].output, "a 1 ['b']");
        assert_eq!(lines[1].output, "");
    }
}
