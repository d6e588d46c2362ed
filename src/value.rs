use crate::ast::Stmt;
use crate::environment::ScopeId;
use crate::features::ExternalFunction;
use crate::stdlib::{Builtin, Method, StdlibCategory};
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// A runtime object. Cloning a `Value` aliases lists, like Python names do;
/// use [`Value::snapshot`] for an independent copy.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(ListRef),
    Function(Rc<Callable>),
    Module(Module),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    Random,
}

impl Module {
    pub fn name(&self) -> &'static str {
        match self {
            Module::Random => "random",
        }
    }
}

#[derive(Debug)]
pub enum Callable {
    User(UserFunction),
    Builtin(Builtin),
    External(ExternalFunction),
    Method(BoundMethod),
}

#[derive(Debug)]
pub struct UserFunction {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    /// Scope the function was defined in.
    pub closure: ScopeId,
}

/// A stdlib method looked up on a receiver, e.g. `items.index`.
#[derive(Debug)]
pub struct BoundMethod {
    pub category: StdlibCategory,
    pub method: &'static Method,
    pub receiver: Value,
}

impl Callable {
    pub fn name(&self) -> String {
        match self {
            Callable::User(function) => function.name.clone(),
            Callable::Builtin(builtin) => builtin.name().to_string(),
            Callable::External(external) => external.name.clone(),
            Callable::Method(bound) => bound.method.name.to_string(),
        }
    }
}

impl Value {
    pub fn new_list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Module(_) => "module",
        }
    }

    /// Coarse kind: `int` and `float` are both `number`.
    pub fn category(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Module(_) => "module",
        }
    }

    /// Python truthiness, only consulted when truthiness is enabled.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Function(_) | Value::Module(_) => true,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Deep copy: the result shares no lists with `self`.
    pub fn snapshot(&self) -> Value {
        fn copy(value: &Value, copies: &mut HashMap<ListPtr, ListRef>) -> Value {
            match value {
                Value::List(items) => {
                    let key = Rc::as_ptr(items);
                    if let Some(existing) = copies.get(&key) {
                        return Value::List(Rc::clone(existing));
                    }
                    let copied: ListRef = Rc::new(RefCell::new(Vec::new()));
                    copies.insert(key, Rc::clone(&copied));
                    let elements: Vec<Value> =
                        items.borrow().iter().map(|item| copy(item, copies)).collect();
                    *copied.borrow_mut() = elements;
                    Value::List(copied)
                }
                other => other.clone(),
            }
        }

        copy(self, &mut HashMap::new())
    }

    /// Python `repr()`.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, true, &mut Vec::new());
        out
    }

    fn write(&self, out: &mut String, repr: bool, open_lists: &mut Vec<ListPtr>) {
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(n) => out.push_str(&n.to_string()),
            Value::Float(n) => out.push_str(&format_float(*n)),
            Value::Str(s) if repr => out.push_str(&quote(s)),
            Value::Str(s) => out.push_str(s),
            Value::List(items) => {
                let key = Rc::as_ptr(items);
                if open_lists.contains(&key) {
                    out.push_str("[...]");
                    return;
                }
                open_lists.push(key);
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write(out, true, open_lists);
                }
                out.push(']');
                open_lists.pop();
            }
            Value::Function(callable) => match &**callable {
                Callable::Method(bound) => out.push_str(&format!(
                    "<built-in method {} of {} object>",
                    bound.method.name,
                    bound.receiver.type_name()
                )),
                other => out.push_str(&format!("<function {}>", other.name())),
            },
            Value::Module(module) => out.push_str(&format!("<module '{}'>", module.name())),
        }
    }
}

fn format_float(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if n != 0.0 && (n.abs() >= 1e16 || n.abs() < 1e-4) {
        // Python writes at least two exponent digits with an explicit sign.
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exponent)) => {
                let exponent: i32 = exponent.parse().unwrap_or(0);
                let sign = if exponent < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exponent.abs())
            }
            None => formatted,
        }
    } else if n.fract() == 0.0 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}

fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(delimiter);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == delimiter => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delimiter);
    out
}

/// Python `str()`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut out = String::new();
        self.write(&mut out, false, &mut Vec::new());
        f.write_str(&out)
    }
}

/// Python `==`: numbers compare by value across int, float and bool.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other, &mut Vec::new())
    }
}

type ListPtr = *const RefCell<Vec<Value>>;

impl Value {
    /// A pair of lists met again while comparing them is treated as equal,
    /// so self-referencing lists compare without recursing forever.
    fn equals(&self, other: &Value, comparing: &mut Vec<(ListPtr, ListPtr)>) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let pair = (Rc::as_ptr(a), Rc::as_ptr(b));
                if comparing.contains(&pair) {
                    return true;
                }
                comparing.push(pair);
                let (a, b) = (a.borrow(), b.borrow());
                let equal = a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y, comparing));
                comparing.pop();
                equal
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl Value {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let open_lists = RefCell::new(Vec::new());
        Guarded {
            value: self,
            open_lists: &open_lists,
        }
        .serialize(serializer)
    }
}

/// Serializes a value, writing a list that contains itself as `"[...]"`.
struct Guarded<'a> {
    value: &'a Value,
    open_lists: &'a RefCell<Vec<ListPtr>>,
}

impl Serialize for Guarded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::None => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(n) => serializer.serialize_f64(*n),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let key = Rc::as_ptr(items);
                if self.open_lists.borrow().contains(&key) {
                    return serializer.serialize_str("[...]");
                }
                self.open_lists.borrow_mut().push(key);
                let items = items.borrow();
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(&Guarded {
                        value: item,
                        open_lists: self.open_lists,
                    })?;
                }
                self.open_lists.borrow_mut().pop();
                seq.end()
            }
            Value::Function(_) | Value::Module(_) => serializer.serialize_str(&self.value.repr()),
        }
    }
}
