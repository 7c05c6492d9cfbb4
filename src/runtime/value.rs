use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Peekable;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::interop::HostObject;
use crate::parallel::TaskHandle;
use crate::parser::Expression;
use crate::runtime::Function;

/// Boxed stream of lazily produced values
pub type ValueIter = Box<dyn Iterator<Item = Result<Value>> + Send>;

/// Shared, lazy, non-restartable sequence
///
/// Clones share the same underlying iterator: an element pulled through one
/// clone is gone for every other clone.
#[derive(Clone)]
pub struct LazyIter {
    inner: Arc<Mutex<Peekable<ValueIter>>>,
}

impl LazyIter {
    /// Wraps any sendable iterator of fallible values
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<Value>> + Send + 'static,
    {
        let boxed: ValueIter = Box::new(iter);
        LazyIter {
            inner: Arc::new(Mutex::new(boxed.peekable())),
        }
    }

    /// Iterator over already computed values
    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(values.into_iter().map(Ok))
    }

    /// Iterator that yields nothing
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// True if another element (or error) is available
    ///
    /// May force evaluation of the next element.
    pub fn has_next(&self) -> bool {
        self.inner.lock().peek().is_some()
    }

    /// Drains the remaining elements into a vector
    pub fn drain(&self) -> Result<Vec<Value>> {
        self.clone().collect()
    }

    /// True if both handles share the same iterator
    pub fn ptr_eq(&self, other: &LazyIter) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Iterator for LazyIter {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.lock().next()
    }
}

impl fmt::Debug for LazyIter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<iterator>")
    }
}

/// Runtime value representation
#[derive(Debug, Clone)]
pub enum Value {
    // Primitives
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit integer value
    Int(i64),
    /// 64-bit floating-point value
    Float(f64),
    /// String value (also what bare words evaluate to)
    String(String),

    // Collections (use Arc for large values)
    /// List of values (reference-counted)
    List(Arc<Vec<Value>>),
    /// Dictionary with sorted string keys (reference-counted)
    Dict(Arc<BTreeMap<String, Value>>),
    /// Lazy sequence, possibly still being computed
    Iter(LazyIter),

    // Special
    /// Callable function value
    Function(Function),
    /// Handle to a `thread`-scheduled evaluation
    Future(TaskHandle),
    /// Opaque object owned by a host bridge
    Foreign(Arc<dyn HostObject>),
}

impl Value {
    /// Creates a list value from a vector of values
    pub fn list(values: Vec<Value>) -> Self {
        Value::List(Arc::new(values))
    }

    /// Creates a dictionary value
    pub fn dict(entries: BTreeMap<String, Value>) -> Self {
        Value::Dict(Arc::new(entries))
    }

    /// Creates a lazy sequence value
    pub fn iter<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<Value>> + Send + 'static,
    {
        Value::Iter(LazyIter::new(iter))
    }

    /// Value of a parsed atom. Sequences are not atoms and yield `None`.
    pub fn from_atom(expr: &Expression) -> Option<Self> {
        match expr {
            Expression::Int(n) => Some(Value::Int(*n)),
            Expression::Float(x) => Some(Value::Float(*x)),
            Expression::Bool(b) => Some(Value::Bool(*b)),
            Expression::Word(s) | Expression::Text(s) => Some(Value::String(s.clone())),
            Expression::Sequence(_) => None,
        }
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Iter(_) => "iterator",
            Value::Function(_) => "function",
            Value::Future(_) => "future",
            Value::Foreign(_) => "foreign",
        }
    }

    /// Returns true if the value is truthy in a boolean context
    ///
    /// `null`, `false`, numeric zero and the strings `false`, `0`, `no`, `f`
    /// and `off` (any case) are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::String(s) => !["false", "0", "no", "f", "off"]
                .iter()
                .any(|falsy| falsy.eq_ignore_ascii_case(s)),
            _ => true,
        }
    }

    // Type conversion methods

    /// Converts value to a 64-bit integer
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(x) => Ok(*x as i64),
            Value::Bool(b) => Ok(if *b { 1 } else { 0 }),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::type_error("int", format!("string \"{}\"", s))),
            _ => Err(Error::type_error("int", self.type_name())),
        }
    }

    /// Converts value to a 64-bit floating-point number
    pub fn as_float(&self) -> Result<f64> {
        match self {
            Value::Float(x) => Ok(*x),
            Value::Int(n) => Ok(*n as f64),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| Error::type_error("float", format!("string \"{}\"", s))),
            _ => Err(Error::type_error("float", self.type_name())),
        }
    }

    /// Returns a reference to the string value
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(Error::type_error("string", self.type_name())),
        }
    }

    /// Returns the function held by this value
    pub fn as_function(&self) -> Result<&Function> {
        match self {
            Value::Function(f) => Ok(f),
            _ => Err(Error::type_error("function", self.type_name())),
        }
    }

    /// Returns the dictionary held by this value
    pub fn as_dict(&self) -> Result<&Arc<BTreeMap<String, Value>>> {
        match self {
            Value::Dict(d) => Ok(d),
            _ => Err(Error::type_error("dict", self.type_name())),
        }
    }

    /// Converts value to its text form; strings are returned without quotes
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// True for lists and lazy sequences
    pub fn is_iterable(&self) -> bool {
        matches!(self, Value::List(_) | Value::Iter(_))
    }

    /// Iterator over a list or lazy sequence, `None` for anything else
    ///
    /// Iterating a lazy sequence consumes it.
    pub fn iterate(&self) -> Option<ValueIter> {
        match self {
            Value::List(items) => {
                let items = Arc::clone(items);
                Some(Box::new((0..items.len()).map(move |i| Ok(items[i].clone()))))
            }
            Value::Iter(iter) => Some(Box::new(iter.clone())),
            _ => None,
        }
    }

    /// Orders two comparable values
    ///
    /// Numbers compare with each other (mixing int and float), strings and
    /// booleans compare with their own kind. Anything else is incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, val) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
            Value::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (key, val)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, val)?;
                }
                write!(f, "}}")
            }
            Value::Iter(_) => write!(f, "<iterator>"),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Future(handle) => write!(f, "<future {}>", handle.id()),
            Value::Foreign(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

// Implement equality manually (iterators and functions compare by identity)
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Iter(a), Value::Iter(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Future(a), Value::Future(b)) => a.id() == b.id(),
            (Value::Foreign(a), Value::Foreign(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq<Vec<Value>> for Value {
    fn eq(&self, other: &Vec<Value>) -> bool {
        match self {
            Value::List(items) => items.as_ref() == other,
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

/// Turns a value back into an unevaluated expression
///
/// Used when a function that wants an unevaluated argument is fed already
/// computed values, for example through `curry`.
impl TryFrom<&Value> for Expression {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Expression> {
        match value {
            Value::Int(n) => Ok(Expression::Int(*n)),
            Value::Float(x) => Ok(Expression::Float(*x)),
            Value::Bool(b) => Ok(Expression::Bool(*b)),
            Value::String(s) => Ok(Expression::Text(s.clone())),
            Value::List(items) => items
                .iter()
                .map(Expression::try_from)
                .collect::<Result<Vec<_>>>()
                .map(Expression::sequence),
            other => Err(Error::type_error("expression", other.type_name())),
        }
    }
}
