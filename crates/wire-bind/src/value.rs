//! Data values and assignments

use crate::LiveNode;
use indexmap::IndexMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use wire_dom::NodeId;

/// A logical value held by a `data` property
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Plain DOM node
    Node(NodeId),
    /// Node produced by a template, carrying its own `data`
    Live(LiveNode),
    List(Vec<Value>),
    Record(IndexMap<String, Value>),
}

impl Value {
    /// Short type name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Node(_) => "node",
            Value::Live(_) => "live node",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `false`, `null`, `0`, `NaN` and `""` are falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// DOM node behind a `Node` or `Live` value
    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Value::Node(id) => Some(*id),
            Value::Live(live) => Some(live.id()),
            _ => None,
        }
    }

    pub fn as_live(&self) -> Option<&LiveNode> {
        match self {
            Value::Live(live) => Some(live),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Text rendering used by text nodes and attributes.
    ///
    /// Integral numbers print without a fraction, `Null` and nodes print as
    /// nothing, lists join with `,`.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null | Value::Node(_) | Value::Live(_) => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(","),
            Value::Record(_) => "[object Object]".to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a == b,
            (Value::Live(a), Value::Live(b)) => a.id() == b.id(),
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Node(id) => write!(f, "Node({id})"),
            Value::Live(live) => write!(f, "Live({})", live.id()),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Record(record) => f.debug_map().entries(record).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(n: $ty) -> Self {
                Value::Number(n as f64)
            }
        })*
    };
}

number_from!(f64, f32, i32, i64, u32, u64, usize);

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

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

impl From<LiveNode> for Value {
    fn from(live: LiveNode) -> Self {
        Value::Live(live)
    }
}

impl From<&LiveNode> for Value {
    fn from(live: &LiveNode) -> Self {
        Value::Live(live.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(record: IndexMap<String, Value>) -> Self {
        Value::Record(record)
    }
}

/// A value that becomes available on a later turn of the event loop
pub struct Pending(Pin<Box<dyn Future<Output = Value>>>);

impl Pending {
    pub fn new<F, T>(future: F) -> Self
    where
        F: Future<Output = T> + 'static,
        T: Into<Value>,
    {
        Self(Box::pin(async move { future.await.into() }))
    }

    pub(crate) fn into_future(self) -> Pin<Box<dyn Future<Output = Value>>> {
        self.0
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pending")
    }
}

/// Right-hand side of a `data` write
#[derive(Debug)]
pub enum Assignment {
    Immediate(Value),
    Pending(Pending),
}

impl Assignment {
    /// Assignment resolved from a future
    pub fn pending<F, T>(future: F) -> Self
    where
        F: Future<Output = T> + 'static,
        T: Into<Value>,
    {
        Assignment::Pending(Pending::new(future))
    }
}

impl<T: Into<Value>> From<T> for Assignment {
    fn from(value: T) -> Self {
        Assignment::Immediate(value.into())
    }
}

impl From<Pending> for Assignment {
    fn from(pending: Pending) -> Self {
        Assignment::Pending(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_text() {
        assert_eq!(Value::from(3).to_text(), "3");
        assert_eq!(Value::from(2.5).to_text(), "2.5");
        assert_eq!(Value::from(-0.0).to_text(), "0");
        assert_eq!(Value::Number(f64::NAN).to_text(), "NaN");
    }

    #[test]
    fn test_list_text_joins() {
        let list = Value::from(vec!["a", "b"]);
        assert_eq!(list.to_text(), "a,b");
        assert_eq!(Value::Null.to_text(), "");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::List(vec![]).is_truthy());
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<&str>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }
}
