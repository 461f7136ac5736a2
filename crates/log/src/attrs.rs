//! Structured key/value attributes attached to a single log call.

use std::fmt;

use serde::{Serialize, Serializer};

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl AttrValue {
    /// Render the value for a human-readable `key=value` layout.
    ///
    /// Strings that would be ambiguous in that layout (empty, or containing
    /// whitespace, control characters, `=` or `"`) are quoted and escaped.
    pub fn to_text(&self) -> String {
        match self {
            Self::Str(s) => quote_text(s),
            other => other.to_string(),
        }
    }
}

/// Quote and escape `s` if it cannot stand alone as a `key=value` token.
///
/// Escaping turns newlines into `\n`, so the result is always one line.
pub(crate) fn quote_text(s: &str) -> String {
    if needs_quoting(s) {
        format!("{:?}", s)
    } else {
        s.to_string()
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s.chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '=' || c == '"')
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(v) => write!(f, "{}", v),
            Self::UInt(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::UInt(v) => serializer.serialize_u64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Bool(v) => serializer.serialize_bool(*v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&String> for AttrValue {
    fn from(v: &String) -> Self {
        Self::Str(v.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for AttrValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for AttrValue {
            fn from(v: $t) -> Self {
                Self::Int(i64::from(v))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for AttrValue {
            fn from(v: $t) -> Self {
                Self::UInt(u64::from(v))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<usize> for AttrValue {
    fn from(v: usize) -> Self {
        Self::UInt(v as u64)
    }
}

impl From<isize> for AttrValue {
    fn from(v: isize) -> Self {
        Self::Int(v as i64)
    }
}

/// Ordered key/value pairs for one log call.
///
/// Keys are not required to be unique; insertion order is preserved so that
/// every sink renders attributes deterministically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pairs: Vec<(String, AttrValue)>,
}

impl Attributes {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair, returning the set for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a pair in place.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Iterate pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// First value recorded under `key`.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Render as space-separated `key=value` tokens on a single line.
    ///
    /// Keys are quoted under the same rule as string values.
    pub fn to_text(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}={}", quote_text(k), v.to_text()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (k, v) in iter {
            attrs.push(k, v);
        }
        attrs
    }
}

/// Build an [`Attributes`] set from `key => value` pairs.
///
/// ```
/// let attrs = jig_log::attrs!["user" => "ada", "retries" => 3, "ok" => true];
/// assert_eq!(attrs.to_text(), "user=ada retries=3 ok=true");
/// ```
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::Attributes::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Attributes::new()$(.with($key, $value))+
    };
}
