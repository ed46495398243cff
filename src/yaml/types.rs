//! In-memory YAML document tree.
//!
//! Mappings keep the order the parser produced them in; sorting happens only
//! when the tree is dumped. Keys are full values, not just strings, because
//! YAML allows `1: one` or `[a, b]: pair`.

use std::hash::{Hash, Hasher};
use std::mem;

use chrono::{DateTime, Utc};

use crate::schema::{NodeKind, Tag};

/// Ordered key/value pairs as they appeared in the source.
pub type Mapping = Vec<(YamlValue, YamlValue)>;

/// A parsed YAML node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum YamlValue {
    /// `null`, `~` or an empty scalar
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer that fits in 64 bits
    Int(i64),
    /// Floating point, including `.inf` and `.nan`
    Float(f64),
    /// String
    String(String),
    /// Point in time (`!!timestamp`), normalized to UTC
    Timestamp(DateTime<Utc>),
    /// Raw bytes (`!!binary`)
    Binary(Vec<u8>),
    /// Sequence
    Sequence(Vec<YamlValue>),
    /// Mapping in source order
    Mapping(Mapping),
    /// Ordered mapping (`!!omap`); order is part of the value
    Omap(Mapping),
    /// Ordered pairs (`!!pairs`); duplicates allowed
    Pairs(Mapping),
    /// Set (`!!set`) in source order
    Set(Vec<YamlValue>),
    /// `!!js/undefined`
    Undefined,
    /// `!!js/regexp` source text
    RegExp(String),
    /// `!!js/function` source text, never evaluated
    Function(String),
}

impl YamlValue {
    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, YamlValue::Null)
    }

    /// Returns true if this is a string value.
    pub fn is_string(&self) -> bool {
        matches!(self, YamlValue::String(_))
    }

    /// Returns true for sequence-like values (sequence, omap, pairs).
    pub fn is_sequence(&self) -> bool {
        self.kind() == NodeKind::Sequence
    }

    /// Returns true for mapping-like values (mapping, set).
    pub fn is_mapping(&self) -> bool {
        self.kind() == NodeKind::Mapping
    }

    /// Returns the boolean value if this is a Bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            YamlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value if this is an Int.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            YamlValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the float value if this is a Float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            YamlValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string if this is a String.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            YamlValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items if this is a plain Sequence.
    pub fn as_sequence(&self) -> Option<&[YamlValue]> {
        match self {
            YamlValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a plain Mapping.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            YamlValue::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a string key in a mapping.
    pub fn get(&self, key: &str) -> Option<&YamlValue> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Node kind as YAML sees it.
    pub fn kind(&self) -> NodeKind {
        match self {
            YamlValue::Sequence(_) | YamlValue::Omap(_) | YamlValue::Pairs(_) => {
                NodeKind::Sequence
            }
            YamlValue::Mapping(_) | YamlValue::Set(_) => NodeKind::Mapping,
            _ => NodeKind::Scalar,
        }
    }

    /// Tag that must be written explicitly for the value to load back as
    /// the same type. Types the resolver recognizes implicitly return None.
    pub fn explicit_tag(&self) -> Option<Tag> {
        match self {
            YamlValue::Binary(_) => Some(Tag::Binary),
            YamlValue::Omap(_) => Some(Tag::Omap),
            YamlValue::Pairs(_) => Some(Tag::Pairs),
            YamlValue::Set(_) => Some(Tag::Set),
            YamlValue::Undefined => Some(Tag::JsUndefined),
            YamlValue::RegExp(_) => Some(Tag::JsRegExp),
            YamlValue::Function(_) => Some(Tag::JsFunction),
            _ => None,
        }
    }

    /// Number of nodes in this subtree, counting this one.
    pub fn node_count(&self) -> u64 {
        match self {
            YamlValue::Sequence(items) | YamlValue::Set(items) => {
                1 + items.iter().map(YamlValue::node_count).sum::<u64>()
            }
            YamlValue::Mapping(entries) | YamlValue::Omap(entries) | YamlValue::Pairs(entries) => {
                1 + entries
                    .iter()
                    .map(|(k, v)| k.node_count() + v.node_count())
                    .sum::<u64>()
            }
            _ => 1,
        }
    }

    /// Structural equality that ignores the order of mapping and set entries.
    ///
    /// Sequence, omap and pairs order is significant. `.nan` equals `.nan`.
    pub fn eq_unordered(&self, other: &YamlValue) -> bool {
        match (self, other) {
            (YamlValue::Float(a), YamlValue::Float(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits() || a == b
            }
            (YamlValue::Sequence(a), YamlValue::Sequence(b))
            | (YamlValue::Set(a), YamlValue::Set(b))
                if a.len() != b.len() =>
            {
                false
            }
            (YamlValue::Sequence(a), YamlValue::Sequence(b)) => {
                a.iter().zip(b).all(|(x, y)| x.eq_unordered(y))
            }
            (YamlValue::Set(a), YamlValue::Set(b)) => unordered_match(a, b, |x, y| x.eq_unordered(y)),
            (YamlValue::Omap(a), YamlValue::Omap(b)) | (YamlValue::Pairs(a), YamlValue::Pairs(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka.eq_unordered(kb) && va.eq_unordered(vb))
            }
            (YamlValue::Mapping(a), YamlValue::Mapping(b)) => {
                a.len() == b.len()
                    && unordered_match(a, b, |(ka, va), (kb, vb)| {
                        ka.eq_unordered(kb) && va.eq_unordered(vb)
                    })
            }
            _ => self == other,
        }
    }
}

/// Every item of `a` pairs with a distinct item of `b`. Lengths must match.
fn unordered_match<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        let found = b
            .iter()
            .enumerate()
            .position(|(i, y)| !used[i] && eq(x, y));
        match found {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Agrees with `PartialEq`: `0.0` and `-0.0` hash alike.
impl Hash for YamlValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            YamlValue::Null | YamlValue::Undefined => {}
            YamlValue::Bool(b) => b.hash(state),
            YamlValue::Int(n) => n.hash(state),
            YamlValue::Float(f) => {
                let bits = if *f == 0.0 { 0 } else { f.to_bits() };
                bits.hash(state);
            }
            YamlValue::String(s) | YamlValue::RegExp(s) | YamlValue::Function(s) => s.hash(state),
            YamlValue::Timestamp(ts) => ts.hash(state),
            YamlValue::Binary(bytes) => bytes.hash(state),
            YamlValue::Sequence(items) | YamlValue::Set(items) => items.hash(state),
            YamlValue::Mapping(entries) | YamlValue::Omap(entries) | YamlValue::Pairs(entries) => {
                entries.hash(state)
            }
        }
    }
}

impl From<&str> for YamlValue {
    fn from(s: &str) -> Self {
        YamlValue::String(s.to_string())
    }
}

impl From<String> for YamlValue {
    fn from(s: String) -> Self {
        YamlValue::String(s)
    }
}

impl From<i64> for YamlValue {
    fn from(n: i64) -> Self {
        YamlValue::Int(n)
    }
}

impl From<bool> for YamlValue {
    fn from(b: bool) -> Self {
        YamlValue::Bool(b)
    }
}
