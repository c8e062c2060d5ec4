//! Keys, key ranges and stored values.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A structured value held by an object store.
pub type Value = serde_json::Value;

/// Primary key of a record within an object store.
///
/// Keys are totally ordered: every integer key sorts before every text key,
/// then keys compare by their natural order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Integer key, as produced by engine key generators.
    Int(i64),
    /// Text key, as produced by random identifier generators.
    Text(String),
}

impl Key {
    /// Returns the integer payload, if any.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Int(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Int(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// A contiguous range of keys used to bound a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    lower: Option<Key>,
    upper: Option<Key>,
}

impl KeyRange {
    /// A range matching exactly one key.
    #[must_use]
    pub fn only(key: Key) -> Self {
        Self {
            lower: Some(key.clone()),
            upper: Some(key),
        }
    }

    /// An inclusive range between two keys.
    #[must_use]
    pub fn bound(lower: Key, upper: Key) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Returns true if `key` falls inside the range.
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.lower.as_ref().map_or(true, |lower| key >= lower)
            && self.upper.as_ref().map_or(true, |upper| key <= upper)
    }

    /// The inclusive lower bound, if any.
    #[must_use]
    pub fn lower(&self) -> Option<&Key> {
        self.lower.as_ref()
    }
}
