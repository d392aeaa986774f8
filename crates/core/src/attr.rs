use core::fmt;

use indexmap::IndexMap;
use fxhash::FxBuildHasher;

/// A dynamically typed attribute value.
///
/// Rust has no runtime property inspection, so where the original toolkit
/// would stash an arbitrary language value on a node/edge/graph, this is the
/// closed set of shapes `attrgraph` supports. `Map` lets attribute values
/// nest, which covers the "compound record" case mentioned for node
/// identifiers' structural-equality companions.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<AttrValue>),
    Map(AttrMap),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => write!(f, "{map:?}"),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Returns the numeric value of an attribute, treating a missing attribute
/// (`None`) as `default`. Used by weighted-degree computation, where a
/// missing `weight` attribute defaults to `1`.
#[must_use]
pub fn numeric_or(value: Option<&AttrValue>, default: f64) -> f64 {
    match value {
        Some(AttrValue::Int(n)) => *n as f64,
        Some(AttrValue::Float(x)) => *x,
        Some(AttrValue::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => default,
    }
}

/// A mutable, insertion-ordered, string-keyed attribute record.
///
/// This is the "attribute record" of `spec.md` §3: attached to nodes,
/// edges, and the graph itself, freely mutated by the caller, with empty
/// records permitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrMap {
    entries: IndexMap<String, AttrValue, FxBuildHasher>,
}

impl AttrMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.entries.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merges `other` into `self`, with `other`'s values taking precedence on key clashes.
    /// This is the "merges `attr` into the existing record" behavior `add_node`/`add_edge`
    /// rely on.
    pub fn merge_from(&mut self, other: &AttrMap) {
        for (key, value) in other.iter() {
            self.entries.insert(key.to_owned(), value.clone());
        }
    }
}

impl FromIterator<(String, AttrValue)> for AttrMap {
    fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overrides_matching_keys_only() {
        let mut base = AttrMap::new();
        base.insert("color", "red");
        base.insert("weight", 1_i64);

        let mut overlay = AttrMap::new();
        overlay.insert("weight", 2_i64);

        base.merge_from(&overlay);
        assert_eq!(base.get("color"), Some(&AttrValue::Str("red".into())));
        assert_eq!(base.get("weight"), Some(&AttrValue::Int(2)));
    }

    #[test]
    fn numeric_or_defaults_missing_attribute() {
        let attrs = AttrMap::new();
        assert_eq!(numeric_or(attrs.get("weight"), 1.0), 1.0);
    }

    #[test]
    fn numeric_or_reads_int_and_float() {
        let mut attrs = AttrMap::new();
        attrs.insert("weight", 3_i64);
        assert_eq!(numeric_or(attrs.get("weight"), 1.0), 3.0);
        attrs.insert("weight", 2.5_f64);
        assert_eq!(numeric_or(attrs.get("weight"), 1.0), 2.5);
    }
}
