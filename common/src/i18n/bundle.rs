//! Locale bundle tree and key-path lookup.
//!
//! A bundle is a mapping at its root whose values are strings, string lists,
//! nested mappings, or opaque values that exist but are neither. Lookups split
//! a key on `.` and descend one mapping per segment; any absent segment, or a
//! non-mapping node with segments left over, is a miss. Whether a present
//! terminal is usable depends on the accessor: [`Bundle::text`] wants a
//! string, [`Bundle::list`] wants a string list.
//!
//! Arrays that contain anything other than strings are stored as mappings
//! keyed by decimal index, so `features.items.0.title` addresses the `title`
//! of the first item. Arrays made only of strings stay [`Node::List`] and are
//! not indexable: `points.0` misses, and the list is read whole through
//! [`Bundle::list`]. Bundles address single strings by name, and a list is
//! only ever rendered as a unit.

use std::collections::BTreeMap;

use serde_json::Value;

use super::LoadError;

/// Child nodes of a mapping, ordered by key.
pub type Mapping = BTreeMap<String, Node>;

/// A node within a locale bundle.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A translated string.
    Text(String),
    /// An ordered list of translated strings.
    List(Vec<String>),
    /// A nested mapping.
    Map(Mapping),
    /// A present value that is neither a string, a string list, nor a mapping.
    Opaque(Value),
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, child)| (key, Self::from(child)))
                    .collect(),
            ),
            Value::Array(items) if items.iter().all(Value::is_string) => Self::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(text) => Some(text),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::Array(items) => Self::Map(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, child)| (index.to_string(), Self::from(child)))
                    .collect(),
            ),
            other => Self::Opaque(other),
        }
    }
}

/// Immutable translation tree for one language.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bundle {
    root: Mapping,
}

impl Bundle {
    /// An empty bundle; every lookup against it misses.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a bundle from JSON text.
    ///
    /// `resource` names the document in error messages.
    ///
    /// ```
    /// use common::i18n::Bundle;
    ///
    /// let bundle = Bundle::from_json("en", r#"{ "a": { "b": "hello" } }"#)?;
    /// assert_eq!(bundle.text("a.b"), Some("hello"));
    /// # Ok::<(), common::i18n::LoadError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Malformed`] when the text is not JSON and
    /// [`LoadError::NotAMapping`] when the root is not an object.
    pub fn from_json(resource: &str, text: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text).map_err(|source| LoadError::Malformed {
            resource: resource.to_owned(),
            source,
        })?;
        Self::from_value(resource, value)
    }

    /// Build a bundle from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NotAMapping`] when `value` is not an object.
    pub fn from_value(resource: &str, value: Value) -> Result<Self, LoadError> {
        match value {
            Value::Object(entries) => Ok(Self {
                root: entries
                    .into_iter()
                    .map(|(key, child)| (key, Node::from(child)))
                    .collect(),
            }),
            _ => Err(LoadError::NotAMapping {
                resource: resource.to_owned(),
            }),
        }
    }

    /// Whether the bundle has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Walk `key` and return the node it addresses, if every segment exists.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<&Node> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let start = self.root.get(first)?;

        segments.try_fold(start, |node, segment| match node {
            Node::Map(children) => children.get(segment),
            Node::Text(_) | Node::List(_) | Node::Opaque(_) => None,
        })
    }

    /// The string at `key`, or `None` when the path misses or is not a string.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.resolve(key)? {
            Node::Text(text) => Some(text.as_str()),
            Node::List(_) | Node::Map(_) | Node::Opaque(_) => None,
        }
    }

    /// The string list at `key`, or `None` when the path misses or is not a
    /// string list.
    #[must_use]
    pub fn list(&self, key: &str) -> Option<&[String]> {
        match self.resolve(key)? {
            Node::List(items) => Some(items.as_slice()),
            Node::Text(_) | Node::Map(_) | Node::Opaque(_) => None,
        }
    }

    /// Translate `key`, returning `fallback` or the key itself on a miss.
    #[must_use]
    pub fn translate(&self, key: &str, fallback: Option<&str>) -> String {
        self.text(key).or(fallback).unwrap_or(key).to_owned()
    }

    /// Translate `key` to a string list, returning an empty list on a miss.
    #[must_use]
    pub fn translate_list(&self, key: &str) -> Vec<String> {
        self.list(key).map(<[String]>::to_vec).unwrap_or_default()
    }

    /// Every path that ends at a non-mapping node, in key order.
    #[must_use]
    pub fn key_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_paths(&self.root, None, &mut paths);
        paths
    }
}

fn collect_paths(mapping: &Mapping, prefix: Option<&str>, paths: &mut Vec<String>) {
    for (key, node) in mapping {
        let path = prefix.map_or_else(|| key.clone(), |parent| format!("{parent}.{key}"));
        match node {
            Node::Map(children) => collect_paths(children, Some(&path), paths),
            Node::Text(_) | Node::List(_) | Node::Opaque(_) => paths.push(path),
        }
    }
}

/// Paths present in `reference` that `candidate` cannot resolve.
///
/// Used to report translations that lag behind the primary bundle.
#[must_use]
pub fn missing_paths(reference: &Bundle, candidate: &Bundle) -> Vec<String> {
    reference
        .key_paths()
        .into_iter()
        .filter(|path| candidate.resolve(path).is_none())
        .collect()
}
