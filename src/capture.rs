//! Captures collected while a case is being tested
//!
//! A [`CaptureSet`] keeps insertion order and addresses entries either by
//! name or by a positional index. Patterns produce [`CaptureFragment`]s which
//! are merged slot by slot; merging never overwrites an existing name.

use crate::value::Value;
use std::fmt;

/// Key of a single capture
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CaptureKey {
    /// Bound by name (wildcards, named regex groups, predicate objects)
    Name(String),
    /// Unnamed capture at the given position
    Index(usize),
}

impl fmt::Display for CaptureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureKey::Name(name) => write!(f, "'{}'", name),
            CaptureKey::Index(index) => write!(f, "#{}", index),
        }
    }
}

impl From<&str> for CaptureKey {
    fn from(name: &str) -> Self {
        CaptureKey::Name(name.to_string())
    }
}

impl From<String> for CaptureKey {
    fn from(name: String) -> Self {
        CaptureKey::Name(name)
    }
}

impl From<usize> for CaptureKey {
    fn from(index: usize) -> Self {
        CaptureKey::Index(index)
    }
}

/// Captures produced by one successful pattern test
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureFragment {
    named: Vec<(String, Value)>,
    positional: Vec<Value>,
}

impl CaptureFragment {
    /// A fragment that captures nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// A fragment holding one named capture
    pub fn named(name: impl Into<String>, value: Value) -> Self {
        Self {
            named: vec![(name.into(), value)],
            positional: Vec::new(),
        }
    }

    /// A fragment holding one positional capture
    pub fn positional(value: Value) -> Self {
        Self {
            named: Vec::new(),
            positional: vec![value],
        }
    }

    /// Build a fragment from a value: objects become named captures,
    /// anything else a single positional capture
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                named: map.into_iter().collect(),
                positional: Vec::new(),
            },
            other => Self::positional(other),
        }
    }

    /// Add a named capture
    pub fn with_named(mut self, name: impl Into<String>, value: Value) -> Self {
        self.named.push((name.into(), value));
        self
    }

    /// Named entries in order
    pub fn named_entries(&self) -> &[(String, Value)] {
        &self.named
    }

    /// Positional entries in order
    pub fn positional_entries(&self) -> &[Value] {
        &self.positional
    }

    /// Whether nothing was captured
    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }
}

/// Insertion-ordered captures of one case attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureSet {
    entries: Vec<(CaptureKey, Value)>,
    next_index: usize,
}

impl CaptureSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a capture
    pub fn get(&self, key: &CaptureKey) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Look up a named capture
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find_map(|(key, value)| match key {
            CaptureKey::Name(n) if n == name => Some(value),
            _ => None,
        })
    }

    /// Look up a positional capture
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.get(&CaptureKey::Index(index))
    }

    /// Whether a named capture exists
    pub fn contains_name(&self, name: &str) -> bool {
        self.get_named(name).is_some()
    }

    /// Bind a name, failing with the name if it is already bound
    pub fn insert_named(&mut self, name: String, value: Value) -> Result<(), String> {
        if self.contains_name(&name) {
            return Err(name);
        }
        self.entries.push((CaptureKey::Name(name), value));
        Ok(())
    }

    /// Append an unnamed capture, returning its index
    pub fn push_positional(&mut self, value: Value) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        self.entries.push((CaptureKey::Index(index), value));
        index
    }

    /// Merge a fragment; on a name collision the colliding name is returned
    /// and the set is left with the entries merged so far
    pub fn merge(&mut self, fragment: CaptureFragment) -> Result<(), String> {
        for value in fragment.positional {
            self.push_positional(value);
        }
        for (name, value) in fragment.named {
            self.insert_named(name, value)?;
        }
        Ok(())
    }

    /// Positional captures in index order
    pub fn positional(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().filter_map(|(key, value)| match key {
            CaptureKey::Index(_) => Some(value),
            CaptureKey::Name(_) => None,
        })
    }

    /// Named captures in insertion order
    pub fn named(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().filter_map(|(key, value)| match key {
            CaptureKey::Name(name) => Some((name.as_str(), value)),
            CaptureKey::Index(_) => None,
        })
    }

    /// All captures in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&CaptureKey, &Value)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Number of captures
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was captured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a JSON object; positional keys become their decimal index
    pub fn to_value(&self) -> Value {
        let map = self
            .entries
            .iter()
            .map(|(key, value)| {
                let key = match key {
                    CaptureKey::Name(name) => name.clone(),
                    CaptureKey::Index(index) => index.to_string(),
                };
                (key, value.clone())
            })
            .collect();
        Value::Object(map)
    }
}

/// Map formal parameter names onto capture keys.
///
/// A parameter binds to the capture of the same name if there is one,
/// otherwise to the next unused positional capture. Binding stops at the
/// first parameter that can be satisfied by neither.
pub fn bind_parameters(params: &[String], captures: &CaptureSet) -> Vec<CaptureKey> {
    let mut keys = Vec::with_capacity(params.len());
    let mut next = 0;

    for param in params {
        if captures.contains_name(param) {
            keys.push(CaptureKey::Name(param.clone()));
        } else if captures.get_index(next).is_some() {
            keys.push(CaptureKey::Index(next));
            next += 1;
        } else {
            break;
        }
    }
    keys
}
