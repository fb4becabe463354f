//! Attribute and tag sets.

use std::collections::{BTreeMap, BTreeSet};

use crate::schema::SchemaSet;
use crate::value::Value;
use nt_utils::RepoPath;

/// The tag that makes the parser skip a file entirely.
pub const IGNORE_TAG: &str = "ignore";

/// A typed attribute map. Keys are kept sorted so serialized forms are
/// deterministic.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeMap<String, Value>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_mapping(mapping: serde_yaml::Mapping) -> Self {
        let mut set = AttributeSet::new();
        for (k, v) in mapping {
            if let serde_yaml::Value::String(key) = k {
                set.0.insert(key, Value::from(v));
            }
        }
        set
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// The `tags` attribute as a tag set.
    pub fn tags(&self) -> TagSet {
        match self.0.get("tags") {
            Some(value) => TagSet::from_iter(value.as_string_list()),
            None => TagSet::default(),
        }
    }

    /// Merge a parent's attributes into this set for a file at `path`.
    ///
    /// Parent keys flow down unless the schema declares `inherit = false`
    /// for the attribute at that path; the child's own values always win.
    pub fn merge_parent(&mut self, parent: &AttributeSet, path: &RepoPath, schema: &SchemaSet) {
        for (key, value) in parent.iter() {
            if self.0.contains_key(key) {
                continue;
            }
            if !schema.inheritable(path, key) {
                continue;
            }
            self.0.insert(key.clone(), value.clone());
        }
    }
}

impl FromIterator<(String, Value)> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        AttributeSet(iter.into_iter().collect())
    }
}

/// An ordered set of tags.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>) {
        self.0.insert(tag.into());
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn ignored(&self) -> bool {
        self.contains(IGNORE_TAG)
    }

    pub fn union(&self, other: &TagSet) -> TagSet {
        TagSet(self.0.union(&other.0).cloned().collect())
    }
}

impl FromIterator<String> for TagSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        TagSet(iter.into_iter().collect())
    }
}
