//! Attribute schemas.
//!
//! Configuration declares, per path prefix, the type, aliases, validation
//! pattern, required-ness, and inheritance of attributes. The most
//! specific matching schema wins; ties break on declaration order
//! (longest path prefix, then schema index).

use regex::Regex;

use crate::value::Value;
use crate::{ObjectError, Result};
use nt_utils::RepoPath;

/// Declared attribute type, driving read coercions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    StringList,
    Int,
    Float,
    Bool,
}

impl AttributeType {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(AttributeType::String),
            "string[]" => Ok(AttributeType::StringList),
            "int" | "integer" => Ok(AttributeType::Int),
            "float" | "number" => Ok(AttributeType::Float),
            "bool" | "boolean" => Ok(AttributeType::Bool),
            other => Err(ObjectError::UnknownKind(format!("attribute type {other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::StringList => "string[]",
            AttributeType::Int => "int",
            AttributeType::Float => "float",
            AttributeType::Bool => "bool",
        }
    }

    /// Coerce a raw front-matter value to the declared type.
    pub fn coerce(self, name: &str, value: &Value) -> Result<Value> {
        let mismatch = |actual: &Value| ObjectError::AttributeType {
            name: name.to_string(),
            expected: self.as_str(),
            actual: actual.to_display_string(),
        };
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(value.clone()),
            (AttributeType::String, Value::Int(n)) => Ok(Value::String(n.to_string())),
            (AttributeType::StringList, Value::List(_)) => Ok(value.clone()),
            (AttributeType::StringList, Value::String(s)) => {
                Ok(Value::List(vec![Value::String(s.clone())]))
            }
            (AttributeType::Int, Value::Int(_)) => Ok(value.clone()),
            (AttributeType::Int, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| mismatch(value)),
            (AttributeType::Float, Value::Float(_) | Value::Int(_)) => Ok(value.clone()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(value.clone()),
            (AttributeType::Bool, Value::String(s)) => match s.as_str() {
                "true" | "yes" => Ok(Value::Bool(true)),
                "false" | "no" => Ok(Value::Bool(false)),
                _ => Err(mismatch(value)),
            },
            _ => Err(mismatch(value)),
        }
    }
}

/// One attribute declaration inside a schema.
#[derive(Debug, Clone)]
pub struct AttributeDef {
    pub name: String,
    pub ty: AttributeType,
    /// Alternate front-matter keys normalized to `name`.
    pub aliases: Vec<String>,
    /// Validation pattern for string values.
    pub pattern: Option<Regex>,
    pub required: bool,
    /// Whether the attribute flows from `index.md` files to children.
    pub inherit: bool,
}

impl Default for AttributeDef {
    fn default() -> Self {
        AttributeDef {
            name: String::new(),
            ty: AttributeType::String,
            aliases: Vec::new(),
            pattern: None,
            required: false,
            inherit: true,
        }
    }
}

/// A named schema scoped to a path prefix.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    /// Path prefix scope; empty scopes the whole repository.
    pub path: RepoPath,
    pub attributes: Vec<AttributeDef>,
}

impl Schema {
    fn applies_to(&self, path: &RepoPath) -> bool {
        if self.path.is_empty() {
            return true;
        }
        let prefix = self.path.as_str();
        path.as_str() == prefix || path.as_str().starts_with(&format!("{prefix}/"))
    }

    fn find(&self, key: &str) -> Option<&AttributeDef> {
        self.attributes
            .iter()
            .find(|def| def.name == key || def.aliases.iter().any(|a| a == key))
    }
}

/// All declared schemas, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: Vec<Schema>,
}

impl SchemaSet {
    /// Duplicate attribute declarations within one schema are rejected.
    pub fn new(schemas: Vec<Schema>) -> Result<Self> {
        for schema in &schemas {
            let mut seen = std::collections::BTreeSet::new();
            for def in &schema.attributes {
                if !seen.insert(def.name.as_str()) {
                    return Err(ObjectError::AttributeType {
                        name: def.name.clone(),
                        expected: "a single declaration per schema",
                        actual: format!("duplicate in schema '{}'", schema.name),
                    });
                }
            }
        }
        Ok(SchemaSet { schemas })
    }

    /// The attribute definition governing `key` at `path`.
    ///
    /// Resolution order: longest matching path prefix wins; among schemas
    /// with equally long prefixes the earliest declared wins.
    pub fn resolve(&self, path: &RepoPath, key: &str) -> Option<&AttributeDef> {
        let mut best: Option<(usize, usize, &AttributeDef)> = None;
        for (index, schema) in self.schemas.iter().enumerate() {
            if !schema.applies_to(path) {
                continue;
            }
            let Some(def) = schema.find(key) else {
                continue;
            };
            let specificity = schema.path.as_str().len();
            let better = match best {
                None => true,
                Some((best_spec, best_index, _)) => {
                    specificity > best_spec || (specificity == best_spec && index < best_index)
                }
            };
            if better {
                best = Some((specificity, index, def));
            }
        }
        best.map(|(_, _, def)| def)
    }

    /// Whether `key` flows down from a parent `index.md` at `path`.
    pub fn inheritable(&self, path: &RepoPath, key: &str) -> bool {
        self.resolve(path, key).map(|def| def.inherit).unwrap_or(true)
    }

    /// Canonical name for `key` (resolving aliases) at `path`.
    pub fn canonical_name(&self, path: &RepoPath, key: &str) -> String {
        self.resolve(path, key)
            .map(|def| def.name.clone())
            .unwrap_or_else(|| key.to_string())
    }

    /// Coerce `value` per the declared type, if any declaration applies.
    pub fn coerce(&self, path: &RepoPath, key: &str, value: &Value) -> Result<Value> {
        match self.resolve(path, key) {
            Some(def) => def.ty.coerce(&def.name, value),
            None => Ok(value.clone()),
        }
    }

    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, ty: AttributeType) -> AttributeDef {
        AttributeDef {
            name: name.to_string(),
            ty,
            ..Default::default()
        }
    }

    #[test]
    fn longest_prefix_wins() {
        let set = SchemaSet::new(vec![
            Schema {
                name: "root".into(),
                path: RepoPath::new(""),
                attributes: vec![def("rating", AttributeType::String)],
            },
            Schema {
                name: "books".into(),
                path: RepoPath::new("references/books"),
                attributes: vec![def("rating", AttributeType::Int)],
            },
        ])
        .unwrap();

        let at_books = set
            .resolve(&RepoPath::new("references/books/sicp.md"), "rating")
            .unwrap();
        assert_eq!(at_books.ty, AttributeType::Int);

        let at_root = set.resolve(&RepoPath::new("go/go.md"), "rating").unwrap();
        assert_eq!(at_root.ty, AttributeType::String);
    }

    #[test]
    fn ties_break_on_declaration_order() {
        let set = SchemaSet::new(vec![
            Schema {
                name: "first".into(),
                path: RepoPath::new("notes"),
                attributes: vec![def("kind", AttributeType::String)],
            },
            Schema {
                name: "second".into(),
                path: RepoPath::new("notes"),
                attributes: vec![def("kind", AttributeType::Int)],
            },
        ])
        .unwrap();
        let resolved = set.resolve(&RepoPath::new("notes/a.md"), "kind").unwrap();
        assert_eq!(resolved.ty, AttributeType::String);
    }

    #[test]
    fn duplicate_attribute_in_schema_rejected() {
        let result = SchemaSet::new(vec![Schema {
            name: "dup".into(),
            path: RepoPath::new(""),
            attributes: vec![
                def("rating", AttributeType::Int),
                def("rating", AttributeType::String),
            ],
        }]);
        assert!(result.is_err());
    }

    #[test]
    fn coercions() {
        assert_eq!(
            AttributeType::StringList
                .coerce("tags", &Value::from("go"))
                .unwrap(),
            Value::List(vec![Value::from("go")])
        );
        assert_eq!(
            AttributeType::Int.coerce("year", &Value::from("2009")).unwrap(),
            Value::Int(2009)
        );
        assert!(AttributeType::Int.coerce("year", &Value::from("n/a")).is_err());
    }

    #[test]
    fn alias_resolution() {
        let set = SchemaSet::new(vec![Schema {
            name: "root".into(),
            path: RepoPath::new(""),
            attributes: vec![AttributeDef {
                name: "author".to_string(),
                aliases: vec!["by".to_string()],
                ..Default::default()
            }],
        }])
        .unwrap();
        assert_eq!(set.canonical_name(&RepoPath::new("a.md"), "by"), "author");
    }
}
