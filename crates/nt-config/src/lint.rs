//! `.nt/lint` (YAML): lint rules and attribute schemas.

use std::path::Path;

use regex::Regex;

use nt_object::{AttributeDef, AttributeType, Schema, SchemaSet};
use nt_utils::{PathSpecs, RepoPath};

use crate::{ConfigError, Result};

/// Rule severity: `error` blocks `nt add`, `warning` only reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One configured rule instance.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintRule {
    pub name: String,
    pub severity: Severity,
    #[serde(default)]
    pub args: Vec<String>,
    /// Pathspecs restricting where the rule applies; empty means everywhere.
    #[serde(default)]
    pub includes: Vec<String>,
}

impl LintRule {
    /// Compiled include pathspecs (`.` when none are declared).
    pub fn include_specs(&self) -> Result<PathSpecs> {
        if self.includes.is_empty() {
            return Ok(PathSpecs::any());
        }
        PathSpecs::parse_owned(&self.includes).map_err(|e| ConfigError::Invalid {
            file: ".nt/lint".to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
struct LintFile {
    rules: Vec<LintRule>,
    schemas: Vec<SchemaDecl>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDecl {
    name: String,
    #[serde(default)]
    path: String,
    #[serde(default)]
    attributes: Vec<AttributeDecl>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct AttributeDecl {
    name: String,
    #[serde(rename = "type", default)]
    ty: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default = "default_inherit")]
    inherit: bool,
}

fn default_inherit() -> bool {
    true
}

/// The loaded lint configuration.
#[derive(Debug, Clone, Default)]
pub struct LintConfig {
    pub rules: Vec<LintRule>,
    pub schemas: SchemaSet,
}

impl LintConfig {
    /// Read `.nt/lint`. A missing file yields an empty configuration.
    ///
    /// `known_rules` is the registry of implemented rule names; declaring
    /// any other name is fatal.
    pub fn load(nt_dir: &Path, known_rules: &[&str]) -> Result<LintConfig> {
        let path = nt_dir.join("lint");
        if !path.is_file() {
            return Ok(LintConfig::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content, known_rules)
    }

    pub fn parse(content: &str, known_rules: &[&str]) -> Result<LintConfig> {
        let file: LintFile = serde_yaml::from_str(content).map_err(|e| ConfigError::Invalid {
            file: ".nt/lint".to_string(),
            reason: e.to_string(),
        })?;

        for rule in &file.rules {
            if !known_rules.contains(&rule.name.as_str()) {
                return Err(ConfigError::UnknownRule(rule.name.clone()));
            }
            rule.include_specs()?;
        }

        let mut schemas = Vec::with_capacity(file.schemas.len());
        for decl in file.schemas {
            let mut attributes = Vec::with_capacity(decl.attributes.len());
            for attr in decl.attributes {
                if attributes.iter().any(|a: &AttributeDef| a.name == attr.name) {
                    return Err(ConfigError::DuplicateAttribute {
                        schema: decl.name.clone(),
                        attribute: attr.name,
                    });
                }
                let ty = match attr.ty.as_deref() {
                    Some(raw) => {
                        AttributeType::parse(raw).map_err(|e| ConfigError::Invalid {
                            file: ".nt/lint".to_string(),
                            reason: e.to_string(),
                        })?
                    }
                    None => AttributeType::String,
                };
                let pattern = match attr.pattern {
                    Some(raw) => Some(Regex::new(&raw).map_err(|e| {
                        ConfigError::InvalidPattern {
                            attribute: attr.name.clone(),
                            reason: e.to_string(),
                        }
                    })?),
                    None => None,
                };
                attributes.push(AttributeDef {
                    name: attr.name,
                    ty,
                    aliases: attr.aliases,
                    pattern,
                    required: attr.required,
                    inherit: attr.inherit,
                });
            }
            schemas.push(Schema {
                name: decl.name,
                path: RepoPath::new(decl.path),
                attributes,
            });
        }

        let schemas = SchemaSet::new(schemas).map_err(|e| ConfigError::Invalid {
            file: ".nt/lint".to_string(),
            reason: e.to_string(),
        })?;

        Ok(LintConfig {
            rules: file.rules,
            schemas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: &[&str] = &["no-free-note", "note-title-match"];

    #[test]
    fn parses_rules_and_schemas() {
        let yaml = r#"
rules:
  - name: no-free-note
    severity: error
    includes: ["."]
  - name: note-title-match
    severity: warning
    args: ["^[A-Z]"]
schemas:
  - name: books
    path: references/books
    attributes:
      - name: rating
        type: int
        required: true
        inherit: false
      - name: author
        aliases: [by]
"#;
        let lint = LintConfig::parse(yaml, KNOWN).unwrap();
        assert_eq!(lint.rules.len(), 2);
        assert_eq!(lint.rules[0].severity, Severity::Error);
        assert_eq!(lint.rules[1].args, vec!["^[A-Z]"]);

        let def = lint
            .schemas
            .resolve(&RepoPath::new("references/books/sicp.md"), "rating")
            .unwrap();
        assert_eq!(def.ty, AttributeType::Int);
        assert!(!def.inherit);
        assert_eq!(
            lint.schemas
                .canonical_name(&RepoPath::new("references/books/sicp.md"), "by"),
            "author"
        );
    }

    #[test]
    fn unknown_rule_is_fatal() {
        let yaml = "rules:\n  - name: no-such-rule\n    severity: error\n";
        let err = LintConfig::parse(yaml, KNOWN).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRule(name) if name == "no-such-rule"));
    }

    #[test]
    fn duplicate_attribute_is_fatal() {
        let yaml = r#"
schemas:
  - name: dup
    attributes:
      - name: rating
      - name: rating
"#;
        assert!(matches!(
            LintConfig::parse(yaml, KNOWN),
            Err(ConfigError::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn invalid_regex_is_fatal() {
        let yaml = r#"
schemas:
  - name: bad
    attributes:
      - name: isbn
        pattern: "["
"#;
        assert!(matches!(
            LintConfig::parse(yaml, KNOWN),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn missing_lint_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let lint = LintConfig::load(dir.path(), KNOWN).unwrap();
        assert!(lint.rules.is_empty());
    }
}
