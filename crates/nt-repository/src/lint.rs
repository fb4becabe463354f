//! The lint rule registry.
//!
//! Rules run over parsed files. `nt add` aborts when any rule of severity
//! `error` fires; `nt lint` reports everything and still exits non-zero
//! on errors.

use std::path::Path;

use regex::Regex;

use nt_config::{LintRule, Severity};
use nt_object::{NoteKind, ParsedFile, Value};
use nt_utils::RepoPath;

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: String,
    pub severity: Severity,
    pub path: RepoPath,
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.path, self.line, level, self.rule, self.message
        )
    }
}

/// Names of the rules this build implements. Configuration referencing
/// any other name fails at load time.
pub const KNOWN_RULES: &[&str] = &[
    "no-free-note",
    "min-lines-between-notes",
    "note-title-match",
    "no-dangling-media",
    "no-dead-wikilink",
    "require-quote-attribute",
];

/// Run one configured rule against a parsed file.
///
/// `root` is the working-tree root (for media existence checks) and
/// `resolve_slug` answers whether a wikilink target exists.
pub fn check(
    rule: &LintRule,
    parsed: &ParsedFile,
    root: &Path,
    resolve_slug: &dyn Fn(&str) -> bool,
) -> Vec<Violation> {
    let violation = |line: usize, message: String| Violation {
        rule: rule.name.clone(),
        severity: rule.severity,
        path: parsed.relative_path.clone(),
        line,
        message,
    };

    match rule.name.as_str() {
        "no-free-note" => parsed
            .notes
            .iter()
            .filter(|n| n.kind == NoteKind::Free)
            .map(|n| violation(n.line, format!("untyped note \"{}\"", n.short_title)))
            .collect(),

        "min-lines-between-notes" => {
            let min: usize = rule
                .args
                .first()
                .and_then(|a| a.parse().ok())
                .unwrap_or(1);
            let lines: Vec<&str> = parsed.body.lines().collect();
            parsed
                .notes
                .iter()
                .filter(|n| n.line > 1)
                .filter(|n| {
                    let end = (n.line - 1).min(lines.len());
                    let before = &lines[end.saturating_sub(min)..end];
                    before.len() < min || before.iter().any(|l| !l.trim().is_empty())
                })
                .map(|n| {
                    violation(
                        n.line,
                        format!("expected {min} blank line(s) before \"{}\"", n.short_title),
                    )
                })
                .collect()
        }

        "note-title-match" => {
            let Some(pattern) = rule.args.first() else {
                return Vec::new();
            };
            let Ok(re) = Regex::new(pattern) else {
                return Vec::new(); // validated at config load
            };
            parsed
                .notes
                .iter()
                .filter(|n| !re.is_match(&n.short_title))
                .map(|n| {
                    violation(
                        n.line,
                        format!("title \"{}\" does not match {pattern}", n.short_title),
                    )
                })
                .collect()
        }

        "no-dangling-media" => parsed
            .medias
            .iter()
            .filter(|m| !m.relative_path.to_abs(root).is_file())
            .map(|m| violation(m.line, format!("missing media \"{}\"", m.relative_path)))
            .collect(),

        "no-dead-wikilink" => parsed
            .notes
            .iter()
            .flat_map(|n| n.embeds.iter().map(move |e| (n.line, e)))
            .filter(|(_, target)| !resolve_slug(target))
            .map(|(line, target)| violation(line, format!("dead wikilink \"{target}\"")))
            .collect(),

        "require-quote-attribute" => {
            let attribute = rule.args.first().map(String::as_str).unwrap_or("author");
            parsed
                .notes
                .iter()
                .filter(|n| n.kind == NoteKind::Quote)
                .filter(|n| {
                    !matches!(
                        n.attributes.get(attribute),
                        Some(v) if !matches!(v, Value::Null)
                    )
                })
                .map(|n| {
                    violation(
                        n.line,
                        format!("quote \"{}\" is missing @{attribute}", n.short_title),
                    )
                })
                .collect()
        }

        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nt_object::SchemaSet;

    fn rule(name: &str, severity: Severity, args: &[&str]) -> LintRule {
        LintRule {
            name: name.to_string(),
            severity,
            args: args.iter().map(|a| a.to_string()).collect(),
            includes: Vec::new(),
        }
    }

    fn parse(content: &str) -> ParsedFile {
        ParsedFile::build(
            &RepoPath::new("go/go.md"),
            content,
            None,
            &SchemaSet::default(),
            &[],
        )
        .unwrap()
    }

    #[test]
    fn no_free_note_flags_untyped_headings() {
        let parsed = parse("# Loose\n\nText.\n");
        let violations = check(
            &rule("no-free-note", Severity::Error, &[]),
            &parsed,
            Path::new("/nonexistent"),
            &|_| true,
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("Loose"));
    }

    #[test]
    fn note_title_match_applies_regex() {
        let parsed = parse("# T\n\n## Note: lowercase title\n\nx\n");
        let violations = check(
            &rule("note-title-match", Severity::Warning, &["^[A-Z]"]),
            &parsed,
            Path::new("/nonexistent"),
            &|_| true,
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Warning);
    }

    #[test]
    fn no_dangling_media_checks_disk() {
        let dir = tempfile::tempdir().unwrap();
        let parsed = parse("# T\n\n## Note: N\n\n![x](medias/gone.png)\n");
        let violations = check(
            &rule("no-dangling-media", Severity::Error, &[]),
            &parsed,
            dir.path(),
            &|_| true,
        );
        assert_eq!(violations.len(), 1);

        std::fs::create_dir_all(dir.path().join("go/medias")).unwrap();
        std::fs::write(dir.path().join("go/medias/gone.png"), b"png").unwrap();
        let violations = check(
            &rule("no-dangling-media", Severity::Error, &[]),
            &parsed,
            dir.path(),
            &|_| true,
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn no_dead_wikilink_uses_resolver() {
        let parsed = parse("# T\n\n## Note: N\n\n![[missing-slug]]\n");
        let violations = check(
            &rule("no-dead-wikilink", Severity::Warning, &[]),
            &parsed,
            Path::new("/nonexistent"),
            &|slug| slug != "missing-slug",
        );
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn require_quote_attribute() {
        let with = parse("# T\n\n## Quote: Wisdom\n\n`@author: Rob Pike`\n\nLess is more.\n");
        let without = parse("# T\n\n## Quote: Wisdom\n\nLess is more.\n");
        let r = rule("require-quote-attribute", Severity::Error, &[]);
        assert!(check(&r, &with, Path::new("/"), &|_| true).is_empty());
        assert_eq!(check(&r, &without, Path::new("/"), &|_| true).len(), 1);
    }
}
