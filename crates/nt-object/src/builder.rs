//! Markdown → ParsedFile.
//!
//! Turns a parsed Markdown file into the typed note structure the object
//! constructor consumes: typed notes with parent pointers, flashcard
//! front/back splits, media references resolved to repo-relative paths,
//! and attributes merged with the parent `index.md`.

use std::sync::OnceLock;

use regex::Regex;

use nt_markdown::{
    apply_typographic_replacements, extract_media_refs, slug_from_path, slugify, MarkdownFile,
};
use nt_utils::RepoPath;

use crate::attributes::{AttributeSet, TagSet};
use crate::kind::NoteKind;
use crate::schema::SchemaSet;
use crate::value::Value;
use crate::Result;

/// Attribute-driven content expansion, run before note splitting.
///
/// The core ships only the identity generator; deck- or template-driven
/// generators plug in through this trait.
pub trait Generator {
    fn expand(&self, body: &str, attributes: &AttributeSet) -> Result<String>;
}

/// The default generator: no expansion.
pub struct IdentityGenerator;

impl Generator for IdentityGenerator {
    fn expand(&self, body: &str, _attributes: &AttributeSet) -> Result<String> {
        Ok(body.to_string())
    }
}

/// A fully parsed Markdown file, ready for object construction.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub relative_path: RepoPath,
    pub slug: String,
    pub short_title: String,
    pub long_title: String,
    pub attributes: AttributeSet,
    pub tags: TagSet,
    pub notes: Vec<ParsedNote>,
    pub medias: Vec<ParsedMedia>,
    /// Raw front matter block (without fences).
    pub front_matter: String,
    /// Raw body (after front matter), preserved for diffing.
    pub body: String,
    /// Raw file content, preserved for diffing.
    pub content: String,
}

/// One note extracted from a typed (or free) heading.
#[derive(Debug, Clone)]
pub struct ParsedNote {
    pub kind: NoteKind,
    /// Heading level the note was found at.
    pub level: usize,
    /// Index into `ParsedFile::notes` of the enclosing typed note.
    pub parent: Option<usize>,
    pub slug: String,
    pub short_title: String,
    pub long_title: String,
    pub attributes: AttributeSet,
    pub tags: TagSet,
    /// Processed body: sub-notes stripped, attribute lines removed,
    /// typographic replacements applied.
    pub body: String,
    /// Raw section text with typed sub-sections stripped, otherwise
    /// untouched.
    pub raw_body: String,
    /// Reminder expressions from `#reminder-…` tags.
    pub reminders: Vec<String>,
    /// `go/…` link names found in the body.
    pub golinks: Vec<String>,
    /// `![[…]]` embed targets.
    pub embeds: Vec<String>,
    /// 1-based heading line within the body.
    pub line: usize,
}

impl ParsedNote {
    /// Front/back split for flashcards: text before the first `---` rule
    /// is the front, text after is the back.
    pub fn flashcard_sides(&self) -> Option<(String, String)> {
        let mut front = String::new();
        let mut back = String::new();
        let mut seen_rule = false;
        for line in self.body.lines() {
            let trimmed = line.trim();
            if !seen_rule && trimmed.len() >= 3 && trimmed.chars().all(|c| c == '-') {
                seen_rule = true;
                continue;
            }
            let dst = if seen_rule { &mut back } else { &mut front };
            dst.push_str(line);
            dst.push('\n');
        }
        if seen_rule {
            Some((front.trim().to_string(), back.trim().to_string()))
        } else {
            None
        }
    }
}

/// A media file referenced from the Markdown body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMedia {
    pub relative_path: RepoPath,
    pub line: usize,
}

impl ParsedFile {
    /// The parser skips files tagged `ignore` in front matter.
    pub fn ignored(&self) -> bool {
        self.tags.ignored()
    }

    /// Build a ParsedFile from raw content.
    ///
    /// `parent` carries the (already merged) attributes of the containing
    /// directory's `index.md` — taken from its fresh parse, or from its
    /// pack when the parent wasn't re-parsed this run. `generators` run on
    /// the body before note splitting.
    pub fn build(
        relative_path: &RepoPath,
        content: &str,
        parent: Option<&AttributeSet>,
        schema: &SchemaSet,
        generators: &[&dyn Generator],
    ) -> Result<ParsedFile> {
        let md = MarkdownFile::parse(content)?;

        // Front matter → canonical, coerced attributes.
        let mut attributes = AttributeSet::new();
        for (key, value) in AttributeSet::from_yaml_mapping(md.front_matter_mapping()?).iter() {
            let name = schema.canonical_name(relative_path, key);
            let coerced = schema.coerce(relative_path, &name, value)?;
            attributes.set(name, coerced);
        }
        if let Some(parent) = parent {
            attributes.merge_parent(parent, relative_path, schema);
        }
        let tags = attributes.tags();

        // Generators may rewrite the body before anything is split.
        let mut body = md.body.clone();
        for generator in generators {
            body = generator.expand(&body, &attributes)?;
        }
        // Re-scan only when a generator actually rewrote something; a
        // body-only parse would mistake a leading `---` rule for front
        // matter.
        let scan = if body == md.body {
            md.clone()
        } else {
            MarkdownFile::parse(&body)?
        };

        let slug = attributes
            .get("slug")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| slug_from_path(relative_path));

        let has_typed = scan
            .headings
            .iter()
            .any(|h| NoteKind::from_heading(&h.title).is_some());
        let top_level = scan.headings.iter().map(|h| h.level).min().unwrap_or(1);

        let short_title = file_short_title(&scan, &attributes, relative_path, has_typed, top_level);
        let long_title = short_title.clone();

        let notes = extract_notes(
            &scan,
            relative_path,
            &slug,
            &short_title,
            &attributes,
            &tags,
            schema,
            has_typed,
            top_level,
        )?;

        let medias = extract_medias(relative_path, &body)?;

        Ok(ParsedFile {
            relative_path: relative_path.clone(),
            slug,
            short_title,
            long_title,
            attributes,
            tags,
            notes,
            medias,
            front_matter: md.front_matter,
            body: md.body,
            content: content.to_string(),
        })
    }
}

/// The file's short title: front matter `title`, else the first untyped
/// top heading when typed notes exist, else the first heading, else the
/// file stem.
fn file_short_title(
    scan: &MarkdownFile,
    attributes: &AttributeSet,
    relative_path: &RepoPath,
    has_typed: bool,
    top_level: usize,
) -> String {
    if let Some(title) = attributes.get("title").and_then(Value::as_str) {
        return title.to_string();
    }
    if has_typed {
        if let Some(free) = scan
            .headings
            .iter()
            .find(|h| h.level == top_level && NoteKind::from_heading(&h.title).is_none())
        {
            return free.title.clone();
        }
    } else if let Some(first) = scan.headings.first() {
        return first.title.clone();
    }
    relative_path.file_stem().to_string()
}

#[allow(clippy::too_many_arguments)]
fn extract_notes(
    scan: &MarkdownFile,
    relative_path: &RepoPath,
    file_slug: &str,
    file_title: &str,
    file_attributes: &AttributeSet,
    file_tags: &TagSet,
    schema: &SchemaSet,
    has_typed: bool,
    top_level: usize,
) -> Result<Vec<ParsedNote>> {
    let mut notes: Vec<ParsedNote> = Vec::new();
    // (heading level, note index) for enclosing typed notes.
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for (i, heading) in scan.headings.iter().enumerate() {
        while let Some(&(level, _)) = stack.last() {
            if heading.level <= level {
                stack.pop();
            } else {
                break;
            }
        }

        let typed = NoteKind::from_heading(&heading.title);
        let (kind, short_title) = match typed {
            Some(pair) => pair,
            None => {
                if has_typed || heading.level != top_level {
                    // Free top headings are the file title; untyped
                    // sub-headings stay inside their note's body.
                    continue;
                }
                (NoteKind::Free, heading.title.clone())
            }
        };

        let parent = stack.last().map(|&(_, idx)| idx);

        let raw_section = scan.section_text(i);
        let raw_body = strip_sub_notes(&raw_section);
        let (body_no_attrs, note_attrs) = extract_note_attributes(&raw_body);

        let mut attributes = AttributeSet::new();
        for (key, value) in note_attrs.iter() {
            let name = schema.canonical_name(relative_path, key);
            attributes.set(name.clone(), schema.coerce(relative_path, &name, value)?);
        }

        let (hashtags, reminders) = extract_tags(&body_no_attrs);
        let mut tags = file_tags.union(&hashtags);
        for tag in attributes.tags().iter() {
            tags.insert(tag.clone());
        }

        let golinks = extract_golinks(&body_no_attrs);
        let embeds = extract_embeds(&body_no_attrs);

        let body = apply_typographic_replacements(&body_no_attrs)
            .trim()
            .to_string();

        let slug = attributes
            .get("slug")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{file_slug}-{}", slugify(&short_title)));

        let ancestor_titles: Vec<String> = match parent {
            Some(parent_idx) => {
                let mut titles: Vec<String> = notes[parent_idx]
                    .long_title
                    .split(" / ")
                    .map(str::to_string)
                    .collect();
                titles.push(short_title.clone());
                titles
            }
            None => vec![file_title.to_string(), short_title.clone()],
        };
        let long_title = join_long_title(&ancestor_titles);

        // Note-level attributes inherit the file's (child wins).
        let mut merged = attributes;
        merged.merge_parent(file_attributes, relative_path, schema);

        stack.push((heading.level, notes.len()));
        notes.push(ParsedNote {
            kind,
            level: heading.level,
            parent,
            slug,
            short_title,
            long_title,
            attributes: merged,
            tags,
            body,
            raw_body,
            reminders,
            golinks,
            embeds,
            line: heading.line,
        });
    }

    Ok(notes)
}

fn extract_medias(relative_path: &RepoPath, body: &str) -> Result<Vec<ParsedMedia>> {
    let mut medias = Vec::new();
    for media_ref in extract_media_refs(body) {
        let resolved = relative_path.resolve_reference(&media_ref.target)?;
        let media = ParsedMedia {
            relative_path: resolved,
            line: media_ref.line,
        };
        if !medias.contains(&media) {
            medias.push(media);
        }
    }
    Ok(medias)
}

/// Remove typed sub-note sections from a note's body, keeping untyped
/// sub-headings in place.
pub fn strip_sub_notes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut skip_below: Option<usize> = None;
    let mut fence: Option<&str> = None;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if fence.is_none() && (trimmed.starts_with("```") || trimmed.starts_with("~~~")) {
            if skip_below.is_none() {
                out.push_str(line);
                out.push('\n');
            }
            fence = Some(if trimmed.starts_with("```") { "```" } else { "~~~" });
            continue;
        }
        if let Some(open) = fence {
            if skip_below.is_none() {
                out.push_str(line);
                out.push('\n');
            }
            if trimmed.starts_with(open) {
                fence = None;
            }
            continue;
        }

        let hashes = line.len() - line.trim_start_matches('#').len();
        let is_heading = hashes >= 1 && hashes <= 6 && line[hashes..].starts_with(' ');
        if is_heading {
            let title = line[hashes..].trim();
            if let Some(limit) = skip_below {
                if hashes > limit {
                    continue;
                }
                skip_below = None;
            }
            if NoteKind::from_heading(title).is_some() {
                skip_below = Some(hashes);
                continue;
            }
        }
        if skip_below.is_none() {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

fn note_attr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^`@([A-Za-z0-9_-]+):\s*(.+?)`\s*$").expect("valid regex"))
}

/// Split `` `@key: value` `` lines out of a note body.
fn extract_note_attributes(body: &str) -> (String, AttributeSet) {
    let mut attrs = AttributeSet::new();
    let mut kept = String::with_capacity(body.len());
    for line in body.lines() {
        if let Some(caps) = note_attr_re().captures(line.trim()) {
            let raw = caps[2].trim();
            let value = serde_yaml::from_str::<serde_yaml::Value>(raw)
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string()));
            attrs.set(caps[1].to_string(), value);
        } else {
            kept.push_str(line);
            kept.push('\n');
        }
    }
    (kept, attrs)
}

fn hashtag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)#([a-zA-Z][a-zA-Z0-9_-]*)").expect("valid regex"))
}

/// Collect `#tag` hashtags, splitting `#reminder-…` expressions out.
fn extract_tags(body: &str) -> (TagSet, Vec<String>) {
    let mut tags = TagSet::new();
    let mut reminders = Vec::new();
    let mut fence: Option<&str> = None;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if fence.is_none() && (trimmed.starts_with("```") || trimmed.starts_with("~~~")) {
            fence = Some(if trimmed.starts_with("```") { "```" } else { "~~~" });
            continue;
        }
        if let Some(open) = fence {
            if trimmed.starts_with(open) {
                fence = None;
            }
            continue;
        }
        for caps in hashtag_re().captures_iter(line) {
            let tag = caps[1].to_string();
            match tag.strip_prefix("reminder-") {
                Some(expr) => reminders.push(expr.to_string()),
                None => tags.insert(tag),
            }
        }
    }
    (tags, reminders)
}

fn golink_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bgo/([a-zA-Z0-9_/-]+)").expect("valid regex"))
}

fn extract_golinks(body: &str) -> Vec<String> {
    let mut out = Vec::new();
    for caps in golink_re().captures_iter(body) {
        let name = caps[1].to_string();
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

fn embed_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"!\[\[([^\]]+)\]\]").expect("valid regex"))
}

fn extract_embeds(body: &str) -> Vec<String> {
    embed_re()
        .captures_iter(body)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Join ancestor short titles with ` / `, dropping an ancestor when the
/// next title equals it or extends it.
pub fn join_long_title(titles: &[String]) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for title in titles {
        let title = title.trim();
        if title.is_empty() {
            continue;
        }
        if let Some(last) = kept.last() {
            if title == *last || title.starts_with(*last) {
                kept.pop();
            }
        }
        kept.push(title);
    }
    kept.join(" / ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaSet;

    const GO_MD: &str = "---\ntags: [go]\n---\n# Go\n\n![Gopher](medias/gopher.png)\n\n## Note: Syntax\n\nGo uses braces. #syntax\n\n`@source: https://go.dev`\n\n### Flashcard: Keywords\n\nHow many keywords?\n\n---\n\n25 keywords.\n\n## Quote: Rob Pike\n\nSimplicity is complicated.\n";

    fn build(content: &str) -> ParsedFile {
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
    fn file_title_and_slug() {
        let parsed = build(GO_MD);
        assert_eq!(parsed.short_title, "Go");
        assert_eq!(parsed.slug, "go");
    }

    #[test]
    fn typed_notes_extracted_with_parents() {
        let parsed = build(GO_MD);
        let kinds: Vec<NoteKind> = parsed.notes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NoteKind::Note, NoteKind::Flashcard, NoteKind::Quote]
        );
        assert_eq!(parsed.notes[1].parent, Some(0));
        assert_eq!(parsed.notes[0].parent, None);
    }

    #[test]
    fn sub_note_sections_are_stripped_from_parent() {
        let parsed = build(GO_MD);
        let syntax = &parsed.notes[0];
        assert!(syntax.body.contains("Go uses braces."));
        assert!(!syntax.body.contains("keywords"));
    }

    #[test]
    fn flashcard_front_back() {
        let parsed = build(GO_MD);
        let (front, back) = parsed.notes[1].flashcard_sides().unwrap();
        assert_eq!(front, "How many keywords?");
        assert_eq!(back, "25 keywords.");
        assert!(parsed.notes[0].flashcard_sides().is_none());
    }

    #[test]
    fn note_attributes_and_tags() {
        let parsed = build(GO_MD);
        let syntax = &parsed.notes[0];
        assert_eq!(
            syntax.attributes.get("source"),
            Some(&Value::from("https://go.dev"))
        );
        assert!(syntax.tags.contains("syntax"));
        assert!(syntax.tags.contains("go")); // inherited from the file
        assert!(!syntax.body.contains("@source"));
    }

    #[test]
    fn media_resolved_to_repo_relative() {
        let parsed = build(GO_MD);
        assert_eq!(parsed.medias.len(), 1);
        assert_eq!(parsed.medias[0].relative_path.as_str(), "go/medias/gopher.png");
    }

    #[test]
    fn long_titles_dedup() {
        let parsed = build(GO_MD);
        assert_eq!(parsed.notes[0].long_title, "Go / Syntax");
        assert_eq!(parsed.notes[1].long_title, "Go / Syntax / Keywords");
        assert_eq!(
            join_long_title(&["Go".into(), "Go Syntax".into()]),
            "Go Syntax"
        );
    }

    #[test]
    fn free_headings_become_notes_without_typed() {
        let parsed = build("# Only\n\nSome text.\n\n# Another\n\nMore.\n");
        assert_eq!(parsed.notes.len(), 2);
        assert_eq!(parsed.notes[0].kind, NoteKind::Free);
    }

    #[test]
    fn free_heading_is_title_when_typed_present() {
        let parsed = build(GO_MD);
        assert!(parsed.notes.iter().all(|n| n.short_title != "Go"));
    }

    #[test]
    fn ignore_tag_detected() {
        let parsed = build("---\ntags: [ignore]\n---\n# X\n");
        assert!(parsed.ignored());
    }

    #[test]
    fn reminders_split_from_tags() {
        let parsed = build("# T\n\n## Todo: Ship\n\nDo it #reminder-2025-06 #urgent\n");
        let todo = &parsed.notes[0];
        assert_eq!(todo.reminders, vec!["2025-06"]);
        assert!(todo.tags.contains("urgent"));
        assert!(!todo.tags.iter().any(|t| t.starts_with("reminder")));
    }

    #[test]
    fn golinks_and_embeds() {
        let parsed =
            build("# T\n\n## Note: Links\n\nSee go/r/spec and embed ![[go-syntax]].\n");
        let note = &parsed.notes[0];
        assert_eq!(note.golinks, vec!["r/spec"]);
        assert_eq!(note.embeds, vec!["go-syntax"]);
    }

    #[test]
    fn parent_attributes_inherited() {
        let schema = SchemaSet::default();
        let parent = ParsedFile::build(
            &RepoPath::new("go/index.md"),
            "---\nauthor: Julien\n---\n# Go Section\n",
            None,
            &schema,
            &[],
        )
        .unwrap();
        let child = ParsedFile::build(
            &RepoPath::new("go/go.md"),
            GO_MD,
            Some(&parent.attributes),
            &schema,
            &[],
        )
        .unwrap();
        assert_eq!(child.attributes.get("author"), Some(&Value::from("Julien")));
    }

    #[test]
    fn typographic_replacements_in_processed_body_only() {
        let parsed = build("# T\n\n## Note: Arrows\n\na -> b\n");
        assert!(parsed.notes[0].body.contains("a → b"));
        assert!(parsed.notes[0].raw_body.contains("a -> b"));
        assert!(parsed.body.contains("a -> b"));
    }
}
