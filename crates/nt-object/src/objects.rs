//! The stored object model.
//!
//! Objects carry random OIDs that survive content edits: construction
//! matches each object against the previous parse (file by path, note by
//! slug, media by path, …) and reuses the prior OID on a match. An
//! unmatched prior object simply isn't carried into the new pack; the
//! pack swap tombstones it.

use chrono::{DateTime, Utc};

use nt_oid::Oid;
use nt_utils::RepoPath;

use crate::attributes::{AttributeSet, TagSet};
use crate::builder::ParsedFile;
use crate::kind::NoteKind;
use crate::reminder::next_reminder_date;
use crate::{ObjectError, Result};

/// A Markdown source file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct File {
    pub oid: Oid,
    pub relative_path: RepoPath,
    pub slug: String,
    pub title: String,
    pub attributes: AttributeSet,
    pub tags: TagSet,
    /// Raw front matter block, preserved byte-for-byte.
    pub front_matter: String,
    /// Raw body, preserved byte-for-byte.
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note extracted from a typed heading.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Note {
    pub oid: Oid,
    pub file_oid: Oid,
    /// Nil for top-level notes.
    pub parent_note_oid: Oid,
    pub kind: NoteKind,
    pub relative_path: RepoPath,
    pub slug: String,
    pub short_title: String,
    pub long_title: String,
    pub attributes: AttributeSet,
    pub tags: TagSet,
    /// Processed body (replacements applied, sub-notes stripped).
    pub body: String,
    /// Raw section text, preserved for diffing.
    pub raw_body: String,
    /// Heading line within the source body.
    pub line: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The spaced-repetition face of a flashcard-kind note.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Flashcard {
    pub oid: Oid,
    pub note_oid: Oid,
    pub file_oid: Oid,
    pub slug: String,
    pub short_title: String,
    pub front: String,
    pub back: String,
    pub tags: TagSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Classification of a referenced media file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Document,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> MediaKind {
        match ext {
            "jpg" | "jpeg" | "png" | "gif" | "svg" | "webp" | "avif" => MediaKind::Image,
            "mp3" | "ogg" | "wav" | "flac" | "m4a" => MediaKind::Audio,
            "mp4" | "webm" | "mkv" | "avi" | "mov" => MediaKind::Video,
            _ => MediaKind::Document,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
        }
    }
}

/// A referenced media file. The record's OID is stable per relative path;
/// the underlying blobs rotate with content.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Media {
    pub oid: Oid,
    pub relative_path: RepoPath,
    pub kind: MediaKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A `go/…` shortcut link found in a note body.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GoLink {
    pub oid: Oid,
    pub note_oid: Oid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A `#reminder-<expr>` scheduled on a note.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Reminder {
    pub oid: Oid,
    pub note_oid: Oid,
    pub file_oid: Oid,
    pub expression: String,
    pub next_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Typed edge between two objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    Source,
    References,
    Inspirations,
    Embeds,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::Source => "source",
            RelationKind::References => "references",
            RelationKind::Inspirations => "inspirations",
            RelationKind::Embeds => "embeds",
        }
    }
}

/// The object graph is a flat OID map plus these edges, resolved on
/// demand (notes may embed each other cyclically).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Relation {
    pub oid: Oid,
    pub source_oid: Oid,
    pub kind: RelationKind,
    pub target_oid: Oid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Any stored object.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    File(File),
    Note(Note),
    Flashcard(Flashcard),
    Media(Media),
    GoLink(GoLink),
    Reminder(Reminder),
    Relation(Relation),
}

/// Discriminant of [`Object`], stored alongside each pack object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    File,
    Note,
    Flashcard,
    Media,
    GoLink,
    Reminder,
    Relation,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::File => "file",
            ObjectKind::Note => "note",
            ObjectKind::Flashcard => "flashcard",
            ObjectKind::Media => "media",
            ObjectKind::GoLink => "golink",
            ObjectKind::Reminder => "reminder",
            ObjectKind::Relation => "relation",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "file" => Ok(ObjectKind::File),
            "note" => Ok(ObjectKind::Note),
            "flashcard" => Ok(ObjectKind::Flashcard),
            "media" => Ok(ObjectKind::Media),
            "golink" => Ok(ObjectKind::GoLink),
            "reminder" => Ok(ObjectKind::Reminder),
            "relation" => Ok(ObjectKind::Relation),
            other => Err(ObjectError::UnknownKind(other.to_string())),
        }
    }
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::File(_) => ObjectKind::File,
            Object::Note(_) => ObjectKind::Note,
            Object::Flashcard(_) => ObjectKind::Flashcard,
            Object::Media(_) => ObjectKind::Media,
            Object::GoLink(_) => ObjectKind::GoLink,
            Object::Reminder(_) => ObjectKind::Reminder,
            Object::Relation(_) => ObjectKind::Relation,
        }
    }

    pub fn oid(&self) -> &Oid {
        match self {
            Object::File(o) => &o.oid,
            Object::Note(o) => &o.oid,
            Object::Flashcard(o) => &o.oid,
            Object::Media(o) => &o.oid,
            Object::GoLink(o) => &o.oid,
            Object::Reminder(o) => &o.oid,
            Object::Relation(o) => &o.oid,
        }
    }

    /// Human description shown by `status -v` and stored in the pack.
    pub fn description(&self) -> String {
        match self {
            Object::File(o) => format!("file \"{}\"", o.relative_path),
            Object::Note(o) => format!("note \"{}\"", o.long_title),
            Object::Flashcard(o) => format!("flashcard \"{}\"", o.short_title),
            Object::Media(o) => format!("media \"{}\"", o.relative_path),
            Object::GoLink(o) => format!("go link \"go/{}\"", o.name),
            Object::Reminder(o) => format!("reminder \"{}\"", o.expression),
            Object::Relation(o) => format!(
                "relation {} -{}-> {}",
                o.source_oid.short(),
                o.kind.as_str(),
                o.target_oid.short()
            ),
        }
    }

    /// Raw text used by `diff`: the content a user actually edited.
    pub fn raw_content(&self) -> String {
        match self {
            Object::File(o) => o.body.clone(),
            Object::Note(o) => o.raw_body.clone(),
            Object::Flashcard(o) => format!("{}\n---\n{}\n", o.front, o.back),
            other => other.to_yaml().unwrap_or_default(),
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Object::File(o) => o.created_at,
            Object::Note(o) => o.created_at,
            Object::Flashcard(o) => o.created_at,
            Object::Media(o) => o.created_at,
            Object::GoLink(o) => o.created_at,
            Object::Reminder(o) => o.created_at,
            Object::Relation(o) => o.created_at,
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Object::File(o) => o.updated_at,
            Object::Note(o) => o.updated_at,
            Object::Flashcard(o) => o.updated_at,
            Object::Media(o) => o.updated_at,
            Object::GoLink(o) => o.updated_at,
            Object::Reminder(o) => o.updated_at,
            Object::Relation(o) => o.updated_at,
        }
    }

    /// Serialize to the YAML form embedded in pack objects.
    pub fn to_yaml(&self) -> Result<String> {
        let yaml = match self {
            Object::File(o) => serde_yaml::to_string(o),
            Object::Note(o) => serde_yaml::to_string(o),
            Object::Flashcard(o) => serde_yaml::to_string(o),
            Object::Media(o) => serde_yaml::to_string(o),
            Object::GoLink(o) => serde_yaml::to_string(o),
            Object::Reminder(o) => serde_yaml::to_string(o),
            Object::Relation(o) => serde_yaml::to_string(o),
        }?;
        Ok(yaml)
    }

    /// Deserialize from the YAML form, dispatching on the stored kind.
    pub fn from_yaml(kind: ObjectKind, yaml: &str) -> Result<Object> {
        let object = match kind {
            ObjectKind::File => Object::File(serde_yaml::from_str(yaml)?),
            ObjectKind::Note => Object::Note(serde_yaml::from_str(yaml)?),
            ObjectKind::Flashcard => Object::Flashcard(serde_yaml::from_str(yaml)?),
            ObjectKind::Media => Object::Media(serde_yaml::from_str(yaml)?),
            ObjectKind::GoLink => Object::GoLink(serde_yaml::from_str(yaml)?),
            ObjectKind::Reminder => Object::Reminder(serde_yaml::from_str(yaml)?),
            ObjectKind::Relation => Object::Relation(serde_yaml::from_str(yaml)?),
        };
        Ok(object)
    }
}

/// Construct the object set for a parsed Markdown file.
///
/// `prior` is the object set decoded from the file's previous pack (empty
/// on first parse); `resolve_slug` maps note slugs to OIDs across the
/// whole repository for relation targets.
pub fn build_objects(
    parsed: &ParsedFile,
    prior: &[Object],
    now: DateTime<Utc>,
    resolve_slug: &dyn Fn(&str) -> Option<Oid>,
) -> Result<Vec<Object>> {
    let mut objects: Vec<Object> = Vec::new();

    let prior_file = prior.iter().find_map(|o| match o {
        Object::File(f) => Some(f),
        _ => None,
    });

    let file = File {
        oid: prior_file.map(|f| f.oid.clone()).unwrap_or_else(Oid::random),
        relative_path: parsed.relative_path.clone(),
        slug: parsed.slug.clone(),
        title: parsed.short_title.clone(),
        attributes: parsed.attributes.clone(),
        tags: parsed.tags.clone(),
        front_matter: parsed.front_matter.clone(),
        body: parsed.body.clone(),
        created_at: prior_file.map(|f| f.created_at).unwrap_or(now),
        updated_at: now,
    };
    let file = carry_unchanged(Object::File(file), prior, now);
    let file_oid = file.oid().clone();
    objects.push(file);

    // Notes in document order; parents precede children, so parent OIDs
    // are known when a child is built.
    let mut note_oids: Vec<Oid> = Vec::with_capacity(parsed.notes.len());
    for note in &parsed.notes {
        let prior_note = prior.iter().find_map(|o| match o {
            Object::Note(n) if n.slug == note.slug => Some(n),
            _ => None,
        });
        let oid = prior_note.map(|n| n.oid.clone()).unwrap_or_else(Oid::random);
        let parent_note_oid = note
            .parent
            .map(|idx| note_oids[idx].clone())
            .unwrap_or_else(Oid::nil);

        let built = Note {
            oid: oid.clone(),
            file_oid: file_oid.clone(),
            parent_note_oid,
            kind: note.kind,
            relative_path: parsed.relative_path.clone(),
            slug: note.slug.clone(),
            short_title: note.short_title.clone(),
            long_title: note.long_title.clone(),
            attributes: note.attributes.clone(),
            tags: note.tags.clone(),
            body: note.body.clone(),
            raw_body: note.raw_body.clone(),
            line: note.line,
            created_at: prior_note.map(|n| n.created_at).unwrap_or(now),
            updated_at: now,
        };
        note_oids.push(oid);
        objects.push(carry_unchanged(Object::Note(built), prior, now));
    }

    // Flashcards, golinks and reminders hang off their notes.
    for (idx, note) in parsed.notes.iter().enumerate() {
        let note_oid = note_oids[idx].clone();

        if note.kind == NoteKind::Flashcard {
            let (front, back) = note.flashcard_sides().unwrap_or_else(|| {
                (note.body.trim().to_string(), String::new())
            });
            let prior_card = prior.iter().find_map(|o| match o {
                Object::Flashcard(c) if c.slug == note.slug => Some(c),
                _ => None,
            });
            let card = Flashcard {
                oid: prior_card.map(|c| c.oid.clone()).unwrap_or_else(Oid::random),
                note_oid: note_oid.clone(),
                file_oid: file_oid.clone(),
                slug: note.slug.clone(),
                short_title: note.short_title.clone(),
                front,
                back,
                tags: note.tags.clone(),
                created_at: prior_card.map(|c| c.created_at).unwrap_or(now),
                updated_at: now,
            };
            objects.push(carry_unchanged(Object::Flashcard(card), prior, now));
        }

        for name in &note.golinks {
            let prior_link = prior.iter().find_map(|o| match o {
                Object::GoLink(l) if &l.name == name => Some(l),
                _ => None,
            });
            let link = GoLink {
                oid: prior_link.map(|l| l.oid.clone()).unwrap_or_else(Oid::random),
                note_oid: note_oid.clone(),
                name: name.clone(),
                created_at: prior_link.map(|l| l.created_at).unwrap_or(now),
                updated_at: now,
            };
            objects.push(carry_unchanged(Object::GoLink(link), prior, now));
        }

        for expression in &note.reminders {
            let next_date = next_reminder_date(expression, now)?;
            let prior_reminder = prior.iter().find_map(|o| match o {
                Object::Reminder(r) if &r.expression == expression && r.note_oid == note_oid => {
                    Some(r)
                }
                _ => None,
            });
            let reminder = Reminder {
                oid: prior_reminder
                    .map(|r| r.oid.clone())
                    .unwrap_or_else(Oid::random),
                note_oid: note_oid.clone(),
                file_oid: file_oid.clone(),
                expression: expression.clone(),
                next_date: prior_reminder.map(|r| r.next_date).unwrap_or(next_date),
                created_at: prior_reminder.map(|r| r.created_at).unwrap_or(now),
                updated_at: now,
            };
            objects.push(carry_unchanged(Object::Reminder(reminder), prior, now));
        }
    }

    // Relations: attribute-declared edges plus body embeds.
    for (idx, note) in parsed.notes.iter().enumerate() {
        let source = note_oids[idx].clone();
        let mut edges: Vec<(RelationKind, Oid)> = Vec::new();
        for (kind, key) in [
            (RelationKind::Source, "source"),
            (RelationKind::References, "references"),
            (RelationKind::Inspirations, "inspirations"),
        ] {
            if let Some(value) = note.attributes.get(key) {
                for target in value.as_string_list() {
                    let name = target
                        .trim()
                        .trim_start_matches("[[")
                        .trim_end_matches("]]");
                    if let Some(target_oid) = resolve_slug(name) {
                        edges.push((kind, target_oid));
                    }
                }
            }
        }
        for embed in &note.embeds {
            if let Some(target_oid) = resolve_slug(embed) {
                edges.push((RelationKind::Embeds, target_oid));
            }
        }

        for (kind, target_oid) in edges {
            let prior_rel = prior.iter().find_map(|o| match o {
                Object::Relation(r)
                    if r.source_oid == source && r.kind == kind && r.target_oid == target_oid =>
                {
                    Some(r)
                }
                _ => None,
            });
            let relation = Relation {
                oid: prior_rel.map(|r| r.oid.clone()).unwrap_or_else(Oid::random),
                source_oid: source.clone(),
                kind,
                target_oid,
                created_at: prior_rel.map(|r| r.created_at).unwrap_or(now),
                updated_at: now,
            };
            objects.push(carry_unchanged(Object::Relation(relation), prior, now));
        }
    }

    Ok(objects)
}

/// Build (or refresh) the Media object for a referenced media path.
pub fn build_media(
    relative_path: &RepoPath,
    prior: Option<&Media>,
    now: DateTime<Utc>,
) -> Media {
    Media {
        oid: prior.map(|m| m.oid.clone()).unwrap_or_else(Oid::random),
        relative_path: relative_path.clone(),
        kind: MediaKind::from_extension(&relative_path.extension()),
        created_at: prior.map(|m| m.created_at).unwrap_or(now),
        updated_at: now,
    }
}

/// If the freshly built object is identical to its prior version apart
/// from `updated_at`, keep the prior version (stable `updated_at` keeps
/// pack bytes and status counts stable across no-op re-parses).
fn carry_unchanged(mut built: Object, prior: &[Object], now: DateTime<Utc>) -> Object {
    let Some(previous) = prior.iter().find(|o| o.oid() == built.oid()) else {
        return built;
    };
    set_updated_at(&mut built, previous.updated_at());
    if &built != previous {
        set_updated_at(&mut built, now);
    }
    built
}

fn set_updated_at(object: &mut Object, at: DateTime<Utc>) {
    match object {
        Object::File(o) => o.updated_at = at,
        Object::Note(o) => o.updated_at = at,
        Object::Flashcard(o) => o.updated_at = at,
        Object::Media(o) => o.updated_at = at,
        Object::GoLink(o) => o.updated_at = at,
        Object::Reminder(o) => o.updated_at = at,
        Object::Relation(o) => o.updated_at = at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaSet;

    const GO_MD: &str = "---\ntags: [go]\n---\n# Go\n\n## Note: Syntax\n\nBraces. #syntax\n\n## Flashcard: Keywords\n\nHow many?\n\n---\n\n25.\n";

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

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2023-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn no_resolve(_: &str) -> Option<Oid> {
        None
    }

    #[test]
    fn builds_file_notes_and_flashcard() {
        let objects = build_objects(&parse(GO_MD), &[], now(), &no_resolve).unwrap();
        let kinds: Vec<ObjectKind> = objects.iter().map(Object::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ObjectKind::File,
                ObjectKind::Note,
                ObjectKind::Note,
                ObjectKind::Flashcard,
            ]
        );
    }

    #[test]
    fn oids_stable_across_edits() {
        let first = build_objects(&parse(GO_MD), &[], now(), &no_resolve).unwrap();
        let edited = GO_MD.replace("Braces.", "Curly braces.");
        let second = build_objects(&parse(&edited), &first, now(), &no_resolve).unwrap();
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.oid(), b.oid(), "OID changed for {:?}", a.kind());
        }
    }

    #[test]
    fn renamed_note_gets_fresh_oid() {
        let first = build_objects(&parse(GO_MD), &[], now(), &no_resolve).unwrap();
        let renamed = GO_MD.replace("Note: Syntax", "Note: Grammar");
        let second = build_objects(&parse(&renamed), &first, now(), &no_resolve).unwrap();
        let old_note = first.iter().find(|o| matches!(o, Object::Note(n) if n.short_title == "Syntax")).unwrap();
        let new_note = second.iter().find(|o| matches!(o, Object::Note(n) if n.short_title == "Grammar")).unwrap();
        assert_ne!(old_note.oid(), new_note.oid());
    }

    #[test]
    fn unchanged_objects_keep_updated_at() {
        let t0 = now();
        let first = build_objects(&parse(GO_MD), &[], t0, &no_resolve).unwrap();
        let t1 = t0 + chrono::Duration::hours(1);
        let second = build_objects(&parse(GO_MD), &first, t1, &no_resolve).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn edited_note_bumps_updated_at() {
        let t0 = now();
        let first = build_objects(&parse(GO_MD), &[], t0, &no_resolve).unwrap();
        let t1 = t0 + chrono::Duration::hours(1);
        let edited = GO_MD.replace("Braces.", "Curly braces.");
        let second = build_objects(&parse(&edited), &first, t1, &no_resolve).unwrap();
        let note = second
            .iter()
            .find(|o| matches!(o, Object::Note(n) if n.short_title == "Syntax"))
            .unwrap();
        assert_eq!(note.updated_at(), t1);
        // The untouched flashcard keeps its original timestamps.
        let card = second
            .iter()
            .find(|o| matches!(o, Object::Flashcard(_)))
            .unwrap();
        assert_eq!(card.updated_at(), t0);
    }

    #[test]
    fn yaml_round_trip_preserves_content() {
        let objects = build_objects(&parse(GO_MD), &[], now(), &no_resolve).unwrap();
        for object in &objects {
            let yaml = object.to_yaml().unwrap();
            let back = Object::from_yaml(object.kind(), &yaml).unwrap();
            assert_eq!(&back, object);
        }
    }

    #[test]
    fn file_round_trip_preserves_front_matter_bytes() {
        let objects = build_objects(&parse(GO_MD), &[], now(), &no_resolve).unwrap();
        let Object::File(file) = &objects[0] else {
            panic!("first object is the file");
        };
        assert_eq!(file.front_matter, "tags: [go]\n");
        let yaml = objects[0].to_yaml().unwrap();
        let Object::File(back) = Object::from_yaml(ObjectKind::File, &yaml).unwrap() else {
            panic!("kind dispatch");
        };
        assert_eq!(back.front_matter, file.front_matter);
        assert_eq!(back.body, file.body);
    }

    #[test]
    fn media_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("png"), MediaKind::Image);
        assert_eq!(MediaKind::from_extension("ogg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_extension("webm"), MediaKind::Video);
        assert_eq!(MediaKind::from_extension("pdf"), MediaKind::Document);
    }

    #[test]
    fn media_record_oid_stable_per_path() {
        let t0 = now();
        let media = build_media(&RepoPath::new("go/medias/gopher.png"), None, t0);
        let again = build_media(&media.relative_path, Some(&media), t0);
        assert_eq!(media.oid, again.oid);
        assert_eq!(media.kind, MediaKind::Image);
    }

    #[test]
    fn relations_resolve_through_lookup() {
        let target = Oid::from_bytes(b"target");
        let resolver = |slug: &str| {
            if slug == "go-syntax" {
                Some(target.clone())
            } else {
                None
            }
        };
        let content = "# T\n\n## Note: A\n\nSee ![[go-syntax]].\n";
        let objects = build_objects(&parse(content), &[], now(), &resolver).unwrap();
        let relation = objects
            .iter()
            .find_map(|o| match o {
                Object::Relation(r) => Some(r),
                _ => None,
            })
            .unwrap();
        assert_eq!(relation.kind, RelationKind::Embeds);
        assert_eq!(relation.target_oid, target);
    }
}
