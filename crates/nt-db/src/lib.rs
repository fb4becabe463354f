//! Relational projection of the object store.
//!
//! A write-through SQLite mirror of pack-file contents, used for queries
//! (`nt search`, deck definitions, stats). The projection is derivable:
//! rebuilding it from the packs referenced by the index yields an
//! equivalent database (timestamps of the `last_checked_at` kind aside).

mod error;
mod query;

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};

use nt_object::{Object, Value};
use nt_oid::Oid;
use nt_pack::PackFile;

pub use error::DbError;
pub use query::Query;

pub type Result<T> = std::result::Result<T, DbError>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS file (
    oid TEXT PRIMARY KEY,
    relative_path TEXT NOT NULL,
    slug TEXT NOT NULL,
    title TEXT NOT NULL,
    front_matter TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_checked_at TEXT
);
CREATE TABLE IF NOT EXISTS note (
    oid TEXT PRIMARY KEY,
    file_oid TEXT NOT NULL,
    parent_note_oid TEXT NOT NULL,
    kind TEXT NOT NULL,
    relative_path TEXT NOT NULL,
    slug TEXT NOT NULL,
    short_title TEXT NOT NULL,
    long_title TEXT NOT NULL,
    body TEXT NOT NULL,
    line INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_checked_at TEXT
);
CREATE TABLE IF NOT EXISTS flashcard (
    oid TEXT PRIMARY KEY,
    note_oid TEXT NOT NULL,
    file_oid TEXT NOT NULL,
    slug TEXT NOT NULL,
    short_title TEXT NOT NULL,
    front TEXT NOT NULL,
    back TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_checked_at TEXT
);
CREATE TABLE IF NOT EXISTS media (
    oid TEXT PRIMARY KEY,
    relative_path TEXT NOT NULL,
    kind TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    last_checked_at TEXT
);
CREATE TABLE IF NOT EXISTS link (
    oid TEXT PRIMARY KEY,
    note_oid TEXT NOT NULL,
    name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS reminder (
    oid TEXT PRIMARY KEY,
    note_oid TEXT NOT NULL,
    file_oid TEXT NOT NULL,
    expression TEXT NOT NULL,
    next_date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS relation (
    oid TEXT PRIMARY KEY,
    source_oid TEXT NOT NULL,
    kind TEXT NOT NULL,
    target_oid TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS attribute (
    object_oid TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (object_oid, name)
);
CREATE TABLE IF NOT EXISTS tag (
    object_oid TEXT NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY (object_oid, name)
);
CREATE INDEX IF NOT EXISTS idx_note_file ON note(file_oid);
CREATE INDEX IF NOT EXISTS idx_note_slug ON note(slug);
CREATE INDEX IF NOT EXISTS idx_relation_target ON relation(target_oid);
"#;

/// A note row returned by queries.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteRow {
    pub oid: Oid,
    pub file_oid: Oid,
    pub kind: String,
    pub relative_path: String,
    pub slug: String,
    pub short_title: String,
    pub long_title: String,
    pub body: String,
}

/// A file row returned by queries.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRow {
    pub oid: Oid,
    pub relative_path: String,
    pub slug: String,
    pub title: String,
}

/// Aggregate row counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub files: i64,
    pub notes: i64,
    pub flashcards: i64,
    pub medias: i64,
    pub links: i64,
    pub reminders: i64,
    pub relations: i64,
}

/// The projection database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating the schema when needed) at `.nt/database.db`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    /// Run `f` inside one transaction; rolls back on error.
    pub fn with_transaction<T>(
        &mut self,
        f: impl FnOnce(&Transaction) -> Result<T>,
    ) -> Result<T> {
        let tx = self.conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Remove every row. `pull` rebuilds the projection from the packs
    /// the fetched index references.
    pub fn clear(tx: &Transaction) -> Result<()> {
        for table in [
            "file", "note", "flashcard", "media", "link", "reminder", "relation", "attribute",
            "tag",
        ] {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        Ok(())
    }

    /// Insert or update every row derived from the packs' objects.
    pub fn upsert_pack_files(tx: &Transaction, packs: &[&PackFile]) -> Result<()> {
        for pack in packs {
            for object in pack.decode_objects()? {
                upsert_object(tx, &object)?;
            }
        }
        Ok(())
    }

    /// Delete rows whose OID matches a pack object, or whose `file_oid`
    /// belongs to a file removed by these packs.
    pub fn delete_pack_files(tx: &Transaction, packs: &[&PackFile]) -> Result<()> {
        let mut oids: BTreeSet<String> = BTreeSet::new();
        let mut file_oids: BTreeSet<String> = BTreeSet::new();
        for pack in packs {
            for object in &pack.objects {
                oids.insert(object.oid.to_string());
                if object.kind == nt_object::ObjectKind::File {
                    file_oids.insert(object.oid.to_string());
                }
            }
        }
        for oid in &oids {
            for table in ["file", "note", "flashcard", "media", "link", "reminder", "relation"] {
                tx.execute(&format!("DELETE FROM {table} WHERE oid = ?1"), params![oid])?;
            }
            tx.execute("DELETE FROM attribute WHERE object_oid = ?1", params![oid])?;
            tx.execute("DELETE FROM tag WHERE object_oid = ?1", params![oid])?;
        }
        for file_oid in &file_oids {
            // Children of a removed file, whatever pack they arrived in.
            let orphan_notes: Vec<String> = {
                let mut stmt = tx.prepare("SELECT oid FROM note WHERE file_oid = ?1")?;
                let rows = stmt.query_map(params![file_oid], |row| row.get::<_, String>(0))?;
                rows.collect::<std::result::Result<_, _>>()?
            };
            for oid in orphan_notes {
                tx.execute("DELETE FROM attribute WHERE object_oid = ?1", params![oid])?;
                tx.execute("DELETE FROM tag WHERE object_oid = ?1", params![oid])?;
                tx.execute("DELETE FROM relation WHERE source_oid = ?1", params![oid])?;
            }
            tx.execute("DELETE FROM note WHERE file_oid = ?1", params![file_oid])?;
            tx.execute("DELETE FROM flashcard WHERE file_oid = ?1", params![file_oid])?;
            tx.execute("DELETE FROM reminder WHERE file_oid = ?1", params![file_oid])?;
        }
        Ok(())
    }

    pub fn count_files(&self) -> Result<i64> {
        self.count("file")
    }

    pub fn count_notes(&self) -> Result<i64> {
        self.count("note")
    }

    pub fn count_flashcards(&self) -> Result<i64> {
        self.count("flashcard")
    }

    pub fn count_medias(&self) -> Result<i64> {
        self.count("media")
    }

    pub fn count_links(&self) -> Result<i64> {
        self.count("link")
    }

    pub fn count_reminders(&self) -> Result<i64> {
        self.count("reminder")
    }

    pub fn count_relations(&self) -> Result<i64> {
        self.count("relation")
    }

    fn count(&self, table: &str) -> Result<i64> {
        let n = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(n)
    }

    pub fn stats_in_db(&self) -> Result<Stats> {
        Ok(Stats {
            files: self.count_files()?,
            notes: self.count_notes()?,
            flashcards: self.count_flashcards()?,
            medias: self.count_medias()?,
            links: self.count_links()?,
            reminders: self.count_reminders()?,
            relations: self.count_relations()?,
        })
    }

    pub fn find_file_by_oid(&self, oid: &Oid) -> Result<Option<FileRow>> {
        self.file_row("oid = ?1", &[&oid.to_string()])
    }

    pub fn find_file_by_relative_path(&self, path: &str) -> Result<Option<FileRow>> {
        self.file_row("relative_path = ?1", &[&path.to_string()])
    }

    fn file_row(&self, cond: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Option<FileRow>> {
        let sql =
            format!("SELECT oid, relative_path, slug, title FROM file WHERE {cond} LIMIT 1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(args)?;
        match rows.next()? {
            Some(row) => Ok(Some(FileRow {
                oid: parse_oid(row.get::<_, String>(0)?),
                relative_path: row.get(1)?,
                slug: row.get(2)?,
                title: row.get(3)?,
            })),
            None => Ok(None),
        }
    }

    pub fn find_note_by_oid(&self, oid: &Oid) -> Result<Option<NoteRow>> {
        let mut rows = self.note_rows("WHERE oid = ?1 LIMIT 1", &[&oid.to_string()])?;
        Ok(rows.pop())
    }

    pub fn find_notes_by_title(&self, title: &str) -> Result<Vec<NoteRow>> {
        self.note_rows(
            "WHERE short_title = ?1 OR long_title = ?1 ORDER BY relative_path, line",
            &[&title.to_string()],
        )
    }

    pub fn find_note_by_slug(&self, slug: &str) -> Result<Option<NoteRow>> {
        let mut rows = self.note_rows("WHERE slug = ?1 LIMIT 1", &[&slug.to_string()])?;
        Ok(rows.pop())
    }

    fn note_rows(&self, tail: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<NoteRow>> {
        let sql = format!(
            "SELECT oid, file_oid, kind, relative_path, slug, short_title, long_title, body \
             FROM note {tail}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(args, |row| {
            Ok(NoteRow {
                oid: parse_oid(row.get::<_, String>(0)?),
                file_oid: parse_oid(row.get::<_, String>(1)?),
                kind: row.get(2)?,
                relative_path: row.get(3)?,
                slug: row.get(4)?,
                short_title: row.get(5)?,
                long_title: row.get(6)?,
                body: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Run a query-language search over notes.
    pub fn search(&self, input: &str) -> Result<Vec<NoteRow>> {
        let query = Query::parse(input)?;
        let mut sql = String::from(
            "SELECT oid, file_oid, kind, relative_path, slug, short_title, long_title, body \
             FROM note WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();

        for tag in &query.tags {
            args.push(tag.clone());
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM tag WHERE object_oid = note.oid AND name = ?{})",
                args.len()
            ));
        }
        for tag in &query.excluded_tags {
            args.push(tag.clone());
            sql.push_str(&format!(
                " AND NOT EXISTS (SELECT 1 FROM tag WHERE object_oid = note.oid AND name = ?{})",
                args.len()
            ));
        }
        for (key, value) in &query.attributes {
            args.push(key.clone());
            let key_pos = args.len();
            args.push(value.clone());
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM attribute WHERE object_oid = note.oid \
                 AND name = ?{key_pos} AND value = ?{})",
                args.len()
            ));
        }
        for kind in &query.kinds {
            args.push(kind.clone());
            sql.push_str(&format!(" AND kind = ?{}", args.len()));
        }
        for path in &query.paths {
            args.push(format!("{}%", path.trim_end_matches('/')));
            sql.push_str(&format!(" AND relative_path LIKE ?{}", args.len()));
        }
        for keyword in &query.keywords {
            args.push(format!("%{keyword}%"));
            let pos = args.len();
            sql.push_str(&format!(
                " AND (short_title LIKE ?{pos} OR long_title LIKE ?{pos} OR body LIKE ?{pos})"
            ));
        }
        sql.push_str(" ORDER BY relative_path, line");

        let mut stmt = self.conn.prepare(&sql)?;
        let params: Vec<&dyn rusqlite::ToSql> =
            args.iter().map(|a| a as &dyn rusqlite::ToSql).collect();
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok(NoteRow {
                oid: parse_oid(row.get::<_, String>(0)?),
                file_oid: parse_oid(row.get::<_, String>(1)?),
                kind: row.get(2)?,
                relative_path: row.get(3)?,
                slug: row.get(4)?,
                short_title: row.get(5)?,
                long_title: row.get(6)?,
                body: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Relations targeting an object.
    pub fn find_relations_to(&self, oid: &Oid) -> Result<Vec<(Oid, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source_oid, kind FROM relation WHERE target_oid = ?1")?;
        let rows = stmt.query_map(params![oid.to_string()], |row| {
            Ok((parse_oid(row.get::<_, String>(0)?), row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Tag histogram over all objects.
    pub fn count_tags(&self) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, COUNT(*) FROM tag GROUP BY name ORDER BY COUNT(*) DESC, name",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Attribute-name histogram over all objects.
    pub fn count_attributes(&self) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, COUNT(*) FROM attribute GROUP BY name ORDER BY COUNT(*) DESC, name",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<std::result::Result<_, _>>()?)
    }

    /// Record that an object was surfaced to the user.
    pub fn touch_last_checked(&self, table: &str, oid: &Oid, at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            &format!("UPDATE {table} SET last_checked_at = ?1 WHERE oid = ?2"),
            params![at.to_rfc3339(), oid.to_string()],
        )?;
        Ok(())
    }
}

fn parse_oid(s: String) -> Oid {
    s.parse().unwrap_or_else(|_| Oid::nil())
}

fn upsert_object(tx: &Transaction, object: &Object) -> Result<()> {
    let oid = object.oid().to_string();
    match object {
        Object::File(f) => {
            tx.execute(
                "INSERT OR REPLACE INTO file \
                 (oid, relative_path, slug, title, front_matter, body, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    oid,
                    f.relative_path.as_str(),
                    f.slug,
                    f.title,
                    f.front_matter,
                    f.body,
                    f.created_at.to_rfc3339(),
                    f.updated_at.to_rfc3339(),
                ],
            )?;
            replace_attributes(tx, &oid, f.attributes.iter())?;
            replace_tags(tx, &oid, f.tags.iter())?;
        }
        Object::Note(n) => {
            tx.execute(
                "INSERT OR REPLACE INTO note \
                 (oid, file_oid, parent_note_oid, kind, relative_path, slug, short_title, \
                  long_title, body, line, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    oid,
                    n.file_oid.to_string(),
                    n.parent_note_oid.to_string(),
                    n.kind.as_str(),
                    n.relative_path.as_str(),
                    n.slug,
                    n.short_title,
                    n.long_title,
                    n.body,
                    n.line as i64,
                    n.created_at.to_rfc3339(),
                    n.updated_at.to_rfc3339(),
                ],
            )?;
            replace_attributes(tx, &oid, n.attributes.iter())?;
            replace_tags(tx, &oid, n.tags.iter())?;
        }
        Object::Flashcard(c) => {
            tx.execute(
                "INSERT OR REPLACE INTO flashcard \
                 (oid, note_oid, file_oid, slug, short_title, front, back, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    oid,
                    c.note_oid.to_string(),
                    c.file_oid.to_string(),
                    c.slug,
                    c.short_title,
                    c.front,
                    c.back,
                    c.created_at.to_rfc3339(),
                    c.updated_at.to_rfc3339(),
                ],
            )?;
            replace_tags(tx, &oid, c.tags.iter())?;
        }
        Object::Media(m) => {
            tx.execute(
                "INSERT OR REPLACE INTO media \
                 (oid, relative_path, kind, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    oid,
                    m.relative_path.as_str(),
                    m.kind.as_str(),
                    m.created_at.to_rfc3339(),
                    m.updated_at.to_rfc3339(),
                ],
            )?;
        }
        Object::GoLink(l) => {
            tx.execute(
                "INSERT OR REPLACE INTO link \
                 (oid, note_oid, name, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    oid,
                    l.note_oid.to_string(),
                    l.name,
                    l.created_at.to_rfc3339(),
                    l.updated_at.to_rfc3339(),
                ],
            )?;
        }
        Object::Reminder(r) => {
            tx.execute(
                "INSERT OR REPLACE INTO reminder \
                 (oid, note_oid, file_oid, expression, next_date, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    oid,
                    r.note_oid.to_string(),
                    r.file_oid.to_string(),
                    r.expression,
                    r.next_date.to_rfc3339(),
                    r.created_at.to_rfc3339(),
                    r.updated_at.to_rfc3339(),
                ],
            )?;
        }
        Object::Relation(r) => {
            tx.execute(
                "INSERT OR REPLACE INTO relation (oid, source_oid, kind, target_oid) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    oid,
                    r.source_oid.to_string(),
                    r.kind.as_str(),
                    r.target_oid.to_string(),
                ],
            )?;
        }
    }
    Ok(())
}

fn replace_attributes<'a>(
    tx: &Transaction,
    oid: &str,
    attributes: impl Iterator<Item = (&'a String, &'a Value)>,
) -> Result<()> {
    tx.execute("DELETE FROM attribute WHERE object_oid = ?1", params![oid])?;
    for (name, value) in attributes {
        tx.execute(
            "INSERT INTO attribute (object_oid, name, value) VALUES (?1, ?2, ?3)",
            params![oid, name, value.to_display_string()],
        )?;
    }
    Ok(())
}

fn replace_tags<'a>(
    tx: &Transaction,
    oid: &str,
    tags: impl Iterator<Item = &'a String>,
) -> Result<()> {
    tx.execute("DELETE FROM tag WHERE object_oid = ?1", params![oid])?;
    for name in tags {
        tx.execute(
            "INSERT INTO tag (object_oid, name) VALUES (?1, ?2)",
            params![oid, name],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nt_object::{build_objects, ParsedFile, SchemaSet};
    use nt_utils::RepoPath;

    const GO_MD: &str = "---\ntags: [go]\n---\n# Go\n\n## Note: Syntax\n\nBraces everywhere. #syntax\n\n## Flashcard: Keywords\n\nHow many?\n\n---\n\n25.\n";

    fn t(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn sample_pack(content: &str, path: &str) -> PackFile {
        let now = t("2023-01-01T00:00:00Z");
        let parsed = ParsedFile::build(
            &RepoPath::new(path),
            content,
            None,
            &SchemaSet::default(),
            &[],
        )
        .unwrap();
        let objects = build_objects(&parsed, &[], now, &|_| None).unwrap();
        PackFile::from_objects(
            &RepoPath::new(path),
            now,
            content.len() as u64,
            &objects,
            Vec::new(),
            None,
            now,
        )
        .unwrap()
    }

    fn loaded_db() -> (Database, PackFile) {
        let mut db = Database::open_in_memory().unwrap();
        let pack = sample_pack(GO_MD, "go/go.md");
        db.with_transaction(|tx| Database::upsert_pack_files(tx, &[&pack]))
            .unwrap();
        (db, pack)
    }

    #[test]
    fn upsert_counts_rows() {
        let (db, _) = loaded_db();
        assert_eq!(db.count_files().unwrap(), 1);
        assert_eq!(db.count_notes().unwrap(), 2);
        assert_eq!(db.count_flashcards().unwrap(), 1);
    }

    #[test]
    fn find_by_relative_path_and_title() {
        let (db, _) = loaded_db();
        let file = db.find_file_by_relative_path("go/go.md").unwrap().unwrap();
        assert_eq!(file.title, "Go");
        assert_eq!(file.slug, "go");

        let notes = db.find_notes_by_title("Syntax").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].long_title, "Go / Syntax");
    }

    #[test]
    fn search_by_tag_kind_and_keyword() {
        let (db, _) = loaded_db();
        assert_eq!(db.search("#syntax").unwrap().len(), 1);
        assert_eq!(db.search("kind:flashcard").unwrap().len(), 1);
        assert_eq!(db.search("Braces").unwrap().len(), 1);
        assert_eq!(db.search("#syntax -#go").unwrap().len(), 0);
        assert_eq!(db.search("path:\"go/\"").unwrap().len(), 2);
        assert_eq!(db.search("kind:flashcard #syntax").unwrap().len(), 0);
    }

    #[test]
    fn delete_pack_files_removes_projection_rows() {
        let (mut db, pack) = loaded_db();
        db.with_transaction(|tx| Database::delete_pack_files(tx, &[&pack]))
            .unwrap();
        assert_eq!(db.stats_in_db().unwrap(), Stats::default());
        assert_eq!(db.count_tags().unwrap().len(), 0);
    }

    #[test]
    fn rebuild_equals_live() {
        let (db, pack) = loaded_db();
        let mut rebuilt = Database::open_in_memory().unwrap();
        rebuilt
            .with_transaction(|tx| Database::upsert_pack_files(tx, &[&pack]))
            .unwrap();
        assert_eq!(db.stats_in_db().unwrap(), rebuilt.stats_in_db().unwrap());
        assert_eq!(db.count_tags().unwrap(), rebuilt.count_tags().unwrap());
        assert_eq!(
            db.search("#syntax").unwrap(),
            rebuilt.search("#syntax").unwrap()
        );
    }

    #[test]
    fn upsert_is_idempotent() {
        let (mut db, pack) = loaded_db();
        db.with_transaction(|tx| Database::upsert_pack_files(tx, &[&pack]))
            .unwrap();
        assert_eq!(db.count_notes().unwrap(), 2);
        let tags = db.count_tags().unwrap();
        let syntax = tags.iter().find(|(name, _)| name == "syntax").unwrap();
        assert_eq!(syntax.1, 1);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let (mut db, pack) = loaded_db();
        let result: Result<()> = db.with_transaction(|tx| {
            Database::delete_pack_files(tx, &[&pack])?;
            Err(DbError::QuerySyntax("boom".to_string()))
        });
        assert!(result.is_err());
        // Deletion rolled back.
        assert_eq!(db.count_notes().unwrap(), 2);
    }

    #[test]
    fn relations_to() {
        let mut db = Database::open_in_memory().unwrap();
        let target = Oid::from_bytes(b"target");
        let content = "# T\n\n## Note: A\n\n![[go-syntax]]\n";
        let now = t("2023-01-01T00:00:00Z");
        let parsed = ParsedFile::build(
            &RepoPath::new("t.md"),
            content,
            None,
            &SchemaSet::default(),
            &[],
        )
        .unwrap();
        let objects = build_objects(&parsed, &[], now, &|slug| {
            (slug == "go-syntax").then(|| target.clone())
        })
        .unwrap();
        let pack = PackFile::from_objects(
            &RepoPath::new("t.md"),
            now,
            0,
            &objects,
            Vec::new(),
            None,
            now,
        )
        .unwrap();
        db.with_transaction(|tx| Database::upsert_pack_files(tx, &[&pack]))
            .unwrap();
        let relations = db.find_relations_to(&target).unwrap();
        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].1, "embeds");
    }
}
