//! Repository façade.
//!
//! Ties the parser, object model, pack store, index, projection and
//! remotes together behind the operations the CLI dispatches to:
//! add / reset / commit / status / diff / push / pull / lint / gc.
//!
//! Ordering within a command is fixed: pack and blob files hit the disk
//! first, then the projection transaction commits, then the index is
//! saved. A crash between the last two leaves the projection ahead of the
//! index, which is safe — the projection is rebuildable from the packs
//! the index references.

mod discover;
mod error;
mod lint;
mod status;
mod sync;
mod walk;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use nt_config::{Config, LintConfig};
use nt_db::Database;
use nt_index::Index;
use nt_object::{
    build_media, build_objects, AttributeSet, Object, ParsedFile,
};
use nt_oid::Oid;
use nt_pack::{
    BlobRef, FfmpegConverter, MediaConverter, ObjectStore, PackFile, RandomConverter,
};
use nt_utils::{order, Clock, PathSpecs, RepoPath};

pub use discover::{discover, discover_from};
pub use error::RepoError;
pub use lint::{check as check_rule, Violation, KNOWN_RULES};
pub use status::{ChangeVerb, StatusChange, StatusReport};
pub use walk::walk_markdown_files;

pub type Result<T> = std::result::Result<T, RepoError>;

/// An open repository.
pub struct Repository {
    root: PathBuf,
    nt_dir: PathBuf,
    config: Config,
    lint: LintConfig,
    ignore: PathSpecs,
    index: Index,
    db: Database,
    store: ObjectStore,
}

impl Repository {
    /// Discover and open the repository containing `start`.
    pub fn open(start: &Path) -> Result<Repository> {
        let root = discover(start)?;
        Self::open_at(&root)
    }

    /// Open a known repository root.
    pub fn open_at(root: &Path) -> Result<Repository> {
        let nt_dir = root.join(".nt");
        if !nt_dir.is_dir() {
            return Err(RepoError::NotARepository(root.to_path_buf()));
        }
        let config = Config::load(&nt_dir)?;
        let lint = LintConfig::load(&nt_dir, KNOWN_RULES)?;
        let ignore = nt_config::load_ignore(root)?;
        let index = Index::read_from(&nt_dir.join("index"))?;
        let db = Database::open(&nt_dir.join("database.db"))?;
        let store = ObjectStore::new(nt_dir.join("objects"));

        for warning in index.verify(&store) {
            tracing::warn!("{warning}");
        }

        Ok(Repository {
            root: root.to_path_buf(),
            nt_dir,
            config,
            lint,
            ignore,
            index,
            db,
            store,
        })
    }

    /// Create the `.nt/` skeleton. Idempotent.
    pub fn init(root: &Path) -> Result<()> {
        let nt_dir = root.join(".nt");
        std::fs::create_dir_all(nt_dir.join("objects"))?;
        let config_path = nt_dir.join("config");
        if !config_path.exists() {
            std::fs::write(&config_path, Config::default_toml())?;
        }
        let lint_path = nt_dir.join("lint");
        if !lint_path.exists() {
            std::fs::write(&lint_path, "rules: []\nschemas: []\n")?;
        }
        std::fs::write(nt_dir.join(".gitignore"), nt_config::NT_GITIGNORE)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn index_path(&self) -> PathBuf {
        self.nt_dir.join("index")
    }

    fn converter(&self) -> Box<dyn MediaConverter> {
        if self.config.medias.command == "random" {
            Box::new(RandomConverter)
        } else {
            Box::new(FfmpegConverter::new(
                self.config.medias.command.clone(),
                self.config.medias.preset.clone(),
            ))
        }
    }

    /// Run the configured lint rules over the files matching `pathspecs`.
    pub fn lint(&mut self, pathspecs: &PathSpecs) -> Result<Vec<Violation>> {
        let files = walk_markdown_files(
            &self.root,
            &self.config.core.extensions,
            &self.ignore,
        )?;
        let mut violations = Vec::new();
        let mut parent_cache: BTreeMap<RepoPath, AttributeSet> = BTreeMap::new();

        for rel in files {
            if !pathspecs.matches(&rel) {
                continue;
            }
            let content = match std::fs::read_to_string(rel.to_abs(&self.root)) {
                Ok(content) => content,
                Err(e) => {
                    violations.push(Violation {
                        rule: "parse".to_string(),
                        severity: nt_config::Severity::Error,
                        path: rel.clone(),
                        line: 0,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            let parent = self.parent_attributes(&rel, &mut parent_cache)?;
            let parsed = match ParsedFile::build(
                &rel,
                &content,
                parent.as_ref(),
                &self.lint.schemas,
                &[],
            ) {
                Ok(parsed) => parsed,
                Err(e) => {
                    // A parse failure poisons only the affected file here;
                    // `add` turns it into a command failure.
                    violations.push(Violation {
                        rule: "parse".to_string(),
                        severity: nt_config::Severity::Error,
                        path: rel.clone(),
                        line: 0,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            if parsed.ignored() {
                continue;
            }

            let db = &self.db;
            let resolve = |slug: &str| db.find_note_by_slug(slug).ok().flatten().is_some();
            for rule in &self.lint.rules {
                if !rule.include_specs()?.matches(&rel) {
                    continue;
                }
                violations.extend(lint::check(rule, &parsed, &self.root, &resolve));
            }
        }
        Ok(violations)
    }

    /// Stage every change under the matching paths.
    pub fn add(&mut self, pathspecs: &PathSpecs) -> Result<()> {
        let now = Clock::now();

        // Lint gate: any error-severity violation aborts before anything
        // is written. A file that does not parse aborts the whole command.
        let violations = self.lint(pathspecs)?;
        if let Some(parse_failure) = violations.iter().find(|v| v.rule == "parse") {
            return Err(RepoError::ParseFailed {
                path: parse_failure.path.to_string(),
                reason: parse_failure.message.clone(),
            });
        }
        let errors = violations
            .iter()
            .filter(|v| v.severity == nt_config::Severity::Error)
            .count();
        if errors > 0 {
            for violation in &violations {
                tracing::error!("{violation}");
            }
            return Err(RepoError::LintFailed(errors));
        }

        let files = walk_markdown_files(
            &self.root,
            &self.config.core.extensions,
            &self.ignore,
        )?;

        let mut parent_cache: BTreeMap<RepoPath, AttributeSet> = BTreeMap::new();
        let mut slug_map: BTreeMap<String, Oid> = BTreeMap::new();
        let mut staged_packs: Vec<PackFile> = Vec::new();
        let mut replaced_packs: Vec<PackFile> = Vec::new();
        let mut traversed: BTreeSet<RepoPath> = BTreeSet::new();
        let mut media_paths: BTreeSet<RepoPath> = BTreeSet::new();

        for rel in files {
            let matched = pathspecs.matches(&rel);
            if !matched && !order::is_index_file(&rel) {
                continue;
            }

            let abs = rel.to_abs(&self.root);
            let content = std::fs::read_to_string(&abs).map_err(|e| RepoError::ParseFailed {
                path: rel.to_string(),
                reason: e.to_string(),
            })?;
            let (mtime, size) = stat(&abs)?;

            let parent = self.parent_attributes(&rel, &mut parent_cache)?;
            let changed = match self.index.entry(&rel) {
                Some(entry) => entry.mtime != mtime || entry.size != size,
                None => true,
            };

            // Parse index files even when unchanged so children inherit
            // current attributes; only re-pack when something moved.
            let must_parse = changed || order::is_index_file(&rel);
            if !must_parse {
                traversed.insert(rel.clone());
                if let Some(prior) = self.current_pack(&rel)? {
                    for blob_media in self.media_of_entry(&prior)? {
                        media_paths.insert(blob_media);
                    }
                }
                continue;
            }

            let parsed = ParsedFile::build(
                &rel,
                &content,
                parent.as_ref(),
                &self.lint.schemas,
                &[],
            )
            .map_err(|e| RepoError::ParseFailed {
                path: rel.to_string(),
                reason: e.to_string(),
            })?;

            if order::is_index_file(&rel) {
                parent_cache.insert(rel.clone(), parsed.attributes.clone());
            }

            if parsed.ignored() {
                continue;
            }
            traversed.insert(rel.clone());

            if !matched {
                continue; // parsed for inheritance only
            }
            for media in &parsed.medias {
                media_paths.insert(media.relative_path.clone());
            }
            if !changed {
                continue;
            }

            let prior_pack = self.current_pack(&rel)?;
            let prior_objects = match &prior_pack {
                Some(pack) => pack.decode_objects()?,
                None => Vec::new(),
            };

            for object in &prior_objects {
                if let Object::Note(note) = object {
                    slug_map.insert(note.slug.clone(), note.oid.clone());
                }
            }
            let db = &self.db;
            let local_slugs = slug_map.clone();
            let resolve = move |slug: &str| -> Option<Oid> {
                local_slugs.get(slug).cloned().or_else(|| {
                    db.find_note_by_slug(slug).ok().flatten().map(|row| row.oid)
                })
            };

            let objects = build_objects(&parsed, &prior_objects, now, &resolve)?;
            for object in &objects {
                if let Object::Note(note) = object {
                    slug_map.insert(note.slug.clone(), note.oid.clone());
                }
            }

            let pack = PackFile::from_objects(
                &rel,
                mtime,
                size,
                &objects,
                Vec::new(),
                prior_pack.as_ref(),
                now,
            )?;

            // A touched-but-identical file produces an identical object
            // list; refresh the stat data instead of staging a no-op pack.
            if let Some(prior) = &prior_pack {
                if prior.objects == pack.objects && prior.blobs == pack.blobs {
                    self.index.touch(&rel, mtime, size);
                    continue;
                }
            }

            self.store.write_pack(&pack)?;
            if let Some(prior) = prior_pack {
                replaced_packs.push(prior);
            }
            self.index.stage(&pack);
            staged_packs.push(pack);
        }

        // Media packs for every referenced media file.
        let converter = self.converter();
        for media_rel in &media_paths {
            if let Some((pack, replaced)) =
                self.pack_media(media_rel, converter.as_ref(), now)?
            {
                if let Some(prior) = replaced {
                    replaced_packs.push(prior);
                }
                self.index.stage(&pack);
                staged_packs.push(pack);
            }
        }

        // A match-everything add also stages deletions for entries whose
        // sources vanished (or are no longer referenced media).
        let mut tombstoned_packs: Vec<PackFile> = Vec::new();
        if pathspecs.match_all() {
            let gone: Vec<RepoPath> = self
                .index
                .entries()
                .iter()
                .filter(|e| !e.tombstone)
                .map(|e| e.relative_path.clone())
                .filter(|path| {
                    let is_markdown = self.is_markdown(path);
                    if is_markdown {
                        !traversed.contains(path)
                    } else {
                        !path.to_abs(&self.root).is_file()
                    }
                })
                .collect();
            for path in gone {
                if let Some(pack) = self.current_pack(&path)? {
                    tombstoned_packs.push(pack);
                }
                self.index.stage_tombstone(&path)?;
            }
        }

        // One projection transaction for the whole command.
        let staged_refs: Vec<&PackFile> = staged_packs.iter().collect();
        let replaced_refs: Vec<&PackFile> = replaced_packs.iter().collect();
        let tombstoned_refs: Vec<&PackFile> = tombstoned_packs.iter().collect();
        self.db.with_transaction(|tx| {
            Database::delete_pack_files(tx, &replaced_refs)?;
            Database::delete_pack_files(tx, &tombstoned_refs)?;
            Database::upsert_pack_files(tx, &staged_refs)?;
            Ok(())
        })?;

        self.index.save(&self.index_path())?;
        tracing::info!(staged = staged_packs.len(), "add complete");
        Ok(())
    }

    /// Unstage matching entries, restoring their committed state.
    pub fn reset(&mut self, pathspecs: &PathSpecs) -> Result<()> {
        // Committed packs of affected entries, for projection restore.
        let restore_oids: Vec<Oid> = self
            .index
            .staged_entries()
            .filter(|e| pathspecs.matches(&e.relative_path))
            .filter(|e| !e.pack_file_oid.is_nil())
            .map(|e| e.pack_file_oid.clone())
            .collect();

        let abandoned = self.index.reset(pathspecs);

        let mut dropped_packs = Vec::new();
        for pack in &abandoned {
            if self.store.pack_exists(&pack.oid) {
                dropped_packs.push(self.store.read_pack(&pack.oid)?);
            }
        }
        let mut restored_packs = Vec::new();
        for oid in &restore_oids {
            restored_packs.push(self.store.read_pack(oid)?);
        }

        let dropped_refs: Vec<&PackFile> = dropped_packs.iter().collect();
        let restored_refs: Vec<&PackFile> = restored_packs.iter().collect();
        self.db.with_transaction(|tx| {
            Database::delete_pack_files(tx, &dropped_refs)?;
            Database::upsert_pack_files(tx, &restored_refs)?;
            Ok(())
        })?;

        // Replaced-staged packs go; never-committed packs stay on disk
        // (reclaimed by `gc`, or reused by a re-add).
        for pack in &abandoned {
            if !pack.never_committed {
                self.store.delete_pack(&pack.oid)?;
            }
        }

        self.index.save(&self.index_path())?;
        Ok(())
    }

    /// Promote the staging area.
    pub fn commit(&mut self) -> Result<()> {
        if self.index.nothing_to_commit() {
            return Err(RepoError::NothingToCommit);
        }
        let outcome = self.index.commit(Clock::now());
        self.index.save(&self.index_path())?;

        for oid in &outcome.removed_packs {
            self.store.delete_pack(oid)?;
        }
        self.collect_orphan_blobs()?;
        tracing::info!(removed = outcome.removed_packs.len(), "commit complete");
        Ok(())
    }

    /// Remove on-disk packs and blobs no longer referenced by the index.
    pub fn gc(&mut self) -> Result<()> {
        let packs = self.index.referenced_pack_oids();
        for (oid, is_pack) in self.store.enumerate()? {
            if is_pack && !packs.contains(&oid) {
                self.store.delete_pack(&oid)?;
            }
        }
        self.collect_orphan_blobs()?;
        Ok(())
    }

    fn collect_orphan_blobs(&self) -> Result<()> {
        let blobs = self.index.referenced_blob_oids();
        for (oid, is_pack) in self.store.enumerate()? {
            if !is_pack && !blobs.contains(&oid) {
                self.store.delete_blob(&oid)?;
            }
        }
        Ok(())
    }

    /// The pack currently describing an entry (staged when present).
    fn current_pack(&self, path: &RepoPath) -> Result<Option<PackFile>> {
        let Some(entry) = self.index.entry(path) else {
            return Ok(None);
        };
        let oid = entry.current_pack_oid();
        if oid.is_nil() {
            return Ok(None);
        }
        Ok(Some(self.store.read_pack(oid)?))
    }

    fn is_markdown(&self, path: &RepoPath) -> bool {
        let ext = path.extension();
        self.config
            .core
            .extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&ext))
    }

    /// Media paths referenced by a markdown pack's file object.
    fn media_of_entry(&self, pack: &PackFile) -> Result<Vec<RepoPath>> {
        let mut out = Vec::new();
        for object in pack.decode_objects()? {
            if let Object::File(file) = object {
                let parsed_refs = nt_markdown::extract_media_refs(&file.body);
                for media_ref in parsed_refs {
                    if let Ok(resolved) = file.relative_path.resolve_reference(&media_ref.target)
                    {
                        out.push(resolved);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Build and write the pack (with blobs) for one media file. Returns
    /// `None` when the media is missing or unchanged.
    fn pack_media(
        &mut self,
        rel: &RepoPath,
        converter: &dyn MediaConverter,
        now: DateTime<Utc>,
    ) -> Result<Option<(PackFile, Option<PackFile>)>> {
        let abs = rel.to_abs(&self.root);
        if !abs.is_file() {
            return Ok(None);
        }
        let (mtime, size) = stat(&abs)?;
        if let Some(entry) = self.index.entry(rel) {
            if entry.mtime == mtime && entry.size == size && !entry.tombstone {
                return Ok(None);
            }
        }

        let prior_pack = self.current_pack(rel)?;
        let prior_media = prior_pack.as_ref().and_then(|pack| {
            pack.decode_objects().ok().and_then(|objects| {
                objects.into_iter().find_map(|o| match o {
                    Object::Media(m) => Some(m),
                    _ => None,
                })
            })
        });

        let media = build_media(rel, prior_media.as_ref(), now);
        let kind = media.kind;
        let payloads = converter.convert(&abs, kind)?;

        let mut blob_refs = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            let oid = Oid::from_bytes(&payload.bytes);
            self.store.write_blob(&oid, &payload.bytes)?;
            blob_refs.push(BlobRef {
                oid,
                mime: payload.mime.clone(),
                attributes: payload.attributes.clone(),
                tags: payload.tags.clone(),
            });
        }

        let objects = vec![Object::Media(media)];
        let pack = PackFile::from_objects(
            rel,
            mtime,
            size,
            &objects,
            blob_refs,
            prior_pack.as_ref(),
            now,
        )?;

        if let Some(prior) = &prior_pack {
            if prior.objects == pack.objects && prior.blobs == pack.blobs {
                self.index.touch(rel, mtime, size);
                return Ok(None);
            }
        }

        self.store.write_pack(&pack)?;
        Ok(Some((pack, prior_pack)))
    }

    /// Attributes of the `index.md` governing `rel`'s directory.
    fn parent_attributes(
        &self,
        rel: &RepoPath,
        cache: &mut BTreeMap<RepoPath, AttributeSet>,
    ) -> Result<Option<AttributeSet>> {
        if order::is_index_file(rel) {
            // An index file inherits from the directory above its own;
            // the root index has nothing to inherit from.
            let parent_dir = rel.parent();
            if parent_dir.is_empty() {
                return Ok(None);
            }
            return self.dir_attributes(&parent_dir.parent(), cache);
        }
        self.dir_attributes(&rel.parent(), cache)
    }

    fn dir_attributes(
        &self,
        dir: &RepoPath,
        cache: &mut BTreeMap<RepoPath, AttributeSet>,
    ) -> Result<Option<AttributeSet>> {
        for ext in &self.config.core.extensions {
            let candidate = dir.join(&format!("index.{ext}"));
            if let Some(attrs) = cache.get(&candidate) {
                return Ok(Some(attrs.clone()));
            }
            if let Some(pack) = self.current_pack(&candidate)? {
                for object in pack.decode_objects()? {
                    if let Object::File(file) = object {
                        cache.insert(candidate.clone(), file.attributes.clone());
                        return Ok(Some(file.attributes));
                    }
                }
            }
        }
        Ok(None)
    }
}

pub(crate) fn stat(path: &Path) -> Result<(DateTime<Utc>, u64)> {
    let meta = std::fs::metadata(path)?;
    let mtime: DateTime<Utc> = meta.modified()?.into();
    Ok((mtime, meta.len()))
}
