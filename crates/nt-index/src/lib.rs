//! The index: the mutable per-repository ledger mapping source paths to
//! their committed and staged pack OIDs.
//!
//! The index sits between the working tree and the immutable pack files.
//! Staging swaps an entry's `staged_pack_file_oid`; committing promotes
//! staged OIDs to committed ones, drops tombstoned entries, and bumps the
//! global `committed_at` timestamp. The file is YAML at `.nt/index`,
//! written atomically.

mod entry;

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use chrono::{DateTime, Utc};

use nt_oid::Oid;
use nt_pack::PackFile;
use nt_utils::{tempfile::write_atomic, PathSpecs, RepoPath};

pub use entry::{IndexBlob, IndexEntry, IndexObject};

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("corrupt index at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("no index entry for '{0}'")]
    UnknownPath(RepoPath),

    #[error(transparent)]
    Util(#[from] nt_utils::UtilError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Packs and blobs present in another index but missing from this one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDiff {
    pub missing_pack_files: Vec<Oid>,
    pub missing_blobs: Vec<Oid>,
}

impl IndexDiff {
    pub fn is_empty(&self) -> bool {
        self.missing_pack_files.is_empty() && self.missing_blobs.is_empty()
    }
}

/// Outcome of a commit: pack files no longer referenced by any entry.
#[derive(Debug, Clone, Default)]
pub struct CommitOutcome {
    pub removed_packs: Vec<Oid>,
}

/// An abandoned staged pack, reported so the caller can decide whether
/// the file on disk should go too.
#[derive(Debug, Clone)]
pub struct AbandonedPack {
    pub oid: Oid,
    /// The owning entry had never been committed (`nt reset` keeps these
    /// on disk; they are garbage-collected later).
    pub never_committed: bool,
}

/// The whole mutable state of a repository.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Index {
    entries: Vec<IndexEntry>,
    objects: Vec<IndexObject>,
    blobs: Vec<IndexBlob>,
    #[serde(default = "epoch")]
    committed_at: DateTime<Utc>,
    /// Reverse map: pack OID → owning entry path. Rebuilt on load.
    #[serde(skip)]
    by_pack: HashMap<Oid, RepoPath>,
}

impl Default for Index {
    fn default() -> Self {
        Index {
            entries: Vec::new(),
            objects: Vec::new(),
            blobs: Vec::new(),
            committed_at: epoch(),
            by_pack: HashMap::new(),
        }
    }
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
            && self.objects == other.objects
            && self.blobs == other.blobs
            && self.committed_at == other.committed_at
    }
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the index from disk; a missing file is a fresh index.
    pub fn read_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let yaml = std::fs::read_to_string(path)?;
        let mut index: Index =
            serde_yaml::from_str(&yaml).map_err(|e| IndexError::Corrupt {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        index.reindex();
        Ok(index)
    }

    /// Persist atomically (temp file + rename): the index on disk is
    /// either wholly new or wholly unchanged.
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).map_err(|e| IndexError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        write_atomic(path, yaml.as_bytes())?;
        Ok(())
    }

    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_default()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut index: Index = serde_yaml::from_str(yaml).map_err(|e| IndexError::Corrupt {
            path: "<memory>".to_string(),
            reason: e.to_string(),
        })?;
        index.reindex();
        Ok(index)
    }

    pub fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn objects(&self) -> &[IndexObject] {
        &self.objects
    }

    pub fn blobs(&self) -> &[IndexBlob] {
        &self.blobs
    }

    pub fn entry(&self, path: &RepoPath) -> Option<&IndexEntry> {
        self.entries
            .binary_search_by(|e| e.relative_path.cmp(path))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// The entry owning a pack OID, through the reverse map.
    pub fn entry_by_pack(&self, oid: &Oid) -> Option<&IndexEntry> {
        self.by_pack.get(oid).and_then(|path| self.entry(path))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn nothing_to_commit(&self) -> bool {
        !self.entries.iter().any(IndexEntry::is_staged)
    }

    pub fn something_to_commit(&self) -> bool {
        !self.nothing_to_commit()
    }

    pub fn staged_entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter().filter(|e| e.is_staged())
    }

    /// Stage a freshly written pack for its source path, creating the
    /// entry when new. Returns the staged pack it replaces, if any.
    pub fn stage(&mut self, pack: &PackFile) -> Option<AbandonedPack> {
        let abandoned = self.find_or_insert(&pack.file_relative_path, |entry| {
            let abandoned = Self::take_abandoned(entry);
            entry.staged_pack_file_oid = pack.oid.clone();
            entry.mtime = pack.file_mtime;
            entry.size = pack.file_size;
            entry.tombstone = false;
            entry.staged = entry.is_staged();
            abandoned
        });
        if let Some(ref old) = abandoned {
            self.drop_pack_rows(&old.oid);
            self.by_pack.remove(&old.oid);
        }
        self.add_pack_rows(pack);
        self.by_pack
            .insert(pack.oid.clone(), pack.file_relative_path.clone());
        abandoned
    }

    /// Record fresh stat data for an entry whose re-parse produced no
    /// object changes (touched file, identical content).
    pub fn touch(&mut self, path: &RepoPath, mtime: DateTime<Utc>, size: u64) {
        if let Ok(pos) = self
            .entries
            .binary_search_by(|e| e.relative_path.cmp(path))
        {
            self.entries[pos].mtime = mtime;
            self.entries[pos].size = size;
        }
    }

    /// Stage a deletion: the entry survives until commit with its
    /// tombstone raised. An entry that was never committed is simply
    /// forgotten.
    pub fn stage_tombstone(&mut self, path: &RepoPath) -> Result<Option<AbandonedPack>> {
        let Ok(pos) = self
            .entries
            .binary_search_by(|e| e.relative_path.cmp(path))
        else {
            return Err(IndexError::UnknownPath(path.clone()));
        };

        let entry = &mut self.entries[pos];
        let abandoned = Self::take_abandoned(entry);

        if entry.never_committed() {
            let removed = self.entries.remove(pos);
            self.by_pack.remove(&removed.staged_pack_file_oid);
        } else {
            entry.staged_pack_file_oid = entry.pack_file_oid.clone();
            entry.tombstone = true;
            entry.staged = true;
        }

        if let Some(ref old) = abandoned {
            self.drop_pack_rows(&old.oid);
            self.by_pack.remove(&old.oid);
        }
        Ok(abandoned)
    }

    /// Reverse staging for one path. Returns the abandoned staged pack.
    pub fn unstage(&mut self, path: &RepoPath) -> Result<Option<AbandonedPack>> {
        let Ok(pos) = self
            .entries
            .binary_search_by(|e| e.relative_path.cmp(path))
        else {
            return Err(IndexError::UnknownPath(path.clone()));
        };

        let entry = &mut self.entries[pos];
        let abandoned = Self::take_abandoned(entry);
        entry.tombstone = false;

        if entry.never_committed() {
            let removed = self.entries.remove(pos);
            self.by_pack.remove(&removed.staged_pack_file_oid);
        } else {
            entry.staged_pack_file_oid = entry.pack_file_oid.clone();
            entry.staged = false;
        }

        if let Some(ref old) = abandoned {
            self.drop_pack_rows(&old.oid);
            self.by_pack.remove(&old.oid);
        }
        Ok(abandoned)
    }

    /// Bulk-unstage every staged entry matching the pathspecs.
    pub fn reset(&mut self, pathspecs: &PathSpecs) -> Vec<AbandonedPack> {
        let paths: Vec<RepoPath> = self
            .entries
            .iter()
            .filter(|e| e.is_staged() && pathspecs.matches(&e.relative_path))
            .map(|e| e.relative_path.clone())
            .collect();
        let mut abandoned = Vec::new();
        for path in paths {
            if let Ok(Some(pack)) = self.unstage(&path) {
                abandoned.push(pack);
            }
        }
        abandoned
    }

    /// Promote every staged entry, drop tombstones, bump `committed_at`.
    pub fn commit(&mut self, now: DateTime<Utc>) -> CommitOutcome {
        let mut outcome = CommitOutcome::default();
        let mut surviving = Vec::with_capacity(self.entries.len());

        for mut entry in std::mem::take(&mut self.entries) {
            if !entry.is_staged() {
                surviving.push(entry);
                continue;
            }
            if entry.tombstone {
                if !entry.pack_file_oid.is_nil() {
                    outcome.removed_packs.push(entry.pack_file_oid.clone());
                }
                continue;
            }
            if !entry.pack_file_oid.is_nil() && entry.pack_file_oid != entry.staged_pack_file_oid {
                outcome.removed_packs.push(entry.pack_file_oid.clone());
            }
            entry.pack_file_oid = entry.staged_pack_file_oid.clone();
            entry.staged = false;
            surviving.push(entry);
        }

        self.entries = surviving;
        for oid in &outcome.removed_packs {
            self.drop_pack_rows(oid);
            self.by_pack.remove(oid);
        }
        self.committed_at = now;
        outcome
    }

    /// Entries matching the pathspecs, in path order.
    pub fn walk<'a>(
        &'a self,
        pathspecs: &'a PathSpecs,
    ) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| pathspecs.matches(&e.relative_path))
    }

    pub fn objects_for_pack(&self, pack_oid: &Oid) -> Vec<&IndexObject> {
        self.objects
            .iter()
            .filter(|o| &o.pack_file_oid == pack_oid)
            .collect()
    }

    pub fn blobs_for_pack(&self, pack_oid: &Oid) -> Vec<&IndexBlob> {
        self.blobs
            .iter()
            .filter(|b| &b.pack_file_oid == pack_oid)
            .collect()
    }

    /// Every pack OID referenced by some entry (committed or staged).
    pub fn referenced_pack_oids(&self) -> BTreeSet<Oid> {
        let mut set = BTreeSet::new();
        for entry in &self.entries {
            if !entry.pack_file_oid.is_nil() {
                set.insert(entry.pack_file_oid.clone());
            }
            if !entry.staged_pack_file_oid.is_nil() {
                set.insert(entry.staged_pack_file_oid.clone());
            }
        }
        set
    }

    /// Every blob OID referenced by a referenced pack.
    pub fn referenced_blob_oids(&self) -> BTreeSet<Oid> {
        let packs = self.referenced_pack_oids();
        self.blobs
            .iter()
            .filter(|b| packs.contains(&b.pack_file_oid))
            .map(|b| b.oid.clone())
            .collect()
    }

    /// What `self` is missing relative to `other`: pack files and blobs
    /// referenced by `other`'s entries but absent from `self`.
    pub fn diff(&self, other: &Index) -> IndexDiff {
        let own_packs = self.referenced_pack_oids();
        let own_blobs = self.referenced_blob_oids();
        let missing_pack_files = other
            .referenced_pack_oids()
            .into_iter()
            .filter(|oid| !own_packs.contains(oid))
            .collect();
        let missing_blobs = other
            .referenced_blob_oids()
            .into_iter()
            .filter(|oid| !own_blobs.contains(oid))
            .collect();
        IndexDiff {
            missing_pack_files,
            missing_blobs,
        }
    }

    /// Detect drift between the index and the objects on disk (a crash
    /// between projection commit and index save can leave either side
    /// ahead). Returns human-readable warnings.
    pub fn verify(&self, store: &nt_pack::ObjectStore) -> Vec<String> {
        let mut warnings = Vec::new();
        for oid in self.referenced_pack_oids() {
            if !store.pack_exists(&oid) {
                let owner = self
                    .entry_by_pack(&oid)
                    .map(|e| e.relative_path.to_string())
                    .unwrap_or_default();
                warnings.push(format!(
                    "index references missing pack {} (entry '{}')",
                    oid.short(),
                    owner
                ));
            }
        }
        let referenced = self.referenced_pack_oids();
        if let Ok(on_disk) = store.enumerate() {
            for (oid, is_pack) in on_disk {
                if is_pack && !referenced.contains(&oid) {
                    warnings.push(format!("pack {} on disk is unreferenced", oid.short()));
                }
            }
        }
        warnings
    }

    fn take_abandoned(entry: &mut IndexEntry) -> Option<AbandonedPack> {
        if !entry.staged_pack_file_oid.is_nil()
            && entry.staged_pack_file_oid != entry.pack_file_oid
        {
            Some(AbandonedPack {
                oid: entry.staged_pack_file_oid.clone(),
                never_committed: entry.never_committed(),
            })
        } else {
            None
        }
    }

    fn find_or_insert<T>(
        &mut self,
        path: &RepoPath,
        apply: impl FnOnce(&mut IndexEntry) -> T,
    ) -> T {
        match self
            .entries
            .binary_search_by(|e| e.relative_path.cmp(path))
        {
            Ok(pos) => apply(&mut self.entries[pos]),
            Err(pos) => {
                let mut entry = IndexEntry {
                    relative_path: path.clone(),
                    mtime: epoch(),
                    size: 0,
                    pack_file_oid: Oid::nil(),
                    staged_pack_file_oid: Oid::nil(),
                    tombstone: false,
                    staged: false,
                };
                let result = apply(&mut entry);
                self.entries.insert(pos, entry);
                result
            }
        }
    }

    fn add_pack_rows(&mut self, pack: &PackFile) {
        for object in &pack.objects {
            self.objects.push(IndexObject {
                oid: object.oid.clone(),
                kind: object.kind,
                pack_file_oid: pack.oid.clone(),
            });
        }
        for blob in &pack.blobs {
            self.blobs.push(IndexBlob {
                oid: blob.oid.clone(),
                mime: blob.mime.clone(),
                tags: blob.tags.clone(),
                pack_file_oid: pack.oid.clone(),
            });
        }
    }

    fn drop_pack_rows(&mut self, pack_oid: &Oid) {
        self.objects.retain(|o| &o.pack_file_oid != pack_oid);
        self.blobs.retain(|b| &b.pack_file_oid != pack_oid);
    }

    fn reindex(&mut self) {
        self.entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        self.by_pack.clear();
        for entry in &self.entries {
            if !entry.pack_file_oid.is_nil() {
                self.by_pack
                    .insert(entry.pack_file_oid.clone(), entry.relative_path.clone());
            }
            if !entry.staged_pack_file_oid.is_nil() {
                self.by_pack
                    .insert(entry.staged_pack_file_oid.clone(), entry.relative_path.clone());
            }
        }
    }
}
