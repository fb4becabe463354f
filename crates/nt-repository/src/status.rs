//! `nt status` and `nt diff`: read-only views over the staging area.

use std::collections::BTreeMap;
use std::fmt;

use similar::TextDiff;

use nt_object::Object;
use nt_oid::Oid;
use nt_pack::PackFile;
use nt_utils::{PathSpecs, RepoPath};

use crate::walk::walk_markdown_files;
use crate::{Repository, Result};

/// What happened to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeVerb {
    Added,
    Modified,
    Deleted,
}

impl ChangeVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeVerb::Added => "added",
            ChangeVerb::Modified => "modified",
            ChangeVerb::Deleted => "deleted",
        }
    }
}

/// One line of status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub path: RepoPath,
    pub verb: ChangeVerb,
    /// Inner objects added / modified / deleted, derived from pack-object
    /// creation times (zero for unstaged changes, which are stat-only).
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
}

/// The two halves of `nt status`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub staged: Vec<StatusChange>,
    pub unstaged: Vec<StatusChange>,
}

impl StatusReport {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty()
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(f, "nothing to commit, working tree clean");
        }
        if !self.staged.is_empty() {
            writeln!(f, "Changes to be committed:")?;
            for change in &self.staged {
                write!(f, "  {}: {}", change.verb.as_str(), change.path)?;
                let total = change.added + change.modified + change.deleted;
                if total > 0 {
                    write!(
                        f,
                        " ({} added, {} modified, {} deleted)",
                        change.added, change.modified, change.deleted
                    )?;
                }
                writeln!(f)?;
            }
        }
        if !self.unstaged.is_empty() {
            if !self.staged.is_empty() {
                writeln!(f)?;
            }
            writeln!(f, "Changes not staged for commit:")?;
            for change in &self.unstaged {
                writeln!(f, "  {}: {}", change.verb.as_str(), change.path)?;
            }
        }
        Ok(())
    }
}

impl Repository {
    /// Compute the status report. No side-effects: nothing is parsed,
    /// packed, or written.
    pub fn status(&self, pathspecs: &PathSpecs) -> Result<StatusReport> {
        let mut report = StatusReport::default();

        for entry in self.index.staged_entries() {
            if !pathspecs.matches(&entry.relative_path) {
                continue;
            }
            let change = if entry.tombstone {
                let deleted = self.count_objects(&entry.pack_file_oid)?;
                StatusChange {
                    path: entry.relative_path.clone(),
                    verb: ChangeVerb::Deleted,
                    added: 0,
                    modified: 0,
                    deleted,
                }
            } else if entry.never_committed() {
                let added = self.count_objects(&entry.staged_pack_file_oid)?;
                StatusChange {
                    path: entry.relative_path.clone(),
                    verb: ChangeVerb::Added,
                    added,
                    modified: 0,
                    deleted: 0,
                }
            } else {
                let (added, modified, deleted) = self.compare_packs(
                    &entry.pack_file_oid,
                    &entry.staged_pack_file_oid,
                )?;
                StatusChange {
                    path: entry.relative_path.clone(),
                    verb: ChangeVerb::Modified,
                    added,
                    modified,
                    deleted,
                }
            };
            report.staged.push(change);
        }

        // Unstaged: stat the working tree against the index.
        let files = walk_markdown_files(
            &self.root,
            &self.config.core.extensions,
            &self.ignore,
        )?;
        for rel in files {
            if !pathspecs.matches(&rel) {
                continue;
            }
            let (mtime, size) = super::stat(&rel.to_abs(&self.root))?;
            match self.index.entry(&rel) {
                None => report.unstaged.push(StatusChange {
                    path: rel,
                    verb: ChangeVerb::Added,
                    added: 0,
                    modified: 0,
                    deleted: 0,
                }),
                Some(entry) if entry.mtime != mtime || entry.size != size => {
                    report.unstaged.push(StatusChange {
                        path: rel,
                        verb: ChangeVerb::Modified,
                        added: 0,
                        modified: 0,
                        deleted: 0,
                    })
                }
                Some(_) => {}
            }
        }

        // Entries whose source vanished from the working tree.
        for entry in self.index.entries() {
            if entry.tombstone || !pathspecs.matches(&entry.relative_path) {
                continue;
            }
            let abs = entry.relative_path.to_abs(&self.root);
            if !abs.is_file() {
                report.unstaged.push(StatusChange {
                    path: entry.relative_path.clone(),
                    verb: ChangeVerb::Deleted,
                    added: 0,
                    modified: 0,
                    deleted: 0,
                });
            } else if !self.is_markdown(&entry.relative_path) {
                // Media entries never appear in the markdown walk above.
                let (mtime, size) = super::stat(&abs)?;
                if entry.mtime != mtime || entry.size != size {
                    report.unstaged.push(StatusChange {
                        path: entry.relative_path.clone(),
                        verb: ChangeVerb::Modified,
                        added: 0,
                        modified: 0,
                        deleted: 0,
                    });
                }
            }
        }

        report.unstaged.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(report)
    }

    /// Unified diffs of object content.
    ///
    /// Staged mode pairs each staged entry's committed and staged packs.
    /// Unstaged mode diffs the in-memory parse against the current pack
    /// (dry-run: nothing is written).
    pub fn diff(&self, pathspecs: &PathSpecs, staged: bool) -> Result<String> {
        let mut out = String::new();
        if staged {
            for entry in self.index.staged_entries() {
                if !pathspecs.matches(&entry.relative_path) {
                    continue;
                }
                let old = self.read_objects(&entry.pack_file_oid)?;
                let new = if entry.tombstone {
                    Vec::new()
                } else {
                    self.read_objects(&entry.staged_pack_file_oid)?
                };
                diff_object_sets(&mut out, &entry.relative_path, &old, &new);
            }
            return Ok(out);
        }

        // Unstaged: parse matching working-tree files in memory.
        let files = walk_markdown_files(
            &self.root,
            &self.config.core.extensions,
            &self.ignore,
        )?;
        let now = nt_utils::Clock::now();
        let mut parent_cache = BTreeMap::new();
        for rel in files {
            if !pathspecs.matches(&rel) {
                continue;
            }
            let abs = rel.to_abs(&self.root);
            let (mtime, size) = super::stat(&abs)?;
            if let Some(entry) = self.index.entry(&rel) {
                if entry.mtime == mtime && entry.size == size {
                    continue;
                }
            }
            let content = std::fs::read_to_string(&abs)?;
            let parent = self.parent_attributes(&rel, &mut parent_cache)?;
            let parsed = nt_object::ParsedFile::build(
                &rel,
                &content,
                parent.as_ref(),
                &self.lint.schemas,
                &[],
            )?;
            if parsed.ignored() {
                continue;
            }
            let prior_pack = self.current_pack(&rel)?;
            let prior_objects = match &prior_pack {
                Some(pack) => pack.decode_objects()?,
                None => Vec::new(),
            };
            let objects =
                nt_object::build_objects(&parsed, &prior_objects, now, &|_| None)?;
            diff_object_sets(&mut out, &rel, &prior_objects, &objects);
        }

        // Deleted sources: diff committed objects against nothing.
        for entry in self.index.entries() {
            if entry.tombstone || !pathspecs.matches(&entry.relative_path) {
                continue;
            }
            if entry.relative_path.to_abs(&self.root).is_file() {
                continue;
            }
            let old = self.read_objects(entry.current_pack_oid())?;
            diff_object_sets(&mut out, &entry.relative_path, &old, &[]);
        }
        Ok(out)
    }

    fn count_objects(&self, pack_oid: &Oid) -> Result<usize> {
        if pack_oid.is_nil() {
            return Ok(0);
        }
        Ok(self.store.read_pack(pack_oid)?.objects.len())
    }

    fn read_objects(&self, pack_oid: &Oid) -> Result<Vec<Object>> {
        if pack_oid.is_nil() {
            return Ok(Vec::new());
        }
        Ok(self.store.read_pack(pack_oid)?.decode_objects()?)
    }

    /// (added, modified, deleted) pack objects between two packs, keyed by
    /// OID with modification detected through the object version ctime.
    fn compare_packs(&self, old_oid: &Oid, new_oid: &Oid) -> Result<(usize, usize, usize)> {
        let old = self.store.read_pack(old_oid)?;
        let new = self.store.read_pack(new_oid)?;
        Ok(compare_pack_objects(&old, &new))
    }
}

pub(crate) fn compare_pack_objects(old: &PackFile, new: &PackFile) -> (usize, usize, usize) {
    let mut added = 0;
    let mut modified = 0;
    let mut deleted = 0;
    for object in &new.objects {
        match old.find_object(&object.oid) {
            None => added += 1,
            Some(prev) if prev.ctime != object.ctime => modified += 1,
            Some(_) => {}
        }
    }
    for object in &old.objects {
        if new.find_object(&object.oid).is_none() {
            deleted += 1;
        }
    }
    (added, modified, deleted)
}

/// Emit unified diffs between two object sets of the same source file.
fn diff_object_sets(out: &mut String, path: &RepoPath, old: &[Object], new: &[Object]) {
    for object in new {
        let before = old
            .iter()
            .find(|o| o.oid() == object.oid())
            .map(Object::raw_content)
            .unwrap_or_default();
        let after = object.raw_content();
        if before != after {
            push_diff(out, path, &object.description(), &before, &after);
        }
    }
    for object in old {
        if !new.iter().any(|o| o.oid() == object.oid()) {
            push_diff(
                out,
                path,
                &object.description(),
                &object.raw_content(),
                "",
            );
        }
    }
}

fn push_diff(out: &mut String, path: &RepoPath, description: &str, old: &str, new: &str) {
    let diff = TextDiff::from_lines(old, new);
    out.push_str(&format!("--- a/{path} ({description})\n"));
    out.push_str(&format!("+++ b/{path} ({description})\n"));
    out.push_str(
        &diff
            .unified_diff()
            .context_radius(3)
            .to_string(),
    );
    if !out.ends_with('\n') {
        out.push('\n');
    }
}
