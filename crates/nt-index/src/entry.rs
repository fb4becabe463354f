//! Index rows: entries plus the derived object/blob views.

use chrono::{DateTime, Utc};

use nt_object::{ObjectKind, TagSet};
use nt_oid::Oid;
use nt_utils::RepoPath;

/// One source path present in the store.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IndexEntry {
    pub relative_path: RepoPath,
    /// Last seen modification time of the source file.
    pub mtime: DateTime<Utc>,
    /// Last seen size of the source file.
    pub size: u64,
    /// The committed pack (nil until the first commit).
    pub pack_file_oid: Oid,
    /// The staged pack (equals `pack_file_oid` when nothing is staged).
    pub staged_pack_file_oid: Oid,
    /// Entry scheduled for deletion on the next commit.
    pub tombstone: bool,
    /// Stored staging flag, kept in sync with [`IndexEntry::is_staged`].
    pub staged: bool,
}

impl IndexEntry {
    /// Staged ⇔ the staged pack differs from the committed one, or the
    /// entry carries a tombstone.
    pub fn is_staged(&self) -> bool {
        self.staged_pack_file_oid != self.pack_file_oid || self.tombstone
    }

    /// The pack currently describing this entry: staged when present,
    /// committed otherwise.
    pub fn current_pack_oid(&self) -> &Oid {
        if self.staged_pack_file_oid.is_nil() {
            &self.pack_file_oid
        } else {
            &self.staged_pack_file_oid
        }
    }

    /// Never committed: unstaging such an entry removes it entirely.
    pub fn never_committed(&self) -> bool {
        self.pack_file_oid.is_nil()
    }
}

/// Derived view: one row per pack object, with a back-pointer to its pack.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IndexObject {
    pub oid: Oid,
    pub kind: ObjectKind,
    pub pack_file_oid: Oid,
}

/// Derived view: one row per referenced blob.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IndexBlob {
    pub oid: Oid,
    pub mime: String,
    pub tags: TagSet,
    pub pack_file_oid: Oid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> IndexEntry {
        IndexEntry {
            relative_path: RepoPath::new("go.md"),
            mtime: DateTime::<Utc>::UNIX_EPOCH,
            size: 0,
            pack_file_oid: Oid::nil(),
            staged_pack_file_oid: Oid::nil(),
            tombstone: false,
            staged: false,
        }
    }

    #[test]
    fn fresh_entry_is_not_staged() {
        assert!(!entry().is_staged());
    }

    #[test]
    fn differing_staged_pack_means_staged() {
        let mut e = entry();
        e.staged_pack_file_oid = Oid::from_bytes(b"new");
        assert!(e.is_staged());
    }

    #[test]
    fn tombstone_means_staged() {
        let mut e = entry();
        e.pack_file_oid = Oid::from_bytes(b"old");
        e.staged_pack_file_oid = e.pack_file_oid.clone();
        e.tombstone = true;
        assert!(e.is_staged());
    }
}
