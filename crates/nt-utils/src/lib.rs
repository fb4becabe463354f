//! Foundation utilities for the nt note-taking object store.
//!
//! This crate provides repository-relative path handling, gitignore-style
//! pathspec matching, the process clock (freezable in tests), and the
//! atomic temp-file writer used by every on-disk mutation.

pub mod clock;
pub mod error;
pub mod order;
pub mod path;
pub mod pathspec;
pub mod tempfile;

pub use clock::Clock;
pub use error::UtilError;
pub use path::RepoPath;
pub use pathspec::{PathSpec, PathSpecs};
pub use tempfile::TempFile;

pub type Result<T> = std::result::Result<T, UtilError>;

/// Marker threaded through writers to suppress disk side-effects.
///
/// `status` and `diff` run the full parse/pack pipeline in dry-run so they
/// can report OIDs and structure without writing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DryRun {
    #[default]
    Disabled,
    Enabled,
}

impl DryRun {
    pub fn is_enabled(self) -> bool {
        matches!(self, DryRun::Enabled)
    }
}
