use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error("invalid pathspec '{spec}': {reason}")]
    InvalidPathSpec { spec: String, reason: String },

    #[error("path escapes the repository root: {0}")]
    PathEscapesRoot(String),

    #[error("not a repository-relative path: {}", .0.display())]
    NotRelative(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
