use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a NoteWriter repository (or any parent up to 10 directories)")]
    NotARepository(PathBuf),

    #[error(transparent)]
    ConfigInvalid(#[from] nt_config::ConfigError),

    #[error("lint failed with {0} error(s)")]
    LintFailed(usize),

    #[error("cannot parse {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("nothing to commit")]
    NothingToCommit,

    #[error("changes not committed")]
    StagedChangesPresent,

    #[error("no remote found")]
    NoRemote,

    #[error("remote is newer (committed at {remote}); use --force to overwrite")]
    RemoteNewer { remote: String },

    #[error("local index is newer than the remote; use --force to overwrite")]
    LocalNewer,

    #[error(transparent)]
    ObjectNotExist(nt_remote::RemoteError),

    #[error(transparent)]
    Index(#[from] nt_index::IndexError),

    #[error(transparent)]
    Pack(#[from] nt_pack::PackError),

    #[error(transparent)]
    Object(#[from] nt_object::ObjectError),

    #[error(transparent)]
    Db(#[from] nt_db::DbError),

    #[error(transparent)]
    Util(#[from] nt_utils::UtilError),

    #[error("remote backend: {0}")]
    Backend(nt_remote::RemoteError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<nt_remote::RemoteError> for RepoError {
    fn from(err: nt_remote::RemoteError) -> Self {
        match err {
            nt_remote::RemoteError::ObjectNotExist(_) => RepoError::ObjectNotExist(err),
            other => RepoError::Backend(other),
        }
    }
}
