use std::path::PathBuf;

use nt_oid::Oid;

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("pack file {} does not exist", .0.relative_path())]
    PackNotExist(Oid),

    #[error("blob {} does not exist", .0.relative_path())]
    BlobNotExist(Oid),

    #[error("corrupt pack file {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("invalid object payload: {0}")]
    Payload(String),

    #[error("media conversion failed for {}: {reason}", .path.display())]
    Conversion { path: PathBuf, reason: String },

    #[error(transparent)]
    Object(#[from] nt_object::ObjectError),

    #[error(transparent)]
    Util(#[from] nt_utils::UtilError),

    #[error("serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
