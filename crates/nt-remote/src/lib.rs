//! Remote object stores.
//!
//! A remote holds exactly three key shapes: `index`, `<aa>/<oid>.pack`,
//! and `<aa>/<oid>.blob` (no leading slash). Two backends exist — a local
//! directory mirror and an S3-compatible bucket — with identical
//! semantics from the core's perspective. The trait is blocking; the S3
//! backend confines async to this crate behind an owned runtime, the way
//! the rest of the store stays synchronous.

mod fs;
mod s3;

pub use fs::FsRemote;
pub use s3::S3Remote;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote object '{0}' does not exist")]
    ObjectNotExist(String),

    #[error("remote backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/// A remote object store.
pub trait Remote {
    fn get_object(&self, key: &str) -> Result<Vec<u8>>;
    fn put_object(&self, key: &str, bytes: &[u8]) -> Result<()>;
    fn delete_object(&self, key: &str) -> Result<()>;
    /// Reclaim backend-specific garbage (empty fan-out directories, …).
    fn gc(&self) -> Result<()>;
}

/// The key holding the serialized index.
pub const INDEX_KEY: &str = "index";
