//! Pack file and blob storage.
//!
//! A pack file is the atomic unit of storage: one YAML document grouping
//! every object derived from a single source file, plus references to the
//! blobs (media derivatives) it produced. Packs and blobs live under
//! `.nt/objects/<aa>/` keyed by OID and are written atomically so no
//! reader ever observes a partial file.

mod blob;
mod data;
mod error;
mod media;
mod pack;

pub use blob::ObjectStore;
pub use data::ObjectData;
pub use error::PackError;
pub use media::{
    convert_all, mime_for_extension, BlobPayload, FfmpegConverter, MediaConverter, RandomConverter,
};
pub use pack::{BlobRef, PackFile, PackObject};

pub type Result<T> = std::result::Result<T, PackError>;
