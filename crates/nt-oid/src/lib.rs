//! Object identity for the nt note-taking object store.
//!
//! Every stored object carries a 40-character lowercase hexadecimal OID.
//! Logical objects (files, notes, flashcards, packs, …) get random OIDs
//! that survive content edits; blobs get content-hash OIDs (SHA-1 of their
//! bytes) so identical content deduplicates naturally.

mod error;
mod generator;
mod oid;

pub use error::OidError;
pub use generator::{set_generator, use_fixed, use_counter, use_sequence, GeneratorGuard, OidGenerator};
pub use oid::Oid;
