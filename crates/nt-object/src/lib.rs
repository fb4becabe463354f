//! Object model and parsed-file builder for the nt note-taking object store.
//!
//! Markdown files parse into [`ParsedFile`] values (notes, flashcards,
//! media references); object construction then turns a `ParsedFile` plus
//! the previous committed object set into File/Note/Flashcard/Media/
//! GoLink/Reminder/Relation objects with stable OIDs.

mod attributes;
mod builder;
mod error;
mod kind;
mod objects;
mod reminder;
mod schema;
mod value;

pub use attributes::{AttributeSet, TagSet, IGNORE_TAG};
pub use builder::{Generator, IdentityGenerator, ParsedFile, ParsedMedia, ParsedNote};
pub use error::ObjectError;
pub use kind::NoteKind;
pub use objects::{
    build_media, build_objects, File, Flashcard, GoLink, Media, MediaKind, Note, Object,
    ObjectKind, Relation, RelationKind,
};
pub use reminder::next_reminder_date;
pub use schema::{AttributeDef, AttributeType, Schema, SchemaSet};
pub use value::Value;

pub type Result<T> = std::result::Result<T, ObjectError>;
