//! Markdown file model for the nt note-taking object store.
//!
//! A Markdown file is split into YAML front matter and a body; the body is
//! scanned into an ATX heading sequence with fenced-code awareness. The
//! raw content is always preserved untouched (it is what gets diffed);
//! typographic replacements apply only to the processed text handed to the
//! note builder.

mod error;
mod file;
mod media;
mod replace;
mod slug;

pub use error::MarkdownError;
pub use file::{Heading, MarkdownFile};
pub use media::{extract_media_refs, MediaRef};
pub use replace::apply_typographic_replacements;
pub use slug::{slug_from_path, slugify};

pub type Result<T> = std::result::Result<T, MarkdownError>;
