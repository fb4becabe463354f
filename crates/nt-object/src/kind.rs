//! Note kinds recognized in typed headings.

use std::fmt;

/// The kind of a note, taken from a `Kind: Title` heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// An untyped heading promoted to a note.
    Free,
    Note,
    Flashcard,
    Quote,
    Reference,
    Cheatsheet,
    Journal,
    Todo,
    Artwork,
    Snippet,
}

impl NoteKind {
    /// Split a heading title of the form `Kind: Title`.
    pub fn from_heading(title: &str) -> Option<(NoteKind, String)> {
        let (kind, rest) = title.split_once(':')?;
        let kind = match kind.trim() {
            "Note" => NoteKind::Note,
            "Flashcard" => NoteKind::Flashcard,
            "Quote" => NoteKind::Quote,
            "Reference" => NoteKind::Reference,
            "Cheatsheet" => NoteKind::Cheatsheet,
            "Journal" => NoteKind::Journal,
            "Todo" => NoteKind::Todo,
            "Artwork" => NoteKind::Artwork,
            "Snippet" => NoteKind::Snippet,
            _ => return None,
        };
        Some((kind, rest.trim().to_string()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteKind::Free => "free",
            NoteKind::Note => "note",
            NoteKind::Flashcard => "flashcard",
            NoteKind::Quote => "quote",
            NoteKind::Reference => "reference",
            NoteKind::Cheatsheet => "cheatsheet",
            NoteKind::Journal => "journal",
            NoteKind::Todo => "todo",
            NoteKind::Artwork => "artwork",
            NoteKind::Snippet => "snippet",
        }
    }
}

impl fmt::Display for NoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
