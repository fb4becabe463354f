//! Slug derivation.
//!
//! The slug is the stable human-readable identifier of a file. Front
//! matter wins; otherwise the slug is derived from the repo-relative path:
//! directory segments plus the file stem, dropping a trailing `index` stem
//! and collapsing adjacent duplicate segments (`go/go.md` → `go`).

use nt_utils::RepoPath;

/// Lowercase a free-form string into slug form: alphanumeric runs
/// separated by single dashes.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            for lower in c.to_lowercase() {
                out.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Derive a slug from a repo-relative path.
pub fn slug_from_path(path: &RepoPath) -> String {
    let mut segments: Vec<String> = path.parent().segments().map(slugify).collect();
    let stem = slugify(path.file_stem());
    if !stem.eq_ignore_ascii_case("index") {
        segments.push(stem);
    }
    segments.dedup();
    segments.retain(|s| !s.is_empty());
    segments.join("-")
}
