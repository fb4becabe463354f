//! Repository-relative path algebra.
//!
//! Every path stored in the index, in pack files, or in the projection is a
//! `RepoPath`: forward slashes, no leading slash, no `.`/`..` segments.

use std::fmt;
use std::path::Path;

use crate::{Result, UtilError};

/// A normalized path relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RepoPath(String);

impl RepoPath {
    /// Build from an already-relative path string, normalizing separators
    /// and stripping any leading `./` or `/`.
    pub fn new(path: impl AsRef<str>) -> Self {
        let mut s = path.as_ref().replace('\\', "/");
        while let Some(rest) = s.strip_prefix("./") {
            s = rest.to_string();
        }
        let s = s.trim_start_matches('/').trim_end_matches('/').to_string();
        RepoPath(s)
    }

    /// Build from an absolute path known to live under `root`.
    pub fn from_abs(root: &Path, abs: &Path) -> Result<Self> {
        let rel = abs
            .strip_prefix(root)
            .map_err(|_| UtilError::NotRelative(abs.to_path_buf()))?;
        let s = rel
            .to_str()
            .ok_or_else(|| UtilError::NotRelative(abs.to_path_buf()))?;
        Ok(Self::new(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent directory ("" for top-level paths).
    pub fn parent(&self) -> RepoPath {
        match self.0.rfind('/') {
            Some(idx) => RepoPath(self.0[..idx].to_string()),
            None => RepoPath(String::new()),
        }
    }

    /// Final component.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Final component without its extension.
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    /// Extension without the dot, lowercased. Empty when absent.
    pub fn extension(&self) -> String {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => name[idx + 1..].to_ascii_lowercase(),
            _ => String::new(),
        }
    }

    /// Append a component.
    pub fn join(&self, component: &str) -> RepoPath {
        if self.0.is_empty() {
            RepoPath::new(component)
        } else {
            RepoPath::new(format!("{}/{}", self.0, component))
        }
    }

    /// The filesystem path under `root`.
    pub fn to_abs(&self, root: &Path) -> std::path::PathBuf {
        root.join(&self.0)
    }

    /// Iterate over the `/`-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Resolve a relative reference found inside the file at `self`.
    ///
    /// References are interpreted against the referring file's directory:
    /// a note `projects/the-notewriter/todo.md` linking
    /// `../../skills/programming.md` refers to `skills/programming.md`, and
    /// `medias/pic.png` refers to the `medias/` directory next to the note.
    /// A reference climbing above the repository root is an error.
    pub fn resolve_reference(&self, target: &str) -> Result<RepoPath> {
        let target = target.replace('\\', "/");
        let parent = self.parent();
        let mut owned: Vec<String> = if target.starts_with('/') {
            Vec::new()
        } else {
            parent.segments().map(str::to_string).collect()
        };
        for seg in target.split('/') {
            match seg {
                "" | "." => {}
                ".." => {
                    if owned.pop().is_none() {
                        return Err(UtilError::PathEscapesRoot(target.clone()));
                    }
                }
                other => owned.push(other.to_string()),
            }
        }
        Ok(RepoPath(owned.join("/")))
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepoPath {
    fn from(s: &str) -> Self {
        RepoPath::new(s)
    }
}

impl From<String> for RepoPath {
    fn from(s: String) -> Self {
        RepoPath::new(s)
    }
}

impl serde::Serialize for RepoPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for RepoPath {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Ok(RepoPath::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_prefixes() {
        assert_eq!(RepoPath::new("./go/go.md").as_str(), "go/go.md");
        assert_eq!(RepoPath::new("/go/go.md").as_str(), "go/go.md");
        assert_eq!(RepoPath::new("go\\go.md").as_str(), "go/go.md");
        assert_eq!(RepoPath::new("go/").as_str(), "go");
    }

    #[test]
    fn parent_and_file_name() {
        let p = RepoPath::new("references/books/index.md");
        assert_eq!(p.parent().as_str(), "references/books");
        assert_eq!(p.file_name(), "index.md");
        assert_eq!(p.file_stem(), "index");
        assert_eq!(p.extension(), "md");
        assert_eq!(RepoPath::new("todo.md").parent().as_str(), "");
    }

    #[test]
    fn resolve_reference_climbs_directories() {
        let referrer = RepoPath::new("projects/the-notewriter/todo.md");
        let resolved = referrer
            .resolve_reference("../../skills/programming.md")
            .unwrap();
        assert_eq!(resolved.as_str(), "skills/programming.md");
    }

    #[test]
    fn resolve_reference_sibling_medias() {
        let referrer = RepoPath::new("go/go.md");
        let resolved = referrer.resolve_reference("medias/gopher.png").unwrap();
        assert_eq!(resolved.as_str(), "go/medias/gopher.png");
    }

    #[test]
    fn resolve_reference_refuses_escape() {
        let referrer = RepoPath::new("todo.md");
        assert!(referrer.resolve_reference("../outside.md").is_err());
    }

    #[test]
    fn resolve_reference_anchored() {
        let referrer = RepoPath::new("go/go.md");
        let resolved = referrer.resolve_reference("/skills/go.md").unwrap();
        assert_eq!(resolved.as_str(), "skills/go.md");
    }
}
