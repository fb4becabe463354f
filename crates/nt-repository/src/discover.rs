//! Repository discovery.
//!
//! `NT_HOME` overrides discovery entirely. Otherwise the search starts at
//! the working directory and ascends at most 10 ancestors looking for a
//! `.nt/` directory, refusing to climb above the user's home directory.

use std::path::{Path, PathBuf};

use crate::{RepoError, Result};

const MAX_ASCENT: usize = 10;

/// Find the repository root (the directory containing `.nt/`).
pub fn discover(start: &Path) -> Result<PathBuf> {
    if let Ok(home) = std::env::var("NT_HOME") {
        let root = PathBuf::from(home);
        if root.join(".nt").is_dir() {
            return Ok(root);
        }
        return Err(RepoError::NotARepository(root));
    }
    discover_from(start, user_home().as_deref())
}

/// Discovery with an explicit ceiling (for tests).
pub fn discover_from(start: &Path, ceiling: Option<&Path>) -> Result<PathBuf> {
    let start = std::fs::canonicalize(start)
        .map_err(|_| RepoError::NotARepository(start.to_path_buf()))?;
    let ceiling = ceiling.and_then(|c| std::fs::canonicalize(c).ok());

    let mut current = start.clone();
    for _ in 0..MAX_ASCENT {
        if current.join(".nt").is_dir() {
            return Ok(current);
        }
        if ceiling.as_deref() == Some(current.as_path()) {
            break;
        }
        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }
    Err(RepoError::NotARepository(start))
}

fn user_home() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nt_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".nt")).unwrap();
        let nested = dir.path().join("references").join("books");
        std::fs::create_dir_all(&nested).unwrap();

        let root = discover_from(&nested, None).unwrap();
        assert_eq!(root, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn refuses_to_cross_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".nt")).unwrap();
        let home = dir.path().join("home");
        let nested = home.join("projects");
        std::fs::create_dir_all(&nested).unwrap();

        // .nt sits above the ceiling: never found.
        assert!(matches!(
            discover_from(&nested, Some(&home)),
            Err(RepoError::NotARepository(_))
        ));
    }

    #[test]
    fn gives_up_after_ten_levels() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".nt")).unwrap();
        let mut deep = dir.path().to_path_buf();
        for i in 0..11 {
            deep = deep.join(format!("d{i}"));
        }
        std::fs::create_dir_all(&deep).unwrap();
        assert!(discover_from(&deep, None).is_err());
    }
}
