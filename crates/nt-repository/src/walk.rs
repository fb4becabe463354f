//! Working-tree traversal.

use std::path::Path;

use nt_utils::{order, PathSpecs, RepoPath};

use crate::Result;

/// Collect the Markdown files under `root`, ordered so that each
/// directory's `index.md` precedes its siblings and descendants.
///
/// Skips `.nt/`, `.git/`, paths matched by `.ntignore`, and anything that
/// is not a regular file.
pub fn walk_markdown_files(
    root: &Path,
    extensions: &[String],
    ignore: &PathSpecs,
) -> Result<Vec<RepoPath>> {
    let mut paths = Vec::new();
    walk_dir(root, root, extensions, ignore, &mut paths)?;
    order::sort_index_files_first(&mut paths);
    Ok(paths)
}

fn walk_dir(
    root: &Path,
    dir: &Path,
    extensions: &[String],
    ignore: &PathSpecs,
    out: &mut Vec<RepoPath>,
) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name == ".nt" || name == ".git" {
            continue;
        }

        let path = entry.path();
        let rel = RepoPath::from_abs(root, &path)?;
        if ignore.matches(&rel) {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_dir(root, &path, extensions, ignore, out)?;
        } else if file_type.is_file() {
            let ext = rel.extension();
            if extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
                out.push(rel);
            }
        }
        // Symlinks and other non-regular files are skipped.
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "# x\n").unwrap();
    }

    #[test]
    fn walks_in_index_first_order() {
        let dir = tempfile::tempdir().unwrap();
        for rel in [
            "appendix.md",
            "index.md",
            "references/books/a.md",
            "references/books/index.md",
            "references/index.md",
            "todo/do.md",
            "todo/index.md",
        ] {
            touch(dir.path(), rel);
        }
        touch(dir.path(), ".nt/index.md"); // must be skipped
        touch(dir.path(), ".git/config.md"); // must be skipped
        std::fs::write(dir.path().join("gopher.png"), b"png").unwrap();

        let extensions = vec!["md".to_string(), "markdown".to_string()];
        let paths =
            walk_markdown_files(dir.path(), &extensions, &PathSpecs::default()).unwrap();
        let got: Vec<&str> = paths.iter().map(RepoPath::as_str).collect();
        assert_eq!(
            got,
            vec![
                "index.md",
                "appendix.md",
                "references/index.md",
                "references/books/index.md",
                "references/books/a.md",
                "todo/index.md",
                "todo/do.md",
            ]
        );
    }

    #[test]
    fn ntignore_prunes() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "keep.md");
        touch(dir.path(), "drafts/wip.md");
        let ignore = PathSpecs::parse(&["drafts/"]).unwrap();
        let extensions = vec!["md".to_string()];
        let paths = walk_markdown_files(dir.path(), &extensions, &ignore).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].as_str(), "keep.md");
    }
}
