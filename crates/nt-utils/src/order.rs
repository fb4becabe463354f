//! Working-tree visit ordering.
//!
//! Parent attributes must be available when a child file is parsed, so the
//! directory walk visits `index.md` (any case, any Markdown extension)
//! before its siblings. Everything else follows lexical order.

use std::cmp::Ordering;

use crate::path::RepoPath;

/// True when the path's base name (without extension) is `index`,
/// case-insensitively.
pub fn is_index_file(path: &RepoPath) -> bool {
    path.file_stem().eq_ignore_ascii_case("index")
}

/// Compare two sibling-or-deeper paths so that within each directory the
/// index file precedes every other file, and files otherwise sort lexically.
pub fn index_files_first(a: &RepoPath, b: &RepoPath) -> Ordering {
    let a_segs: Vec<&str> = a.segments().collect();
    let b_segs: Vec<&str> = b.segments().collect();
    let a_len = a_segs.len();
    let b_len = b_segs.len();

    for i in 0..a_len.min(b_len) {
        let a_last = i + 1 == a_len;
        let b_last = i + 1 == b_len;
        if a_last && b_last {
            // Same directory: index file wins, then lexical.
            let a_index = is_index_file(a);
            let b_index = is_index_file(b);
            return match (a_index, b_index) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => a_segs[i].cmp(b_segs[i]),
            };
        }
        if a_last != b_last {
            // A file vs. deeper content in the same directory: the
            // directory's index file precedes everything below it, other
            // files sort by name against the subdirectory.
            if a_last && is_index_file(a) {
                return Ordering::Less;
            }
            if b_last && is_index_file(b) {
                return Ordering::Greater;
            }
            return a_segs[i].cmp(b_segs[i]).then(if a_last {
                Ordering::Less
            } else {
                Ordering::Greater
            });
        }
        match a_segs[i].cmp(b_segs[i]) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a_len.cmp(&b_len)
}

/// Sort a list of paths with [`index_files_first`].
pub fn sort_index_files_first(paths: &mut [RepoPath]) {
    paths.sort_by(|a, b| index_files_first(a, b));
}
