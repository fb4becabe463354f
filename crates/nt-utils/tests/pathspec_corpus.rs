//! Corpus-style pathspec tests plus matching properties.

use nt_utils::{PathSpec, PathSpecs, RepoPath};
use proptest::prelude::*;

#[test]
fn corpus() {
    // (pattern, path, expected)
    let cases: &[(&str, &str, bool)] = &[
        (".", "anything.md", true),
        ("/go.md", "go.md", true),
        ("/go.md", "go/go.md", false),
        ("go.md", "go/go.md", true),
        ("*.md", "notes/deep/file.md", true),
        ("*.md", "notes/deep/file.png", false),
        ("/notes/*.md", "notes/file.md", true),
        ("/notes/*.md", "notes/deep/file.md", false),
        ("/notes/**/*.md", "notes/deep/file.md", true),
        ("/notes/**/*.md", "notes/a/b/c.md", true),
        ("/notes/**", "notes/a/b/c.md", true),
        ("**/medias/*", "go/medias/gopher.png", true),
        ("medias/", "go/medias/gopher.png", true),
        ("/todo/", "todo/today.md", true),
        ("/todo/", "todolist/today.md", false),
        ("/projects", "projects/nt/todo.md", true),
        ("archive", "archive", true),
        ("archive", "deep/archive/x.md", true),
        ("?.md", "a.md", true),
        ("?.md", "ab.md", false),
    ];

    for &(pattern, path, expected) in cases {
        let spec = PathSpec::parse(pattern).unwrap();
        assert_eq!(
            spec.matches(&RepoPath::new(path)),
            expected,
            "pattern {pattern:?} vs path {path:?}"
        );
    }
}

#[test]
fn list_semantics() {
    let specs = PathSpecs::parse(&["/notes/", "!*.draft.md"]).unwrap();
    assert!(specs.matches(&RepoPath::new("notes/go.md")));
    assert!(!specs.matches(&RepoPath::new("notes/go.draft.md")));
    assert!(!specs.matches(&RepoPath::new("other/go.md")));
}

proptest! {
    /// An anchored literal pattern always matches exactly its own path.
    #[test]
    fn literal_matches_itself(segs in prop::collection::vec("[a-z]{1,8}", 1..4)) {
        let path = segs.join("/");
        let spec = PathSpec::parse(&format!("/{path}")).unwrap();
        prop_assert!(spec.matches(&RepoPath::new(&path)));
    }

    /// A list matches iff some positive spec matches and no negation does.
    #[test]
    fn list_is_positive_and_not_negated(
        segs in prop::collection::vec("[a-z]{1,8}", 1..4),
        negate in any::<bool>(),
    ) {
        let path = segs.join("/");
        let mut patterns = vec![".".to_string()];
        if negate {
            patterns.push(format!("!/{path}"));
        }
        let specs = PathSpecs::parse_owned(&patterns).unwrap();
        prop_assert_eq!(specs.matches(&RepoPath::new(&path)), !negate);
    }
}
