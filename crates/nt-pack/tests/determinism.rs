//! Pack bytes are deterministic under test doubles: the same working
//! tree, clock, and OID sequence always produce identical YAML.

use chrono::{DateTime, Utc};

use nt_object::{build_objects, ParsedFile, SchemaSet};
use nt_oid::use_counter;
use nt_pack::PackFile;
use nt_utils::RepoPath;

const GO_MD: &str = "---\ntags: [go]\n---\n# Go\n\n## Note: Syntax\n\nBraces.\n\n## Flashcard: Keywords\n\nHow many?\n\n---\n\n25.\n";

fn build_pack_yaml(now: DateTime<Utc>) -> String {
    let _guard = use_counter();
    let parsed = ParsedFile::build(
        &RepoPath::new("go/go.md"),
        GO_MD,
        None,
        &SchemaSet::default(),
        &[],
    )
    .unwrap();
    let objects = build_objects(&parsed, &[], now, &|_| None).unwrap();
    let pack = PackFile::from_objects(
        &RepoPath::new("go/go.md"),
        now,
        GO_MD.len() as u64,
        &objects,
        Vec::new(),
        None,
        now,
    )
    .unwrap();
    pack.to_yaml().unwrap()
}

#[test]
fn identical_inputs_identical_pack_bytes() {
    let now = DateTime::parse_from_rfc3339("2023-01-01T01:12:30Z")
        .unwrap()
        .with_timezone(&Utc);
    let first = build_pack_yaml(now);
    let second = build_pack_yaml(now);
    assert_eq!(first, second);
}
