//! End-to-end scenarios over a real working tree.
//!
//! The OID generator and the clock are process-wide, so every test takes
//! the shared lock, installs its doubles, and restores them on drop.

use std::path::Path;
use std::sync::Mutex;

use nt_config::RemoteConfig;
use nt_oid::{use_counter, GeneratorGuard};
use nt_repository::{ChangeVerb, RepoError, Repository};
use nt_utils::{Clock, PathSpecs, RepoPath};

static TEST_LOCK: Mutex<()> = Mutex::new(());

const GO_MD: &str = "---\ntags: [go]\n---\n# Go\n\n![Gopher](medias/gopher.png)\n\n## Flashcard: Keywords\n\nHow many keywords does Go have?\n\n---\n\n25 keywords.\n";

// Field order matters: the generator guard and tempdir must drop before
// the lock releases, so a following test never sees half-restored state.
struct Fixture {
    _oids: GeneratorGuard,
    dir: tempfile::TempDir,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl Fixture {
    fn new() -> Fixture {
        let lock = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let oids = use_counter();
        Clock::freeze_at("2023-01-01T01:12:30Z");
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        // Deterministic media payloads, no ffmpeg.
        std::fs::write(
            dir.path().join(".nt/config"),
            "[medias]\ncommand = \"random\"\nparallel = 1\n",
        )
        .unwrap();
        Fixture {
            _oids: oids,
            dir,
            _lock: lock,
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn write_bytes(&self, rel: &str, bytes: &[u8]) {
        let path = self.root().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }

    fn open(&self) -> Repository {
        Repository::open_at(self.root()).unwrap()
    }

    fn with_remote(&self, dir: &Path) {
        std::fs::write(
            self.root().join(".nt/config"),
            format!(
                "[medias]\ncommand = \"random\"\nparallel = 1\n\n[remote]\ntype = \"fs\"\ndir = \"{}\"\n",
                dir.display()
            ),
        )
        .unwrap();
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        Clock::unfreeze();
    }
}

fn any() -> PathSpecs {
    PathSpecs::any()
}

#[test]
fn s1_first_add_and_commit() {
    let fx = Fixture::new();
    fx.write("go.md", GO_MD);
    fx.write_bytes("medias/gopher.png", b"not really a png");

    let mut repo = fx.open();
    repo.add(&any()).unwrap();
    assert!(repo.index().something_to_commit());
    repo.commit().unwrap();

    // One markdown entry plus the referenced media.
    let paths: Vec<&str> = repo
        .index()
        .entries()
        .iter()
        .map(|e| e.relative_path.as_str())
        .collect();
    assert_eq!(paths, vec!["go.md", "medias/gopher.png"]);

    let stats = repo.database().stats_in_db().unwrap();
    assert_eq!(stats.files, 1);
    assert!(stats.notes >= 1);
    assert_eq!(stats.flashcards, 1);
    assert_eq!(stats.medias, 1);

    // Every blob referenced by a pack is on disk.
    assert!(!repo.index().blobs().is_empty());
    for blob in repo.index().blobs() {
        assert!(fx
            .root()
            .join(".nt/objects")
            .join(format!("{}.blob", blob.oid.relative_path()))
            .is_file());
    }

    // Nothing left to commit.
    assert!(matches!(repo.commit(), Err(RepoError::NothingToCommit)));
}

#[test]
fn re_add_after_commit_is_stable() {
    let fx = Fixture::new();
    fx.write("go.md", GO_MD);
    fx.write_bytes("medias/gopher.png", b"not really a png");

    let mut repo = fx.open();
    repo.add(&any()).unwrap();
    repo.commit().unwrap();
    let index_bytes = std::fs::read(fx.root().join(".nt/index")).unwrap();

    repo.add(&any()).unwrap();
    assert!(repo.index().nothing_to_commit());
    let again = std::fs::read(fx.root().join(".nt/index")).unwrap();
    assert_eq!(index_bytes, again);
}

#[test]
fn s2_reset_returns_to_empty() {
    let fx = Fixture::new();
    fx.write("go.md", GO_MD);
    fx.write_bytes("medias/gopher.png", b"not really a png");

    let mut repo = fx.open();
    repo.add(&any()).unwrap();
    let staged_packs: Vec<_> = repo
        .index()
        .entries()
        .iter()
        .map(|e| e.staged_pack_file_oid.clone())
        .collect();
    assert!(!staged_packs.is_empty());

    repo.reset(&any()).unwrap();
    assert!(repo.index().is_empty());

    // Never-committed staged packs stay on disk (reclaimed by gc).
    for oid in &staged_packs {
        assert!(fx
            .root()
            .join(".nt/objects")
            .join(format!("{}.pack", oid.relative_path()))
            .is_file());
    }

    // But the projection holds no rows for the reset file.
    assert!(repo
        .database()
        .find_file_by_relative_path("go.md")
        .unwrap()
        .is_none());
    assert_eq!(repo.database().stats_in_db().unwrap().notes, 0);
}

#[test]
fn s3_status_splits_staged_and_unstaged() {
    let fx = Fixture::new();
    fx.write("go.md", GO_MD);
    fx.write_bytes("medias/gopher.png", b"not really a png");

    let mut repo = fx.open();
    repo.add(&PathSpecs::parse(&["/go.md"]).unwrap()).unwrap();
    fx.write("python.md", "# Python\n\n## Note: Zen\n\nSimple is better.\n");

    let report = repo.status(&any()).unwrap();
    let staged: Vec<&str> = report.staged.iter().map(|c| c.path.as_str()).collect();
    assert!(staged.contains(&"go.md"));
    assert!(staged.contains(&"medias/gopher.png"));
    assert!(report
        .staged
        .iter()
        .all(|c| c.verb == ChangeVerb::Added));

    let unstaged: Vec<&str> = report.unstaged.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(unstaged, vec!["python.md"]);

    let rendered = report.to_string();
    assert!(rendered.contains("Changes to be committed:"));
    assert!(rendered.contains("Changes not staged for commit:"));
}

#[test]
fn s4_push_pull_round_trip() {
    let fx1 = Fixture::new();
    let origin = tempfile::tempdir().unwrap();
    fx1.write("go.md", GO_MD);
    fx1.write_bytes("medias/gopher.png", b"not really a png");
    fx1.with_remote(origin.path());

    let mut r1 = fx1.open();
    r1.add(&any()).unwrap();
    r1.commit().unwrap();
    r1.push(false).unwrap();
    let r1_entries = r1.index().entries().len();
    let r1_objects = r1.index().objects().len();
    let r1_blobs = r1.index().blobs().len();
    drop(r1);
    drop(fx1);

    let fx2 = Fixture::new();
    fx2.with_remote(origin.path());
    let mut r2 = fx2.open();
    r2.pull(false).unwrap();

    assert_eq!(r2.index().entries().len(), r1_entries);
    assert_eq!(r2.index().objects().len(), r1_objects);
    assert_eq!(r2.index().blobs().len(), r1_blobs);

    // The projection was rebuilt from the fetched packs.
    let stats = r2.database().stats_in_db().unwrap();
    assert_eq!(stats.files, 1);
    assert_eq!(stats.flashcards, 1);

    // Push followed by pull against the same remote is a no-op.
    let before = std::fs::read(fx2.root().join(".nt/index")).unwrap();
    r2.push(false).unwrap();
    r2.pull(false).unwrap();
    let after = std::fs::read(fx2.root().join(".nt/index")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn s5_push_refuses_staged_changes() {
    let fx = Fixture::new();
    let origin = tempfile::tempdir().unwrap();
    fx.write("go.md", GO_MD);
    fx.write_bytes("medias/gopher.png", b"not really a png");
    fx.with_remote(origin.path());

    let mut repo = fx.open();
    repo.add(&any()).unwrap();
    let err = repo.push(false).unwrap_err();
    assert!(matches!(err, RepoError::StagedChangesPresent));
    assert_eq!(err.to_string(), "changes not committed");
}

#[test]
fn s6_repetitive_edits_keep_the_index_stable() {
    let fx = Fixture::new();
    fx.write("go.md", GO_MD);
    fx.write_bytes("medias/gopher.png", b"not really a png");

    let mut repo = fx.open();
    repo.add(&any()).unwrap();
    repo.commit().unwrap();
    let entries = repo.index().entries().len();
    let objects = repo.index().objects().len();
    let blobs = repo.index().blobs().len();

    for round in 0..3 {
        let edited = GO_MD.replace(
            "25 keywords.",
            &format!("25 keywords (checked {round} times)."),
        );
        fx.write("go.md", &edited);
        // The frozen clock would hide the edit from mtime comparison only
        // if the filesystem froze too; sizes differ anyway.
        repo.add(&any()).unwrap();
        repo.commit().unwrap();
    }

    assert_eq!(repo.index().entries().len(), entries);
    assert_eq!(repo.index().objects().len(), objects);
    assert_eq!(repo.index().blobs().len(), blobs);
}

#[test]
fn deleted_file_is_tombstoned_then_removed() {
    let fx = Fixture::new();
    fx.write("go.md", GO_MD);
    fx.write_bytes("medias/gopher.png", b"not really a png");

    let mut repo = fx.open();
    repo.add(&any()).unwrap();
    repo.commit().unwrap();

    std::fs::remove_file(fx.root().join("go.md")).unwrap();
    std::fs::remove_file(fx.root().join("medias/gopher.png")).unwrap();
    repo.add(&any()).unwrap();

    let tombstoned: Vec<&str> = repo
        .index()
        .entries()
        .iter()
        .filter(|e| e.tombstone)
        .map(|e| e.relative_path.as_str())
        .collect();
    assert_eq!(tombstoned, vec!["go.md", "medias/gopher.png"]);
    assert!(repo.index().entries().iter().all(|e| e.staged));

    repo.commit().unwrap();
    assert!(repo.index().is_empty());
    // Objects directory holds nothing referenced anymore.
    assert!(repo.index().referenced_pack_oids().is_empty());
}

#[test]
fn stable_oids_across_edits() {
    let fx = Fixture::new();
    fx.write("go.md", GO_MD);
    fx.write_bytes("medias/gopher.png", b"not really a png");

    let mut repo = fx.open();
    repo.add(&any()).unwrap();
    repo.commit().unwrap();
    let file_row = repo
        .database()
        .find_file_by_relative_path("go.md")
        .unwrap()
        .unwrap();

    let edited = GO_MD.replace("25 keywords.", "twenty-five keywords.");
    fx.write("go.md", &edited);
    repo.add(&any()).unwrap();
    repo.commit().unwrap();

    let after = repo
        .database()
        .find_file_by_relative_path("go.md")
        .unwrap()
        .unwrap();
    assert_eq!(file_row.oid, after.oid);
}

#[test]
fn ignored_front_matter_tag_skips_file() {
    let fx = Fixture::new();
    fx.write("secret.md", "---\ntags: [ignore]\n---\n# Secret\n");
    fx.write("go.md", "# Go\n\n## Note: N\n\nx\n");

    let mut repo = fx.open();
    repo.add(&any()).unwrap();
    let paths: Vec<&str> = repo
        .index()
        .entries()
        .iter()
        .map(|e| e.relative_path.as_str())
        .collect();
    assert_eq!(paths, vec!["go.md"]);
}

#[test]
fn lint_error_blocks_add() {
    let fx = Fixture::new();
    std::fs::write(
        fx.root().join(".nt/lint"),
        "rules:\n  - name: no-free-note\n    severity: error\n",
    )
    .unwrap();
    fx.write("loose.md", "# Loose heading\n\nFree text.\n");

    let mut repo = fx.open();
    let err = repo.add(&any()).unwrap_err();
    assert!(matches!(err, RepoError::LintFailed(1)));
    assert!(repo.index().is_empty());
}

#[test]
fn unknown_lint_rule_is_config_error() {
    let fx = Fixture::new();
    std::fs::write(
        fx.root().join(".nt/lint"),
        "rules:\n  - name: no-such-rule\n    severity: error\n",
    )
    .unwrap();
    let err = Repository::open_at(fx.root()).map(|_| ()).unwrap_err();
    assert!(err.to_string().contains("unknown lint rule \"no-such-rule\""));
}

#[test]
fn diff_staged_shows_edited_lines() {
    let fx = Fixture::new();
    fx.write("go.md", GO_MD);
    fx.write_bytes("medias/gopher.png", b"not really a png");

    let mut repo = fx.open();
    repo.add(&any()).unwrap();
    repo.commit().unwrap();

    let edited = GO_MD.replace("25 keywords.", "twenty-five keywords.");
    fx.write("go.md", &edited);
    repo.add(&any()).unwrap();

    let diff = repo.diff(&any(), true).unwrap();
    assert!(diff.contains("-25 keywords."));
    assert!(diff.contains("+twenty-five keywords."));
}

#[test]
fn parse_failure_aborts_add() {
    let fx = Fixture::new();
    fx.write("broken.md", "---\ntags: [unterminated\n");

    let mut repo = fx.open();
    let err = repo.add(&any()).unwrap_err();
    assert!(matches!(err, RepoError::ParseFailed { .. }));
}

#[test]
fn not_a_repository() {
    let _lock = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let err = Repository::open_at(dir.path()).map(|_| ()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "not a NoteWriter repository (or any parent up to 10 directories)"
    );
}

#[test]
fn remote_newer_gates_push() {
    let fx = Fixture::new();
    let origin = tempfile::tempdir().unwrap();
    fx.write("go.md", "# Go\n\n## Note: N\n\nx\n");
    fx.with_remote(origin.path());

    let mut repo = fx.open();
    repo.add(&any()).unwrap();
    repo.commit().unwrap();
    repo.push(false).unwrap();

    // Another writer pushes a newer index.
    Clock::freeze_at("2024-06-01T00:00:00Z");
    fx.write("go.md", "# Go\n\n## Note: N\n\nedited elsewhere\n");
    repo.add(&any()).unwrap();
    repo.commit().unwrap();
    repo.push(false).unwrap();

    // Roll the local clock back before an older commit tries to push.
    Clock::freeze_at("2023-06-01T00:00:00Z");
    fx.write("go.md", "# Go\n\n## Note: N\n\nstale edit\n");
    repo.add(&any()).unwrap();
    repo.commit().unwrap();
    let err = repo.push(false).unwrap_err();
    assert!(matches!(err, RepoError::RemoteNewer { .. }));

    // Force wins.
    repo.push(true).unwrap();
}
