//! On-disk object store: `.nt/objects/<aa>/<oid>.{pack,blob}`.

use std::path::{Path, PathBuf};

use nt_oid::Oid;
use nt_utils::{tempfile::write_atomic, DryRun};

use crate::pack::PackFile;
use crate::{PackError, Result};

/// Reader/writer for the objects directory.
///
/// All writes are atomic (temp file + rename). Blob writes are
/// additionally idempotent: content-addressing means an existing file
/// already holds the right bytes, so a lost rename race is a success.
pub struct ObjectStore {
    objects_dir: PathBuf,
    dry_run: DryRun,
}

impl ObjectStore {
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        ObjectStore {
            objects_dir: objects_dir.into(),
            dry_run: DryRun::Disabled,
        }
    }

    /// A store that computes everything but never touches the disk.
    pub fn dry_run(objects_dir: impl Into<PathBuf>) -> Self {
        ObjectStore {
            objects_dir: objects_dir.into(),
            dry_run: DryRun::Enabled,
        }
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run.is_enabled()
    }

    pub fn pack_path(&self, oid: &Oid) -> PathBuf {
        self.objects_dir.join(format!("{}.pack", oid.relative_path()))
    }

    pub fn blob_path(&self, oid: &Oid) -> PathBuf {
        self.objects_dir.join(format!("{}.blob", oid.relative_path()))
    }

    pub fn pack_exists(&self, oid: &Oid) -> bool {
        self.pack_path(oid).is_file()
    }

    pub fn blob_exists(&self, oid: &Oid) -> bool {
        self.blob_path(oid).is_file()
    }

    /// Write a pack file atomically.
    pub fn write_pack(&self, pack: &PackFile) -> Result<()> {
        if self.dry_run.is_enabled() {
            return Ok(());
        }
        let yaml = pack.to_yaml()?;
        write_atomic(self.pack_path(&pack.oid), yaml.as_bytes())?;
        tracing::debug!(oid = %pack.oid, path = %pack.file_relative_path, "wrote pack");
        Ok(())
    }

    /// Write a blob, at most once: an existing file wins.
    pub fn write_blob(&self, oid: &Oid, bytes: &[u8]) -> Result<()> {
        if self.dry_run.is_enabled() || self.blob_exists(oid) {
            return Ok(());
        }
        write_atomic(self.blob_path(oid), bytes)?;
        tracing::debug!(oid = %oid, size = bytes.len(), "wrote blob");
        Ok(())
    }

    pub fn read_pack(&self, oid: &Oid) -> Result<PackFile> {
        let path = self.pack_path(oid);
        if !path.is_file() {
            return Err(PackError::PackNotExist(oid.clone()));
        }
        PackFile::read_from(&path)
    }

    pub fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>> {
        let path = self.blob_path(oid);
        if !path.is_file() {
            return Err(PackError::BlobNotExist(oid.clone()));
        }
        Ok(std::fs::read(path)?)
    }

    pub fn delete_pack(&self, oid: &Oid) -> Result<()> {
        if self.dry_run.is_enabled() {
            return Ok(());
        }
        let path = self.pack_path(oid);
        if path.is_file() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn delete_blob(&self, oid: &Oid) -> Result<()> {
        if self.dry_run.is_enabled() {
            return Ok(());
        }
        let path = self.blob_path(oid);
        if path.is_file() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Enumerate every `(oid, is_pack)` present on disk.
    pub fn enumerate(&self) -> Result<Vec<(Oid, bool)>> {
        let mut out = Vec::new();
        if !self.objects_dir.is_dir() {
            return Ok(out);
        }
        for fan in std::fs::read_dir(&self.objects_dir)? {
            let fan = fan?;
            if !fan.file_type()?.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(fan.path())? {
                let entry = entry?;
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                let (stem, is_pack) = match name.strip_suffix(".pack") {
                    Some(stem) => (stem, true),
                    None => match name.strip_suffix(".blob") {
                        Some(stem) => (stem, false),
                        None => continue,
                    },
                };
                if let Ok(oid) = Oid::parse(stem) {
                    out.push((oid, is_pack));
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use nt_utils::RepoPath;

    fn sample_pack() -> PackFile {
        let now: DateTime<Utc> = DateTime::parse_from_rfc3339("2023-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        PackFile::from_objects(&RepoPath::new("go.md"), now, 0, &[], Vec::new(), None, now)
            .unwrap()
    }

    #[test]
    fn pack_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let pack = sample_pack();
        store.write_pack(&pack).unwrap();
        assert!(store.pack_exists(&pack.oid));
        assert_eq!(store.read_pack(&pack.oid).unwrap(), pack);
    }

    #[test]
    fn blob_write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let oid = Oid::from_bytes(b"payload");
        store.write_blob(&oid, b"payload").unwrap();
        let mtime = std::fs::metadata(store.blob_path(&oid)).unwrap().modified().unwrap();
        store.write_blob(&oid, b"payload").unwrap();
        let mtime2 = std::fs::metadata(store.blob_path(&oid)).unwrap().modified().unwrap();
        assert_eq!(mtime, mtime2);
        assert_eq!(store.read_blob(&oid).unwrap(), b"payload");
    }

    #[test]
    fn dry_run_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::dry_run(dir.path());
        let pack = sample_pack();
        store.write_pack(&pack).unwrap();
        store.write_blob(&Oid::from_bytes(b"x"), b"x").unwrap();
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn missing_objects_are_not_exist_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let oid = Oid::from_bytes(b"missing");
        assert!(matches!(
            store.read_pack(&oid),
            Err(PackError::PackNotExist(_))
        ));
        assert!(matches!(
            store.read_blob(&oid),
            Err(PackError::BlobNotExist(_))
        ));
    }

    #[test]
    fn enumerate_lists_packs_and_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path());
        let pack = sample_pack();
        store.write_pack(&pack).unwrap();
        let blob_oid = Oid::from_bytes(b"bytes");
        store.write_blob(&blob_oid, b"bytes").unwrap();

        let mut entries = store.enumerate().unwrap();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|(oid, is_pack)| oid == &pack.oid && *is_pack));
        assert!(entries.iter().any(|(oid, is_pack)| oid == &blob_oid && !*is_pack));
    }
}
