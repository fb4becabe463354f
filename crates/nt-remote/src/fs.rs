//! Filesystem remote: a local directory mirroring the object store.

use std::path::{Path, PathBuf};

use nt_utils::tempfile::write_atomic;

use crate::{Remote, RemoteError, Result};

pub struct FsRemote {
    dir: PathBuf,
}

impl FsRemote {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsRemote { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Remote for FsRemote {
    fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RemoteError::ObjectNotExist(key.to_string()))
            }
            Err(e) => Err(RemoteError::Io(e)),
        }
    }

    fn put_object(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.object_path(key);
        write_atomic(&path, bytes).map_err(|e| RemoteError::Backend(e.to_string()))?;
        tracing::debug!(key, size = bytes.len(), "put remote object");
        Ok(())
    }

    fn delete_object(&self, key: &str) -> Result<()> {
        let path = self.object_path(key);
        if !path.is_file() {
            return Err(RemoteError::ObjectNotExist(key.to_string()));
        }
        std::fs::remove_file(path)?;
        tracing::debug!(key, "deleted remote object");
        Ok(())
    }

    fn gc(&self) -> Result<()> {
        // Drop fan-out directories emptied by deletions.
        if !self.dir.is_dir() {
            return Ok(());
        }
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir()
                && std::fs::read_dir(entry.path())?.next().is_none()
            {
                std::fs::remove_dir(entry.path())?;
            }
        }
        Ok(())
    }
}
