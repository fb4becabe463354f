use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::Result;

/// A temporary file with RAII cleanup, used for atomic writes.
///
/// The file is created in the same directory as its target so that the
/// final rename never crosses a filesystem: a reader observes either the
/// old bytes or the new bytes, never a partial file. Dropped unpersisted
/// temp files are deleted.
pub struct TempFile {
    inner: Option<::tempfile::NamedTempFile>,
}

impl TempFile {
    /// Create a temporary file alongside `target`, creating the parent
    /// directory when needed.
    pub fn new_for(target: impl AsRef<Path>) -> Result<Self> {
        let dir = target.as_ref().parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;
        let named = ::tempfile::NamedTempFile::new_in(dir)?;
        Ok(Self { inner: Some(named) })
    }

    pub fn path(&self) -> &Path {
        self.inner
            .as_ref()
            .map(|n| n.path())
            .unwrap_or(Path::new(""))
    }

    /// Rename into place, consuming the temp file.
    pub fn persist(mut self, target: impl AsRef<Path>) -> Result<()> {
        if let Some(named) = self.inner.take() {
            named
                .persist(target.as_ref())
                .map_err(|e| crate::UtilError::Io(e.error))?;
        }
        Ok(())
    }
}

impl Write for TempFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::other("temp file already persisted"))?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::other("temp file already persisted"))?
            .flush()
    }
}

/// Write `bytes` to `target` atomically (temp file + rename).
pub fn write_atomic(target: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let mut tmp = TempFile::new_for(&target)?;
    tmp.write_all(bytes)?;
    tmp.persist(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_renames_into_place() {
        let dir = ::tempfile::tempdir().unwrap();
        let target = dir.path().join("objects").join("ab").join("x.pack");

        write_atomic(&target, b"oid: abc").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"oid: abc");
    }

    #[test]
    fn drop_without_persist_cleans_up() {
        let dir = ::tempfile::tempdir().unwrap();
        let tmp_path;
        {
            let mut tmp = TempFile::new_for(dir.path().join("out")).unwrap();
            tmp.write_all(b"partial").unwrap();
            tmp_path = tmp.path().to_path_buf();
            assert!(tmp_path.exists());
        }
        assert!(!tmp_path.exists());
    }
}
