//! `nt push` / `nt pull`: last-writer-wins reconciliation with a remote.
//!
//! The remote holds the serialized index plus every referenced pack and
//! blob. Push and pull both refuse while anything is staged, and both
//! gate on `committed_at` unless forced.

use nt_db::Database;
use nt_index::Index;
use nt_pack::PackFile;
use nt_remote::{FsRemote, Remote, RemoteError, S3Remote, INDEX_KEY};

use nt_config::RemoteConfig;
use nt_utils::Clock;

use crate::{RepoError, Repository, Result};

impl Repository {
    fn remote(&self) -> Result<Box<dyn Remote>> {
        match &self.config.remote {
            None => Err(RepoError::NoRemote),
            Some(RemoteConfig::Fs { dir }) => Ok(Box::new(FsRemote::new(dir.as_str()))),
            Some(RemoteConfig::S3 {
                endpoint,
                bucket,
                access_key,
                secret_key,
                secure,
            }) => Ok(Box::new(S3Remote::connect(
                endpoint, bucket, access_key, secret_key, *secure,
            )?)),
        }
    }

    fn fetch_remote_index(remote: &dyn Remote) -> Result<Option<Index>> {
        match remote.get_object(INDEX_KEY) {
            Ok(bytes) => {
                let yaml = String::from_utf8_lossy(&bytes).to_string();
                Ok(Some(Index::from_yaml(&yaml)?))
            }
            Err(RemoteError::ObjectNotExist(_)) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    /// Upload local state to the remote.
    pub fn push(&mut self, force: bool) -> Result<()> {
        if self.index.something_to_commit() {
            return Err(RepoError::StagedChangesPresent);
        }
        let remote = self.remote()?;

        let origin = Self::fetch_remote_index(remote.as_ref())?.unwrap_or_default();
        if !force && origin.committed_at() > self.index.committed_at() {
            return Err(RepoError::RemoteNewer {
                remote: Clock::to_rfc3339(origin.committed_at()),
            });
        }

        // Ship everything the remote is missing.
        let missing = origin.diff(&self.index);
        for oid in &missing.missing_pack_files {
            let pack = self.store.read_pack(oid)?;
            remote.put_object(&pack.relative_path(), pack.to_yaml()?.as_bytes())?;
        }
        for oid in &missing.missing_blobs {
            let bytes = self.store.read_blob(oid)?;
            remote.put_object(&format!("{}.blob", oid.relative_path()), &bytes)?;
        }

        // The index goes last so a crashed push never publishes an index
        // referencing objects that were not uploaded.
        remote.put_object(INDEX_KEY, self.index.to_yaml().as_bytes())?;

        // Drop remote objects the local index no longer references.
        let keep_packs = self.index.referenced_pack_oids();
        let keep_blobs = self.index.referenced_blob_oids();
        for oid in origin.referenced_pack_oids() {
            if !keep_packs.contains(&oid) {
                match remote.delete_object(&format!("{}.pack", oid.relative_path())) {
                    Ok(()) | Err(RemoteError::ObjectNotExist(_)) => {}
                    Err(other) => return Err(other.into()),
                }
            }
        }
        for oid in origin.referenced_blob_oids() {
            if !keep_blobs.contains(&oid) {
                match remote.delete_object(&format!("{}.blob", oid.relative_path())) {
                    Ok(()) | Err(RemoteError::ObjectNotExist(_)) => {}
                    Err(other) => return Err(other.into()),
                }
            }
        }
        remote.gc()?;

        tracing::info!(
            packs = missing.missing_pack_files.len(),
            blobs = missing.missing_blobs.len(),
            "push complete"
        );
        Ok(())
    }

    /// Mirror the remote state locally.
    pub fn pull(&mut self, force: bool) -> Result<()> {
        if self.index.something_to_commit() {
            return Err(RepoError::StagedChangesPresent);
        }
        let remote = self.remote()?;

        let Some(origin) = Self::fetch_remote_index(remote.as_ref())? else {
            tracing::info!("remote has no index; nothing to pull");
            return Ok(());
        };
        if !force && self.index.committed_at() > origin.committed_at() {
            return Err(RepoError::LocalNewer);
        }

        // Fetch missing objects before adopting the remote index.
        let missing = self.index.diff(&origin);
        for oid in &missing.missing_pack_files {
            let bytes = remote.get_object(&format!("{}.pack", oid.relative_path()))?;
            let pack = PackFile::from_yaml(&String::from_utf8_lossy(&bytes))?;
            self.store.write_pack(&pack)?;
        }
        for oid in &missing.missing_blobs {
            let bytes = remote.get_object(&format!("{}.blob", oid.relative_path()))?;
            self.store.write_blob(oid, &bytes)?;
        }

        // Adopt the remote index wholesale (last writer wins), rebuild the
        // projection from the packs it references, then persist.
        let packs: Vec<PackFile> = origin
            .referenced_pack_oids()
            .into_iter()
            .map(|oid| self.store.read_pack(&oid))
            .collect::<std::result::Result<_, _>>()?;
        let pack_refs: Vec<&PackFile> = packs.iter().collect();
        self.db.with_transaction(|tx| {
            Database::clear(tx)?;
            Database::upsert_pack_files(tx, &pack_refs)?;
            Ok(())
        })?;

        self.index = origin;
        self.index.save(&self.index_path())?;

        // Drop local objects the adopted index no longer references.
        self.gc()?;

        tracing::info!(
            packs = missing.missing_pack_files.len(),
            blobs = missing.missing_blobs.len(),
            "pull complete"
        );
        Ok(())
    }
}
