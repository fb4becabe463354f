//! S3-compatible remote (MinIO protocol subset).
//!
//! The SDK is async; the store is not. The client owns a small runtime
//! and blocks on each call, keeping async confined to the transport edge.

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tokio::runtime::Runtime;

use crate::{Remote, RemoteError, Result};

pub struct S3Remote {
    runtime: Runtime,
    client: Client,
    bucket: String,
}

impl S3Remote {
    /// Connect to an S3-compatible endpoint with static credentials.
    ///
    /// Path-style addressing is forced: MinIO and friends don't resolve
    /// virtual-host bucket names.
    pub fn connect(
        endpoint: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        secure: bool,
    ) -> Result<Self> {
        let runtime = Runtime::new().map_err(RemoteError::Io)?;
        let scheme = if secure { "https" } else { "http" };
        let credentials = Credentials::new(access_key, secret_key, None, None, "nt-config");
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(format!("{scheme}://{endpoint}"))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();
        let client = Client::from_conf(config);
        Ok(S3Remote {
            runtime,
            client,
            bucket: bucket.to_string(),
        })
    }

    fn head(&self, key: &str) -> Result<bool> {
        let result = self.runtime.block_on(
            self.client
                .head_object()
                .bucket(&self.bucket)
                .key(key)
                .send(),
        );
        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                let service = err.as_service_error();
                if service.map(|e| e.is_not_found()).unwrap_or(false) {
                    Ok(false)
                } else {
                    Err(RemoteError::Backend(err.to_string()))
                }
            }
        }
    }
}

impl Remote for S3Remote {
    fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let response = self.runtime.block_on(
            self.client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send(),
        );
        match response {
            Ok(output) => {
                let data = self
                    .runtime
                    .block_on(output.body.collect())
                    .map_err(|e| RemoteError::Backend(e.to_string()))?;
                Ok(data.into_bytes().to_vec())
            }
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false);
                if not_found {
                    Err(RemoteError::ObjectNotExist(key.to_string()))
                } else {
                    Err(RemoteError::Backend(err.to_string()))
                }
            }
        }
    }

    fn put_object(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .body(ByteStream::from(bytes.to_vec()))
                    .send(),
            )
            .map_err(|e| RemoteError::Backend(e.to_string()))?;
        tracing::debug!(key, size = bytes.len(), "put remote object");
        Ok(())
    }

    fn delete_object(&self, key: &str) -> Result<()> {
        // S3 DELETE is idempotent; match the filesystem remote by
        // refusing to delete a missing key.
        if !self.head(key)? {
            return Err(RemoteError::ObjectNotExist(key.to_string()));
        }
        self.runtime
            .block_on(
                self.client
                    .delete_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .send(),
            )
            .map_err(|e| RemoteError::Backend(e.to_string()))?;
        tracing::debug!(key, "deleted remote object");
        Ok(())
    }

    fn gc(&self) -> Result<()> {
        // Buckets have no directories to clean.
        Ok(())
    }
}

