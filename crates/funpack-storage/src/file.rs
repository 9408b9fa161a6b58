//! Local directory object store
//!
//! Buckets are directories under a root, objects are files under their
//! bucket. Useful for:
//! - Packaging offline and inspecting the uploaded archives
//! - Integration tests without a storage endpoint

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{Result, StorageError};
use crate::{ObjectStore, validate_key};

/// File-based object store
pub struct FileObjectStore {
    /// Directory holding one subdirectory per bucket
    root: PathBuf,
}

impl FileObjectStore {
    /// Create a new store rooted at `root`, creating the directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the directory for a bucket
    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
            return Err(StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            });
        }
        Ok(self.root.join(bucket))
    }

    /// Get the path for an object
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.bucket_dir(bucket)?.join(key))
    }
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.bucket_dir(bucket) {
            Ok(dir) => match tokio::fs::metadata(&dir).await {
                Ok(metadata) => Ok(metadata.is_dir()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            },
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let dir = self.bucket_dir(bucket)?;
        tokio::fs::create_dir_all(&dir).await?;
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<String> {
        if !self.bucket_exists(bucket).await? {
            return Err(StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            });
        }

        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;

        Ok(key.to_string())
    }
}
