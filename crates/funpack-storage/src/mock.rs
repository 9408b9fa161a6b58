//! Mock object store for testing
//!
//! Stores objects in memory, useful for unit tests without a network
//! endpoint.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::error::{Result, StorageError};
use crate::{ObjectStore, validate_key};

/// In-memory object store for testing
#[derive(Clone, Default)]
pub struct MockObjectStore {
    /// Storage: bucket -> key -> bytes
    buckets: Arc<RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
    /// When set, every upload fails with this HTTP status
    put_failure: Option<u16>,
    /// When set, every bucket existence check fails with this HTTP status
    exists_failure: Option<u16>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    pub exists_checks: usize,
    pub bucket_creates: usize,
    pub puts: usize,
}

impl OperationCounts {
    /// Total number of storage calls
    pub fn total(&self) -> usize {
        self.exists_checks + self.bucket_creates + self.puts
    }
}

impl MockObjectStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-existing empty buckets
    pub fn with_buckets(names: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut buckets = store.buckets.write().unwrap();
            for name in names {
                buckets.insert(name.to_string(), BTreeMap::new());
            }
        }
        store
    }

    /// Make every upload fail with an HTTP `status`
    pub fn failing_puts(mut self, status: u16) -> Self {
        self.put_failure = Some(status);
        self
    }

    /// Make every bucket existence check fail with an HTTP `status`
    pub fn failing_exists(mut self, status: u16) -> Self {
        self.exists_failure = Some(status);
        self
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Read back an object
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        let buckets = self.buckets.read().unwrap();
        buckets.get(bucket).and_then(|b| b.get(key)).cloned()
    }

    /// All keys in a bucket, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let buckets = self.buckets.read().unwrap();
        buckets
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a bucket exists, without counting an operation
    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.read().unwrap().contains_key(bucket)
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.exists_checks += 1;
        }

        if let Some(status) = self.exists_failure {
            return Err(StorageError::HttpError {
                status,
                message: format!("injected failure checking bucket {}", bucket),
            });
        }
        Ok(self.buckets.read().unwrap().contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.bucket_creates += 1;
        }

        let mut buckets = self.buckets.write().unwrap();
        buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<String> {
        {
            let mut ops = self.operations.write().unwrap();
            ops.puts += 1;
        }

        if let Some(status) = self.put_failure {
            return Err(StorageError::HttpError {
                status,
                message: format!("injected failure uploading {}", key),
            });
        }
        validate_key(key)?;

        let mut buckets = self.buckets.write().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })?;
        objects.insert(key.to_string(), data);
        Ok(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_create_and_put() {
        let store = MockObjectStore::new();

        assert!(!store.bucket_exists("b").await.unwrap());
        store.create_bucket("b").await.unwrap();
        assert!(store.bucket_exists("b").await.unwrap());

        let key = store.put_object("b", "dir/a.zip", vec![1, 2]).await.unwrap();
        assert_eq!(key, "dir/a.zip");
        assert_eq!(store.object("b", "dir/a.zip"), Some(vec![1, 2]));

        let counts = store.operation_counts();
        assert_eq!(counts.exists_checks, 2);
        assert_eq!(counts.bucket_creates, 1);
        assert_eq!(counts.puts, 1);
        assert_eq!(counts.total(), 4);
    }

    #[tokio::test]
    async fn test_mock_put_missing_bucket() {
        let store = MockObjectStore::new();
        let result = store.put_object("nope", "a.zip", vec![]).await;
        assert!(matches!(result, Err(StorageError::BucketNotFound { .. })));
    }

    #[tokio::test]
    async fn test_mock_injected_failure() {
        let store = MockObjectStore::with_buckets(&["b"]).failing_puts(503);
        let result = store.put_object("b", "a.zip", vec![]).await;
        assert!(matches!(result, Err(StorageError::HttpError { status: 503, .. })));
        assert!(store.keys("b").is_empty());
    }

    #[tokio::test]
    async fn test_mock_injected_exists_failure() {
        let store = MockObjectStore::with_buckets(&["b"]).failing_exists(500);
        let result = store.bucket_exists("b").await;
        assert!(matches!(result, Err(StorageError::HttpError { status: 500, .. })));
        assert_eq!(store.operation_counts().exists_checks, 1);
    }

    #[tokio::test]
    async fn test_mock_overwrite_same_key() {
        let store = MockObjectStore::with_buckets(&["b"]);
        store.put_object("b", "a.zip", vec![1]).await.unwrap();
        store.put_object("b", "a.zip", vec![1]).await.unwrap();
        assert_eq!(store.keys("b"), vec!["a.zip"]);
    }
}
