//! Bucket-bound client

use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::ObjectStore;

/// An [`ObjectStore`] bound to one bucket
///
/// Records every key it uploads so callers can report them.
#[derive(Clone)]
pub struct BucketClient {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    uploaded: Arc<Mutex<Vec<String>>>,
}

impl BucketClient {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            uploaded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload `data` under `key`
    pub async fn put(&self, key: &str, data: Vec<u8>) -> Result<String> {
        let size = data.len();
        let key = self.store.put_object(&self.bucket, key, data).await?;
        tracing::info!(bucket = %self.bucket, key = %key, size, "uploaded object");
        if let Ok(mut uploaded) = self.uploaded.lock() {
            uploaded.push(key.clone());
        }
        Ok(key)
    }

    /// `oss://<bucket>/<key>`
    pub fn object_uri(&self, key: &str) -> String {
        format!("oss://{}/{}", self.bucket, key)
    }

    /// Keys uploaded through this client, in upload order
    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded
            .lock()
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockObjectStore;

    #[tokio::test]
    async fn test_put_records_keys() {
        let store = Arc::new(MockObjectStore::with_buckets(&["b"]));
        let client = BucketClient::new(store.clone(), "b");

        client.put("one.zip", vec![1]).await.unwrap();
        client.put("two.zip", vec![2]).await.unwrap();

        assert_eq!(client.uploaded(), vec!["one.zip", "two.zip"]);
        assert_eq!(client.object_uri("one.zip"), "oss://b/one.zip");
        assert_eq!(store.object("b", "two.zip"), Some(vec![2]));
    }

    #[tokio::test]
    async fn test_put_propagates_errors() {
        let store = Arc::new(MockObjectStore::new());
        let client = BucketClient::new(store, "missing");

        let result = client.put("a.zip", vec![]).await;
        assert!(result.unwrap_err().is_not_found());
        assert!(client.uploaded().is_empty());
    }
}
