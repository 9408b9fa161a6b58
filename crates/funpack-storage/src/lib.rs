//! Funpack Object Storage
//!
//! Packaging uploads archives into a bucket and references them from the
//! generated template. This crate owns that transport:
//!
//! - **HTTP**: path-style `<endpoint>/<bucket>/<key>` object storage
//! - **File**: a local directory standing in for the bucket namespace
//! - **Mock**: in-memory, with operation counters for tests
//!
//! Callers see one trait, [`ObjectStore`], and usually work through a
//! [`BucketClient`] bound to a single bucket.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use funpack_storage::{BucketClient, FileObjectStore, ObjectStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(FileObjectStore::new("/tmp/buckets")?);
//! if !store.bucket_exists("my-bucket").await? {
//!     store.create_bucket("my-bucket").await?;
//! }
//!
//! let client = BucketClient::new(store, "my-bucket");
//! let key = client.put("code/abc-code.zip", vec![0u8; 4]).await?;
//! println!("{}", client.object_uri(&key));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod file;
pub mod http;
pub mod mock;

pub use client::BucketClient;
pub use error::{Result, StorageError};
pub use file::FileObjectStore;
pub use http::HttpObjectStore;
pub use mock::{MockObjectStore, OperationCounts};

use async_trait::async_trait;

/// Object storage operations used by packaging
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Check whether a bucket exists
    ///
    /// A missing bucket is `Ok(false)`; any other failure is an error.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Upload an object, returning its key
    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<String>;
}

/// Reject empty, absolute, or traversing object keys
pub fn validate_key(key: &str) -> Result<()> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if invalid {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}
