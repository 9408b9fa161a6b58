//! The NAS copy bootstrap bundle
//!
//! A small Python handler deployed as `FunNasCpService/nas-cp`. Each
//! invoker calls it with the bucket, object keys and destination
//! directory of one service; it extracts the archives onto NAS and
//! signals the wait handle.

use funpack_core::zip_entries;
use funpack_storage::BucketClient;

use crate::error::Result;
use crate::packager::package_archive;

/// Handler source shipped as `index.py`
pub const HANDLER_SOURCE: &str = include_str!("../assets/nas-cp-index.py");

/// Object prefix of the bundle
pub const BOOTSTRAP_PREFIX: &str = "funpack/nas-cp";

/// Archive name hint of the bundle
pub const BOOTSTRAP_HINT: &str = "nas-cp.zip";

/// Build the bundle and upload it, returning its key
///
/// The bundle is deterministic, so every run uploads to the same key.
pub async fn upload_bootstrap(client: &BucketClient) -> Result<String> {
    let archive = zip_entries(&[("index.py", HANDLER_SOURCE.as_bytes())])?;
    package_archive(client, archive, BOOTSTRAP_HINT, BOOTSTRAP_PREFIX).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use funpack_storage::MockObjectStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_bootstrap_key_is_stable() {
        let store = Arc::new(MockObjectStore::with_buckets(&["b"]));
        let client = BucketClient::new(store.clone(), "b");

        let first = upload_bootstrap(&client).await.unwrap();
        let second = upload_bootstrap(&client).await.unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with("funpack/nas-cp/"));
        assert!(first.ends_with("-nas-cp.zip"));
        assert_eq!(store.keys("b"), vec![first]);
    }

    #[test]
    fn test_handler_source_defines_handler() {
        assert!(HANDLER_SOURCE.contains("def handler(event, context):"));
    }
}
