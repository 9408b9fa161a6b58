//! Bucket selection
//!
//! An explicit bucket always wins. Otherwise the account's default bucket
//! is used, created on confirmation, or replaced by one the user names.

use funpack_storage::ObjectStore;

use crate::error::{PackageError, Result};

/// Interactive questions asked while choosing a bucket
pub trait Prompter: Send + Sync {
    /// Yes/no question
    fn confirm(&self, prompt: &str) -> Result<bool>;

    /// Free-form answer
    fn input(&self, prompt: &str) -> Result<String>;
}

/// Prompter for non-interactive runs: declines and answers nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn confirm(&self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }

    fn input(&self, _prompt: &str) -> Result<String> {
        Ok(String::new())
    }
}

/// Choose the bucket packaging uploads into
///
/// `default_bucket` is `None` when no account is configured. A storage
/// failure other than "not found" while probing propagates.
pub async fn resolve_bucket(
    store: &dyn ObjectStore,
    explicit: Option<&str>,
    default_bucket: Option<&str>,
    prompter: &dyn Prompter,
) -> Result<String> {
    if let Some(bucket) = explicit.map(str::trim).filter(|b| !b.is_empty()) {
        return Ok(bucket.to_string());
    }

    if let Some(default_bucket) = default_bucket {
        if store.bucket_exists(default_bucket).await? {
            tracing::debug!(bucket = default_bucket, "using default bucket");
            return Ok(default_bucket.to_string());
        }

        let question = format!(
            "Default bucket {} does not exist. Create it?",
            default_bucket
        );
        if prompter.confirm(&question)? {
            store.create_bucket(default_bucket).await?;
            tracing::info!(bucket = default_bucket, "created default bucket");
            return Ok(default_bucket.to_string());
        }
    }

    let answer = prompter.input("Bucket to upload packaged artifacts to")?;
    let bucket = answer.trim();
    if bucket.is_empty() {
        return Err(PackageError::MissingBucket);
    }
    if !store.bucket_exists(bucket).await? {
        store.create_bucket(bucket).await?;
        tracing::info!(bucket, "created bucket");
    }
    Ok(bucket.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use funpack_storage::{MockObjectStore, StorageError};
    use std::sync::Mutex;

    struct Scripted {
        confirm: bool,
        input: String,
        asked: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(confirm: bool, input: &str) -> Self {
            Self {
                confirm,
                input: input.to_string(),
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    impl Prompter for Scripted {
        fn confirm(&self, prompt: &str) -> Result<bool> {
            self.asked.lock().unwrap().push(prompt.to_string());
            Ok(self.confirm)
        }

        fn input(&self, prompt: &str) -> Result<String> {
            self.asked.lock().unwrap().push(prompt.to_string());
            Ok(self.input.clone())
        }
    }

    #[tokio::test]
    async fn test_explicit_bucket_wins_without_storage_calls() {
        let store = MockObjectStore::new();
        let prompter = Scripted::new(true, "");

        let bucket = resolve_bucket(&store, Some("mine"), Some("default"), &prompter)
            .await
            .unwrap();

        assert_eq!(bucket, "mine");
        assert_eq!(store.operation_counts().total(), 0);
        assert!(prompter.asked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_default_bucket() {
        let store = MockObjectStore::with_buckets(&["fun-gen-cn-hangzhou-1"]);
        let bucket = resolve_bucket(&store, None, Some("fun-gen-cn-hangzhou-1"), &NoPrompt)
            .await
            .unwrap();
        assert_eq!(bucket, "fun-gen-cn-hangzhou-1");
    }

    #[tokio::test]
    async fn test_default_bucket_created_on_confirm() {
        let store = MockObjectStore::new();
        let prompter = Scripted::new(true, "");

        let bucket = resolve_bucket(&store, None, Some("default"), &prompter).await.unwrap();

        assert_eq!(bucket, "default");
        assert!(store.has_bucket("default"));
        assert_eq!(store.operation_counts().bucket_creates, 1);
    }

    #[tokio::test]
    async fn test_declined_default_asks_for_name() {
        let store = MockObjectStore::new();
        let prompter = Scripted::new(false, " other ");

        let bucket = resolve_bucket(&store, None, Some("default"), &prompter).await.unwrap();

        assert_eq!(bucket, "other");
        assert!(store.has_bucket("other"));
        assert!(!store.has_bucket("default"));
        assert_eq!(prompter.asked.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_exists_failure_propagates_without_prompting() {
        let store = MockObjectStore::new().failing_exists(403);
        let prompter = Scripted::new(true, "other");

        let result = resolve_bucket(&store, None, Some("default"), &prompter).await;

        assert!(matches!(
            result,
            Err(PackageError::Storage(StorageError::HttpError { status: 403, .. }))
        ));
        assert!(prompter.asked.lock().unwrap().is_empty());
        let counts = store.operation_counts();
        assert_eq!(counts.exists_checks, 1);
        assert_eq!(counts.bucket_creates, 0);
    }

    #[tokio::test]
    async fn test_no_bucket_anywhere() {
        let store = MockObjectStore::new();
        let result = resolve_bucket(&store, None, Some("default"), &NoPrompt).await;
        assert!(matches!(result, Err(PackageError::MissingBucket)));

        let result = resolve_bucket(&store, Some("  "), None, &NoPrompt).await;
        assert!(matches!(result, Err(PackageError::MissingBucket)));
    }
}
