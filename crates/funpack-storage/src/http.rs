//! HTTP object store
//!
//! Talks to an S3/OSS-compatible endpoint using path-style addressing:
//! `HEAD <endpoint>/<bucket>`, `PUT <endpoint>/<bucket>`,
//! `PUT <endpoint>/<bucket>/<key>`. Requests carry an optional bearer
//! token. There is no retry at this layer; failures propagate.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use crate::error::{Result, StorageError};
use crate::{ObjectStore, validate_key};

/// HTTP object store client
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: Url,
    token: Option<String>,
    timeout: Duration,
}

impl HttpObjectStore {
    /// Create a new client for `endpoint`
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(endpoint).map_err(|e| StorageError::InvalidEndpoint {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(StorageError::InvalidEndpoint {
                url: endpoint.to_string(),
                reason: "endpoint cannot carry a path".to_string(),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: parsed,
            token: token.filter(|t| !t.is_empty()),
            timeout,
        })
    }

    /// Endpoint URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn url(&self, bucket: &str, key: Option<&str>) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut segments =
                url.path_segments_mut()
                    .map_err(|_| StorageError::InvalidEndpoint {
                        url: self.endpoint.to_string(),
                        reason: "endpoint cannot carry a path".to_string(),
                    })?;
            segments.pop_if_empty().push(bucket);
            if let Some(key) = key {
                segments.extend(key.split('/'));
            }
        }
        Ok(url)
    }

    /// Send with the bearer token attached
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        request
            .send()
            .await
            .map_err(|e| StorageError::from_transport(e, self.timeout))
    }
}

/// Map a non-success status to an error
fn status_error(status: StatusCode, url: &Url) -> StorageError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StorageError::AccessDenied {
            message: format!("{} returned {}", url, status),
        },
        _ => StorageError::HttpError {
            status: status.as_u16(),
            message: format!("Request to {} failed", url),
        },
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let url = self.url(bucket, None)?;
        let response = self.send(self.client.head(url.clone())).await?;
        let status = response.status();

        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(status_error(status, &url))
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let url = self.url(bucket, None)?;
        let response = self.send(self.client.put(url.clone())).await?;
        let status = response.status();

        // 409: the bucket already exists and is ours
        if status.is_success() || status == StatusCode::CONFLICT {
            tracing::debug!(bucket, "bucket ready");
            Ok(())
        } else {
            Err(status_error(status, &url))
        }
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<String> {
        validate_key(key)?;
        let url = self.url(bucket, Some(key))?;
        let request = self
            .client
            .put(url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/zip")
            .body(data);
        let response = self.send(request).await?;
        let status = response.status();

        if status.is_success() {
            Ok(key.to_string())
        } else if status == StatusCode::NOT_FOUND {
            Err(StorageError::BucketNotFound {
                bucket: bucket.to_string(),
            })
        } else {
            Err(status_error(status, &url))
        }
    }
}
