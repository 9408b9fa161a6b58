//! Account profile
//!
//! Stored in `~/.config/funpack/config.yaml`. Every field can be
//! overridden from the command line or environment.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Account profile used to name default buckets and log projects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Cloud account id
    #[serde(default)]
    pub account_id: Option<String>,

    /// Default region
    #[serde(default = "default_region")]
    pub region: String,

    /// Object storage endpoint (defaults to the regional OSS endpoint)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token sent to the object storage endpoint
    #[serde(default)]
    pub access_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_region() -> String {
    "cn-hangzhou".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            account_id: None,
            region: default_region(),
            endpoint: None,
            access_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl Profile {
    /// Load the profile from the default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load the profile from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let profile: Self = serde_yaml::from_str(&content)?;
        Ok(profile)
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| CoreError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("funpack").join("config.yaml"))
    }

    /// Account id, required for derived names
    pub fn require_account_id(&self) -> Result<&str> {
        self.account_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CoreError::InvalidConfig {
                message: "account id is not configured (set FUNPACK_ACCOUNT_ID or accountId in the profile)"
                    .to_string(),
            })
    }

    /// Bucket used when none is given: `fun-gen-<region>-<account>`
    pub fn default_bucket_name(&self) -> Result<String> {
        Ok(format!("fun-gen-{}-{}", self.region, self.require_account_id()?))
    }

    /// Object storage endpoint
    pub fn storage_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) if !endpoint.is_empty() => endpoint.trim_end_matches('/').to_string(),
            _ => format!("https://oss-{}.aliyuncs.com", self.region),
        }
    }

    /// Log project shared by every `LogConfig: Auto` service
    pub fn default_log_project(&self) -> Result<String> {
        let account = self.require_account_id()?;
        let mut hasher = Sha256::new();
        hasher.update(account.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Ok(format!("aliyun-fc-{}-{}", self.region, &digest[..8]))
    }
}
