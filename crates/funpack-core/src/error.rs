//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Template not found: {path}")]
    TemplateNotFound { path: String },

    #[error("Malformed template: {message}")]
    MalformedTemplate { message: String },

    #[error(
        "Resource '{resource}': 'NasConfig: Auto' cannot be combined with an explicit 'VpcConfig'"
    )]
    ConfigConflict { resource: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("Invalid ignore pattern '{pattern}': {message}")]
    IgnorePattern { pattern: String, message: String },

    #[error("Remote NAS dir '{remote}' is outside the mount dir '{mount_dir}'")]
    RemoteDirOutsideMount { remote: String, mount_dir: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl From<zip::result::ZipError> for CoreError {
    fn from(e: zip::result::ZipError) -> Self {
        CoreError::Archive {
            message: e.to_string(),
        }
    }
}

impl From<walkdir::Error> for CoreError {
    fn from(e: walkdir::Error) -> Self {
        CoreError::Archive {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
