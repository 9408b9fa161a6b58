//! Packaging error types

use miette::Diagnostic;
use thiserror::Error;

use funpack_core::CoreError;
use funpack_storage::StorageError;

/// Main packaging error type
#[derive(Error, Debug, Diagnostic)]
pub enum PackageError {
    /// Mutually exclusive sentinel combination
    #[error("{0}")]
    #[diagnostic(
        code(funpack::config_conflict),
        help("Remove 'VpcConfig' or set it to 'Auto' so the VPC can be generated alongside NAS")
    )]
    ConfigConflict(CoreError),

    /// Template or local file problem
    #[error("{0}")]
    #[diagnostic(code(funpack::template))]
    Core(CoreError),

    /// No bucket from argument, default, or prompt
    #[error("Missing OSS bucket")]
    #[diagnostic(
        code(funpack::missing_bucket),
        help("Pass --bucket, or configure an account id so a default bucket can be derived")
    )]
    MissingBucket,

    /// Any storage failure; propagated unmodified
    #[error("Storage error: {0}")]
    #[diagnostic(code(funpack::storage))]
    Storage(#[from] StorageError),

    #[error("CodeUri '{path}' of function '{service}/{function}' does not exist")]
    #[diagnostic(code(funpack::code_uri))]
    CodeUriNotFound {
        service: String,
        function: String,
        path: String,
    },

    #[error("NAS source {path} is not a directory")]
    #[diagnostic(
        code(funpack::nas_source),
        help("Point 'localNasDir' at a directory; its contents are copied to the remote dir")
    )]
    SourceNotDirectory { path: String },

    #[error("Flow '{flow}': cannot read definition {path}: {message}")]
    #[diagnostic(code(funpack::flow_definition))]
    FlowDefinition {
        flow: String,
        path: String,
        message: String,
    },

    #[error("Prompt failed: {message}")]
    #[diagnostic(code(funpack::prompt))]
    Prompt { message: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(funpack::io))]
    Io(#[from] std::io::Error),
}

impl From<CoreError> for PackageError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::ConfigConflict { .. } => PackageError::ConfigConflict(e),
            other => PackageError::Core(other),
        }
    }
}

/// Result type for packaging operations
pub type Result<T> = std::result::Result<T, PackageError>;
