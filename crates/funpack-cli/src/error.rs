//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use thiserror::Error;

use funpack_core::CoreError;
use funpack_engine::PackageError;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Any packaging failure, displayed with its own diagnostic
    #[error(transparent)]
    #[diagnostic(transparent)]
    Package(#[from] PackageError),

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(funpack::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Package(e) => package_exit_code(e),
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

fn package_exit_code(err: &PackageError) -> i32 {
    match err {
        PackageError::ConfigConflict(_) => exit_codes::VALIDATION_ERROR,
        PackageError::Core(core) => match core {
            CoreError::TemplateNotFound { .. }
            | CoreError::MalformedTemplate { .. }
            | CoreError::YamlParse(_)
            | CoreError::JsonParse(_) => exit_codes::TEMPLATE_ERROR,
            CoreError::InvalidConfig { .. } | CoreError::RemoteDirOutsideMount { .. } => {
                exit_codes::USAGE_ERROR
            }
            CoreError::Io(_) => exit_codes::IO_ERROR,
            _ => exit_codes::ERROR,
        },
        PackageError::MissingBucket => exit_codes::USAGE_ERROR,
        PackageError::Storage(_) => exit_codes::STORAGE_ERROR,
        PackageError::CodeUriNotFound { .. }
        | PackageError::FlowDefinition { .. }
        | PackageError::SourceNotDirectory { .. }
        | PackageError::Io(_) => exit_codes::IO_ERROR,
        PackageError::Prompt { .. } => exit_codes::ERROR,
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::Package(err.into())
    }
}

impl From<funpack_storage::StorageError> for CliError {
    fn from(err: funpack_storage::StorageError) -> Self {
        CliError::Package(err.into())
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
