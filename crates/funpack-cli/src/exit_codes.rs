//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - conflicting Auto configuration
pub const VALIDATION_ERROR: i32 = 2;

/// Template error - missing, unparsable, or malformed template
pub const TEMPLATE_ERROR: i32 = 3;

/// Storage error - bucket or object upload failure
pub const STORAGE_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
