//! Funpack Core - Core types and transforms for the serverless template packager
//!
//! This crate provides the foundational, storage-agnostic pieces:
//! - `Template`: The template document and its resource helpers
//! - `ConfigValue`: The `Auto` sentinel as a tagged variant
//! - `walker`: Deterministic resource traversal and validation
//! - `merge`: Gap-filling deep merge of generated fragments
//! - `mapping`: NAS directory mappings and their merge
//! - `archive`: Deterministic ZIP archives
//! - `Profile`: Account configuration

pub mod archive;
pub mod error;
pub mod mapping;
pub mod merge;
pub mod profile;
pub mod sentinel;
pub mod template;
pub mod walker;

pub use archive::{IgnoreRules, PackedArchive, content_digest, is_empty_dir, zip_directory, zip_entries};
pub use error::{CoreError, Result};
pub use mapping::{NasMapping, ServiceMappings, derive_service_mappings, merge_mappings, read_explicit_mappings};
pub use merge::{merge_values, merged};
pub use profile::Profile;
pub use sentinel::{ConfigValue, NasIdentity, mount_dir_prefix};
pub use template::{Fragment, JsonMap, Template};
pub use walker::{iterate, iterate_mut, of_type, select, validate_nas_and_vpc};
