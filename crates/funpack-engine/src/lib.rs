//! Funpack Engine - Resolution stages for serverless templates
//!
//! This crate turns a template with `Auto` sentinels into a deployable one:
//! - Function code upload (local `CodeUri` to `oss://`)
//! - `LogConfig: Auto` resolution to one shared log project
//! - Custom domain route rewriting
//! - Flow definition inlining
//! - `NasConfig: Auto` resolution with generated VPC/NAS infrastructure
//!
//! [`PackagingPipeline`] runs them in order and writes the result once.

pub mod bootstrap;
pub mod bucket;
pub mod code;
pub mod domain;
pub mod error;
pub mod flow;
pub mod fragments;
pub mod logs;
pub mod nas;
pub mod packager;
pub mod pipeline;

pub use bucket::{NoPrompt, Prompter, resolve_bucket};
pub use domain::CustomDomainResolver;
pub use error::{PackageError, Result};
pub use logs::LogAutoResolver;
pub use nas::{AutoResolutionEngine, NasResolution};
pub use packager::package_directory;
pub use pipeline::{PackageOptions, PackageOutcome, PackagingPipeline, resolve_output_path};
