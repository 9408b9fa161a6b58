//! The `package` pipeline
//!
//! ```text
//! load ─ validate ─ bucket ─ code ─ logs ─ domains ─ flows ─ nas ─ write
//! ```
//!
//! Every stage takes the previous stage's template by reference and
//! returns a new one. Nothing is written until every stage succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use funpack_core::template::PACKAGED_TEMPLATE_NAME;
use funpack_core::{Profile, Template, validate_nas_and_vpc};
use funpack_storage::{BucketClient, ObjectStore};

use crate::bucket::{Prompter, resolve_bucket};
use crate::code::upload_function_code;
use crate::domain::CustomDomainResolver;
use crate::error::Result;
use crate::flow::resolve_flow_definitions;
use crate::logs::{LogAutoResolver, auto_log_services};
use crate::nas::AutoResolutionEngine;

/// Inputs of one packaging run
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    pub template_path: PathBuf,
    /// Bucket to upload into; chosen interactively when absent
    pub bucket: Option<String>,
    /// Output path; `template.packaged.yml` in the working directory when absent
    pub output: Option<PathBuf>,
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct PackageOutcome {
    pub output_path: PathBuf,
    pub bucket: String,
    /// Every uploaded key, in upload order
    pub uploaded: Vec<String>,
    /// Expected signal count of the generated wait condition
    pub wait_count: usize,
    pub template: Template,
}

/// Where the packaged template is written
pub fn resolve_output_path(output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(PACKAGED_TEMPLATE_NAME),
    }
}

/// Sequences the packaging stages against one object store
pub struct PackagingPipeline {
    store: Arc<dyn ObjectStore>,
    profile: Profile,
}

impl PackagingPipeline {
    pub fn new(store: Arc<dyn ObjectStore>, profile: Profile) -> Self {
        Self { store, profile }
    }

    /// Run every stage and write the packaged template
    pub async fn run(&self, options: &PackageOptions, prompter: &dyn Prompter) -> Result<PackageOutcome> {
        let template_path = options.template_path.as_path();
        let template = Template::from_file(template_path)?;
        validate_nas_and_vpc(template.resources()?)?;

        let log_resolver = if auto_log_services(&template)?.is_empty() {
            None
        } else {
            Some(LogAutoResolver::from_profile(&self.profile)?)
        };

        let default_bucket = self.profile.default_bucket_name().ok();
        let bucket = resolve_bucket(
            self.store.as_ref(),
            options.bucket.as_deref(),
            default_bucket.as_deref(),
            prompter,
        )
        .await?;
        tracing::info!(bucket = %bucket, template = %template_path.display(), "packaging");
        let client = BucketClient::new(self.store.clone(), bucket.clone());

        let template = upload_function_code(&client, &template, template_path).await?;
        let template = match &log_resolver {
            Some(resolver) => resolver.resolve(&template)?,
            None => template,
        };
        let template = CustomDomainResolver.resolve(&template)?;
        let template = resolve_flow_definitions(&template, template_path)?;
        let resolution = AutoResolutionEngine::new(&client, template_path)
            .resolve(&template)
            .await?;

        let output_path = resolve_output_path(options.output.as_deref());
        resolution.template.write_to(&output_path)?;
        tracing::info!(path = %output_path.display(), "wrote packaged template");

        Ok(PackageOutcome {
            output_path,
            bucket,
            uploaded: client.uploaded(),
            wait_count: resolution.wait_count,
            template: resolution.template,
        })
    }
}
