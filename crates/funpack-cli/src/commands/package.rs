//! Package command - resolve Auto configuration and upload local assets

use clap::Args;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use funpack_core::Profile;
use funpack_engine::{NoPrompt, PackageOptions, PackagingPipeline, Prompter};
use funpack_storage::{FileObjectStore, HttpObjectStore, ObjectStore};

use crate::display::print_outcome;
use crate::error::{CliError, Result};
use crate::prompt::TerminalPrompter;

/// Template names looked up in the working directory
const DEFAULT_TEMPLATES: [&str; 2] = ["template.yml", "template.yaml"];

#[derive(Args, Debug, Default)]
pub struct PackageArgs {
    /// Template file (default: template.yml or template.yaml)
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Bucket to upload into (default: fun-gen-<region>-<account>)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Where to write the packaged template
    #[arg(short = 'o', long = "output-template-file")]
    pub output: Option<PathBuf>,

    /// Use a local directory as object storage instead of the endpoint
    #[arg(long, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Profile file (default: <config dir>/funpack/config.yaml)
    #[arg(long, env = "FUNPACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cloud account id
    #[arg(long, env = "FUNPACK_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// Region
    #[arg(long, env = "FUNPACK_REGION")]
    pub region: Option<String>,

    /// Object storage endpoint
    #[arg(long, env = "FUNPACK_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Bearer token for the object storage endpoint
    #[arg(long, env = "FUNPACK_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
}

impl PackageArgs {
    /// Profile from file, with command-line and environment overrides
    fn profile(&self) -> Result<Profile> {
        let mut profile = match &self.config {
            Some(path) if path.exists() => Profile::load_from(path)?,
            Some(_) => Profile::default(),
            None => Profile::load()?,
        };
        if let Some(account_id) = &self.account_id {
            profile.account_id = Some(account_id.clone());
        }
        if let Some(region) = &self.region {
            profile.region = region.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            profile.endpoint = Some(endpoint.clone());
        }
        if let Some(token) = &self.access_token {
            profile.access_token = Some(token.clone());
        }
        Ok(profile)
    }
}

/// The given template, or the first default name present in `dir`
pub fn detect_template(explicit: Option<&Path>, dir: &Path) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    DEFAULT_TEMPLATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATES[0]))
}

fn open_store(args: &PackageArgs, profile: &Profile) -> Result<Arc<dyn ObjectStore>> {
    if let Some(dir) = &args.storage_dir {
        return Ok(Arc::new(FileObjectStore::new(dir)?));
    }
    let store = HttpObjectStore::new(
        &profile.storage_endpoint(),
        profile.access_token.clone(),
        Duration::from_secs(profile.timeout_secs),
    )?;
    Ok(Arc::new(store))
}

pub fn run(args: &PackageArgs) -> Result<()> {
    let profile = args.profile()?;
    tracing::debug!(
        region = %profile.region,
        endpoint = %profile.storage_endpoint(),
        storage_dir = ?args.storage_dir,
        "loaded profile"
    );
    let template_path = detect_template(args.template.as_deref(), Path::new("."));
    let store = open_store(args, &profile)?;

    let prompter: Box<dyn Prompter> = if console::user_attended() {
        Box::new(TerminalPrompter)
    } else {
        Box::new(NoPrompt)
    };

    let options = PackageOptions {
        template_path: template_path.clone(),
        bucket: args.bucket.clone(),
        output: args.output.clone(),
    };

    println!(
        "{} {}",
        style("Packaging").cyan().bold(),
        template_path.display()
    );

    let runtime = tokio::runtime::Runtime::new().map_err(|e| CliError::internal(e.to_string()))?;
    let pipeline = PackagingPipeline::new(store, profile);
    let outcome = runtime.block_on(pipeline.run(&options, prompter.as_ref()))?;

    print_outcome(&outcome);
    Ok(())
}
