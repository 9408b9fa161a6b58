//! `NasConfig: Auto` resolution
//!
//! Turns every service declaring `NasConfig: Auto` into one backed by a
//! generated VPC and NAS file system, uploads the service's local NAS
//! directories, and declares the deploy-time copy that moves them onto
//! the file system.
//!
//! Stages run strictly in order over an owned clone of the input:
//!
//! 1. select services needing resolution
//! 2. acquire directory mappings (template-derived + `.nas.yml`)
//! 3. per service: concrete VpcConfig/NasConfig, package and upload
//! 4. merge per-service outputs and invokers, region map, default resources
//! 5. when anything was uploaded: bootstrap bundle, copy service, wait
//!    condition, default outputs

use std::path::Path;

use funpack_core::mapping::{
    derive_service_mappings, merge_mappings, nas_yml_path, read_explicit_mappings,
    relative_remote_dir, template_dir,
};
use funpack_core::sentinel::{ConfigValue, NasIdentity, mount_dir_prefix};
use funpack_core::template::{SERVICE_RESOURCE, properties_mut, property};
use funpack_core::{Template, iterate, of_type, validate_nas_and_vpc};
use funpack_storage::BucketClient;

use crate::bootstrap::upload_bootstrap;
use crate::error::Result;
use crate::fragments;
use crate::packager::package_directory;

/// Archive name hint for NAS payloads
pub const NAS_ARCHIVE_HINT: &str = "nas.zip";

/// Result of a resolution pass
#[derive(Debug, Clone, PartialEq)]
pub struct NasResolution {
    /// The resolved template
    pub template: Template,
    /// Services with at least one upload; the wait condition's `Count`
    pub wait_count: usize,
    /// Every key uploaded for service data, in upload order
    pub uploaded: Vec<String>,
}

/// A service selected for resolution, with what it was declared with
struct SelectedService {
    name: String,
    identity: NasIdentity,
    mount_prefix: String,
}

/// Resolves `NasConfig: Auto` services against one bucket
pub struct AutoResolutionEngine<'a> {
    client: &'a BucketClient,
    template_path: &'a Path,
}

impl<'a> AutoResolutionEngine<'a> {
    /// `template_path` anchors relative local directories and `.nas.yml`
    pub fn new(client: &'a BucketClient, template_path: &'a Path) -> Self {
        Self {
            client,
            template_path,
        }
    }

    /// Resolve `template`, leaving the input untouched
    ///
    /// With no service selected the output is an exact clone.
    pub async fn resolve(&self, template: &Template) -> Result<NasResolution> {
        let resources = template.resources()?;
        validate_nas_and_vpc(resources)?;

        let selected = select_services(template)?;
        if selected.is_empty() {
            tracing::debug!("no service declares NasConfig: Auto");
            return Ok(NasResolution {
                template: template.clone(),
                wait_count: 0,
                uploaded: Vec::new(),
            });
        }

        let derived = derive_service_mappings(resources);
        let explicit = read_explicit_mappings(&nas_yml_path(self.template_path))?;
        let mappings = merge_mappings(&derived, &explicit);
        let base_dir = template_dir(self.template_path);

        let mut working = template.clone();
        let mut wait_count = 0;
        let mut uploaded = Vec::new();
        let mut per_service: Vec<(&SelectedService, Vec<String>)> = Vec::new();

        for service in &selected {
            replace_configs(&mut working, service)?;

            let mut keys = Vec::new();
            for mapping in mappings.get(&service.name).into_iter().flatten() {
                let source = base_dir.join(&mapping.local_nas_dir);
                let prefix = relative_remote_dir(&service.mount_prefix, &mapping.remote_nas_dir)?;
                if let Some(key) = package_directory(
                    self.client,
                    &source,
                    NAS_ARCHIVE_HINT,
                    &prefix,
                    self.template_path,
                )
                .await?
                {
                    keys.push(key);
                }
            }

            if keys.is_empty() {
                tracing::warn!(
                    service = %service.name,
                    "no local NAS data was uploaded; NAS is configured but nothing will be copied"
                );
                continue;
            }

            wait_count += 1;
            uploaded.extend(keys.iter().cloned());
            per_service.push((service, keys));
        }

        for (service, keys) in &per_service {
            working.merge(&fragments::event_outputs(self.client.bucket(), keys, &service.name));
            working.merge(&fragments::nas_cp_invoker(
                &service.name,
                self.client.bucket(),
                keys,
                service.identity,
            ));
        }

        let names: Vec<String> = selected.iter().map(|s| s.name.clone()).collect();
        working.merge(&fragments::region_map());
        working.merge(&fragments::default_resources(&names, !uploaded.is_empty()));

        if uploaded.is_empty() {
            return Ok(NasResolution {
                template: working,
                wait_count,
                uploaded,
            });
        }

        let bootstrap_key = upload_bootstrap(self.client).await?;
        working.merge(&fragments::nas_service(&self.client.object_uri(&bootstrap_key)));
        working.merge(&fragments::wait_condition(wait_count));
        working.merge(&fragments::default_outputs());

        tracing::info!(services = wait_count, objects = uploaded.len(), "resolved NAS");
        Ok(NasResolution {
            template: working,
            wait_count,
            uploaded,
        })
    }
}

/// Services with `NasConfig: Auto` and an empty or `Auto` VpcConfig
fn select_services(template: &Template) -> Result<Vec<SelectedService>> {
    let mut selected = Vec::new();
    iterate(template.resources()?, of_type(SERVICE_RESOURCE), |name, resource| {
        let nas = ConfigValue::parse(property(resource, "NasConfig"));
        let vpc = ConfigValue::parse(property(resource, "VpcConfig"));
        if nas.is_auto() && !vpc.is_explicit() {
            selected.push(SelectedService {
                name: name.to_string(),
                identity: NasIdentity::from_config(&nas),
                mount_prefix: mount_dir_prefix(&nas),
            });
        }
    });
    Ok(selected)
}

fn replace_configs(template: &mut Template, service: &SelectedService) -> Result<()> {
    let resources = template.resources_mut()?;
    if let Some(props) = resources.get_mut(&service.name).and_then(properties_mut) {
        props.insert("VpcConfig".to_string(), fragments::vpc_config());
        props.insert(
            "NasConfig".to_string(),
            fragments::nas_config(&service.name, service.identity),
        );
    }
    Ok(())
}
