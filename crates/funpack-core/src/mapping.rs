//! NAS directory mappings
//!
//! A mapping ties a local directory to its location on provisioned NAS.
//! Mappings come from two places:
//!
//! - derived from the template: every service with a NasConfig implies a
//!   local directory under `.fun/nas`
//! - declared by the author in `.nas.yml` next to the template
//!
//! [`merge_mappings`] folds both into one canonical sequence per service.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Component, Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::sentinel::{AUTO_MOUNT_DIR, ConfigValue};
use crate::template::{JsonMap, SERVICE_RESOURCE, property};
use crate::walker::{iterate, of_type};

/// Local NAS base directory, relative to the template directory
pub const NAS_BASE_DIR: &str = ".fun/nas";

/// Name of the explicit mapping file, next to the template
pub const NAS_YML: &str = ".nas.yml";

/// One local-to-remote directory association
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NasMapping {
    pub local_nas_dir: String,
    pub remote_nas_dir: String,
}

impl NasMapping {
    pub fn new(local: impl Into<String>, remote: impl Into<String>) -> Self {
        Self {
            local_nas_dir: local.into(),
            remote_nas_dir: remote.into(),
        }
    }
}

/// Mappings keyed by service name, in a stable order
pub type ServiceMappings = IndexMap<String, Vec<NasMapping>>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NasYml {
    #[serde(default)]
    nas_mappings: ServiceMappings,
}

/// Path of the explicit mapping file for a template
pub fn nas_yml_path(template_path: &Path) -> PathBuf {
    template_dir(template_path).join(NAS_YML)
}

/// Directory containing the template
pub fn template_dir(template_path: &Path) -> PathBuf {
    match template_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Read author-declared mappings; a missing file means none
pub fn read_explicit_mappings(path: &Path) -> Result<ServiceMappings> {
    if !path.exists() {
        return Ok(ServiceMappings::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(ServiceMappings::new());
    }
    let yml: NasYml = serde_yaml::from_str(&content)?;
    Ok(yml.nas_mappings)
}

/// Derive the mappings a template implies through its services' NasConfig
pub fn derive_service_mappings(resources: &JsonMap) -> ServiceMappings {
    let mut result = ServiceMappings::new();
    iterate(resources, of_type(SERVICE_RESOURCE), |name, resource| {
        let mappings = match ConfigValue::parse(property(resource, "NasConfig")) {
            ConfigValue::Unset => return,
            ConfigValue::Auto(_) => vec![NasMapping::new(
                format!("{}/auto-default/{}", NAS_BASE_DIR, name),
                AUTO_MOUNT_DIR,
            )],
            ConfigValue::Explicit(config) => explicit_mount_mappings(&config),
        };
        if !mappings.is_empty() {
            result.insert(name.to_string(), mappings);
        }
    });
    result
}

fn explicit_mount_mappings(config: &JsonValue) -> Vec<NasMapping> {
    let Some(points) = config.get("MountPoints").and_then(JsonValue::as_array) else {
        return Vec::new();
    };
    points
        .iter()
        .filter_map(|point| {
            let server_addr = point.get("ServerAddr")?.as_str()?;
            let mount_dir = point.get("MountDir")?.as_str()?;
            let (host, remote_path) = server_addr.split_once(':')?;
            let remote_path = if remote_path.starts_with('/') {
                remote_path.to_string()
            } else {
                format!("/{}", remote_path)
            };
            Some(NasMapping::new(
                format!("{}/{}{}", NAS_BASE_DIR, host, remote_path.trim_end_matches('/')),
                mount_dir,
            ))
        })
        .collect()
}

/// Merge template-derived and explicit mappings into one canonical sequence
///
/// - explicit entries win for a given `(service, remoteNasDir)`
/// - template-derived entries for uncovered remote dirs are appended
/// - duplicate `(localNasDir, remoteNasDir)` pairs collapse
/// - services come in explicit-file order, then template order
pub fn merge_mappings(template_derived: &ServiceMappings, explicit: &ServiceMappings) -> ServiceMappings {
    let mut result = ServiceMappings::new();

    let services = explicit
        .keys()
        .chain(template_derived.keys().filter(|k| !explicit.contains_key(*k)));

    for service in services {
        let mut merged: Vec<NasMapping> = Vec::new();

        for mapping in explicit.get(service).into_iter().flatten() {
            if !merged.contains(mapping) {
                merged.push(mapping.clone());
            }
        }

        let explicit_remotes: Vec<String> = merged
            .iter()
            .map(|m| normalize_remote(&m.remote_nas_dir))
            .collect();

        for mapping in template_derived.get(service).into_iter().flatten() {
            if explicit_remotes.contains(&normalize_remote(&mapping.remote_nas_dir)) {
                continue;
            }
            if !merged.contains(mapping) {
                merged.push(mapping.clone());
            }
        }

        if !merged.is_empty() {
            result.insert(service.clone(), merged);
        }
    }

    result
}

fn normalize_remote(remote: &str) -> String {
    let trimmed = remote.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `remote` relative to `mount_prefix`, with `/` separators
///
/// A remote dir outside the prefix, or one climbing out with `..`, is
/// rejected.
pub fn relative_remote_dir(mount_prefix: &str, remote: &str) -> Result<String> {
    let outside = || CoreError::RemoteDirOutsideMount {
        remote: remote.to_string(),
        mount_dir: mount_prefix.to_string(),
    };
    let relative = Path::new(remote)
        .strip_prefix(mount_prefix)
        .map_err(|_| outside())?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(outside()),
        }
    }
    Ok(parts.join("/"))
}
