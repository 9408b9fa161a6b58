//! `LogConfig: Auto` resolution
//!
//! Every service asking for automatic logging shares one generated log
//! project and logstore.

use serde_json::json;

use funpack_core::sentinel::ConfigValue;
use funpack_core::template::{SERVICE_RESOURCE, properties_mut, property};
use funpack_core::{Profile, Template, of_type, select};

use crate::error::Result;
use crate::fragments;

/// Logstore shared by generated log configs
pub const DEFAULT_LOGSTORE: &str = "function-log";

/// Services declaring `LogConfig: Auto`, in resource order
pub fn auto_log_services(template: &Template) -> Result<Vec<String>> {
    let resources = template.resources()?;
    let services = select(resources, of_type(SERVICE_RESOURCE))
        .into_iter()
        .filter(|name| ConfigValue::parse(property(&resources[name.as_str()], "LogConfig")).is_auto())
        .collect();
    Ok(services)
}

/// Resolves `LogConfig: Auto` to one shared project/logstore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogAutoResolver {
    project: String,
    logstore: String,
}

impl LogAutoResolver {
    pub fn new(project: impl Into<String>, logstore: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            logstore: logstore.into(),
        }
    }

    /// Project named after the profile's region and account
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        Ok(Self::new(profile.default_log_project()?, DEFAULT_LOGSTORE))
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Resolve `template`; unchanged when no service asks for it
    pub fn resolve(&self, template: &Template) -> Result<Template> {
        let services = auto_log_services(template)?;
        if services.is_empty() {
            return Ok(template.clone());
        }

        let config = json!({"Project": self.project, "Logstore": self.logstore});
        let mut working = template.clone();
        let resources = working.resources_mut()?;
        for name in &services {
            if let Some(props) = resources.get_mut(name).and_then(properties_mut) {
                props.insert("LogConfig".to_string(), config.clone());
            }
        }

        working.merge(&fragments::log_project(&self.project, &self.logstore));
        tracing::info!(project = %self.project, services = services.len(), "resolved LogConfig");
        Ok(working)
    }
}
