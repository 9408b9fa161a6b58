//! Inline flow definitions
//!
//! A flow may point at its definition file through `DefinitionUri`; the
//! packaged template carries the definition text itself.

use serde_json::Value as JsonValue;
use std::path::Path;

use funpack_core::mapping::template_dir;
use funpack_core::template::{FLOW_RESOURCE, properties_mut};
use funpack_core::{Template, iterate_mut, of_type};

use crate::error::{PackageError, Result};

/// Replace each flow's `DefinitionUri` with the file's content as `Definition`
pub fn resolve_flow_definitions(template: &Template, template_path: &Path) -> Result<Template> {
    let base_dir = template_dir(template_path);
    let mut working = template.clone();
    let mut failure = None;

    iterate_mut(working.resources_mut()?, of_type(FLOW_RESOURCE), |name, resource| {
        if failure.is_some() {
            return;
        }
        let Some(props) = properties_mut(resource) else {
            return;
        };
        let Some(uri) = props.get("DefinitionUri").and_then(JsonValue::as_str) else {
            return;
        };

        let path = base_dir.join(uri);
        match std::fs::read_to_string(&path) {
            Ok(definition) => {
                props.shift_remove("DefinitionUri");
                props.insert("Definition".to_string(), JsonValue::String(definition));
                tracing::debug!(flow = name, path = %path.display(), "inlined flow definition");
            }
            Err(e) => {
                failure = Some(PackageError::FlowDefinition {
                    flow: name.to_string(),
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(working),
    }
}
