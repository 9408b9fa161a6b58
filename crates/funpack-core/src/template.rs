//! Serverless template document
//!
//! A template is a YAML document whose `Resources` section maps unique
//! logical ids to resource declarations (`{Type, Properties}`). The
//! document is held as an order-preserving JSON value so that key order
//! survives a load/serialize cycle and generated ids stay deterministic.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::merge::merge_values;

/// `Aliyun::Serverless::Service`
pub const SERVICE_RESOURCE: &str = "Aliyun::Serverless::Service";
/// `Aliyun::Serverless::Function` (nested under a service)
pub const FUNCTION_RESOURCE: &str = "Aliyun::Serverless::Function";
/// `Aliyun::Serverless::CustomDomain`
pub const CUSTOM_DOMAIN_RESOURCE: &str = "Aliyun::Serverless::CustomDomain";
/// `Aliyun::Serverless::Flow`
pub const FLOW_RESOURCE: &str = "Aliyun::Serverless::Flow";
/// `Aliyun::Serverless::Log`
pub const LOG_RESOURCE: &str = "Aliyun::Serverless::Log";
/// `Aliyun::Serverless::Log::Logstore` (nested under a log project)
pub const LOGSTORE_RESOURCE: &str = "Aliyun::Serverless::Log::Logstore";

/// Default filename of the packaged template
pub const PACKAGED_TEMPLATE_NAME: &str = "template.packaged.yml";

pub type JsonMap = Map<String, JsonValue>;

/// A serverless application template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template(pub JsonValue);

impl Template {
    /// Load a template from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CoreError::TemplateNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a template from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        if !value.is_object() {
            return Err(CoreError::MalformedTemplate {
                message: "template root must be a mapping".to_string(),
            });
        }
        Ok(Self(value))
    }

    /// Serialize the template to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    /// Write the template to `path`
    ///
    /// The YAML is written to a sibling temporary file first and renamed
    /// into place, so readers never observe a partially written template.
    pub fn write_to(&self, path: &Path) -> Result<PathBuf> {
        let yaml = self.to_yaml()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("yml.tmp");
        std::fs::write(&tmp, yaml)?;
        std::fs::rename(&tmp, path)?;
        Ok(path.to_path_buf())
    }

    /// The `Resources` mapping
    pub fn resources(&self) -> Result<&JsonMap> {
        self.0
            .get("Resources")
            .and_then(JsonValue::as_object)
            .ok_or_else(missing_resources)
    }

    /// Mutable access to the `Resources` mapping
    pub fn resources_mut(&mut self) -> Result<&mut JsonMap> {
        self.0
            .get_mut("Resources")
            .and_then(JsonValue::as_object_mut)
            .ok_or_else(missing_resources)
    }

    /// Deep merge a fragment into this template without overwriting
    /// existing concrete values (see [`merge_values`])
    pub fn merge(&mut self, fragment: &Fragment) {
        merge_values(&mut self.0, &fragment.0);
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert to JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }
}

fn missing_resources() -> CoreError {
    CoreError::MalformedTemplate {
        message: "missing 'Resources' section".to_string(),
    }
}

/// Partial template produced by generators and merged into a working template
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Fragment(pub JsonValue);

impl Fragment {
    /// A fragment with a single top-level section
    pub fn section(name: &str, value: JsonValue) -> Self {
        let mut root = JsonMap::new();
        root.insert(name.to_string(), value);
        Self(JsonValue::Object(root))
    }

    /// A fragment declaring resources, in the given order
    pub fn resources<I>(resources: I) -> Self
    where
        I: IntoIterator<Item = (String, JsonValue)>,
    {
        let map: JsonMap = resources.into_iter().collect();
        Self::section("Resources", JsonValue::Object(map))
    }

    /// A fragment declaring outputs, in the given order
    pub fn outputs<I>(outputs: I) -> Self
    where
        I: IntoIterator<Item = (String, JsonValue)>,
    {
        let map: JsonMap = outputs.into_iter().collect();
        Self::section("Outputs", JsonValue::Object(map))
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }
}

/// The `Type` of a resource declaration
pub fn resource_type(resource: &JsonValue) -> Option<&str> {
    resource.get("Type").and_then(JsonValue::as_str)
}

/// A single property of a resource; a missing `Properties` reads as empty
pub fn property<'a>(resource: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    resource
        .get("Properties")
        .and_then(JsonValue::as_object)
        .and_then(|props| props.get(key))
}

/// Mutable `Properties` of a resource, created when missing
///
/// Returns `None` only when the resource itself is not a mapping.
pub fn properties_mut(resource: &mut JsonValue) -> Option<&mut JsonMap> {
    let obj = resource.as_object_mut()?;
    let props = obj
        .entry("Properties")
        .or_insert_with(|| JsonValue::Object(JsonMap::new()));
    if !props.is_object() {
        *props = JsonValue::Object(JsonMap::new());
    }
    props.as_object_mut()
}

/// Child resources nested inside a resource (e.g. functions of a service)
///
/// Children are the non-`Type`/`Properties` keys whose value declares a `Type`.
pub fn children(resource: &JsonValue) -> Vec<(&str, &JsonValue)> {
    let Some(obj) = resource.as_object() else {
        return Vec::new();
    };
    obj.iter()
        .filter(|(k, v)| {
            k.as_str() != "Type" && k.as_str() != "Properties" && resource_type(v).is_some()
        })
        .map(|(k, v)| (k.as_str(), v))
        .collect()
}
