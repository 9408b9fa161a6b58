//! The `Auto` sentinel
//!
//! `NasConfig`, `VpcConfig` and `LogConfig` accept the sentinel `Auto`,
//! asking the packager to synthesize defaults and supporting
//! infrastructure. Parsing happens once, into [`ConfigValue`]; callers
//! dispatch on the variant instead of comparing strings.

use serde_json::Value as JsonValue;

use crate::merge::is_empty;
use crate::template::JsonMap;

/// Sentinel keyword
pub const AUTO: &str = "Auto";

/// Default NAS user/group id for `NasConfig: Auto`
pub const DEFAULT_NAS_ID: u32 = 10003;

/// Mount prefix of a service with `NasConfig: Auto`
pub const AUTO_MOUNT_DIR: &str = "/mnt/auto";

/// A configuration field that may carry the `Auto` sentinel
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Absent, `null`, or empty
    Unset,
    /// `Auto`, or a mapping with `Auto: true`; holds the remaining keys
    Auto(JsonMap),
    /// A concrete, author-supplied value
    Explicit(JsonValue),
}

impl ConfigValue {
    /// Classify a raw property value
    pub fn parse(value: Option<&JsonValue>) -> Self {
        let Some(value) = value else {
            return Self::Unset;
        };
        if is_empty(value) {
            return Self::Unset;
        }
        match value {
            JsonValue::String(s) if s == AUTO => Self::Auto(JsonMap::new()),
            JsonValue::Object(map) if map.get(AUTO) == Some(&JsonValue::Bool(true)) => {
                let mut options = map.clone();
                options.shift_remove(AUTO);
                Self::Auto(options)
            }
            other => Self::Explicit(other.clone()),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto(_))
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

/// User/group identity a service mounts NAS with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NasIdentity {
    pub user_id: u32,
    pub group_id: u32,
}

impl Default for NasIdentity {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_NAS_ID,
            group_id: DEFAULT_NAS_ID,
        }
    }
}

impl NasIdentity {
    /// Extract `UserId`/`GroupId` from a NasConfig, defaulting what is absent
    pub fn from_config(config: &ConfigValue) -> Self {
        let map = match config {
            ConfigValue::Auto(options) => Some(options),
            ConfigValue::Explicit(value) => value.as_object(),
            ConfigValue::Unset => None,
        };
        let read = |key: &str| {
            map.and_then(|m| m.get(key))
                .and_then(JsonValue::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(DEFAULT_NAS_ID)
        };
        Self {
            user_id: read("UserId"),
            group_id: read("GroupId"),
        }
    }
}

/// Mount directory prefix declared by a NasConfig
///
/// Auto mounts under [`AUTO_MOUNT_DIR`]; an explicit config uses its
/// first mount point's `MountDir`.
pub fn mount_dir_prefix(config: &ConfigValue) -> String {
    match config {
        ConfigValue::Auto(_) => AUTO_MOUNT_DIR.to_string(),
        ConfigValue::Explicit(value) => value
            .get("MountPoints")
            .and_then(JsonValue::as_array)
            .and_then(|points| points.first())
            .and_then(|p| p.get("MountDir"))
            .and_then(JsonValue::as_str)
            .unwrap_or("/")
            .to_string(),
        ConfigValue::Unset => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_unset() {
        assert_eq!(ConfigValue::parse(None), ConfigValue::Unset);
        assert_eq!(ConfigValue::parse(Some(&json!(null))), ConfigValue::Unset);
        assert_eq!(ConfigValue::parse(Some(&json!({}))), ConfigValue::Unset);
        assert_eq!(ConfigValue::parse(Some(&json!(""))), ConfigValue::Unset);
    }

    #[test]
    fn test_parse_auto_string() {
        assert!(ConfigValue::parse(Some(&json!("Auto"))).is_auto());
        // case matters
        assert!(ConfigValue::parse(Some(&json!("auto"))).is_explicit());
    }

    #[test]
    fn test_parse_auto_mapping_keeps_options() {
        let value = json!({"Auto": true, "UserId": 1000, "GroupId": 1001});
        let ConfigValue::Auto(options) = ConfigValue::parse(Some(&value)) else {
            panic!("expected Auto");
        };
        assert!(!options.contains_key("Auto"));
        assert_eq!(options["UserId"], 1000);
    }

    #[test]
    fn test_parse_auto_false_is_explicit() {
        let value = json!({"Auto": false});
        assert!(ConfigValue::parse(Some(&value)).is_explicit());
    }

    #[test]
    fn test_identity_defaults() {
        let id = NasIdentity::from_config(&ConfigValue::parse(Some(&json!("Auto"))));
        assert_eq!(id, NasIdentity::default());
        assert_eq!(id.user_id, 10003);
    }

    #[test]
    fn test_identity_from_auto_options() {
        let value = json!({"Auto": true, "UserId": 1000});
        let id = NasIdentity::from_config(&ConfigValue::parse(Some(&value)));
        assert_eq!(id.user_id, 1000);
        assert_eq!(id.group_id, DEFAULT_NAS_ID);
    }

    #[test]
    fn test_mount_dir_prefix() {
        let auto = ConfigValue::parse(Some(&json!("Auto")));
        assert_eq!(mount_dir_prefix(&auto), "/mnt/auto");

        let explicit = ConfigValue::parse(Some(&json!({
            "UserId": 10003,
            "MountPoints": [{"ServerAddr": "abc.nas.aliyuncs.com:/share", "MountDir": "/mnt/share"}]
        })));
        assert_eq!(mount_dir_prefix(&explicit), "/mnt/share");
    }
}
