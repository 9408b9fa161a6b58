//! Gap-filling deep merge for template fragments
//!
//! Generated infrastructure is merged into a working template without
//! ever clobbering what the author wrote:
//!
//! - target value empty or absent: take the fragment's value
//! - both values non-empty mappings: union keys recursively, fragment loses ties
//! - otherwise: keep the target's value, discard the fragment's
//!
//! "Empty" means `null`, `""`, `[]` or `{}`. Numbers and booleans are
//! never empty, so `false` or `0` set by the author survive a merge.

use serde_json::Value as JsonValue;

/// Whether a value counts as unset for merge purposes
pub fn is_empty(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.is_empty(),
        JsonValue::Array(a) => a.is_empty(),
        JsonValue::Object(o) => o.is_empty(),
        JsonValue::Bool(_) | JsonValue::Number(_) => false,
    }
}

/// Merge `fragment` into `target` in place
pub fn merge_values(target: &mut JsonValue, fragment: &JsonValue) {
    if is_empty(target) {
        if !fragment.is_null() {
            *target = fragment.clone();
        }
        return;
    }

    if let (JsonValue::Object(target_map), JsonValue::Object(fragment_map)) = (target, fragment) {
        for (key, fragment_value) in fragment_map {
            match target_map.get_mut(key) {
                Some(target_value) => merge_values(target_value, fragment_value),
                None => {
                    target_map.insert(key.clone(), fragment_value.clone());
                }
            }
        }
    }
}

/// Merge into a copy of `target`, leaving the original untouched
#[must_use]
pub fn merged(target: &JsonValue, fragment: &JsonValue) -> JsonValue {
    let mut result = target.clone();
    merge_values(&mut result, fragment);
    result
}
