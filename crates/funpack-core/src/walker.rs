//! Deterministic traversal of the resource graph
//!
//! Visit order is the `Resources` mapping's insertion order. Generated
//! logical ids and object keys depend on it, so it is part of the contract.

use serde_json::Value as JsonValue;

use crate::error::{CoreError, Result};
use crate::sentinel::ConfigValue;
use crate::template::{JsonMap, SERVICE_RESOURCE, property, resource_type};

/// Predicate matching resources of exactly `type_name`
pub fn of_type(type_name: &str) -> impl Fn(&str) -> bool + '_ {
    move |t| t == type_name
}

/// Visit every resource whose `Type` satisfies `predicate`, in order
///
/// Resources without a `Type` never match.
pub fn iterate<P, F>(resources: &JsonMap, predicate: P, mut visitor: F)
where
    P: Fn(&str) -> bool,
    F: FnMut(&str, &JsonValue),
{
    for (name, resource) in resources {
        if resource_type(resource).is_some_and(&predicate) {
            visitor(name, resource);
        }
    }
}

/// Mutable variant of [`iterate`]
pub fn iterate_mut<P, F>(resources: &mut JsonMap, predicate: P, mut visitor: F)
where
    P: Fn(&str) -> bool,
    F: FnMut(&str, &mut JsonValue),
{
    for (name, resource) in resources.iter_mut() {
        if resource_type(resource).is_some_and(&predicate) {
            visitor(name, resource);
        }
    }
}

/// Names of the resources matching `predicate`, in visit order
pub fn select<P>(resources: &JsonMap, predicate: P) -> Vec<String>
where
    P: Fn(&str) -> bool,
{
    let mut names = Vec::new();
    iterate(resources, predicate, |name, _| names.push(name.to_string()));
    names
}

/// Reject services combining `NasConfig: Auto` with an explicit `VpcConfig`
///
/// Runs before any transform; the error names the first offending service.
pub fn validate_nas_and_vpc(resources: &JsonMap) -> Result<()> {
    let mut conflict = None;
    iterate(resources, of_type(SERVICE_RESOURCE), |name, resource| {
        if conflict.is_some() {
            return;
        }
        let nas = ConfigValue::parse(property(resource, "NasConfig"));
        let vpc = ConfigValue::parse(property(resource, "VpcConfig"));
        if nas.is_auto() && vpc.is_explicit() {
            conflict = Some(name.to_string());
        }
    });

    match conflict {
        Some(resource) => Err(CoreError::ConfigConflict { resource }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{FUNCTION_RESOURCE, Template};

    fn resources(yaml: &str) -> JsonMap {
        Template::from_yaml(yaml).unwrap().resources().unwrap().clone()
    }

    #[test]
    fn test_iterate_in_insertion_order() {
        let res = resources(
            r#"
Resources:
  c: {Type: 'Aliyun::Serverless::Service'}
  a: {Type: 'Aliyun::Serverless::CustomDomain'}
  b: {Type: 'Aliyun::Serverless::Service'}
"#,
        );
        assert_eq!(select(&res, of_type(SERVICE_RESOURCE)), vec!["c", "b"]);
    }

    #[test]
    fn test_iterate_skips_untyped_and_tolerates_missing_properties() {
        let res = resources(
            r#"
Resources:
  untyped: {Properties: {}}
  svc: {Type: 'Aliyun::Serverless::Service'}
"#,
        );
        let mut seen = Vec::new();
        iterate(&res, |_| true, |name, resource| {
            assert!(property(resource, "NasConfig").is_none());
            seen.push(name.to_string());
        });
        assert_eq!(seen, vec!["svc"]);
    }

    #[test]
    fn test_iterate_mut() {
        let mut res = resources(
            r#"
Resources:
  svc: {Type: 'Aliyun::Serverless::Service'}
"#,
        );
        iterate_mut(&mut res, of_type(SERVICE_RESOURCE), |_, resource| {
            resource["Touched"] = JsonValue::Bool(true);
        });
        assert_eq!(res["svc"]["Touched"], true);
        assert!(select(&res, of_type(FUNCTION_RESOURCE)).is_empty());
    }

    #[test]
    fn test_validate_rejects_auto_nas_with_explicit_vpc() {
        let res = resources(
            r#"
Resources:
  ok:
    Type: 'Aliyun::Serverless::Service'
    Properties:
      NasConfig: Auto
  bad:
    Type: 'Aliyun::Serverless::Service'
    Properties:
      NasConfig: Auto
      VpcConfig:
        VpcId: vpc-123
        VSwitchIds: [vsw-1]
        SecurityGroupId: sg-1
"#,
        );
        match validate_nas_and_vpc(&res) {
            Err(CoreError::ConfigConflict { resource }) => assert_eq!(resource, "bad"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_auto_or_empty_vpc() {
        let res = resources(
            r#"
Resources:
  a:
    Type: 'Aliyun::Serverless::Service'
    Properties:
      NasConfig: Auto
      VpcConfig: Auto
  b:
    Type: 'Aliyun::Serverless::Service'
    Properties:
      NasConfig: Auto
      VpcConfig: {}
  c:
    Type: 'Aliyun::Serverless::Service'
    Properties:
      VpcConfig:
        VpcId: vpc-123
"#,
        );
        assert!(validate_nas_and_vpc(&res).is_ok());
    }
}
