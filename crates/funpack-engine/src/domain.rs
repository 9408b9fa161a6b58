//! Custom domain route rewriting
//!
//! Routes name their target by logical ids. Deployment needs the runtime
//! names instead, so each `{ServiceName, FunctionName}` pair becomes a
//! pair of `Fn::GetAtt` references.

use serde_json::Value as JsonValue;

use funpack_core::template::{CUSTOM_DOMAIN_RESOURCE, JsonMap};
use funpack_core::{Template, iterate_mut, of_type};

use crate::error::Result;
use crate::fragments::route_target;

const SERVICE_KEYS: [&str; 2] = ["ServiceName", "serviceName"];
const FUNCTION_KEYS: [&str; 2] = ["FunctionName", "functionName"];

/// Rewrites custom domain routes into attribute references
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomDomainResolver;

impl CustomDomainResolver {
    /// Resolve every custom domain in `template`
    pub fn resolve(&self, template: &Template) -> Result<Template> {
        let mut working = template.clone();
        let mut rewritten = 0;

        iterate_mut(
            working.resources_mut()?,
            of_type(CUSTOM_DOMAIN_RESOURCE),
            |name, resource| {
                let Some(routes) = resource
                    .get_mut("Properties")
                    .and_then(|props| props.get_mut("RouteConfig"))
                    .and_then(routes_mut)
                else {
                    return;
                };
                for (path, route) in routes.iter_mut() {
                    if rewrite_route(route) {
                        rewritten += 1;
                    } else {
                        tracing::debug!(domain = name, path = %path, "route left unchanged");
                    }
                }
            },
        );

        if rewritten > 0 {
            tracing::debug!(routes = rewritten, "resolved custom domain routes");
        }
        Ok(working)
    }
}

/// `Routes` (or `routes`) of a route config, when non-empty
fn routes_mut(route_config: &mut JsonValue) -> Option<&mut JsonMap> {
    let config = route_config.as_object_mut()?;
    let key = ["Routes", "routes"].into_iter().find(|k| config.contains_key(*k))?;
    config
        .get_mut(key)
        .and_then(JsonValue::as_object_mut)
        .filter(|routes| !routes.is_empty())
}

fn lookup<'a>(route: &'a JsonMap, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| route.get(*key)?.as_str())
}

/// Rewrite one route in place; false when it lacks string names
fn rewrite_route(route: &mut JsonValue) -> bool {
    let Some(map) = route.as_object_mut() else {
        return false;
    };
    let (Some(service), Some(function)) =
        (lookup(map, &SERVICE_KEYS), lookup(map, &FUNCTION_KEYS))
    else {
        return false;
    };

    let target = route_target(service, function);
    for key in SERVICE_KEYS.iter().chain(FUNCTION_KEYS.iter()) {
        map.shift_remove(*key);
    }
    if let JsonValue::Object(target) = target {
        for (key, value) in target {
            map.insert(key, value);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(yaml: &str) -> Template {
        CustomDomainResolver.resolve(&Template::from_yaml(yaml).unwrap()).unwrap()
    }

    #[test]
    fn test_route_rewritten_to_attribute_references() {
        let out = resolve(
            r#"
Resources:
  domain:
    Type: 'Aliyun::Serverless::CustomDomain'
    Properties:
      Protocol: HTTP
      RouteConfig:
        Routes:
          '/a':
            ServiceName: S
            FunctionName: F
"#,
        );
        let route = &out.inner()["Resources"]["domain"]["Properties"]["RouteConfig"]["Routes"]["/a"];
        assert_eq!(route["ServiceName"], json!({"Fn::GetAtt": ["S", "ServiceName"]}));
        assert_eq!(route["FunctionName"], json!({"Fn::GetAtt": ["SF", "FunctionName"]}));
    }

    #[test]
    fn test_lowercase_keys_accepted() {
        let out = resolve(
            r#"
Resources:
  domain:
    Type: 'Aliyun::Serverless::CustomDomain'
    Properties:
      RouteConfig:
        routes:
          '/b':
            serviceName: S
            functionName: F
            Qualifier: LATEST
"#,
        );
        let route = &out.inner()["Resources"]["domain"]["Properties"]["RouteConfig"]["routes"]["/b"];
        assert_eq!(route["ServiceName"]["Fn::GetAtt"][0], "S");
        assert!(route.get("serviceName").is_none());
        assert_eq!(route["Qualifier"], "LATEST");
    }

    #[test]
    fn test_incomplete_routes_pass_through() {
        let yaml = r#"
Resources:
  domain:
    Type: 'Aliyun::Serverless::CustomDomain'
    Properties:
      RouteConfig:
        Routes:
          '/c':
            ServiceName: S
  other:
    Type: 'Aliyun::Serverless::CustomDomain'
    Properties:
      RouteConfig:
        Routes: {}
"#;
        let out = resolve(yaml);
        assert_eq!(out, Template::from_yaml(yaml).unwrap());
    }
}
