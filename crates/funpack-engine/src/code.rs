//! Function code upload
//!
//! Local `CodeUri` values are packaged and replaced by `oss://` URIs.
//! Archives (`.zip`, `.jar`) are uploaded as they are; directories are
//! zipped with the same rules as NAS payloads.

use serde_json::Value as JsonValue;
use std::path::Path;

use funpack_core::archive::{IgnoreRules, PackedArchive, zip_directory, zip_entries};
use funpack_core::mapping::template_dir;
use funpack_core::template::{FUNCTION_RESOURCE, SERVICE_RESOURCE, children, properties_mut, property, resource_type};
use funpack_core::{CoreError, Template, iterate, of_type};
use funpack_storage::BucketClient;

use crate::error::{PackageError, Result};
use crate::packager::package_archive;

/// Archive name hint for packaged code directories
pub const CODE_ARCHIVE_HINT: &str = "code.zip";

const REMOTE_SCHEME: &str = "oss://";

/// A function whose code lives on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
struct LocalCode {
    service: String,
    function: String,
    code_uri: String,
}

/// Upload every local function `CodeUri` and point the template at it
pub async fn upload_function_code(
    client: &BucketClient,
    template: &Template,
    template_path: &Path,
) -> Result<Template> {
    let targets = local_code(template)?;
    if targets.is_empty() {
        return Ok(template.clone());
    }

    let base_dir = template_dir(template_path);
    let ignore = IgnoreRules::load(&base_dir)?;
    let mut working = template.clone();

    for target in &targets {
        let path = base_dir.join(&target.code_uri);
        let key = upload_code(client, target, &path, &ignore).await?;
        set_code_uri(&mut working, target, client.object_uri(&key))?;
    }

    Ok(working)
}

fn local_code(template: &Template) -> Result<Vec<LocalCode>> {
    let mut targets = Vec::new();
    iterate(template.resources()?, of_type(SERVICE_RESOURCE), |service, resource| {
        for (function, child) in children(resource) {
            if resource_type(child) != Some(FUNCTION_RESOURCE) {
                continue;
            }
            let Some(uri) = property(child, "CodeUri").and_then(JsonValue::as_str) else {
                continue;
            };
            if uri.starts_with(REMOTE_SCHEME) {
                continue;
            }
            targets.push(LocalCode {
                service: service.to_string(),
                function: function.to_string(),
                code_uri: uri.to_string(),
            });
        }
    });
    Ok(targets)
}

async fn upload_code(
    client: &BucketClient,
    target: &LocalCode,
    path: &Path,
    ignore: &IgnoreRules,
) -> Result<String> {
    if !path.exists() {
        return Err(PackageError::CodeUriNotFound {
            service: target.service.clone(),
            function: target.function.clone(),
            path: path.display().to_string(),
        });
    }

    if path.is_file() {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_archive(path) {
            let archive = PackedArchive { bytes, files: 1 };
            return package_archive(client, archive, &file_name, "").await;
        }
        let archive = zip_entries(&[(file_name.as_str(), bytes.as_slice())])?;
        return package_archive(client, archive, CODE_ARCHIVE_HINT, "").await;
    }

    let Some(archive) = zip_directory(path, ignore)? else {
        return Err(CoreError::Archive {
            message: format!(
                "code directory {} of function '{}/{}' has no files to package",
                path.display(),
                target.service,
                target.function
            ),
        }
        .into());
    };
    tracing::debug!(function = %target.function, files = archive.files, "archived function code");
    package_archive(client, archive, CODE_ARCHIVE_HINT, "").await
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip") || e.eq_ignore_ascii_case("jar"))
}

fn set_code_uri(template: &mut Template, target: &LocalCode, uri: String) -> Result<()> {
    let props = template
        .resources_mut()?
        .get_mut(&target.service)
        .and_then(|service| service.get_mut(&target.function))
        .and_then(properties_mut);
    if let Some(props) = props {
        props.insert("CodeUri".to_string(), JsonValue::String(uri));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use funpack_storage::MockObjectStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    const TEMPLATE: &str = r#"
Resources:
  svc:
    Type: 'Aliyun::Serverless::Service'
    dir-fn:
      Type: 'Aliyun::Serverless::Function'
      Properties:
        Handler: index.handler
        Runtime: python3
        CodeUri: ./src
    zip-fn:
      Type: 'Aliyun::Serverless::Function'
      Properties:
        Handler: index.handler
        Runtime: python3
        CodeUri: ./dist/app.zip
    remote-fn:
      Type: 'Aliyun::Serverless::Function'
      Properties:
        CodeUri: oss://elsewhere/app.zip
"#;

    fn setup() -> (TempDir, Arc<MockObjectStore>, BucketClient) {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src")).unwrap();
        std::fs::create_dir_all(temp.path().join("dist")).unwrap();
        std::fs::write(temp.path().join("src/index.py"), "def handler(e, c): pass\n").unwrap();
        std::fs::write(temp.path().join("dist/app.zip"), b"PK\x05\x06prebuilt").unwrap();
        let store = Arc::new(MockObjectStore::with_buckets(&["b"]));
        let client = BucketClient::new(store.clone(), "b");
        (temp, store, client)
    }

    #[tokio::test]
    async fn test_local_code_replaced_with_oss_uri() {
        let (temp, store, client) = setup();
        let input = Template::from_yaml(TEMPLATE).unwrap();

        let out = upload_function_code(&client, &input, &temp.path().join("template.yml"))
            .await
            .unwrap();
        let svc = &out.resources().unwrap()["svc"];

        let dir_uri = svc["dir-fn"]["Properties"]["CodeUri"].as_str().unwrap();
        assert!(dir_uri.starts_with("oss://b/"));
        assert!(dir_uri.ends_with("-code.zip"));

        let zip_uri = svc["zip-fn"]["Properties"]["CodeUri"].as_str().unwrap();
        assert!(zip_uri.ends_with("-app.zip"));
        let zip_key = zip_uri.trim_start_matches("oss://b/");
        assert_eq!(store.object("b", zip_key).unwrap(), b"PK\x05\x06prebuilt".to_vec());

        assert_eq!(svc["remote-fn"]["Properties"]["CodeUri"], "oss://elsewhere/app.zip");
        assert_eq!(store.operation_counts().puts, 2);
    }

    #[tokio::test]
    async fn test_missing_code_uri_is_fatal() {
        let (temp, _store, client) = setup();
        std::fs::remove_dir_all(temp.path().join("src")).unwrap();
        let input = Template::from_yaml(TEMPLATE).unwrap();

        let result = upload_function_code(&client, &input, &temp.path().join("template.yml")).await;
        match result {
            Err(PackageError::CodeUriNotFound { service, function, .. }) => {
                assert_eq!(service, "svc");
                assert_eq!(function, "dir-fn");
            }
            other => panic!("expected CodeUriNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_nothing_local_is_unchanged() {
        let (temp, store, client) = setup();
        let input = Template::from_yaml(
            "Resources:\n  svc:\n    Type: 'Aliyun::Serverless::Service'\n",
        )
        .unwrap();

        let out = upload_function_code(&client, &input, &temp.path().join("template.yml"))
            .await
            .unwrap();
        assert_eq!(out, input);
        assert_eq!(store.operation_counts().total(), 0);
    }
}
