//! Archive local directories and upload them
//!
//! Absent or empty sources are skipped with a warning. A service may
//! declare NAS without shipping any local data. A source that exists but
//! is not a directory is an error.

use std::path::Path;

use funpack_core::archive::{IgnoreRules, PackedArchive, zip_directory};
use funpack_core::mapping::template_dir;
use funpack_core::is_empty_dir;
use funpack_storage::BucketClient;

use crate::error::{PackageError, Result};

/// Object key for `name` under `prefix`
///
/// Leading and trailing slashes of the prefix are dropped; an empty
/// prefix yields the bare name.
pub fn object_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Archive `source` and upload it to `<prefix>/<digest>-<hint>`
///
/// Ignore rules come from the template's directory. Returns the uploaded
/// key, or `None` when the source is missing, empty, or fully ignored.
/// A source that is not a directory and storage failures are errors.
pub async fn package_directory(
    client: &BucketClient,
    source: &Path,
    archive_hint: &str,
    prefix: &str,
    template_path: &Path,
) -> Result<Option<String>> {
    if !source.exists() {
        tracing::warn!(path = %source.display(), "source does not exist, skipping");
        return Ok(None);
    }
    if !source.is_dir() {
        return Err(PackageError::SourceNotDirectory {
            path: source.display().to_string(),
        });
    }
    if is_empty_dir(source)? {
        tracing::warn!(path = %source.display(), "source is empty, skipping");
        return Ok(None);
    }

    let ignore = IgnoreRules::load(&template_dir(template_path))?;
    let Some(archive) = zip_directory(source, &ignore)? else {
        tracing::warn!(path = %source.display(), "every file in source is ignored, skipping");
        return Ok(None);
    };

    tracing::debug!(path = %source.display(), files = archive.files, "archived directory");
    package_archive(client, archive, archive_hint, prefix).await.map(Some)
}

/// Upload an already built archive under its content-addressed name
pub async fn package_archive(
    client: &BucketClient,
    archive: PackedArchive,
    archive_hint: &str,
    prefix: &str,
) -> Result<String> {
    let key = object_key(prefix, &archive.name(archive_hint));
    Ok(client.put(&key, archive.bytes).await?)
}
