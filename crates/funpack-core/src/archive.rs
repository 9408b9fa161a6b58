//! Deterministic ZIP archives of local directories
//!
//! Function Compute consumes code and NAS payloads as ZIP files. Archives
//! are built in memory from a name-sorted directory walk with fixed
//! timestamps and modes, so identical inputs always produce identical
//! bytes and therefore identical object keys.

use sha2::{Digest, Sha256};
use std::io::{Cursor, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::{CoreError, Result};

/// Ignore file read from the template directory
pub const IGNORE_FILE: &str = ".funignore";

/// Always excluded: local tool state and VCS metadata
const DEFAULT_IGNORES: &[&str] = &[".git", ".fun", IGNORE_FILE];

/// Hex digits of the content digest used in archive names
const DIGEST_LEN: usize = 32;

/// Glob patterns excluding paths from archives
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<glob::Pattern>,
}

impl IgnoreRules {
    /// Parse one pattern per line; blank lines and `#` comments are skipped
    pub fn parse(content: &str) -> Result<Self> {
        let mut patterns = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.trim_start_matches('/').trim_end_matches('/');
            let pattern = glob::Pattern::new(line).map_err(|e| CoreError::IgnorePattern {
                pattern: line.to_string(),
                message: e.to_string(),
            })?;
            patterns.push(pattern);
        }
        Ok(Self { patterns })
    }

    /// Load `.funignore` from `dir` on top of the built-in exclusions
    pub fn load(dir: &Path) -> Result<Self> {
        let mut rules = Self::parse(&DEFAULT_IGNORES.join("\n"))?;
        let path = dir.join(IGNORE_FILE);
        if path.exists() {
            let custom = Self::parse(&std::fs::read_to_string(path)?)?;
            rules.patterns.extend(custom.patterns);
        }
        Ok(rules)
    }

    /// Whether a `/`-separated relative path, or any of its parents, is ignored
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let mut prefix = String::new();
        for part in rel_path.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            if self
                .patterns
                .iter()
                .any(|p| p.matches(&prefix) || p.matches(part))
            {
                return true;
            }
        }
        false
    }
}

/// An archive built in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedArchive {
    pub bytes: Vec<u8>,
    /// Number of file entries
    pub files: usize,
}

impl PackedArchive {
    /// Content-addressed archive name: `<digest>-<hint>`
    #[must_use]
    pub fn name(&self, hint: &str) -> String {
        format!("{}-{}", content_digest(&self.bytes), hint)
    }
}

/// First hex digits of the SHA-256 of `data`
#[must_use]
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(DIGEST_LEN);
    digest
}

/// Whether `path` holds no files at any depth
///
/// A directory containing only (recursively) empty directories is empty.
pub fn is_empty_dir(path: &Path) -> Result<bool> {
    for entry in WalkDir::new(path).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Archive the contents of `dir`, paths relative to `dir`
///
/// Returns `None` when no file survives the ignore rules.
pub fn zip_directory(dir: &Path, ignore: &IgnoreRules) -> Result<Option<PackedArchive>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut files = 0;

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let rel = relative_name(dir, e.path());
            !ignore.is_ignored(&rel)
        });

    for entry in walker {
        let entry = entry?;
        let rel = relative_name(dir, entry.path());

        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", rel), entry_options(0o755))?;
            continue;
        }

        let content = std::fs::read(entry.path())?;
        zip.start_file(rel, entry_options(file_mode(entry.path())))?;
        zip.write_all(&content)?;
        files += 1;
    }

    let bytes = zip.finish()?.into_inner();
    if files == 0 {
        return Ok(None);
    }
    Ok(Some(PackedArchive { bytes, files }))
}

/// Archive in-memory `(path, content)` entries in the given order
pub fn zip_entries(entries: &[(&str, &[u8])]) -> Result<PackedArchive> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in entries {
        zip.start_file(*path, entry_options(0o644))?;
        zip.write_all(content)?;
    }
    let bytes = zip.finish()?.into_inner();
    Ok(PackedArchive {
        bytes,
        files: entries.len(),
    })
}

fn entry_options(mode: u32) -> FileOptions {
    FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default()) // reproducible: fixed timestamp
        .unix_permissions(mode)
}

#[cfg(unix)]
fn file_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) if meta.permissions().mode() & 0o111 != 0 => 0o755,
        _ => 0o644,
    }
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> u32 {
    0o644
}

fn relative_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn create_tree(dir: &Path) {
        std::fs::create_dir_all(dir.join("lib/python")).unwrap();
        std::fs::write(dir.join("index.py"), "def handler(event, context): pass\n").unwrap();
        std::fs::write(dir.join("lib/python/util.py"), "X = 1\n").unwrap();
        std::fs::create_dir_all(dir.join("node_modules/pkg")).unwrap();
        std::fs::write(dir.join("node_modules/pkg/index.js"), "module.exports = 1\n").unwrap();
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        archive.file_names().map(String::from).collect()
    }

    #[test]
    fn test_zip_directory_is_deterministic() {
        let temp = TempDir::new().unwrap();
        create_tree(temp.path());

        let first = zip_directory(temp.path(), &IgnoreRules::default()).unwrap().unwrap();
        let second = zip_directory(temp.path(), &IgnoreRules::default()).unwrap().unwrap();

        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.name("nas.zip"), second.name("nas.zip"));
        assert_eq!(first.files, 3);
    }

    #[test]
    fn test_zip_directory_contents() {
        let temp = TempDir::new().unwrap();
        create_tree(temp.path());

        let archive = zip_directory(temp.path(), &IgnoreRules::default()).unwrap().unwrap();
        let names = entry_names(&archive.bytes);
        assert!(names.contains(&"index.py".to_string()));
        assert!(names.contains(&"lib/python/util.py".to_string()));

        let mut reader = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
        let mut content = String::new();
        reader
            .by_name("lib/python/util.py")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "X = 1\n");
    }

    #[test]
    fn test_ignore_rules_exclude_entries() {
        let temp = TempDir::new().unwrap();
        create_tree(temp.path());

        let ignore = IgnoreRules::parse("# deps\nnode_modules\n*.pyc\n").unwrap();
        let archive = zip_directory(temp.path(), &ignore).unwrap().unwrap();
        let names = entry_names(&archive.bytes);

        assert!(names.iter().all(|n| !n.starts_with("node_modules")));
        assert_eq!(archive.files, 2);
    }

    #[test]
    fn test_everything_ignored_yields_none() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.log"), "x").unwrap();

        let ignore = IgnoreRules::parse("*.log").unwrap();
        assert!(zip_directory(temp.path(), &ignore).unwrap().is_none());
    }

    #[test]
    fn test_is_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(is_empty_dir(temp.path()).unwrap());

        std::fs::create_dir_all(temp.path().join("a/b/c")).unwrap();
        assert!(is_empty_dir(temp.path()).unwrap());

        std::fs::write(temp.path().join("a/b/file"), "x").unwrap();
        assert!(!is_empty_dir(temp.path()).unwrap());
    }

    #[test]
    fn test_ignore_matches_parent_dirs() {
        let ignore = IgnoreRules::parse("/build/\n").unwrap();
        assert!(ignore.is_ignored("build"));
        assert!(ignore.is_ignored("build/out/app.bin"));
        assert!(!ignore.is_ignored("src/main.py"));
    }

    #[test]
    fn test_load_adds_builtin_exclusions() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(IGNORE_FILE), "*.tmp\n").unwrap();

        let ignore = IgnoreRules::load(temp.path()).unwrap();
        assert!(ignore.is_ignored(".fun/nas/auto-default/svc/a.bin"));
        assert!(ignore.is_ignored(".git"));
        assert!(ignore.is_ignored("cache/x.tmp"));
        assert!(!ignore.is_ignored("index.py"));
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        assert!(matches!(
            IgnoreRules::parse("[unclosed"),
            Err(CoreError::IgnorePattern { .. })
        ));
    }

    #[test]
    fn test_zip_entries_and_name() {
        let archive = zip_entries(&[("index.py", b"print(1)\n".as_slice())]).unwrap();
        assert_eq!(entry_names(&archive.bytes), vec!["index.py"]);

        let name = archive.name("nas-cp.zip");
        assert!(name.ends_with("-nas-cp.zip"));
        assert_eq!(name.len(), DIGEST_LEN + "-nas-cp.zip".len());
    }

    #[test]
    fn test_content_digest_changes_with_content() {
        assert_ne!(content_digest(b"a"), content_digest(b"b"));
        assert_eq!(content_digest(b"a").len(), DIGEST_LEN);
    }
}
