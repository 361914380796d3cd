//! Definition bundle resolution.
//!
//! Every firmware version describes its settings objects with its own set of
//! definitions. An upgrade request names the version that produced the dump
//! (its githash) and the matching bundle is handed to the importer.
//!
//! [`StaticArchive`] serves bundles from local archive files keyed by exact
//! version identifier; unknown versions fail the request. Other sources (for
//! example a remote definitions service) implement [`DefinitionSource`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

fn version_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid regex"))
}

fn digest_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-f]{64}$").expect("valid regex"))
}

fn archive_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<version>[A-Za-z0-9][A-Za-z0-9._-]*?)\.(?:tgz|tar\.gz)$")
            .expect("valid regex")
    })
}

/// Check that a version identifier is safe to use as a lookup key and file
/// name stem (no path separators, no leading dot).
#[must_use]
pub fn is_valid_version_id(id: &str) -> bool {
    version_id_regex().is_match(id)
}

/// Check that a string is a lowercase hex blake3 digest.
#[must_use]
pub fn is_valid_digest(digest: &str) -> bool {
    digest_regex().is_match(digest)
}

/// The definitions of one firmware version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionBundle {
    /// Version identifier the bundle belongs to.
    pub githash: String,
    /// Archive contents, passed to the importer as-is.
    pub bytes: Vec<u8>,
    /// blake3 digest of `bytes`, lowercase hex.
    pub digest: String,
}

impl DefinitionBundle {
    /// Wrap archive bytes, computing their digest.
    #[must_use]
    pub fn new(githash: impl Into<String>, bytes: Vec<u8>) -> Self {
        let digest = Self::compute_digest(&bytes);
        Self {
            githash: githash.into(),
            bytes,
            digest,
        }
    }

    /// Compute the blake3 digest of archive bytes.
    #[must_use]
    pub fn compute_digest(bytes: &[u8]) -> String {
        blake3::hash(bytes).to_hex().to_string()
    }

    /// Size of the archive in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the archive is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Maps a version identifier to its definition bundle.
pub trait DefinitionSource {
    /// Resolve the bundle for `githash`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownVersion`] if the version is not served by this
    /// source, or another error if the bundle cannot be produced.
    fn resolve(&self, githash: &str) -> Result<DefinitionBundle>;

    /// Versions this source knows about, in sorted order.
    fn versions(&self) -> Vec<String>;
}

/// Definition bundles stored as local archive files.
#[derive(Debug, Clone, Default)]
pub struct StaticArchive {
    entries: BTreeMap<String, PathBuf>,
    digests: BTreeMap<String, String>,
}

impl StaticArchive {
    /// Create an archive with no entries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration: scan the archive directory, then add the
    /// explicit version mappings (which win over scanned files).
    ///
    /// # Errors
    ///
    /// Returns an error if the archive directory exists but cannot be read.
    pub fn from_config(config: &Config) -> Result<Self> {
        let dir = config.definitions_dir();
        let mut archive = Self::new();
        archive.scan_dir(&dir)?;

        for (version, path) in &config.definitions.versions {
            let path = if path.is_relative() {
                dir.join(path)
            } else {
                path.clone()
            };
            archive.entries.insert(version.clone(), path);
        }
        archive.digests.clone_from(&config.definitions.digests);

        info!(
            versions = archive.entries.len(),
            dir = %dir.display(),
            "definition archive loaded"
        );
        Ok(archive)
    }

    /// Builder that maps `githash` to an archive file.
    #[must_use]
    pub fn with_entry(mut self, githash: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.entries.insert(githash.into(), path.into());
        self
    }

    /// Builder that pins the expected blake3 digest of a version's archive.
    #[must_use]
    pub fn with_digest(mut self, githash: impl Into<String>, digest: impl Into<String>) -> Self {
        self.digests.insert(githash.into(), digest.into());
        self
    }

    /// Add every `<githash>.tgz` / `<githash>.tar.gz` file in `dir`.
    ///
    /// A missing directory adds nothing. Returns the number of entries found.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be listed.
    pub fn scan_dir(&mut self, dir: &Path) -> Result<usize> {
        let read_dir = match std::fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("definition directory {} does not exist", dir.display());
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut found = 0;
        for entry in read_dir {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                warn!(file = ?file_name, "skipping non-UTF-8 archive name");
                continue;
            };
            if let Some(caps) = archive_name_regex().captures(name) {
                let version = caps["version"].to_string();
                debug!(%version, "found definition archive");
                self.entries.insert(version, entry.path());
                found += 1;
            }
        }
        Ok(found)
    }

    /// Path of the archive for `githash`, if known.
    #[must_use]
    pub fn path_for(&self, githash: &str) -> Option<&Path> {
        self.entries.get(githash).map(PathBuf::as_path)
    }

    /// Number of known versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no versions are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DefinitionSource for StaticArchive {
    fn resolve(&self, githash: &str) -> Result<DefinitionBundle> {
        let path = self
            .path_for(githash)
            .ok_or_else(|| Error::unknown_version(githash))?;

        let bytes = std::fs::read(path).map_err(|source| Error::DefinitionRead {
            githash: githash.to_string(),
            path: path.to_path_buf(),
            source,
        })?;
        let bundle = DefinitionBundle::new(githash, bytes);

        if let Some(expected) = self.digests.get(githash) {
            if *expected != bundle.digest {
                return Err(Error::DefinitionDigest {
                    githash: githash.to_string(),
                    expected: expected.clone(),
                    actual: bundle.digest,
                });
            }
        }

        debug!(%githash, size = bundle.len(), "definitions resolved");
        Ok(bundle)
    }

    fn versions(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_archive(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_version_id_validation() {
        assert!(is_valid_version_id("Release-20160120.3"));
        assert!(is_valid_version_id("a1b2c3d"));
        assert!(is_valid_version_id("next_2016.01"));
        assert!(!is_valid_version_id(""));
        assert!(!is_valid_version_id(".hidden"));
        assert!(!is_valid_version_id("../etc"));
        assert!(!is_valid_version_id("with space"));
    }

    #[test]
    fn test_digest_validation() {
        let digest = DefinitionBundle::compute_digest(b"defs");
        assert!(is_valid_digest(&digest));
        assert!(!is_valid_digest(&digest.to_uppercase()));
        assert!(!is_valid_digest("abc"));
    }

    #[test]
    fn test_bundle_digest() {
        let bundle = DefinitionBundle::new("abc1234", b"defs".to_vec());
        assert_eq!(bundle.digest, blake3::hash(b"defs").to_hex().to_string());
        assert_eq!(bundle.len(), 4);
        assert!(!bundle.is_empty());
    }

    #[test]
    fn test_resolve_known_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "defs.tgz", b"archive bytes");
        let archive = StaticArchive::new().with_entry("Release-20160120.3", path);

        let bundle = archive.resolve("Release-20160120.3").unwrap();
        assert_eq!(bundle.githash, "Release-20160120.3");
        assert_eq!(bundle.bytes, b"archive bytes");
    }

    #[test]
    fn test_resolve_unknown_version() {
        let archive = StaticArchive::new();
        let err = archive.resolve("deadbeef").unwrap_err();
        assert!(err.is_unknown_version());
    }

    #[test]
    fn test_resolve_missing_file() {
        let archive = StaticArchive::new().with_entry("deadbeef", "/nonexistent/deadbeef.tgz");
        let err = archive.resolve("deadbeef").unwrap_err();
        assert!(matches!(err, Error::DefinitionRead { .. }));
    }

    #[test]
    fn test_resolve_checks_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_archive(dir.path(), "a.tgz", b"archive bytes");

        let good = StaticArchive::new()
            .with_entry("a", &path)
            .with_digest("a", DefinitionBundle::compute_digest(b"archive bytes"));
        assert!(good.resolve("a").is_ok());

        let bad = StaticArchive::new()
            .with_entry("a", &path)
            .with_digest("a", DefinitionBundle::compute_digest(b"other bytes"));
        let err = bad.resolve("a").unwrap_err();
        assert!(matches!(err, Error::DefinitionDigest { .. }));
    }

    #[test]
    fn test_scan_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "Release-20160120.3.tgz", b"one");
        write_archive(dir.path(), "a1b2c3d.tar.gz", b"two");
        write_archive(dir.path(), "notes.txt", b"ignored");
        std::fs::create_dir(dir.path().join("nested.tgz")).unwrap();

        let mut archive = StaticArchive::new();
        let found = archive.scan_dir(dir.path()).unwrap();

        assert_eq!(found, 2);
        assert_eq!(archive.versions(), vec!["Release-20160120.3", "a1b2c3d"]);
        assert_eq!(archive.resolve("a1b2c3d").unwrap().bytes, b"two");
    }

    #[test]
    fn test_scan_missing_dir() {
        let mut archive = StaticArchive::new();
        assert_eq!(archive.scan_dir(Path::new("/nonexistent/defs")).unwrap(), 0);
        assert!(archive.is_empty());
    }

    #[test]
    fn test_from_config() {
        let dir = tempfile::tempdir().unwrap();
        write_archive(dir.path(), "scanned.tgz", b"scanned");
        write_archive(dir.path(), "explicit-file.bin", b"explicit");
        write_archive(dir.path(), "override.tgz", b"scanned override");

        let mut config = Config::default();
        config.definitions.archive_dir = Some(dir.path().to_path_buf());
        config
            .definitions
            .versions
            .insert("explicit".to_string(), PathBuf::from("explicit-file.bin"));
        config
            .definitions
            .versions
            .insert("override".to_string(), PathBuf::from("explicit-file.bin"));

        let archive = StaticArchive::from_config(&config).unwrap();

        assert_eq!(archive.len(), 3);
        assert_eq!(archive.resolve("scanned").unwrap().bytes, b"scanned");
        assert_eq!(archive.resolve("explicit").unwrap().bytes, b"explicit");
        assert_eq!(archive.resolve("override").unwrap().bytes, b"explicit");
    }
}
