//! Remote update manifest and the local `version.json` file.
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::UpdateError;

pub const VERSION_FILE: &str = "version.json";

/// JSON document published next to each release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifest {
    pub version: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub version_download_url: Option<String>,
    #[serde(default)]
    pub changelog: Vec<String>,
    #[serde(default)]
    pub force_update: bool,
}

impl VersionManifest {
    pub fn from_json(data: &str) -> Result<Self, UpdateError> {
        serde_json::from_str(data).map_err(|e| UpdateError::Manifest(e.to_string()))
    }

    /// The versioned download link wins over the generic one.
    pub fn preferred_download_url(&self) -> Option<&str> {
        non_blank(&self.version_download_url).or_else(|| non_blank(&self.download_url))
    }
}

fn non_blank(url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|url| !url.trim().is_empty())
}

/// Contents of the installed `version.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVersion {
    pub version: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub changelog: Vec<String>,
}

impl LocalVersion {
    pub fn builtin() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            release_date: None,
            changelog: Vec::new(),
        }
    }

    pub fn new(version: impl Into<String>, changelog: Vec<String>) -> Self {
        Self {
            version: version.into(),
            release_date: Some(Local::now().format("%Y-%m-%d").to_string()),
            changelog,
        }
    }

    /// Reads the first readable version file among `candidates`, falling
    /// back to the version compiled into the binary.
    pub fn load_first(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            if !path.exists() {
                debug!("No version file at {}", path.display());
                continue;
            }
            match std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|data| serde_json::from_str::<Self>(&data).map_err(|e| e.to_string()))
            {
                Ok(local) => {
                    debug!("Loaded local version {} from {}", local.version, path.display());
                    return local;
                }
                Err(e) => warn!("Ignoring unreadable version file {}: {}", path.display(), e),
            }
        }
        Self::builtin()
    }

    pub fn save(&self, path: &Path) -> Result<(), UpdateError> {
        let to_error = |source| UpdateError::VersionFile {
            path: path.display().to_string(),
            source,
        };
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| to_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(to_error)?;
        }
        std::fs::write(path, data).map_err(to_error)
    }
}

/// Where a local version file may live: the data directory first, then next
/// to the executable.
pub fn version_file_candidates(data_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![data_dir.join(VERSION_FILE)];
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join(VERSION_FILE));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_versioned_download_falls_back() {
        let manifest = VersionManifest::from_json(
            r#"{
                "version": "1.0.3",
                "download_url": "http://example.com/latest.exe",
                "version_download_url": "  "
            }"#,
        )
        .unwrap();

        assert_eq!(
            manifest.preferred_download_url(),
            Some("http://example.com/latest.exe")
        );
    }

    #[test]
    fn test_manifest_prefers_versioned_download() {
        let manifest = VersionManifest::from_json(
            r#"{
                "version": "1.0.2",
                "download_url": "http://example.com/latest.exe",
                "version_download_url": "http://example.com/v1.0.2/app.exe",
                "changelog": ["faster lines"],
                "force_update": true
            }"#,
        )
        .unwrap();

        assert_eq!(
            manifest.preferred_download_url(),
            Some("http://example.com/v1.0.2/app.exe")
        );
        assert!(manifest.force_update);
        assert_eq!(manifest.changelog, vec!["faster lines".to_string()]);
    }

    #[test]
    fn test_manifest_defaults() {
        let manifest = VersionManifest::from_json(r#"{"version": "2.0.0"}"#).unwrap();
        assert_eq!(manifest.preferred_download_url(), None);
        assert!(!manifest.force_update);
        assert!(manifest.changelog.is_empty());

        let generic = VersionManifest::from_json(
            r#"{"version": "2.0.0", "download_url": "http://example.com/a.exe"}"#,
        )
        .unwrap();
        assert_eq!(generic.preferred_download_url(), Some("http://example.com/a.exe"));
    }

    #[test]
    fn test_manifest_rejects_garbage() {
        assert!(matches!(
            VersionManifest::from_json("<html>not json</html>"),
            Err(UpdateError::Manifest(_))
        ));
    }

    #[test]
    fn test_local_version_roundtrip_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(VERSION_FILE);

        let missing = LocalVersion::load_first(&[path.clone()]);
        assert_eq!(missing, LocalVersion::builtin());

        LocalVersion::new("1.2.3", vec!["fix".to_string()])
            .save(&path)
            .unwrap();
        let loaded = LocalVersion::load_first(&[dir.path().join("absent.json"), path]);
        assert_eq!(loaded.version, "1.2.3");
        assert!(loaded.release_date.is_some());
    }

    #[test]
    fn test_corrupt_version_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        let good = dir.path().join("good.json");
        std::fs::write(&bad, "{ nope").unwrap();
        std::fs::write(&good, r#"{"version": "3.1"}"#).unwrap();

        assert_eq!(LocalVersion::load_first(&[bad, good]).version, "3.1");
    }
}
