//! Checks the release manifest and points the user at new downloads.
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::StatusCode;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use super::manifest::{LocalVersion, VersionManifest};
use super::version::is_newer;
use crate::error::UpdateError;
use crate::parser::Launcher;

const MANIFEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub current: String,
    pub latest: String,
    pub download_url: String,
    pub changelog: Vec<String>,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate { current: String },
    Available(UpdateInfo),
}

#[derive(Clone)]
pub struct Updater {
    direct: reqwest::Client,
    proxied: reqwest::Client,
    manifest_url: String,
    local: LocalVersion,
    version_path: PathBuf,
}

impl Updater {
    /// `version_path` is where an applied update records its version.
    pub fn new(
        manifest_url: impl Into<String>,
        local: LocalVersion,
        version_path: PathBuf,
    ) -> Result<Self, UpdateError> {
        let direct = reqwest::Client::builder()
            .timeout(MANIFEST_TIMEOUT)
            .no_proxy()
            .build()?;
        let proxied = reqwest::Client::builder()
            .timeout(MANIFEST_TIMEOUT)
            .build()?;
        Ok(Self {
            direct,
            proxied,
            manifest_url: manifest_url.into(),
            local,
            version_path,
        })
    }

    pub fn current_version(&self) -> &str {
        &self.local.version
    }

    /// Fetches the manifest, first bypassing any system proxy and then
    /// retrying through it if the direct connection fails.
    pub async fn fetch_manifest(&self) -> Result<VersionManifest, UpdateError> {
        debug!("Fetching update manifest from {}", self.manifest_url);
        let response = match self.request(&self.direct).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Direct manifest request failed ({}), retrying via proxy", e);
                self.request(&self.proxied).send().await?
            }
        };

        if response.status() != StatusCode::OK {
            return Err(UpdateError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        VersionManifest::from_json(&body)
    }

    fn request(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        client
            .get(&self.manifest_url)
            .header(CACHE_CONTROL, "no-cache")
            .header(ACCEPT, "application/json")
    }

    pub async fn check(&self) -> Result<UpdateStatus, UpdateError> {
        let manifest = self.fetch_manifest().await?;
        evaluate(&self.local.version, &manifest)
    }

    /// Opens the download link and records the new version locally.
    pub fn apply(&mut self, info: &UpdateInfo, launcher: &dyn Launcher) -> Result<(), UpdateError> {
        launcher
            .open(&info.download_url)
            .map_err(UpdateError::Launch)?;

        let local = LocalVersion::new(info.latest.clone(), info.changelog.clone());
        local.save(&self.version_path)?;
        info!("Recorded version {} in {}", local.version, self.version_path.display());
        self.local = local;
        Ok(())
    }
}

/// Decides what a manifest means for the installed version.
pub fn evaluate(current: &str, manifest: &VersionManifest) -> Result<UpdateStatus, UpdateError> {
    if !is_newer(&manifest.version, current) {
        return Ok(UpdateStatus::UpToDate {
            current: current.to_string(),
        });
    }

    let download_url = manifest
        .preferred_download_url()
        .ok_or(UpdateError::MissingDownloadUrl)?;

    Ok(UpdateStatus::Available(UpdateInfo {
        current: current.to_string(),
        latest: manifest.version.clone(),
        download_url: download_url.to_string(),
        changelog: manifest.changelog.clone(),
        force: manifest.force_update,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::launcher::testing::RecordingLauncher;
    use crate::update::manifest::VERSION_FILE;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn manifest(version: &str, url: Option<&str>) -> VersionManifest {
        VersionManifest {
            version: version.to_string(),
            download_url: url.map(str::to_string),
            version_download_url: None,
            changelog: vec!["new lines".to_string()],
            force_update: false,
        }
    }

    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/version.json", addr)
    }

    #[test]
    fn test_evaluate_up_to_date() {
        let status = evaluate("1.0.2", &manifest("1.0.2", None)).unwrap();
        assert_eq!(
            status,
            UpdateStatus::UpToDate {
                current: "1.0.2".to_string()
            }
        );
        // A malformed remote version never triggers an update.
        assert!(matches!(
            evaluate("1.0.0", &manifest("latest", Some("http://x"))).unwrap(),
            UpdateStatus::UpToDate { .. }
        ));
    }

    #[test]
    fn test_evaluate_available() {
        match evaluate("1.0.0", &manifest("1.1", Some("http://example.com/a.exe"))).unwrap() {
            UpdateStatus::Available(info) => {
                assert_eq!(info.latest, "1.1");
                assert_eq!(info.current, "1.0.0");
                assert_eq!(info.download_url, "http://example.com/a.exe");
                assert!(!info.force);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_missing_download_url() {
        assert!(matches!(
            evaluate("1.0.0", &manifest("2.0.0", None)),
            Err(UpdateError::MissingDownloadUrl)
        ));
    }

    #[tokio::test]
    async fn test_check_against_server() {
        let url = serve_once(
            "200 OK",
            r#"{"version":"9.0.0","version_download_url":"http://example.com/v9.exe","force_update":true}"#,
        )
        .await;
        let dir = tempfile::tempdir().unwrap();
        let updater = Updater::new(
            url,
            LocalVersion::new("1.0.0", Vec::new()),
            dir.path().join(VERSION_FILE),
        )
        .unwrap();

        match updater.check().await.unwrap() {
            UpdateStatus::Available(info) => {
                assert_eq!(info.download_url, "http://example.com/v9.exe");
                assert!(info.force);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_reports_bad_status() {
        let url = serve_once("500 Internal Server Error", "").await;
        let dir = tempfile::tempdir().unwrap();
        let updater =
            Updater::new(url, LocalVersion::builtin(), dir.path().join(VERSION_FILE)).unwrap();

        assert!(matches!(updater.check().await, Err(UpdateError::Status(500))));
    }

    #[test]
    fn test_apply_opens_link_and_records_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(VERSION_FILE);
        let mut updater =
            Updater::new("http://127.0.0.1:9/version.json", LocalVersion::builtin(), path.clone())
                .unwrap();
        let info = UpdateInfo {
            current: updater.current_version().to_string(),
            latest: "7.0.0".to_string(),
            download_url: "http://example.com/v7.exe".to_string(),
            changelog: vec!["x".to_string()],
            force: false,
        };
        let launcher = RecordingLauncher::default();

        updater.apply(&info, &launcher).unwrap();

        assert_eq!(launcher.opened(), vec!["http://example.com/v7.exe".to_string()]);
        assert_eq!(updater.current_version(), "7.0.0");
        assert_eq!(LocalVersion::load_first(&[path]).version, "7.0.0");
    }

    #[test]
    fn test_apply_launch_failure_keeps_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(VERSION_FILE);
        let mut updater =
            Updater::new("http://127.0.0.1:9/version.json", LocalVersion::builtin(), path.clone())
                .unwrap();
        let info = UpdateInfo {
            current: updater.current_version().to_string(),
            latest: "7.0.0".to_string(),
            download_url: "http://example.com/v7.exe".to_string(),
            changelog: Vec::new(),
            force: false,
        };

        assert!(matches!(
            updater.apply(&info, &RecordingLauncher::failing()),
            Err(UpdateError::Launch(_))
        ));
        assert!(!path.exists());
        assert_eq!(updater.current_version(), env!("CARGO_PKG_VERSION"));
    }
}
