use crate::checksum;
use crate::config::Config;
use crate::download::{download_bytes, extract_zip, find_file, make_executable};
use crate::error::{Result, SolcError};
use crate::manifest::{find_build, ManifestClient};
use crate::platform::{Layout, Platform};
use crate::store::{artifact_name, ArtifactStore};
use crate::types::{Build, InstallReport};
use indicatif::MultiProgress;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallMode {
    #[default]
    Sequential,
    /// One task per version, bounded by `max_parallel_downloads`.
    Parallel,
}

#[derive(Debug, Clone)]
pub struct Installer {
    client: reqwest::Client,
    config: Config,
    store: ArtifactStore,
    platform: Arc<dyn Platform>,
    progress: Option<MultiProgress>,
}

impl Installer {
    pub fn new(client: reqwest::Client, config: Config, platform: Arc<dyn Platform>) -> Self {
        Self {
            store: ArtifactStore::new(&config),
            client,
            config,
            platform,
            progress: None,
        }
    }

    /// Draw download progress bars on `progress`.
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Fetch the platform's manifests and install `versions` from them.
    ///
    /// Only a manifest failure is returned as an error; everything that goes
    /// wrong with an individual version is reported in the result.
    pub async fn install(
        &self,
        versions: &[String],
        mode: InstallMode,
        cancel: &CancellationToken,
    ) -> Result<InstallReport> {
        let builds = ManifestClient::new(self.client.clone(), self.config.clone())
            .fetch_builds(self.platform.as_ref(), cancel)
            .await?;

        let report = match mode {
            InstallMode::Sequential => self.install_builds(&builds, versions, cancel).await,
            InstallMode::Parallel => self.install_builds_parallel(&builds, versions, cancel).await,
        };
        Ok(report)
    }

    /// Install `versions` one after another using an already fetched build list.
    pub async fn install_builds(
        &self,
        builds: &[Build],
        versions: &[String],
        cancel: &CancellationToken,
    ) -> InstallReport {
        let mut report = InstallReport::default();

        for version in versions {
            if cancel.is_cancelled() {
                tracing::warn!("Install of {} skipped: cancelled", version);
                report.not_installed.push(version.clone());
                continue;
            }

            let Some(build) = find_build(builds, version) else {
                tracing::warn!("{}", SolcError::unknown_version(version.as_str()));
                report.not_installed.push(version.clone());
                continue;
            };

            match self.install_build(build, cancel).await {
                Ok(_) => report.installed.push(version.clone()),
                Err(e) => {
                    tracing::warn!("Failed to install version {}: {}", version, e);
                    report.not_installed.push(version.clone());
                }
            }
        }

        report
    }

    /// Install `versions` concurrently. Completion order is unspecified.
    pub async fn install_builds_parallel(
        &self,
        builds: &[Build],
        versions: &[String],
        cancel: &CancellationToken,
    ) -> InstallReport {
        let report = Arc::new(Mutex::new(InstallReport::default()));
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism()));
        let mut set = JoinSet::new();
        let mut spawned = Vec::new();

        for version in versions {
            let Some(build) = find_build(builds, version).cloned() else {
                tracing::warn!("{}", SolcError::unknown_version(version.as_str()));
                record(&report, |r| r.not_installed.push(version.clone()));
                continue;
            };

            spawned.push(version.clone());
            let installer = self.clone();
            let report = Arc::clone(&report);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();

            set.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    permit = semaphore.acquire_owned() => permit.ok(),
                };

                let outcome = match permit {
                    Some(_permit) => installer.install_build(&build, &cancel).await,
                    None => Err(SolcError::Cancelled),
                };

                match outcome {
                    Ok(_) => record(&report, |r| r.installed.push(build.version.clone())),
                    Err(e) => {
                        tracing::warn!("Failed to install version {}: {}", build.version, e);
                        record(&report, |r| r.not_installed.push(build.version.clone()));
                    }
                }
            });
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Install task aborted: {}", e);
            }
        }

        let mut merged =
            std::mem::take(&mut *report.lock().unwrap_or_else(PoisonError::into_inner));

        // Tasks that died without recording anything
        for version in spawned {
            if !merged.installed.contains(&version) && !merged.not_installed.contains(&version) {
                merged.not_installed.push(version);
            }
        }

        merged
    }

    /// Download, verify and place a single build. Returns the executable path.
    pub async fn install_build(&self, build: &Build, cancel: &CancellationToken) -> Result<PathBuf> {
        let url = self.platform.build_url(&self.config, build);
        let label = artifact_name(&build.version);
        tracing::debug!("Downloading {} from {}", label, url);

        let data = download_bytes(&self.client, &url, &label, self.progress.as_ref(), cancel).await?;

        if self.platform.requires_checksum(build) {
            let (sha256, keccak256) = build.digests().ok_or_else(|| SolcError::MissingChecksum {
                version: build.version.clone(),
            })?;
            checksum::verify(sha256, keccak256, &data, self.platform.channel())?;
        } else {
            tracing::debug!("Skipping checksum verification for legacy build {}", build.version);
        }

        if cancel.is_cancelled() {
            return Err(SolcError::Cancelled);
        }

        let path = self.place(&build.version, &data)?;
        tracing::info!("Version {} installed at {}", build.version, path.display());
        Ok(path)
    }

    fn place(&self, version: &str, data: &[u8]) -> Result<PathBuf> {
        let artifacts_dir = self.store.artifacts_dir();
        fs::create_dir_all(artifacts_dir)?;

        let staging = TempDir::new_in(artifacts_dir)?;
        let name = artifact_name(version);
        let staged_binary = staging.path().join(&name);

        match self.platform.layout(version) {
            Layout::RawBinary => {
                fs::write(&staged_binary, data)?;
            }
            Layout::ZipArchive { executable } => {
                extract_zip(data, staging.path())?;
                let found = find_file(staging.path(), executable).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("archive for {} does not contain {}", version, executable),
                    )
                })?;
                fs::rename(found, &staged_binary)?;
            }
        }
        make_executable(&staged_binary)?;

        let version_dir = self.store.version_dir(version);
        replace_dir(staging.path(), &version_dir)?;

        Ok(self.store.path(version))
    }
}

fn record(report: &Mutex<InstallReport>, update: impl FnOnce(&mut InstallReport)) {
    let mut guard = report.lock().unwrap_or_else(PoisonError::into_inner);
    update(&mut guard);
}

/// Move `staged` to `target`, replacing whatever is there.
fn replace_dir(staged: &Path, target: &Path) -> io::Result<()> {
    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::rename(staged, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MacPlatform, WindowsPlatform};
    use tempfile::TempDir;

    fn installer(platform: Arc<dyn Platform>) -> (TempDir, Installer) {
        let dir = TempDir::new().unwrap();
        let config = Config::for_home(dir.path());
        config.ensure_layout().unwrap();
        (dir, Installer::new(reqwest::Client::new(), config, platform))
    }

    #[test]
    fn test_place_raw_binary() {
        let (_dir, installer) = installer(Arc::new(MacPlatform));
        let path = installer.place("0.8.3", b"raw-compiler").unwrap();

        assert_eq!(path, installer.store().path("0.8.3"));
        assert_eq!(fs::read(&path).unwrap(), b"raw-compiler");

        // Staging directories are gone and invisible to the listing
        let entries: Vec<_> = fs::read_dir(installer.store().artifacts_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["solc-0.8.3"]);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_place_replaces_existing_install() {
        let (_dir, installer) = installer(Arc::new(MacPlatform));
        fs::create_dir_all(installer.store().version_dir("0.8.3")).unwrap();
        fs::write(installer.store().version_dir("0.8.3").join("stale"), "").unwrap();

        installer.place("0.8.3", b"fresh").unwrap();

        assert!(!installer.store().version_dir("0.8.3").join("stale").exists());
        assert_eq!(fs::read(installer.store().path("0.8.3")).unwrap(), b"fresh");
    }

    #[test]
    fn test_place_zip_without_executable_leaves_no_ghost() {
        let (_dir, installer) = installer(Arc::new(WindowsPlatform));
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            use std::io::Write;
            let mut writer = zip::ZipWriter::new(&mut buf);
            writer
                .start_file("README.txt", zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(b"no compiler here").unwrap();
            writer.finish().unwrap();
        }

        let err = installer.place("0.4.1", buf.get_ref()).unwrap_err();
        assert!(matches!(err, SolcError::Io(_)));
        assert!(!installer.store().is_installed("0.4.1").unwrap());
    }

    #[tokio::test]
    async fn test_unknown_versions_skip_network() {
        let (_dir, installer) = installer(Arc::new(MacPlatform));
        let versions = vec!["0.0.0".to_string(), "9.9.9".to_string()];
        let cancel = CancellationToken::new();

        let report = installer.install_builds(&[], &versions, &cancel).await;
        assert!(report.installed.is_empty());
        assert_eq!(report.not_installed, versions);

        let report = installer.install_builds_parallel(&[], &versions, &cancel).await;
        assert!(report.installed.is_empty());
        assert_eq!(report.not_installed, versions);
    }

    #[tokio::test]
    async fn test_cancel_mid_download_leaves_no_version_dir() {
        let (_dir, mut installer) = installer(Arc::new(MacPlatform));
        installer.config.settings.binaries_url = crate::download::tests::stalled_server().await;

        let builds = vec![Build {
            path: "solc-macosx-amd64-v0.8.3".into(),
            name: String::new(),
            version: "0.8.3".into(),
            keccak256: Some("0x00".into()),
            sha256: Some("0x00".into()),
        }];
        let versions = vec!["0.8.3".to_string()];
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let report = installer.install_builds(&builds, &versions, &cancel).await;

        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(report.not_installed, versions);
        assert!(report.installed.is_empty());
        assert!(!installer.store().version_dir("0.8.3").exists());
        assert_eq!(
            fs::read_dir(installer.store().artifacts_dir()).unwrap().count(),
            0
        );
    }

    #[tokio::test]
    async fn test_cancelled_batch_installs_nothing() {
        let (_dir, installer) = installer(Arc::new(MacPlatform));
        let builds = vec![Build {
            path: "solc-macosx-amd64-v0.8.3".into(),
            name: String::new(),
            version: "0.8.3".into(),
            keccak256: None,
            sha256: None,
        }];
        let versions = vec!["0.8.3".to_string()];
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = installer.install_builds(&builds, &versions, &cancel).await;
        assert_eq!(report.not_installed, versions);

        let report = installer.install_builds_parallel(&builds, &versions, &cancel).await;
        assert_eq!(report.not_installed, versions);
        assert!(installer.store().list_installed().unwrap().is_empty());
    }
}
