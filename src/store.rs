use crate::config::Config;
use crate::error::{Result, SolcError};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const PREFIX: &str = "solc";

/// `solc-<version>`, the name of both a version directory and its executable.
pub fn artifact_name(version: &str) -> String {
    format!("{}-{}", PREFIX, version)
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    artifacts_dir: PathBuf,
    marker_file: PathBuf,
    version_override: Option<String>,
}

impl ArtifactStore {
    pub fn new(config: &Config) -> Self {
        Self {
            artifacts_dir: config.artifacts_dir.clone(),
            marker_file: config.current_version_file.clone(),
            version_override: config.version_override.clone(),
        }
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.artifacts_dir.join(artifact_name(version))
    }

    /// Where the executable for `version` lives. Does not check existence.
    pub fn path(&self, version: &str) -> PathBuf {
        self.version_dir(version).join(artifact_name(version))
    }

    /// Versions with a directory in the store, whether or not the directory
    /// holds a usable executable. A missing store means nothing is installed.
    pub fn list_installed(&self) -> Result<BTreeSet<String>> {
        let entries = match fs::read_dir(&self.artifacts_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{}-", PREFIX);
        let mut versions = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(version) = name.strip_prefix(&prefix) {
                if !version.is_empty() {
                    versions.insert(version.to_string());
                }
            }
        }
        Ok(versions)
    }

    pub fn is_installed(&self, version: &str) -> Result<bool> {
        Ok(self.list_installed()?.contains(version))
    }

    /// `false` for ghost directories.
    pub fn is_complete(&self, version: &str) -> bool {
        self.path(version).is_file()
    }

    /// Marker contents with surrounding whitespace dropped, so a hand-edited
    /// `0.8.3\n` still names `0.8.3`. A missing marker file is an I/O error.
    pub fn read_marker(&self) -> io::Result<String> {
        Ok(fs::read_to_string(&self.marker_file)?.trim().to_string())
    }

    /// Replace the marker with exactly `contents`.
    ///
    /// The new contents are written to a sibling temp file which is then
    /// renamed over the marker, so readers see either the old or the new
    /// value and never a partial write.
    pub fn write_marker(&self, contents: &str) -> io::Result<()> {
        let parent = self
            .marker_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        staged.write_all(contents.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(&self.marker_file).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn clear_marker(&self) -> io::Result<()> {
        self.write_marker("")
    }

    /// The selected version. `SOLC_VERSION` takes precedence over the marker
    /// file; either way the version must be installed.
    pub fn current(&self) -> Result<String> {
        let version = match &self.version_override {
            Some(version) => {
                tracing::debug!("Using current version override '{}'", version);
                version.clone()
            }
            None => self.read_marker()?,
        };

        if version.is_empty() {
            return Err(SolcError::NoCompilerSelected);
        }

        if !self.is_installed(&version)? {
            return Err(SolcError::not_installed(version));
        }

        Ok(version)
    }

    /// Remove a version directory. Returns `false` if it was already absent.
    pub fn remove(&self, version: &str) -> io::Result<bool> {
        let dir = self.version_dir(version);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::debug!("Removed {}", dir.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
