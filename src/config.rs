use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = ".gsolc-select";
pub const ARTIFACTS_DIR_NAME: &str = "artifacts";
pub const CURRENT_VERSION_FILE_NAME: &str = "global-version";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const SOLIDITYLANG_URL: &str = "https://binaries.soliditylang.org";
pub const LEGACY_LIST_URL: &str =
    "https://raw.githubusercontent.com/crytic/solc/new-list-json/linux/amd64/list.json";
pub const LEGACY_BINARIES_URL: &str = "https://raw.githubusercontent.com/crytic/solc/master/linux/amd64";

pub const HOME_ENV: &str = "SOLC_SELECT_HOME";
pub const VERSION_ENV: &str = "SOLC_VERSION";

/// Settings that may be persisted in `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_binaries_url")]
    pub binaries_url: String,
    #[serde(default = "default_legacy_list_url")]
    pub legacy_list_url: String,
    #[serde(default = "default_legacy_binaries_url")]
    pub legacy_binaries_url: String,
    #[serde(default = "default_max_parallel_downloads")]
    pub max_parallel_downloads: usize,
}

fn default_binaries_url() -> String {
    SOLIDITYLANG_URL.to_string()
}
fn default_legacy_list_url() -> String {
    LEGACY_LIST_URL.to_string()
}
fn default_legacy_binaries_url() -> String {
    LEGACY_BINARIES_URL.to_string()
}
fn default_max_parallel_downloads() -> usize {
    8
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            binaries_url: default_binaries_url(),
            legacy_list_url: default_legacy_list_url(),
            legacy_binaries_url: default_legacy_binaries_url(),
            max_parallel_downloads: default_max_parallel_downloads(),
        }
    }
}

/// Everything the engine needs to know about where things live.
///
/// Components receive a `Config` at construction; nothing reads paths from
/// process-wide state, so tests can root a config in a fresh temp directory.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Config {
    pub home: PathBuf,
    pub artifacts_dir: PathBuf,
    pub current_version_file: PathBuf,
    #[serde(flatten)]
    pub settings: Settings,
    /// Read-only override of the marker file, taken from `SOLC_VERSION`.
    #[serde(skip)]
    pub version_override: Option<String>,
}

impl Config {
    pub fn for_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            artifacts_dir: home.join(ARTIFACTS_DIR_NAME),
            current_version_file: home.join(CURRENT_VERSION_FILE_NAME),
            home,
            settings: Settings::default(),
            version_override: None,
        }
    }

    /// Resolve the configuration for this process: home directory, optional
    /// `config.json`, then environment overrides.
    pub fn load() -> Result<Self> {
        let home = match env::var_os(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => default_home()?,
        };
        tracing::debug!("Application directory: {}", home.display());

        let mut config = Config::for_home(home);
        config.settings = load_settings(&config.home.join(CONFIG_FILE_NAME))?;

        if let Ok(url) = env::var("SOLC_SELECT_BINARIES_URL") {
            config.settings.binaries_url = url;
        }
        if let Ok(url) = env::var("SOLC_SELECT_LEGACY_LIST_URL") {
            config.settings.legacy_list_url = url;
        }
        if let Ok(url) = env::var("SOLC_SELECT_LEGACY_BINARIES_URL") {
            config.settings.legacy_binaries_url = url;
        }
        if let Ok(limit) = env::var("SOLC_SELECT_MAX_PARALLEL") {
            if let Ok(limit) = limit.parse::<usize>() {
                config.settings.max_parallel_downloads = limit;
            }
        }

        config.version_override = env::var(VERSION_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(config)
    }

    /// Create the artifacts directory and an empty marker file if missing.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.artifacts_dir)?;
        if !self.current_version_file.exists() {
            tracing::debug!(
                "Creating empty marker file at {}",
                self.current_version_file.display()
            );
            fs::write(&self.current_version_file, "")?;
        }
        Ok(())
    }

    /// At least one download slot, whatever the settings say.
    pub fn parallelism(&self) -> usize {
        self.settings.max_parallel_downloads.max(1)
    }
}

fn default_home() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(APP_DIR_NAME))
}

fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read config file at {}", path.display()))?;

    serde_json::from_str(&content).with_context(|| "Could not parse config file as JSON")
}
