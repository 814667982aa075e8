use crate::config::Config;
use crate::error::{Result, SolcError};
use crate::types::Build;
use crate::versions;
use semver::Version;
use std::fmt;
use std::sync::Arc;

pub const LINUX_AMD64: &str = "linux-amd64";
pub const MACOSX_AMD64: &str = "macosx-amd64";
pub const WINDOWS_AMD64: &str = "windows-amd64";

/// Linux builds below this version are only published on the legacy mirror.
pub const LINUX_LEGACY_THRESHOLD: Version = Version::new(0, 4, 10);
/// Windows builds below this version ship as a zip holding `solc.exe`.
pub const WINDOWS_LEGACY_THRESHOLD: Version = Version::new(0, 7, 2);

/// How a downloaded payload becomes the executable on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// The payload is the executable itself.
    RawBinary,
    /// The payload is a zip archive; `executable` is the binary's name inside it.
    ZipArchive { executable: &'static str },
}

pub trait Platform: fmt::Debug + Send + Sync {
    /// URL segment naming this platform's build channel.
    fn channel(&self) -> &'static str;

    /// Manifests listing this channel's builds, in merge order. Later
    /// manifests win when they redeclare a version.
    fn manifest_urls(&self, config: &Config) -> Vec<String> {
        vec![primary_manifest_url(config, self.channel())]
    }

    fn build_url(&self, config: &Config, build: &Build) -> String {
        format!(
            "{}/{}/{}",
            config.settings.binaries_url.trim_end_matches('/'),
            self.channel(),
            build.path
        )
    }

    fn layout(&self, _version: &str) -> Layout {
        Layout::RawBinary
    }

    /// Whether the payload of `build` must pass checksum verification.
    fn requires_checksum(&self, _build: &Build) -> bool {
        true
    }
}

fn primary_manifest_url(config: &Config, channel: &str) -> String {
    format!(
        "{}/{}/list.json",
        config.settings.binaries_url.trim_end_matches('/'),
        channel
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxPlatform;

#[derive(Debug, Clone, Copy, Default)]
pub struct MacPlatform;

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPlatform;

impl LinuxPlatform {
    fn is_legacy(version: &str) -> bool {
        versions::is_older_than(version, &LINUX_LEGACY_THRESHOLD)
    }
}

impl Platform for LinuxPlatform {
    fn channel(&self) -> &'static str {
        LINUX_AMD64
    }

    fn manifest_urls(&self, config: &Config) -> Vec<String> {
        vec![
            primary_manifest_url(config, self.channel()),
            config.settings.legacy_list_url.clone(),
        ]
    }

    fn build_url(&self, config: &Config, build: &Build) -> String {
        if Self::is_legacy(&build.version) {
            return format!(
                "{}/{}",
                config.settings.legacy_binaries_url.trim_end_matches('/'),
                build.name
            );
        }
        format!(
            "{}/{}/{}",
            config.settings.binaries_url.trim_end_matches('/'),
            self.channel(),
            build.path
        )
    }

    // The legacy mirror does not always publish digests
    fn requires_checksum(&self, build: &Build) -> bool {
        !(Self::is_legacy(&build.version) && build.digests().is_none())
    }
}

impl Platform for MacPlatform {
    fn channel(&self) -> &'static str {
        MACOSX_AMD64
    }
}

impl Platform for WindowsPlatform {
    fn channel(&self) -> &'static str {
        WINDOWS_AMD64
    }

    fn layout(&self, version: &str) -> Layout {
        if versions::is_older_than(version, &WINDOWS_LEGACY_THRESHOLD) {
            Layout::ZipArchive {
                executable: "solc.exe",
            }
        } else {
            Layout::RawBinary
        }
    }
}

/// Map an operating system identifier to its build channel.
pub fn resolve(os: &str) -> Result<Arc<dyn Platform>> {
    match os {
        "linux" => Ok(Arc::new(LinuxPlatform)),
        "macos" | "darwin" => Ok(Arc::new(MacPlatform)),
        "windows" => Ok(Arc::new(WindowsPlatform)),
        other => Err(SolcError::UnsupportedPlatform {
            platform: other.to_string(),
        }),
    }
}

/// The platform this process is running on.
pub fn current() -> Result<Arc<dyn Platform>> {
    let os = std::env::consts::OS;
    tracing::debug!("Resolving platform for host OS '{}'", os);
    resolve(os)
}
