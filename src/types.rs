use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Body of a channel's `list.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Manifest {
    #[serde(default)]
    pub releases: BTreeMap<String, String>,
    #[serde(default)]
    pub builds: Vec<Build>,
}

/// One installable compiler artifact as declared by a manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Build {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub keccak256: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
}

impl Build {
    /// Both declared digests as `(sha256, keccak256)`, or `None` when the
    /// manifest left either one out.
    pub fn digests(&self) -> Option<(&str, &str)> {
        match (self.sha256.as_deref(), self.keccak256.as_deref()) {
            (Some(sha), Some(keccak)) if !sha.is_empty() && !keccak.is_empty() => {
                Some((sha, keccak))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashKind {
    Sha256,
    Keccak256,
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKind::Sha256 => write!(f, "Sha256"),
            HashKind::Keccak256 => write!(f, "Keccak256"),
        }
    }
}

/// Outcome of a batch install. Order within each list is completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub not_installed: Vec<String>,
}

/// Outcome of a batch uninstall.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UninstallReport {
    pub removed: Vec<String>,
    pub not_removed: Vec<String>,
}
