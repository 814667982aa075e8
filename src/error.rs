use crate::types::HashKind;
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T, E = SolcError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum SolcError {
    #[error("'{platform}' platform is not currently supported")]
    UnsupportedPlatform { platform: String },

    #[error("Unknown version: '{version}'")]
    UnknownVersion { version: String },

    #[error("Version '{version}' not installed. Run `solc-select install {version}`")]
    NotInstalled { version: String },

    #[error("No compiler version selected")]
    NoCompilerSelected,

    #[error("Received unexpected status code {status} from '{url}'")]
    UnexpectedStatusCode { status: StatusCode, url: String },

    #[error("{hash} checksum mismatch of files for {platform} platform")]
    ChecksumMismatch { hash: HashKind, platform: String },

    #[error("Manifest declares no checksums for version '{version}'")]
    MissingChecksum { version: String },

    #[error("Invalid version '{0}'")]
    InvalidVersion(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Could not parse manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not extract archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl SolcError {
    pub fn not_installed(version: impl Into<String>) -> Self {
        SolcError::NotInstalled {
            version: version.into(),
        }
    }

    pub fn unknown_version(version: impl Into<String>) -> Self {
        SolcError::UnknownVersion {
            version: version.into(),
        }
    }
}
