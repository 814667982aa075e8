pub mod checksum;
pub mod config;
pub mod download;
pub mod error;
pub mod install;
pub mod manifest;
pub mod platform;
pub mod store;
pub mod switch;
pub mod types;
pub mod uninstall;
pub mod versions;


pub use config::Config;
pub use error::{Result, SolcError};
pub use install::{InstallMode, Installer};
pub use manifest::ManifestClient;
pub use platform::Platform;
pub use store::ArtifactStore;
pub use switch::use_version;
pub use types::{Build, HashKind, InstallReport, Manifest, UninstallReport};
pub use uninstall::uninstall;
