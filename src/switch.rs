use crate::error::{Result, SolcError};
use crate::store::ArtifactStore;

/// Make `version` the current compiler. It must already be installed.
pub fn use_version(store: &ArtifactStore, version: &str) -> Result<()> {
    if !store.is_installed(version)? {
        return Err(SolcError::not_installed(version));
    }

    store.write_marker(version)?;
    tracing::info!("Switched global version to '{}'", version);
    Ok(())
}
