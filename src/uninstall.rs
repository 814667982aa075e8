use crate::store::ArtifactStore;
use crate::types::UninstallReport;

/// Remove each version's directory, clearing the marker first when it names
/// that version.
///
/// Clearing the marker is best-effort and happens before the removal; if the
/// process dies in between, the marker may already be empty while the
/// directory remains. An absent directory counts as removed.
pub fn uninstall(store: &ArtifactStore, versions: &[String]) -> UninstallReport {
    let mut report = UninstallReport::default();

    for version in versions {
        match store.read_marker() {
            Ok(current) if current == *version => {
                if let Err(e) = store.clear_marker() {
                    tracing::warn!(
                        "Could not clear current version marker for {}: {}",
                        version,
                        e
                    );
                }
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Marker unreadable while uninstalling {}: {}", version, e),
        }

        match store.remove(version) {
            Ok(true) => {
                tracing::info!("Version {} uninstalled", version);
                report.removed.push(version.clone());
            }
            Ok(false) => {
                tracing::debug!("Version {} was not installed", version);
                report.removed.push(version.clone());
            }
            Err(e) => {
                tracing::warn!("Failed to uninstall version {}: {}", version, e);
                report.not_removed.push(version.clone());
            }
        }
    }

    report
}
