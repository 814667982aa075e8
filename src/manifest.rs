use crate::config::Config;
use crate::download::send_get;
use crate::error::{Result, SolcError};
use crate::platform::Platform;
use crate::types::{Build, Manifest};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ManifestClient {
    client: reqwest::Client,
    config: Config,
}

impl ManifestClient {
    pub fn new(client: reqwest::Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn fetch_manifest(&self, url: &str, cancel: &CancellationToken) -> Result<Manifest> {
        let response = send_get(&self.client, url, cancel).await?;
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SolcError::Cancelled),
            body = response.bytes() => body?,
        };
        Ok(serde_json::from_slice(&body)?)
    }

    /// Every build the platform can install. Manifests are merged in the
    /// platform's order; a later manifest redeclaring a version replaces the
    /// earlier entry.
    pub async fn fetch_builds(
        &self,
        platform: &dyn Platform,
        cancel: &CancellationToken,
    ) -> Result<Vec<Build>> {
        let mut builds: Vec<Build> = Vec::new();
        for url in platform.manifest_urls(&self.config) {
            let manifest = self.fetch_manifest(&url, cancel).await?;
            tracing::debug!("{} lists {} builds", url, manifest.builds.len());
            merge_builds(&mut builds, manifest.builds);
        }
        Ok(builds)
    }

    /// Installable versions mapped to their release file names.
    pub async fn available_versions(
        &self,
        platform: &dyn Platform,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<String, String>> {
        let mut releases = BTreeMap::new();
        for url in platform.manifest_urls(&self.config) {
            let manifest = self.fetch_manifest(&url, cancel).await?;
            releases.extend(manifest.releases);
        }
        Ok(releases)
    }
}

fn merge_builds(builds: &mut Vec<Build>, incoming: Vec<Build>) {
    for build in incoming {
        builds.retain(|existing| existing.version != build.version);
        builds.push(build);
    }
}

/// Exact-match lookup of a version's build.
pub fn find_build<'a>(builds: &'a [Build], version: &str) -> Option<&'a Build> {
    builds.iter().find(|b| b.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{LinuxPlatform, MacPlatform};

    const PRIMARY: &str = r#"{
        "builds": [
            {
                "path": "solc-linux-amd64-v0.4.10+commit.f0d539ae",
                "version": "0.4.10",
                "longVersion": "0.4.10+commit.f0d539ae",
                "keccak256": "0x1111",
                "sha256": "0x2222",
                "urls": []
            },
            {
                "path": "solc-linux-amd64-v0.8.3+commit.8d00100c",
                "version": "0.8.3",
                "keccak256": "0x3333",
                "sha256": "0x4444"
            }
        ],
        "releases": {
            "0.4.10": "solc-linux-amd64-v0.4.10+commit.f0d539ae",
            "0.8.3": "solc-linux-amd64-v0.8.3+commit.8d00100c"
        },
        "latestRelease": "0.8.3"
    }"#;

    const LEGACY: &str = r#"{
        "builds": [
            { "name": "solc-v0.4.9", "version": "0.4.9" },
            { "name": "solc-v0.4.10", "version": "0.4.10", "keccak256": "0x5555", "sha256": "0x6666" }
        ],
        "releases": {
            "0.4.9": "solc-v0.4.9",
            "0.4.10": "solc-v0.4.10"
        }
    }"#;

    async fn server_with(
        primary: (usize, &str),
        legacy: (usize, &str),
    ) -> (mockito::ServerGuard, Vec<mockito::Mock>, Config) {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for path in ["/linux-amd64/list.json", "/macosx-amd64/list.json"] {
            let mock = server
                .mock("GET", path)
                .with_status(primary.0)
                .with_body(primary.1)
                .create_async()
                .await;
            mocks.push(mock);
        }
        let mock = server
            .mock("GET", "/legacy/list.json")
            .with_status(legacy.0)
            .with_body(legacy.1)
            .create_async()
            .await;
        mocks.push(mock);

        let mut config = Config::for_home("/tmp/unused");
        config.settings.binaries_url = server.url();
        config.settings.legacy_list_url = format!("{}/legacy/list.json", server.url());
        (server, mocks, config)
    }

    fn client(config: Config) -> ManifestClient {
        ManifestClient::new(reqwest::Client::new(), config)
    }

    #[tokio::test]
    async fn test_linux_merges_legacy_builds() {
        let (_server, _mocks, config) = server_with((200, PRIMARY), (200, LEGACY)).await;
        let builds = client(config)
            .fetch_builds(&LinuxPlatform, &CancellationToken::new())
            .await
            .unwrap();

        let versions: Vec<&str> = builds.iter().map(|b| b.version.as_str()).collect();
        assert_eq!(versions, vec!["0.8.3", "0.4.9", "0.4.10"]);

        // Legacy redeclaration of 0.4.10 wins
        let redeclared = find_build(&builds, "0.4.10").unwrap();
        assert_eq!(redeclared.name, "solc-v0.4.10");
        assert_eq!(redeclared.sha256.as_deref(), Some("0x6666"));

        let undigested = find_build(&builds, "0.4.9").unwrap();
        assert!(undigested.digests().is_none());
    }

    #[tokio::test]
    async fn test_mac_ignores_legacy_manifest() {
        let (_server, _mocks, config) = server_with((200, PRIMARY), (500, "")).await;
        let builds = client(config)
            .fetch_builds(&MacPlatform, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(builds.len(), 2);
    }

    #[tokio::test]
    async fn test_legacy_failure_fails_whole_call() {
        let (_server, _mocks, config) = server_with((200, PRIMARY), (503, "")).await;
        let err = client(config)
            .fetch_builds(&LinuxPlatform, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            SolcError::UnexpectedStatusCode { status, url } => {
                assert_eq!(status.as_u16(), 503);
                assert!(url.ends_with("/legacy/list.json"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_manifest() {
        let (_server, _mocks, config) = server_with((200, "{ not json"), (200, LEGACY)).await;
        let err = client(config)
            .fetch_builds(&MacPlatform, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SolcError::Json(_)));
    }

    #[tokio::test]
    async fn test_available_versions_merge_releases() {
        let (_server, _mocks, config) = server_with((200, PRIMARY), (200, LEGACY)).await;
        let releases = client(config)
            .available_versions(&LinuxPlatform, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(releases.len(), 3);
        assert_eq!(releases["0.4.10"], "solc-v0.4.10");
        assert_eq!(releases["0.4.9"], "solc-v0.4.9");
        assert_eq!(
            releases["0.8.3"],
            "solc-linux-amd64-v0.8.3+commit.8d00100c"
        );
    }

    #[test]
    fn test_find_build_is_exact() {
        let builds = vec![Build {
            path: "p".into(),
            name: String::new(),
            version: "0.8.3".into(),
            keccak256: None,
            sha256: None,
        }];
        assert!(find_build(&builds, "0.8.3").is_some());
        assert!(find_build(&builds, "0.8").is_none());
        assert!(find_build(&builds, "0.8.30").is_none());
    }
}
