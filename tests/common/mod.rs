//! Shared helpers for integration tests.
//!
//! [`TestLibrary`] owns a temp directory laid out like a deployment (media,
//! data and scratch roots) and builds a [`Resolver`] over it that never talks
//! to the network unless a test wires a mock server in.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hdrscan::images::{AllowedSource, ArtworkCache};
use hdrscan::metadata::providers::TmdbClient;
use hdrscan::metadata::{ArtworkProvider, Enricher};
use hdrscan::scanner::ScanSettings;
use hdrscan::{Resolver, ScanRegistry};
use hdrscan_av::{Prober, ToolRegistry};
use tempfile::TempDir;

/// TMDB client without a key. Reports itself unavailable.
pub fn offline_tmdb() -> Arc<TmdbClient> {
    Arc::new(
        TmdbClient::new(None, "en", "http://127.0.0.1:9", Duration::from_secs(1))
            .expect("client builds"),
    )
}

/// Allow-list entry for a wiremock server under `prefix`.
pub fn mock_source(server: &wiremock::MockServer, provider: &str, prefix: &str) -> AllowedSource {
    let addr = server.address();
    AllowedSource::new(provider, "http", &addr.ip().to_string(), Some(addr.port()), prefix)
}

pub struct TestLibrary {
    pub dir: TempDir,
    pub cache: Arc<ArtworkCache>,
    pub registry: Arc<ScanRegistry>,
}

impl TestLibrary {
    pub fn new() -> Self {
        Self::with_sources(AllowedSource::defaults())
    }

    pub fn with_sources(sources: Vec<AllowedSource>) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("media")).expect("media dir");

        let cache = Arc::new(
            ArtworkCache::new(dir.path().join("data/posters"), Duration::from_secs(5))
                .expect("cache dir")
                .with_allowed_sources(sources),
        );
        let registry = ScanRegistry::new(Some(Self::registry_path_in(dir.path())), cache.clone());

        Self {
            dir,
            cache,
            registry,
        }
    }

    fn registry_path_in(root: &Path) -> PathBuf {
        root.join("data/scanned_files.json")
    }

    pub fn registry_path(&self) -> PathBuf {
        Self::registry_path_in(self.dir.path())
    }

    pub fn media(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    pub fn scratch(&self) -> PathBuf {
        self.dir.path().join("temp")
    }

    /// Create a file under the media root with some placeholder bytes.
    pub fn add_file(&self, relative: &str) -> PathBuf {
        let path = self.media().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("parent dir");
        }
        std::fs::write(&path, b"\x1a\x45\xdf\xa3 placeholder").expect("write file");
        path
    }

    /// Resolver with no probe tools and no reachable providers.
    pub fn resolver(&self) -> Resolver {
        self.resolver_with(ToolRegistry::default(), offline_tmdb() as Arc<dyn ArtworkProvider>, offline_tmdb())
    }

    pub fn resolver_with_tools(&self, tools: ToolRegistry) -> Resolver {
        self.resolver_with(tools, offline_tmdb() as Arc<dyn ArtworkProvider>, offline_tmdb())
    }

    pub fn resolver_with(
        &self,
        tools: ToolRegistry,
        artwork: Arc<dyn ArtworkProvider>,
        tmdb: Arc<TmdbClient>,
    ) -> Resolver {
        let prober = Prober::new(Arc::new(tools), self.scratch());
        let enricher = Enricher::new(artwork, tmdb, self.cache.clone());
        Resolver::new(self.registry.clone(), prober, enricher, ScanSettings::default())
    }
}

/// Write an executable shell script named `name` that prints `stdout`.
#[cfg(unix)]
pub fn stub_tool(dir: &Path, name: &str, stdout: &str) -> PathBuf {
    let payload = dir.join(format!("{name}.out"));
    std::fs::write(&payload, stdout).expect("write payload");
    script(dir, name, &format!("#!/bin/sh\ncat '{}'\n", payload.display()))
}

/// Write an executable shell script with an arbitrary body.
#[cfg(unix)]
pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}
