//! Media library scanner.
//!
//! The [`Resolver`] drives one file at a time through probing,
//! classification, technical resolution and enrichment, then commits the
//! finished record to the [`ScanRegistry`]. The registry check up front makes
//! processing at-most-once per path; the commit is the only write.

mod record;

pub use record::{apply_enrichment, technical_record, AnalysisSettings};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use hdrscan_av::{Prober, ToolRegistry};
use hdrscan_common::paths::has_extension;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::images::ArtworkCache;
use crate::metadata::Enricher;
use crate::state::{MediaRecord, ScanRegistry};

/// Outcome of [`Resolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The path was already in the registry; nothing ran.
    AlreadyProcessed(MediaRecord),
    /// The pipeline ran and this record was committed.
    Resolved(MediaRecord),
}

impl Resolution {
    pub fn record(&self) -> &MediaRecord {
        match self {
            Self::AlreadyProcessed(r) | Self::Resolved(r) => r,
        }
    }

    pub fn into_record(self) -> MediaRecord {
        match self {
            Self::AlreadyProcessed(r) | Self::Resolved(r) => r,
        }
    }
}

/// Totals for one library pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub new_files: usize,
    pub removed_files: usize,
    pub failed_files: usize,
    pub total_files: usize,
}

/// Scanner settings that are not owned by a collaborator.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub analysis: AnalysisSettings,
    pub extensions: Vec<String>,
    pub workers: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            analysis: AnalysisSettings::default(),
            extensions: hdrscan_common::paths::video_extensions()
                .iter()
                .map(|e| e.to_string())
                .collect(),
            workers: 2,
        }
    }
}

/// Per-file pipeline and library-level entrypoints.
pub struct Resolver {
    registry: Arc<ScanRegistry>,
    prober: Prober,
    enricher: Enricher,
    settings: ScanSettings,
}

impl Resolver {
    pub fn new(registry: Arc<ScanRegistry>, prober: Prober, enricher: Enricher, settings: ScanSettings) -> Self {
        Self {
            registry,
            prober,
            enricher,
            settings,
        }
    }

    /// Wire up tools, cache, registry and providers from configuration.
    ///
    /// Also clears scratch directories left by a previous run.
    pub fn from_config(config: &Config) -> Result<Self> {
        let temp_root = &config.library.temp_dir;
        match hdrscan_av::workspace::purge_stale(temp_root) {
            Ok(0) => {}
            Ok(n) => info!("Removed {} stale scratch directories", n),
            Err(e) => warn!("Failed to purge scratch root {:?}: {}", temp_root, e),
        }

        let tools = Arc::new(ToolRegistry::discover(&config.tools));
        let prober = Prober::new(tools, temp_root.clone());

        let cache = Arc::new(ArtworkCache::new(
            config.library.artwork_dir(),
            Duration::from_secs(config.metadata.request_timeout_secs),
        )?);
        let registry = ScanRegistry::new(Some(config.library.registry_path()), cache.clone());
        let enricher = Enricher::from_config(&config.metadata, cache)?;

        let settings = ScanSettings {
            analysis: AnalysisSettings {
                content_language: config.metadata.content_language.clone(),
                audio_bitrate_estimate_ratio: config.analysis.audio_bitrate_estimate_ratio,
            },
            extensions: config.library.extensions.clone(),
            workers: config.library.workers.max(1),
        };

        Ok(Self::new(registry, prober, enricher, settings))
    }

    pub fn registry(&self) -> &Arc<ScanRegistry> {
        &self.registry
    }

    pub fn prober(&self) -> &Prober {
        &self.prober
    }

    /// Resolve a file unless it has been processed already.
    pub async fn resolve(&self, path: &Path) -> Result<Resolution> {
        let path = absolute(path)?;
        if let Some(existing) = self.registry.get(&path) {
            debug!(path = %path.display(), "already processed");
            return Ok(Resolution::AlreadyProcessed(existing));
        }

        let record = self.analyze(&path).await?;
        self.registry.commit(record.clone())?;
        info!(
            path = %path.display(),
            format = %record.hdr_format,
            "resolved"
        );
        Ok(Resolution::Resolved(record))
    }

    /// Re-run the full pipeline and replace any existing record.
    pub async fn refresh(&self, path: &Path) -> Result<MediaRecord> {
        let path = absolute(path)?;
        let record = self.analyze(&path).await?;
        let previous = self.registry.commit(record.clone())?;
        info!(
            path = %path.display(),
            format = %record.hdr_format,
            replaced = previous.is_some(),
            "refreshed"
        );
        Ok(record)
    }

    /// Drop the record for `path`.
    pub fn forget(&self, path: &Path) -> Result<Option<MediaRecord>> {
        let path = absolute(path)?;
        self.registry.remove(&path)
    }

    /// Drop records for files that no longer exist.
    pub fn reconcile(&self) -> Result<Vec<PathBuf>> {
        self.registry.reconcile()
    }

    /// Run the pipeline for `path` without touching the registry.
    pub async fn analyze(&self, path: &Path) -> Result<MediaRecord> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(Error::validation(format!("not a file: {}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), "probing");
        let data = self.prober.probe(path).await;
        let mut record = technical_record(path.to_path_buf(), metadata.len(), &data, &self.settings.analysis);

        let enrichment = self.enricher.enrich(&record.filename).await;
        apply_enrichment(&mut record, enrichment);

        Ok(record)
    }

    /// Video files under `root` that are not yet processed, in walk order.
    pub fn discover(&self, root: &Path) -> Vec<PathBuf> {
        if !root.exists() {
            warn!("Media path does not exist: {:?}", root);
            return Vec::new();
        }
        let root = match absolute(root) {
            Ok(r) => r,
            Err(e) => {
                warn!("Cannot resolve media path {:?}: {}", root, e);
                return Vec::new();
            }
        };

        WalkDir::new(&root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| has_extension(p, &self.settings.extensions))
            .filter(|p| {
                let usable = p.to_str().is_some();
                if !usable {
                    warn!("Skipping path that is not valid UTF-8: {:?}", p);
                }
                usable
            })
            .filter(|p| !self.registry.has(p))
            .collect()
    }

    /// Reconcile, discover and resolve everything new under `root`.
    ///
    /// Files are resolved with bounded concurrency. A failing file is logged
    /// and counted; it never stops the pass.
    pub async fn scan_library(&self, root: &Path) -> Result<ScanSummary> {
        let removed = self.reconcile()?;
        let pending = self.discover(root);
        info!("Scanning {} new files under {:?}", pending.len(), root);

        let mut summary = ScanSummary {
            removed_files: removed.len(),
            ..Default::default()
        };

        let mut results = stream::iter(pending)
            .map(|path| async move {
                let outcome = self.resolve(&path).await;
                (path, outcome)
            })
            .buffer_unordered(self.settings.workers.max(1));

        while let Some((path, outcome)) = results.next().await {
            match outcome {
                Ok(Resolution::Resolved(_)) => summary.new_files += 1,
                Ok(Resolution::AlreadyProcessed(_)) => {}
                Err(e) => {
                    summary.failed_files += 1;
                    warn!(path = %path.display(), "Failed to resolve: {}", e);
                }
            }
        }

        summary.total_files = self.registry.len();
        info!(
            new = summary.new_files,
            removed = summary.removed_files,
            failed = summary.failed_files,
            total = summary.total_files,
            "scan complete"
        );
        Ok(summary)
    }

    /// Re-offer records whose artwork is still a remote URL to the cache,
    /// replacing each record that ends up cached. Returns how many changed.
    pub async fn migrate_remote_artwork(&self) -> usize {
        let mut migrated = 0;

        for record in self.registry.records() {
            let Some(artwork) = &record.artwork else {
                continue;
            };
            let Some(cached) = self.enricher.recache(artwork, record.external_id.as_deref()).await else {
                continue;
            };

            // The file may have been rescanned while the download ran.
            let mut updated = record.clone();
            updated.artwork = Some(cached);
            match self.registry.replace_if_unchanged(&record, updated) {
                Ok(true) => migrated += 1,
                Ok(false) => debug!(path = %record.path.display(), "record changed during artwork migration"),
                Err(e) => warn!("Failed to commit migrated artwork: {}", e),
            }
        }

        if migrated > 0 {
            info!("Cached artwork for {} records", migrated);
        }
        migrated
    }
}

/// Registry key for `path`: absolute and valid UTF-8.
fn absolute(path: &Path) -> Result<PathBuf> {
    let path = std::path::absolute(path)?;
    crate::state::ensure_utf8(&path)?;
    Ok(path)
}
