mod types;

pub use types::*;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::images::ArtworkCache;

/// On-disk shape of the registry.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    files: BTreeMap<PathBuf, MediaRecord>,
    #[serde(default)]
    paths: BTreeSet<PathBuf>,
}

/// Registry of processed files.
///
/// Maps each scanned path to its [`MediaRecord`]. Every read-modify-write
/// sequence runs under one lock, and every mutation is persisted before the
/// lock is released. The lock is never held across probe or network calls.
pub struct ScanRegistry {
    files: Mutex<BTreeMap<PathBuf, MediaRecord>>,
    persistence_path: Option<PathBuf>,
    artwork: Arc<ArtworkCache>,
}

impl ScanRegistry {
    /// Create a registry, loading any document already at `persistence_path`.
    pub fn new(persistence_path: Option<PathBuf>, artwork: Arc<ArtworkCache>) -> Arc<Self> {
        let files = match persistence_path.as_deref() {
            Some(path) => match load_from_file(path) {
                Ok(files) => files,
                Err(e) => {
                    tracing::error!("Failed to load scan registry, starting empty: {}", e);
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };

        if !files.is_empty() {
            tracing::info!("Loaded {} records from scan registry", files.len());
        }

        Arc::new(Self {
            files: Mutex::new(files),
            persistence_path,
            artwork,
        })
    }

    pub fn artwork(&self) -> &Arc<ArtworkCache> {
        &self.artwork
    }

    /// Whether `path` has been processed.
    pub fn has(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }

    pub fn get(&self, path: &Path) -> Option<MediaRecord> {
        self.files.lock().get(path).cloned()
    }

    /// Snapshot of all records, ordered by path.
    pub fn records(&self) -> Vec<MediaRecord> {
        self.files.lock().values().cloned().collect()
    }

    /// Snapshot of all processed paths, ordered.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }

    /// Insert or replace the record for its path and persist.
    ///
    /// Returns the replaced record. If the replaced record's cached artwork is
    /// no longer referenced by any record, its file is evicted. Paths that
    /// cannot be written as JSON keys are rejected before the map changes.
    pub fn commit(&self, record: MediaRecord) -> Result<Option<MediaRecord>> {
        ensure_utf8(&record.path)?;
        let mut files = self.files.lock();
        let previous = files.insert(record.path.clone(), record);

        if let Some(old) = &previous {
            self.evict_if_unreferenced(&files, old);
        }

        self.persist(&files)?;
        Ok(previous)
    }

    /// Delete the record for `path`, evict its artwork and persist.
    pub fn remove(&self, path: &Path) -> Result<Option<MediaRecord>> {
        let mut files = self.files.lock();
        let Some(removed) = files.remove(path) else {
            return Ok(None);
        };

        self.evict_if_unreferenced(&files, &removed);
        self.persist(&files)?;
        Ok(Some(removed))
    }

    /// Drop every record whose file no longer exists.
    ///
    /// Existence is checked against a snapshot outside the lock; removal then
    /// happens in one locked pass with a single persist.
    pub fn reconcile(&self) -> Result<Vec<PathBuf>> {
        let missing: Vec<PathBuf> = self
            .paths()
            .into_iter()
            .filter(|p| !p.exists())
            .collect();

        if missing.is_empty() {
            return Ok(missing);
        }

        let mut files = self.files.lock();
        let mut removed = Vec::with_capacity(missing.len());
        for path in missing {
            if let Some(record) = files.remove(&path) {
                self.evict_if_unreferenced(&files, &record);
                tracing::info!(path = %path.display(), "removed record for deleted file");
                removed.push(path);
            }
        }

        if !removed.is_empty() {
            self.persist(&files)?;
        }
        Ok(removed)
    }

    /// Replace the record for `current.path` only if it still equals
    /// `current`. Returns whether the replacement happened.
    pub fn replace_if_unchanged(&self, current: &MediaRecord, updated: MediaRecord) -> Result<bool> {
        let mut files = self.files.lock();
        if files.get(&current.path) != Some(current) {
            return Ok(false);
        }

        let previous = files.insert(updated.path.clone(), updated);
        if let Some(old) = &previous {
            self.evict_if_unreferenced(&files, old);
        }
        self.persist(&files)?;
        Ok(true)
    }

    /// Persist the current state.
    pub fn flush(&self) -> Result<()> {
        let files = self.files.lock();
        self.persist(&files)
    }

    fn evict_if_unreferenced(&self, files: &BTreeMap<PathBuf, MediaRecord>, old: &MediaRecord) {
        let Some(key) = old.artwork_key() else {
            return;
        };
        let still_used = files.values().any(|r| r.artwork_key() == Some(key));
        if !still_used {
            self.artwork.evict(key);
        }
    }

    fn persist(&self, files: &BTreeMap<PathBuf, MediaRecord>) -> Result<()> {
        let Some(path) = self.persistence_path.as_deref() else {
            return Ok(());
        };

        save_to_file(path, files).inspect_err(|e| {
            tracing::error!("Failed to persist scan registry: {}", e);
        })
    }
}

/// Registry keys are JSON object keys and must be valid UTF-8.
pub(crate) fn ensure_utf8(path: &Path) -> Result<()> {
    match path.to_str() {
        Some(_) => Ok(()),
        None => Err(Error::validation(format!(
            "path is not valid UTF-8: {}",
            path.display()
        ))),
    }
}

fn save_to_file(path: &Path, files: &BTreeMap<PathBuf, MediaRecord>) -> Result<()> {
    #[derive(Serialize)]
    struct PersistedRegistry<'a> {
        files: &'a BTreeMap<PathBuf, MediaRecord>,
        paths: Vec<&'a PathBuf>,
    }

    let document = PersistedRegistry {
        files,
        paths: files.keys().collect(),
    };
    let json = serde_json::to_string_pretty(&document)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| Error::persist(path, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::persist(path, e))?;
    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| Error::persist(path, e))?;
    tmp.persist(path).map_err(|e| Error::persist(path, e.error))?;
    Ok(())
}

fn load_from_file(path: &Path) -> Result<BTreeMap<PathBuf, MediaRecord>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };

    let document: RegistryDocument = serde_json::from_str(&content)?;
    let stray = document
        .paths
        .iter()
        .filter(|p| !document.files.contains_key(*p))
        .count();
    if stray > 0 {
        tracing::debug!("Ignoring {} processed paths without records", stray);
    }

    Ok(document.files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdrscan_common::HdrClassification;
    use std::time::Duration;

    fn registry(dir: &Path) -> Arc<ScanRegistry> {
        let cache = ArtworkCache::new(dir.join("posters"), Duration::from_secs(1)).unwrap();
        ScanRegistry::new(Some(dir.join("scanned_files.json")), Arc::new(cache))
    }

    fn record(path: &Path, key: Option<&str>) -> MediaRecord {
        let mut r = MediaRecord::new(path.to_path_buf(), HdrClassification::hdr10());
        r.artwork = key.map(|k| ArtworkRef::Cached { key: k.to_string() });
        r
    }

    #[test]
    fn commit_and_query() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let path = dir.path().join("a.mkv");

        assert!(!reg.has(&path));
        assert!(reg.commit(record(&path, None)).unwrap().is_none());
        assert!(reg.has(&path));
        assert_eq!(reg.get(&path).unwrap().hdr_detail, "HDR10");
        assert_eq!(reg.paths(), vec![path.clone()]);
        assert_eq!(reg.len(), 1);

        let previous = reg.commit(record(&path, None)).unwrap();
        assert!(previous.is_some());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mkv");
        {
            let reg = registry(dir.path());
            reg.commit(record(&path, Some("tmdb_1.jpg"))).unwrap();
        }

        let raw = std::fs::read_to_string(dir.path().join("scanned_files.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json["files"].is_object());
        assert_eq!(json["paths"].as_array().unwrap().len(), 1);

        let reg = registry(dir.path());
        assert!(reg.has(&path));
        assert_eq!(reg.get(&path).unwrap().artwork_key(), Some("tmdb_1.jpg"));
    }

    #[test]
    fn corrupt_document_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scanned_files.json"), b"{not json").unwrap();
        let reg = registry(dir.path());
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_evicts_unshared_artwork() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let posters = dir.path().join("posters");
        std::fs::write(posters.join("tmdb_1.jpg"), b"x").unwrap();
        std::fs::write(posters.join("tmdb_2.jpg"), b"x").unwrap();

        let a = dir.path().join("a.mkv");
        let b = dir.path().join("b.mkv");
        let c = dir.path().join("c.mkv");
        reg.commit(record(&a, Some("tmdb_1.jpg"))).unwrap();
        reg.commit(record(&b, Some("tmdb_1.jpg"))).unwrap();
        reg.commit(record(&c, Some("tmdb_2.jpg"))).unwrap();

        reg.remove(&a).unwrap();
        assert!(posters.join("tmdb_1.jpg").exists(), "shared key must survive");

        reg.remove(&b).unwrap();
        assert!(!posters.join("tmdb_1.jpg").exists());

        assert!(reg.remove(&b).unwrap().is_none());
        assert!(posters.join("tmdb_2.jpg").exists());
    }

    #[test]
    fn replacing_artwork_evicts_stale_key() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let posters = dir.path().join("posters");
        std::fs::write(posters.join("poster_old.jpg"), b"x").unwrap();
        std::fs::write(posters.join("tmdb_9.jpg"), b"x").unwrap();

        let a = dir.path().join("a.mkv");
        reg.commit(record(&a, Some("poster_old.jpg"))).unwrap();
        reg.commit(record(&a, Some("tmdb_9.jpg"))).unwrap();
        assert!(!posters.join("poster_old.jpg").exists());

        // Same key on re-commit stays.
        reg.commit(record(&a, Some("tmdb_9.jpg"))).unwrap();
        assert!(posters.join("tmdb_9.jpg").exists());
    }

    #[test]
    fn reconcile_drops_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let posters = dir.path().join("posters");
        std::fs::write(posters.join("tmdb_5.jpg"), b"x").unwrap();

        let kept = dir.path().join("kept.mkv");
        let gone = dir.path().join("gone.mkv");
        std::fs::write(&kept, b"").unwrap();
        reg.commit(record(&kept, None)).unwrap();
        reg.commit(record(&gone, Some("tmdb_5.jpg"))).unwrap();

        let removed = reg.reconcile().unwrap();
        assert_eq!(removed, vec![gone.clone()]);
        assert!(reg.has(&kept));
        assert!(!reg.has(&gone));
        assert!(!posters.join("tmdb_5.jpg").exists());

        assert!(reg.reconcile().unwrap().is_empty());
    }

    #[test]
    fn in_memory_registry_never_touches_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtworkCache::new(dir.path().join("posters"), Duration::from_secs(1)).unwrap();
        let reg = ScanRegistry::new(None, Arc::new(cache));
        reg.commit(record(&dir.path().join("a.mkv"), None)).unwrap();
        reg.flush().unwrap();
        assert!(!dir.path().join("scanned_files.json").exists());
    }

    #[test]
    fn concurrent_commits_keep_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());

        std::thread::scope(|s| {
            for i in 0..8 {
                let reg = &reg;
                let base = dir.path();
                s.spawn(move || {
                    reg.commit(record(&base.join(format!("{i}.mkv")), None)).unwrap();
                });
            }
        });

        assert_eq!(reg.len(), 8);
        let reloaded = registry(dir.path());
        assert_eq!(reloaded.records(), reg.records());
    }

    #[test]
    fn replace_if_unchanged_skips_moved_records() {
        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let path = dir.path().join("a.mkv");
        let original = record(&path, None);
        reg.commit(original.clone()).unwrap();

        let newer = record(&path, Some("tmdb_2.jpg"));
        reg.commit(newer.clone()).unwrap();

        let stale = record(&path, Some("tmdb_1.jpg"));
        assert!(!reg.replace_if_unchanged(&original, stale).unwrap());
        assert_eq!(reg.get(&path).unwrap(), newer);

        let migrated = record(&path, Some("tmdb_3.jpg"));
        assert!(reg.replace_if_unchanged(&newer, migrated.clone()).unwrap());
        assert_eq!(reg.get(&path).unwrap(), migrated);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_does_not_poison_the_registry() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        let reg = registry(dir.path());
        let bad = dir.path().join(OsStr::from_bytes(b"Film\xff.mkv"));
        let good = dir.path().join("good.mkv");

        assert!(matches!(reg.commit(record(&bad, None)), Err(Error::Validation(_))));
        assert!(!reg.has(&bad));

        reg.commit(record(&good, None)).unwrap();
        let reloaded = registry(dir.path());
        assert!(reloaded.has(&good));
    }
}
