//! Persisted package-metadata cache
//!
//! A process-wide name -> metadata map backed by a single pretty-printed
//! JSON file. The file is read wholesale at load and rewritten wholesale at
//! save; a snapshot of the loaded state detects whether anything actually
//! changed, so a save with no net mutation never touches the disk.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pkg::MetadataBundle;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache file {path:?} is not valid JSON: {source}")]
    MalformedJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write cache file {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct MetadataCache {
    path: PathBuf,
    store: IndexMap<String, MetadataBundle>,
    snapshot: IndexMap<String, MetadataBundle>,
}

impl MetadataCache {
    /// Loads the cache from `path`.
    ///
    /// A missing or unreadable file starts the cache empty; a file that
    /// exists but is not valid JSON is an error rather than silently
    /// discarded state.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let store = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| CacheError::MalformedJson {
                path: path.clone(),
                source,
            })?,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Cache file {:?} unreadable ({}), starting empty", path, e);
                }
                IndexMap::new()
            }
        };
        debug!("Loaded {} cached package entries from {:?}", store.len(), path);
        Ok(Self {
            snapshot: store.clone(),
            store,
            path,
        })
    }

    /// Writes the cache back to disk if it changed since load (or since the
    /// previous save). Returns whether a write happened.
    pub fn save(&mut self) -> Result<bool, CacheError> {
        if !self.is_dirty() {
            debug!("Cache unchanged, skipping write");
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let json =
            serde_json::to_string_pretty(&self.store).expect("cache store serializes to JSON");
        std::fs::write(&self.path, json).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!("Saved {} package entries to {:?}", self.store.len(), self.path);
        self.snapshot = self.store.clone();
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&MetadataBundle> {
        self.store.get(name)
    }

    pub fn put(&mut self, name: &str, bundle: MetadataBundle) {
        self.store.insert(name.to_string(), bundle);
    }

    /// Structural comparison against the load-time snapshot, not a dirty
    /// flag: a put that round-trips to the same value does not count.
    pub fn is_dirty(&self) -> bool {
        self.store != self.snapshot
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
