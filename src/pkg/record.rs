//! A single installed package and its metadata resolution

use std::hash::{Hash, Hasher};

use crate::cache::MetadataCache;
use crate::pkg::metadata::MetadataBundle;
use crate::registry::{MetadataFetchError, MetadataSource};
use crate::version::NormalizedVersion;

/// One package: case-insensitive identity, raw installed version, and a
/// lazily resolved metadata bundle.
#[derive(Debug, Clone)]
pub struct PackageRecord {
    name: String,
    version: String,
    normalized: NormalizedVersion,
    metadata: Option<MetadataBundle>,
}

impl PackageRecord {
    /// Creates a record from a name and an optional raw version string.
    /// The name is lowercased once here and immutable afterwards.
    pub fn new(name: &str, version: Option<&str>) -> Self {
        let version = version.unwrap_or_default().trim().to_string();
        Self {
            name: name.trim().to_lowercase(),
            normalized: NormalizedVersion::new(&version),
            version,
            metadata: None,
        }
    }

    /// Copies another record's identity and version, dropping its metadata.
    pub fn from_identity(other: &PackageRecord) -> Self {
        Self::new(&other.name, Some(&other.version))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw installed version string, possibly empty.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn normalized(&self) -> &NormalizedVersion {
        &self.normalized
    }

    /// The resolved metadata bundle, if resolution has happened.
    pub fn metadata(&self) -> Option<&MetadataBundle> {
        self.metadata.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.metadata.is_some()
    }

    /// Resolves this record's metadata against the shared cache, fetching
    /// remotely when the cache entry is missing or incomplete.
    ///
    /// Idempotent after the first successful resolution unless
    /// `force_refresh`. A cached bundle is accepted as-is when its homepage
    /// and latest-version fields are both non-empty; otherwise the fetched
    /// fields are merged over the cached ones (see
    /// [`MetadataBundle::merged_over`]) and written back to the cache unless
    /// `suppress_cache_write` or the cache already holds the same bundle.
    pub async fn resolve_metadata(
        &mut self,
        cache: &mut MetadataCache,
        source: &dyn MetadataSource,
        force_refresh: bool,
        suppress_cache_write: bool,
    ) -> Result<(), MetadataFetchError> {
        if self.metadata.is_some() && !force_refresh {
            return Ok(());
        }
        if !force_refresh {
            if let Some(cached) = cache.get(&self.name) {
                if cached.is_complete() {
                    self.metadata = Some(cached.clone());
                    return Ok(());
                }
            }
        }

        let fetched = source
            .fetch(&self.name)
            .await
            .map_err(|e| MetadataFetchError::new(&self.name, e))?;
        let merged = fetched.merged_over(cache.get(&self.name), &self.name);

        if !suppress_cache_write && cache.get(&self.name) != Some(&merged) {
            cache.put(&self.name, merged.clone());
        }
        self.metadata = Some(merged);
        Ok(())
    }

    /// Adopts an already-resolved bundle without any fetch.
    pub(crate) fn adopt(&mut self, bundle: MetadataBundle) {
        self.metadata = Some(bundle);
    }

    /// True iff the installed version compares strictly below the latest
    /// published version known to the metadata bundle.
    ///
    /// An unresolved record, or one whose `latest` field is empty,
    /// normalizes the latest version to zero and is therefore never
    /// reported outdated.
    pub fn is_outdated(&self) -> bool {
        let latest = self
            .metadata
            .as_ref()
            .map(|m| m.latest.as_str())
            .unwrap_or_default();
        self.normalized < NormalizedVersion::new(latest)
    }
}

/// Equality is on the exact (name, raw version) pair, not the normalized
/// version; metadata never participates.
impl PartialEq for PackageRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for PackageRecord {}

impl Hash for PackageRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
    }
}
