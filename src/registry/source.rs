//! MetadataSource trait for fetching package metadata from a package index

use crate::pkg::MetadataBundle;
use crate::registry::error::FetchError;

/// Trait for fetching a single package's metadata from an index
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetches the metadata bundle for a package by name.
    ///
    /// # Returns
    /// * `Ok(MetadataBundle)` - Fields the index did not supply are empty
    /// * `Err(FetchError)` - If the fetch fails or the payload is malformed
    async fn fetch(&self, package_name: &str) -> Result<MetadataBundle, FetchError>;
}
