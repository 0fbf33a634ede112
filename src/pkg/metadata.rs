//! Package metadata bundle shared by the registry, the cache, and records

use serde::{Deserialize, Serialize};

/// Metadata for one package as cached on disk and served to reports.
///
/// Field order matches the persisted cache file layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBundle {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub latest: String,
    #[serde(default)]
    pub homepage: String,
}

impl MetadataBundle {
    /// A cached bundle is accepted without a refetch only when both the
    /// homepage and the latest published version are known.
    pub fn is_complete(&self) -> bool {
        !self.homepage.is_empty() && !self.latest.is_empty()
    }

    /// Merges this (freshly fetched) bundle over a cached one.
    ///
    /// Per field: the fetched value wins when non-empty, else the cached
    /// value, else the bare package name. The bare-name placeholder is a
    /// deliberate quirk kept for consumers that rely on non-empty fields,
    /// even though it is meaningless for fields like `author`.
    pub fn merged_over(&self, cached: Option<&MetadataBundle>, package_name: &str) -> MetadataBundle {
        let pick = |fetched: &str, cached: Option<&str>| -> String {
            if !fetched.is_empty() {
                fetched.to_string()
            } else {
                match cached {
                    Some(c) if !c.is_empty() => c.to_string(),
                    _ => package_name.to_string(),
                }
            }
        };
        MetadataBundle {
            name: pick(&self.name, cached.map(|c| c.name.as_str())),
            author: pick(&self.author, cached.map(|c| c.author.as_str())),
            summary: pick(&self.summary, cached.map(|c| c.summary.as_str())),
            latest: pick(&self.latest, cached.map(|c| c.latest.as_str())),
            homepage: pick(&self.homepage, cached.map(|c| c.homepage.as_str())),
        }
    }
}
