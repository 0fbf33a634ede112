//! PyPI JSON API implementation

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::pkg::MetadataBundle;
use crate::registry::error::FetchError;
use crate::registry::source::MetadataSource;

/// Default base URL for the PyPI JSON API
const DEFAULT_BASE_URL: &str = "https://pypi.org/pypi";

/// Response from the PyPI JSON API; a payload without `info` is malformed
#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    home_page: Option<String>,
    #[serde(default)]
    project_url: Option<String>,
    #[serde(default)]
    package_url: Option<String>,
}

/// MetadataSource implementation for the PyPI JSON API
pub struct PypiRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl PypiRegistry {
    /// Creates a new PypiRegistry with a custom base URL and request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("pkgdrift")
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.to_string(),
        }
    }
}

impl Default for PypiRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, crate::config::DEFAULT_REQUEST_TIMEOUT)
    }
}

#[async_trait::async_trait]
impl MetadataSource for PypiRegistry {
    async fn fetch(&self, package_name: &str) -> Result<MetadataBundle, FetchError> {
        let url = format!("{}/{}/json", self.base_url, package_name);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }

        if !status.is_success() {
            warn!("package index returned status {}: {}", status, url);
            return Err(FetchError::Status(status));
        }

        let payload: PypiResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse package index response: {}", e);
            FetchError::InvalidResponse(e.to_string())
        })?;

        let info = payload.info;

        // Homepage precedence follows the index's own field preference:
        // package_url, then project_url, then home_page.
        let homepage = info
            .package_url
            .or(info.project_url)
            .or(info.home_page)
            .unwrap_or_default();

        Ok(MetadataBundle {
            name: info.name.unwrap_or_default(),
            author: info.author.unwrap_or_default(),
            summary: info.summary.unwrap_or_default(),
            latest: info.version.unwrap_or_default(),
            homepage,
        })
    }
}
