use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("package not found")]
    NotFound,

    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed payload: {0}")]
    InvalidResponse(String),
}

/// A remote metadata fetch failed for a specific package.
#[derive(Debug, Error)]
#[error("metadata fetch failed for {package}: {source}")]
pub struct MetadataFetchError {
    pub package: String,
    #[source]
    pub source: FetchError,
}

impl MetadataFetchError {
    pub fn new(package: impl Into<String>, source: FetchError) -> Self {
        Self {
            package: package.into(),
            source,
        }
    }
}
