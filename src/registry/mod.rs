// Package index layer
// - source.rs: MetadataSource trait definition
// - pypi.rs: PyPI JSON API implementation
// - error.rs: Fetch errors

pub mod error;
pub mod pypi;
pub mod source;

pub use error::{FetchError, MetadataFetchError};
pub use pypi::PypiRegistry;
pub use source::MetadataSource;
