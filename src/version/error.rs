use thiserror::Error;

#[derive(Debug, Error)]
#[error("unsupported comparison operator: {0:?}")]
pub struct InvalidOperatorError(pub String);
