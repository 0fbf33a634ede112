use std::path::PathBuf;

use thiserror::Error;

use crate::cache::CacheError;

#[derive(Debug, Error)]
pub enum EnvError {
    /// The listing collaborator returned zero packages. An environment
    /// with nothing installed is treated as misconfiguration, unlike one
    /// whose packages merely failed enrichment.
    #[error("environment {interpreter:?} reported no installed packages")]
    Unavailable { interpreter: PathBuf },

    #[error("failed to invoke {interpreter:?}: {source}")]
    Spawn {
        interpreter: PathBuf,
        source: std::io::Error,
    },

    #[error("{interpreter:?} exited with {status}: {stderr}")]
    CommandFailed {
        interpreter: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

#[derive(Debug, Error)]
pub enum CompareError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("no environment could be constructed")]
    NoEnvironments,
}
