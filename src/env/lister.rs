//! PackageLister trait and the pip-backed implementation

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::env::error::EnvError;

/// Trait for enumerating what an interpreter environment has installed
#[async_trait::async_trait]
pub trait PackageLister: Send + Sync {
    /// Lists installed packages as (name, raw version) pairs.
    async fn list_installed(&self, interpreter: &Path) -> Result<Vec<(String, String)>, EnvError>;

    /// The interpreter's reported version string (e.g. "3.10.2"), used as
    /// the default environment alias.
    async fn interpreter_version(&self, interpreter: &Path) -> Result<String, EnvError>;
}

/// Lists packages by invoking `<interpreter> -m pip freeze`
pub struct PipLister;

impl PipLister {
    async fn run(interpreter: &Path, args: &[&str]) -> Result<String, EnvError> {
        let output = Command::new(interpreter)
            .args(args)
            .output()
            .await
            .map_err(|source| EnvError::Spawn {
                interpreter: interpreter.to_path_buf(),
                source,
            })?;
        if !output.status.success() {
            return Err(EnvError::CommandFailed {
                interpreter: interpreter.to_path_buf(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait::async_trait]
impl PackageLister for PipLister {
    async fn list_installed(&self, interpreter: &Path) -> Result<Vec<(String, String)>, EnvError> {
        let stdout = Self::run(interpreter, &["-m", "pip", "freeze"]).await?;
        let pairs = parse_freeze(&stdout);
        debug!("{:?} lists {} installed packages", interpreter, pairs.len());
        Ok(pairs)
    }

    async fn interpreter_version(&self, interpreter: &Path) -> Result<String, EnvError> {
        let stdout = Self::run(interpreter, &["-V"]).await?;
        Ok(parse_version_banner(&stdout))
    }
}

/// Parses `pip freeze` output: one `name==version` pair per line, skipping
/// blank lines and lines without the separator (editable installs, direct
/// URL references).
fn parse_freeze(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            line.split_once("==")
                .map(|(name, version)| (name.trim().to_string(), version.trim().to_string()))
        })
        .collect()
}

/// Extracts the bare version from a `python -V` banner ("Python 3.10.2").
fn parse_version_banner(banner: &str) -> String {
    let banner = banner.trim();
    banner
        .strip_prefix("Python ")
        .unwrap_or(banner)
        .to_string()
}
