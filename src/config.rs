use std::path::PathBuf;
use std::time::Duration;

/// Default width of the bounded worker pool
pub const DEFAULT_WORKERS: usize = 10;

/// Default per-request timeout for package index fetches
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Returns the path to the data directory for pkgdrift.
/// Uses $XDG_DATA_HOME/pkgdrift if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/pkgdrift,
/// or ./pkgdrift if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path to the persisted metadata cache file.
pub fn cache_path() -> PathBuf {
    data_dir().join("pypkg.json")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("pkgdrift")
}
