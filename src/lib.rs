//! pkgdrift inventories the packages installed across one or more Python
//! interpreter environments, enriches them with PyPI metadata through a
//! shared on-disk cache, and joins everything into one comparison table
//! showing, per package, which version each environment has installed
//! alongside the latest published version.
//!
//! ```no_run
//! use pkgdrift::env::{EnvTarget, EnvironmentComparator};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let targets = vec![
//!     EnvTarget::new("/usr/bin/python3"),
//!     EnvTarget::aliased("/opt/py310/bin/python3", "staging"),
//! ];
//! let mut comparator = EnvironmentComparator::new(targets, pkgdrift::config::cache_path())?;
//! let table = comparator.build_comparison_table().await?;
//! for row in &table.rows {
//!     println!("{}: {:?} (latest {})", row.name, row.cells, row.latest);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod env;
pub mod log;
pub mod pkg;
pub mod registry;
pub mod report;
pub mod version;

/// Side channel for per-item failures during best-effort batches: called
/// with the failing item's name (package or interpreter path) and the
/// error. Receiving a notification never aborts sibling work.
pub type ErrorHook =
    Arc<dyn Fn(&str, &(dyn std::error::Error + Send + Sync + 'static)) + Send + Sync>;

pub use cache::{CacheError, MetadataCache};
pub use env::{CompareError, EnvError, EnvTarget, Environment, EnvironmentComparator};
pub use pkg::{MetadataBundle, PackageRecord, PackageSet, ResolveOptions};
pub use registry::{FetchError, MetadataFetchError, MetadataSource, PypiRegistry};
pub use report::{ComparisonRow, ComparisonTable, TableRenderer};
pub use version::{CompareOp, InvalidOperatorError, NormalizedVersion, latest_index, rank};
