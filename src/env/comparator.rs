//! Multi-environment comparison orchestration

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use futures::StreamExt;
use futures::stream;
use tracing::{info, warn};

use crate::ErrorHook;
use crate::cache::{CacheError, MetadataCache};
use crate::config::DEFAULT_WORKERS;
use crate::env::environment::Environment;
use crate::env::error::{CompareError, EnvError};
use crate::env::lister::{PackageLister, PipLister};
use crate::pkg::set::bulk_resolve;
use crate::pkg::{PackageRecord, PackageSet, ResolveOptions};
use crate::registry::{MetadataSource, PypiRegistry};
use crate::report::ComparisonTable;

/// One configured interpreter target
#[derive(Debug, Clone)]
pub struct EnvTarget {
    pub interpreter: PathBuf,
    pub alias: Option<String>,
}

impl EnvTarget {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            alias: None,
        }
    }

    pub fn aliased(interpreter: impl Into<PathBuf>, alias: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Width of the bounded pool shared by listing and fetch tasks
    pub workers: usize,
    /// Refetch metadata even when the cache holds a complete bundle
    pub force_refresh: bool,
    /// Never write fetched bundles back to the cache
    pub suppress_cache_write: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            force_refresh: false,
            suppress_cache_write: false,
        }
    }
}

/// Orchestrates multiple environments into one comparison table and owns
/// the metadata cache's lifecycle: loaded at construction, saved after a
/// comparison iff mutated.
pub struct EnvironmentComparator {
    targets: Vec<EnvTarget>,
    cache: MetadataCache,
    source: Box<dyn MetadataSource>,
    lister: Box<dyn PackageLister>,
    options: CompareOptions,
    on_error: Option<ErrorHook>,
}

/// Successful listing for one target, pre-join
struct Listing {
    interpreter: PathBuf,
    alias: String,
    pairs: Vec<(String, String)>,
}

impl EnvironmentComparator {
    /// Creates a comparator over the given targets. An empty target list
    /// means "just the current interpreter", i.e. `python3` from PATH.
    pub fn new(targets: Vec<EnvTarget>, cache_path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let targets = if targets.is_empty() {
            vec![EnvTarget::new("python3")]
        } else {
            targets
        };
        Ok(Self {
            targets,
            cache: MetadataCache::load(cache_path)?,
            source: Box::new(PypiRegistry::default()),
            lister: Box::new(PipLister),
            options: CompareOptions::default(),
            on_error: None,
        })
    }

    pub fn with_source(mut self, source: Box<dyn MetadataSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_lister(mut self, lister: Box<dyn PackageLister>) -> Self {
        self.lister = lister;
        self
    }

    pub fn with_options(mut self, options: CompareOptions) -> Self {
        self.options = options;
        self
    }

    /// Side channel for per-item failures; the batch itself is best-effort.
    pub fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.on_error = Some(hook);
        self
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Writes the cache back to disk if this run mutated it.
    pub fn save_cache(&mut self) -> Result<bool, CacheError> {
        self.cache.save()
    }

    /// Builds the full comparison table.
    ///
    /// Listing runs concurrently per target; all distinct package names are
    /// then resolved against the cache in one bounded batch before any
    /// environment's package set is materialized, so the table build never
    /// reads the cache while it is being written. A failed target is
    /// reported through the error hook and excluded from the join; zero
    /// surviving environments is fatal.
    pub async fn build_comparison_table(&mut self) -> Result<ComparisonTable, CompareError> {
        let mut listings = self.list_all_targets().await;
        if listings.is_empty() {
            return Err(CompareError::NoEnvironments);
        }

        dedup_by_interpreter(&mut listings);
        disambiguate_aliases(&mut listings);

        // Serialize "fetch all metadata" ahead of "build comparison table".
        let names = distinct_names(&listings);
        let resolve_opts = ResolveOptions {
            workers: self.options.workers,
            force_refresh: self.options.force_refresh,
            suppress_cache_write: self.options.suppress_cache_write,
        };
        let resolved = bulk_resolve(
            &names,
            &mut self.cache,
            self.source.as_ref(),
            &resolve_opts,
            self.on_error.as_ref(),
        )
        .await;

        let environments: Vec<Environment> = listings
            .into_iter()
            .map(|listing| {
                let records: Vec<PackageRecord> = listing
                    .pairs
                    .iter()
                    .map(|(n, v)| {
                        let mut record = PackageRecord::new(n, Some(v));
                        if let Some(bundle) = resolved.get(record.name()) {
                            record.adopt(bundle.clone());
                        }
                        record
                    })
                    .collect();
                Environment::from_parts(
                    listing.interpreter,
                    listing.alias,
                    PackageSet::from_records(records),
                )
            })
            .collect();

        let table = ComparisonTable::from_environments(&environments);
        info!(
            "Compared {} environments across {} packages",
            environments.len(),
            table.rows.len()
        );

        self.cache.save()?;
        Ok(table)
    }

    /// Lists installed packages for every target on a bounded pool,
    /// dropping failed targets after reporting them.
    async fn list_all_targets(&self) -> Vec<Listing> {
        let lister = self.lister.as_ref();
        let mut tasks = stream::iter(self.targets.iter().enumerate().map(move |(idx, target)| {
            async move {
                let result = async {
                    let pairs = lister.list_installed(&target.interpreter).await?;
                    if pairs.is_empty() {
                        return Err(EnvError::Unavailable {
                            interpreter: target.interpreter.clone(),
                        });
                    }
                    let alias = match target.alias.clone().filter(|a| !a.is_empty()) {
                        Some(alias) => alias,
                        None => lister
                            .interpreter_version(&target.interpreter)
                            .await
                            .unwrap_or_else(|_| target.interpreter.display().to_string()),
                    };
                    Ok(Listing {
                        interpreter: target.interpreter.clone(),
                        alias,
                        pairs,
                    })
                }
                .await;
                (idx, target.interpreter.clone(), result)
            }
        }))
        .buffer_unordered(self.options.workers.max(1));

        let mut indexed: Vec<(usize, Listing)> = Vec::new();
        while let Some((idx, interpreter, result)) = tasks.next().await {
            match result {
                Ok(listing) => indexed.push((idx, listing)),
                Err(err) => {
                    warn!("Skipping environment {:?}: {}", interpreter, err);
                    if let Some(hook) = &self.on_error {
                        hook(&interpreter.display().to_string(), &err);
                    }
                }
            }
        }
        // Column order follows target configuration order, not completion order
        indexed.sort_by_key(|(idx, _)| *idx);
        indexed.into_iter().map(|(_, listing)| listing).collect()
    }
}

fn dedup_by_interpreter(listings: &mut Vec<Listing>) {
    let mut seen: HashSet<String> = HashSet::new();
    listings.retain(|l| seen.insert(l.interpreter.to_string_lossy().to_lowercase()));
}

/// Appends a numeric suffix when two environments would share a label.
fn disambiguate_aliases(listings: &mut [Listing]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for listing in listings.iter_mut() {
        let n = counts.entry(listing.alias.clone()).or_insert(0);
        *n += 1;
        if *n > 1 {
            listing.alias = format!("{}_{}", listing.alias, n);
        }
    }
}

/// Distinct lowercase package names across all listings, in first-seen order.
fn distinct_names(listings: &[Listing]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for listing in listings {
        for (name, _) in &listing.pairs {
            let lower = name.trim().to_lowercase();
            if seen.insert(lower.clone()) {
                names.push(lower);
            }
        }
    }
    names
}
