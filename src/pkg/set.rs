//! Package collections with set algebra and bulk metadata resolution
//!
//! Set identity is (name, normalized version) for the algebraic
//! operations; full record equality (name, raw version) only matters for
//! the value-set difference inside `symmetric_difference_with`.

use std::collections::HashSet;
use std::ops::{Add, BitAnd, BitOr, BitXor, Sub};

use futures::StreamExt;
use futures::stream;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::ErrorHook;
use crate::cache::MetadataCache;
use crate::config::DEFAULT_WORKERS;
use crate::pkg::metadata::MetadataBundle;
use crate::pkg::record::PackageRecord;
use crate::registry::{MetadataFetchError, MetadataSource};

/// Knobs for bulk metadata resolution
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Width of the bounded fetch pool
    pub workers: usize,
    /// Refetch even when the cache holds a complete bundle
    pub force_refresh: bool,
    /// Never write fetched bundles back to the cache
    pub suppress_cache_write: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            force_refresh: false,
            suppress_cache_write: false,
        }
    }
}

/// Resolves a batch of distinct package names against the shared cache,
/// fetching missing or stale entries concurrently.
///
/// Fetches run on a bounded pool of `opts.workers`; each result is merged
/// into the cache on the consuming side as its future completes, so the
/// cache only ever sees single-threaded mutation. A failed fetch goes to
/// the error hook and does not abort sibling fetches.
pub async fn bulk_resolve(
    names: &[String],
    cache: &mut MetadataCache,
    source: &dyn MetadataSource,
    opts: &ResolveOptions,
    on_error: Option<&ErrorHook>,
) -> IndexMap<String, MetadataBundle> {
    let mut resolved: IndexMap<String, MetadataBundle> = IndexMap::new();
    let mut to_fetch: Vec<String> = Vec::new();
    for name in names {
        match cache.get(name) {
            Some(cached) if !opts.force_refresh && cached.is_complete() => {
                resolved.insert(name.clone(), cached.clone());
            }
            _ => to_fetch.push(name.clone()),
        }
    }
    if to_fetch.is_empty() {
        debug!("All {} packages served from cache", names.len());
        return resolved;
    }
    debug!(
        "Fetching metadata for {} of {} packages",
        to_fetch.len(),
        names.len()
    );

    let mut fetches = stream::iter(to_fetch.into_iter().map(move |name| async move {
        let result = source.fetch(&name).await;
        (name, result)
    }))
    .buffer_unordered(opts.workers.max(1));

    while let Some((name, result)) = fetches.next().await {
        match result {
            Ok(fetched) => {
                let merged = fetched.merged_over(cache.get(&name), &name);
                if !opts.suppress_cache_write && cache.get(&name) != Some(&merged) {
                    cache.put(&name, merged.clone());
                }
                resolved.insert(name, merged);
            }
            Err(e) => {
                let err = MetadataFetchError::new(&name, e);
                warn!("{}", err);
                if let Some(hook) = on_error {
                    hook(&name, &err);
                }
            }
        }
    }
    resolved
}

/// An ordered, deduplicated-by-identity collection of package records.
///
/// Records are kept sorted by name ascending (names are lowercase, so the
/// sort is case-insensitive by construction). `full_union` is the one
/// operation allowed to produce duplicate identities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageSet {
    records: Vec<PackageRecord>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from pre-built records: no resolution is triggered,
    /// duplicates by (name, normalized version) are dropped, first wins.
    pub fn from_records(records: Vec<PackageRecord>) -> Self {
        let mut records = Self::sorted(records);
        records.dedup_by(|a, b| a.name() == b.name() && a.normalized() == b.normalized());
        Self { records }
    }

    /// Builds a set from bare names, resolving metadata concurrently.
    pub async fn resolve_names(
        names: &[String],
        cache: &mut MetadataCache,
        source: &dyn MetadataSource,
        opts: &ResolveOptions,
        on_error: Option<&ErrorHook>,
    ) -> Self {
        let pairs: Vec<(String, String)> =
            names.iter().map(|n| (n.clone(), String::new())).collect();
        Self::resolve_pairs(&pairs, cache, source, opts, on_error).await
    }

    /// Builds a set from (name, installed version) pairs, resolving
    /// metadata concurrently. Records whose fetch failed stay unresolved
    /// and are kept; partial results are accepted.
    pub async fn resolve_pairs(
        pairs: &[(String, String)],
        cache: &mut MetadataCache,
        source: &dyn MetadataSource,
        opts: &ResolveOptions,
        on_error: Option<&ErrorHook>,
    ) -> Self {
        let mut records: Vec<PackageRecord> = pairs
            .iter()
            .map(|(n, v)| PackageRecord::new(n, Some(v)))
            .collect();

        let mut seen = HashSet::new();
        let names: Vec<String> = records
            .iter()
            .map(|r| r.name().to_string())
            .filter(|n| seen.insert(n.clone()))
            .collect();

        let resolved = bulk_resolve(&names, cache, source, opts, on_error).await;
        for record in &mut records {
            if let Some(bundle) = resolved.get(record.name()) {
                record.adopt(bundle.clone());
            }
        }
        Self::from_records(records)
    }

    fn sorted(mut records: Vec<PackageRecord>) -> Vec<PackageRecord> {
        records.sort_by(|a, b| {
            a.name()
                .cmp(b.name())
                .then_with(|| a.normalized().cmp(b.normalized()))
        });
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PackageRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&PackageRecord> {
        self.records.get(index)
    }

    /// Case-insensitive lookup by name; with duplicate identities (after
    /// `full_union`) the first in sort order wins.
    pub fn get_named(&self, name: &str) -> Option<&PackageRecord> {
        let name = name.to_lowercase();
        self.records.iter().find(|r| r.name() == name)
    }

    /// The same-name record with the highest normalized version.
    fn best_named(&self, name: &str) -> Option<&PackageRecord> {
        self.records
            .iter()
            .filter(|r| r.name() == name)
            .max_by(|a, b| a.normalized().cmp(b.normalized()))
    }

    /// Lazily yields records whose installed version trails the latest.
    pub fn outdated(&self) -> impl Iterator<Item = &PackageRecord> {
        self.records.iter().filter(|r| r.is_outdated())
    }

    /// Lazily yields records that are current (or lack latest data).
    pub fn up_to_date(&self) -> impl Iterator<Item = &PackageRecord> {
        self.records.iter().filter(|r| !r.is_outdated())
    }

    /// Multiset union: keeps duplicate (name, version) pairs from both
    /// sides, so cardinality is always `len(self) + len(other)`.
    pub fn full_union(&self, other: &PackageSet) -> PackageSet {
        let mut records = self.records.clone();
        records.extend(other.records.iter().cloned());
        PackageSet {
            records: Self::sorted(records),
        }
    }

    /// Per name, keeps the record with the higher normalized version; ties
    /// keep this side's record, and a name present on only one side passes
    /// through.
    pub fn union_with(&self, other: &PackageSet) -> PackageSet {
        let mut by_name: IndexMap<&str, &PackageRecord> = IndexMap::new();
        // Strictly-greater replacement keeps the left (or earlier) record
        // on ties, including duplicate names inside one multiset side.
        for r in self.records.iter().chain(&other.records) {
            match by_name.get_mut(r.name()) {
                Some(existing) => {
                    if r.normalized() > existing.normalized() {
                        *existing = r;
                    }
                }
                None => {
                    by_name.insert(r.name(), r);
                }
            }
        }
        PackageSet::from_records(by_name.into_values().cloned().collect())
    }

    /// Keeps a record only when the other side has the same name at an
    /// equal normalized version.
    pub fn intersection_with(&self, other: &PackageSet) -> PackageSet {
        let records = self
            .records
            .iter()
            .filter(|l| {
                other
                    .records
                    .iter()
                    .any(|r| r.name() == l.name() && r.normalized() == l.normalized())
            })
            .cloned()
            .collect();
        PackageSet::from_records(records)
    }

    /// Keeps a record when the other side lacks its name, or holds it only
    /// at a strictly lower normalized version.
    pub fn difference_with(&self, other: &PackageSet) -> PackageSet {
        let records = self
            .records
            .iter()
            .filter(|l| match other.best_named(l.name()) {
                None => true,
                Some(r) => l.normalized() > r.normalized(),
            })
            .cloned()
            .collect();
        PackageSet::from_records(records)
    }

    /// Union minus intersection, as a value-set difference: records are
    /// excluded by full (name, raw version) equality, which also drops any
    /// duplicates the union's tie-break introduced.
    pub fn symmetric_difference_with(&self, other: &PackageSet) -> PackageSet {
        let union = self.union_with(other);
        let intersection = self.intersection_with(other);
        let records = union
            .records
            .into_iter()
            .filter(|r| !intersection.records.contains(r))
            .collect();
        PackageSet { records }
    }

    pub fn update_full_union(&mut self, other: &PackageSet) {
        *self = self.full_union(other);
    }

    pub fn update_union(&mut self, other: &PackageSet) {
        *self = self.union_with(other);
    }

    pub fn update_intersection(&mut self, other: &PackageSet) {
        *self = self.intersection_with(other);
    }

    pub fn update_difference(&mut self, other: &PackageSet) {
        *self = self.difference_with(other);
    }

    pub fn update_symmetric_difference(&mut self, other: &PackageSet) {
        *self = self.symmetric_difference_with(other);
    }
}

impl<'a> IntoIterator for &'a PackageSet {
    type Item = &'a PackageRecord;
    type IntoIter = std::slice::Iter<'a, PackageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// Operator bindings are a convenience layer over the named methods.

impl Add for &PackageSet {
    type Output = PackageSet;
    fn add(self, rhs: &PackageSet) -> PackageSet {
        self.full_union(rhs)
    }
}

impl BitOr for &PackageSet {
    type Output = PackageSet;
    fn bitor(self, rhs: &PackageSet) -> PackageSet {
        self.union_with(rhs)
    }
}

impl BitAnd for &PackageSet {
    type Output = PackageSet;
    fn bitand(self, rhs: &PackageSet) -> PackageSet {
        self.intersection_with(rhs)
    }
}

impl Sub for &PackageSet {
    type Output = PackageSet;
    fn sub(self, rhs: &PackageSet) -> PackageSet {
        self.difference_with(rhs)
    }
}

impl BitXor for &PackageSet {
    type Output = PackageSet;
    fn bitxor(self, rhs: &PackageSet) -> PackageSet {
        self.symmetric_difference_with(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> PackageSet {
        PackageSet::from_records(
            pairs
                .iter()
                .map(|(n, v)| PackageRecord::new(n, Some(v)))
                .collect(),
        )
    }

    #[test]
    fn from_records_sorts_and_dedups_by_identity() {
        let s = set(&[("zlib", "1.2"), ("abc", "1.0"), ("abc", "1.0.5")]);
        // "1.0" and "1.0.5" share the normalized value 1.0 at precision 2
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(0).unwrap().name(), "abc");
        assert_eq!(s.get(0).unwrap().version(), "1.0");
        assert_eq!(s.get(1).unwrap().name(), "zlib");
    }

    #[test]
    fn full_union_preserves_cardinality() {
        let a = set(&[("foo", "1.0"), ("bar", "2.0")]);
        let b = set(&[("foo", "1.0"), ("baz", "3.0")]);
        let u = a.full_union(&b);
        assert_eq!(u.len(), a.len() + b.len());
        assert_eq!((&a + &b).len(), 4);
    }

    #[test]
    fn union_keeps_higher_version_and_passes_singles_through() {
        let a = set(&[("foo", "1.0"), ("bar", "2.0")]);
        let b = set(&[("foo", "1.1"), ("baz", "3.0")]);
        let u = a.union_with(&b);
        assert_eq!(u.len(), 3);
        assert_eq!(u.get_named("foo").unwrap().version(), "1.1");
        assert_eq!(u.get_named("bar").unwrap().version(), "2.0");
        assert_eq!(u.get_named("baz").unwrap().version(), "3.0");
    }

    #[test]
    fn union_tie_keeps_left_record() {
        let a = set(&[("foo", "1.2.3")]);
        let b = set(&[("foo", "1.2.9")]);
        let u = a.union_with(&b);
        assert_eq!(u.get_named("foo").unwrap().version(), "1.2.3");
    }

    #[test]
    fn intersection_requires_equal_normalized_version() {
        let a = set(&[("foo", "1.0"), ("bar", "2.0")]);
        let b = set(&[("foo", "1.0.7"), ("bar", "2.1")]);
        let i = a.intersection_with(&b);
        assert_eq!(i.len(), 1);
        assert_eq!(i.get_named("foo").unwrap().version(), "1.0");
    }

    #[test]
    fn difference_keeps_missing_and_strictly_newer() {
        let a = set(&[("foo", "2.0"), ("bar", "1.0"), ("qux", "0.1")]);
        let b = set(&[("foo", "1.0"), ("bar", "1.0")]);
        let d = a.difference_with(&b);
        // foo is strictly newer on the left, bar is equal, qux is absent
        assert_eq!(d.len(), 2);
        assert!(d.get_named("foo").is_some());
        assert!(d.get_named("qux").is_some());
        assert!(d.get_named("bar").is_none());
    }

    #[test]
    fn symmetric_difference_matches_union_minus_intersection() {
        let a = set(&[("foo", "1.0"), ("bar", "2.0")]);
        let b = set(&[("foo", "1.1"), ("baz", "3.0")]);
        let sym = a.symmetric_difference_with(&b);
        assert_eq!(sym.len(), 3);
        assert!(sym.get_named("foo").is_some());
        assert!(sym.get_named("bar").is_some());
        assert!(sym.get_named("baz").is_some());

        let c = set(&[("foo", "1.0")]);
        assert!(c.symmetric_difference_with(&c).is_empty());
    }

    #[test]
    fn set_laws_hold_under_normalized_identity() {
        let a = set(&[("foo", "1.0"), ("bar", "2.0"), ("qux", "0.9")]);
        let b = set(&[("foo", "1.1"), ("baz", "3.0"), ("qux", "0.9")]);

        // intersection(A, B) is a subset of union(A, B)
        let u = a.union_with(&b);
        for r in &a.intersection_with(&b) {
            assert!(u.iter().any(|x| x.name() == r.name()
                && x.normalized() == r.normalized()));
        }

        // A - A is empty, A | A == A
        assert!(a.difference_with(&a).is_empty());
        assert_eq!(a.union_with(&a), a);

        // A ^ B == (A | B) - (A & B) as value sets
        let sym = a.symmetric_difference_with(&b);
        let manual: Vec<_> = u
            .iter()
            .filter(|r| !a.intersection_with(&b).iter().any(|i| i == *r))
            .cloned()
            .collect();
        assert_eq!(sym, PackageSet::from_records(manual));
    }

    #[test]
    fn operator_bindings_delegate_to_named_methods() {
        let a = set(&[("foo", "1.0"), ("bar", "2.0")]);
        let b = set(&[("foo", "1.1")]);
        assert_eq!(&a | &b, a.union_with(&b));
        assert_eq!(&a & &b, a.intersection_with(&b));
        assert_eq!(&a - &b, a.difference_with(&b));
        assert_eq!(&a ^ &b, a.symmetric_difference_with(&b));
    }

    #[test]
    fn update_variants_mutate_in_place() {
        let mut a = set(&[("foo", "1.0")]);
        let b = set(&[("foo", "1.1"), ("baz", "3.0")]);
        a.update_union(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get_named("foo").unwrap().version(), "1.1");
    }

    #[test]
    fn outdated_iterators_are_lazy_filters() {
        let mut old = PackageRecord::new("old", Some("1.0"));
        old.adopt(MetadataBundle {
            latest: "2.0".into(),
            ..Default::default()
        });
        let mut fresh = PackageRecord::new("fresh", Some("2.0"));
        fresh.adopt(MetadataBundle {
            latest: "2.0".into(),
            ..Default::default()
        });
        let s = PackageSet::from_records(vec![old, fresh]);

        let outdated: Vec<_> = s.outdated().map(|r| r.name().to_string()).collect();
        assert_eq!(outdated, vec!["old"]);
        let current: Vec<_> = s.up_to_date().map(|r| r.name().to_string()).collect();
        assert_eq!(current, vec!["fresh"]);
    }
}
