//! The comparison table handed to external renderers
//!
//! Rendering itself (spreadsheet, CSV, HTML, JSON, plain text) is an
//! external collaborator's job; this module only carries everything a
//! renderer needs per row, including which environment column holds the
//! single distinguishable latest version.

use std::collections::BTreeSet;

use crate::env::environment::Environment;
use crate::version::{DEFAULT_PRECISION, latest_index};

/// One package row: fixed metadata columns plus one cell per environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRow {
    pub name: String,
    pub author: String,
    pub summary: String,
    pub homepage: String,
    pub latest: String,
    /// Raw installed-version strings, one per environment column; empty
    /// when the package is absent in that environment.
    pub cells: Vec<String>,
    /// Environment column holding the unique maximum installed version,
    /// for renderers that highlight it. `None` on a tie.
    pub latest_cell: Option<usize>,
}

/// Row-per-package, column-per-environment projection of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComparisonTable {
    /// Environment display labels, in configured target order
    pub env_labels: Vec<String>,
    /// Rows sorted case-insensitively by package name ascending
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Full-outer-joins the environments' package sets on package name.
    ///
    /// Rows are the union of names across all environments; a row whose
    /// cells are all empty is dropped. Record names are lowercase, so the
    /// name sort is case-insensitive by construction.
    pub fn from_environments(environments: &[Environment]) -> Self {
        let env_labels: Vec<String> = environments
            .iter()
            .map(|e| e.alias().to_string())
            .collect();

        let names: BTreeSet<&str> = environments
            .iter()
            .flat_map(|e| e.packages().iter().map(|r| r.name()))
            .collect();

        let rows = names
            .into_iter()
            .filter_map(|name| {
                let cells: Vec<String> = environments
                    .iter()
                    .map(|e| {
                        e.packages()
                            .get_named(name)
                            .map(|r| r.version().to_string())
                            .unwrap_or_default()
                    })
                    .collect();
                if cells.iter().all(|c| c.is_empty()) {
                    return None;
                }

                let metadata = environments
                    .iter()
                    .find_map(|e| e.packages().get_named(name).and_then(|r| r.metadata()));
                let latest_cell = latest_index(&cells, DEFAULT_PRECISION);

                Some(ComparisonRow {
                    name: name.to_string(),
                    author: metadata.map(|m| m.author.clone()).unwrap_or_default(),
                    summary: metadata.map(|m| m.summary.clone()).unwrap_or_default(),
                    homepage: metadata.map(|m| m.homepage.clone()).unwrap_or_default(),
                    latest: metadata.map(|m| m.latest.clone()).unwrap_or_default(),
                    cells,
                    latest_cell,
                })
            })
            .collect();

        Self { env_labels, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Implemented by external renderers (spreadsheet, CSV, HTML, ...) that
/// the comparison table is handed to.
pub trait TableRenderer {
    fn render(&self, table: &ComparisonTable) -> anyhow::Result<String>;
}
