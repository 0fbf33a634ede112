//! Truncating version normalization and comparison
//!
//! Versions are compared on their first N dot-separated components only
//! (default 2), so "1.2.3" and "1.2.9" are equal at the default precision
//! while "1.2" and "1.3" differ.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::version::error::InvalidOperatorError;

/// Default number of dot-separated components kept for comparison
pub const DEFAULT_PRECISION: usize = 2;

/// A version string truncated to a fixed number of numeric components.
///
/// An empty or unparsable string normalizes to the zero version, which
/// compares less than any non-empty version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedVersion {
    components: Vec<u64>,
}

impl NormalizedVersion {
    /// Normalizes `raw` at the default precision.
    pub fn new(raw: &str) -> Self {
        Self::parse(raw, DEFAULT_PRECISION)
    }

    /// Normalizes `raw` to exactly `precision` numeric components.
    ///
    /// Each component keeps its leading ASCII digits ("3rc1" parses as 3);
    /// a component without leading digits counts as 0. Missing components
    /// are zero-padded so "1" and "1.0" normalize equal.
    pub fn parse(raw: &str, precision: usize) -> Self {
        let precision = precision.max(1);
        let mut components = vec![0u64; precision];
        for (i, part) in raw.trim().split('.').take(precision).enumerate() {
            let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
            components[i] = digits.parse().unwrap_or(0);
        }
        Self { components }
    }

    /// The minimum version at the given precision.
    pub fn zero(precision: usize) -> Self {
        Self {
            components: vec![0; precision.max(1)],
        }
    }

    pub fn is_zero(&self) -> bool {
        self.components.iter().all(|&c| c == 0)
    }
}

impl fmt::Display for NormalizedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

/// Comparison operator applied between two normalized versions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
}

impl CompareOp {
    /// Evaluates `a <op> b` under normalized ordering.
    pub fn eval(self, a: &NormalizedVersion, b: &NormalizedVersion) -> bool {
        match (self, a.cmp(b)) {
            (CompareOp::Lt, Ordering::Less) => true,
            (CompareOp::Gt, Ordering::Greater) => true,
            (CompareOp::Le, Ordering::Less | Ordering::Equal) => true,
            (CompareOp::Ge, Ordering::Greater | Ordering::Equal) => true,
            (CompareOp::Eq, Ordering::Equal) => true,
            _ => false,
        }
    }

    /// Normalizes both raw strings at `precision`, then evaluates.
    pub fn compare(self, a: &str, b: &str, precision: usize) -> bool {
        self.eval(
            &NormalizedVersion::parse(a, precision),
            &NormalizedVersion::parse(b, precision),
        )
    }
}

impl FromStr for CompareOp {
    type Err = InvalidOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(CompareOp::Lt),
            ">" => Ok(CompareOp::Gt),
            "<=" => Ok(CompareOp::Le),
            ">=" => Ok(CompareOp::Ge),
            "==" | "=" => Ok(CompareOp::Eq),
            other => Err(InvalidOperatorError(other.to_string())),
        }
    }
}

/// One distinct normalized value and the input indices sharing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankGroup {
    pub version: NormalizedVersion,
    pub indices: Vec<usize>,
}

/// Groups input positions by normalized value, ascending.
///
/// Blank entries normalize to the zero version and therefore rank lowest;
/// indices always refer to positions in the input slice.
pub fn rank<S: AsRef<str>>(versions: &[S], precision: usize) -> Vec<RankGroup> {
    let mut groups: BTreeMap<NormalizedVersion, Vec<usize>> = BTreeMap::new();
    for (i, raw) in versions.iter().enumerate() {
        groups
            .entry(NormalizedVersion::parse(raw.as_ref(), precision))
            .or_default()
            .push(i);
    }
    groups
        .into_iter()
        .map(|(version, indices)| RankGroup { version, indices })
        .collect()
}

/// Index of the unique maximum version, or `None` when the maximum is tied.
///
/// Blank entries are excluded from the comparison but still occupy their
/// position, so the returned index aligns with the input slice.
pub fn latest_index<S: AsRef<str>>(versions: &[S], precision: usize) -> Option<usize> {
    let mut best: Option<(usize, NormalizedVersion)> = None;
    let mut tied = false;
    for (i, raw) in versions.iter().enumerate() {
        if raw.as_ref().trim().is_empty() {
            continue;
        }
        let v = NormalizedVersion::parse(raw.as_ref(), precision);
        match &best {
            Some((_, current)) => match v.cmp(current) {
                Ordering::Greater => {
                    best = Some((i, v));
                    tied = false;
                }
                Ordering::Equal => tied = true,
                Ordering::Less => {}
            },
            None => best = Some((i, v)),
        }
    }
    match (best, tied) {
        (Some((i, _)), false) => Some(i),
        _ => None,
    }
}
