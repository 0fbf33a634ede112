// Version comparison layer
// - compare.rs: Normalized version type, comparison operators, ranking
// - error.rs: Operator parse errors

pub mod compare;
pub mod error;

pub use compare::{CompareOp, DEFAULT_PRECISION, NormalizedVersion, RankGroup, latest_index, rank};
pub use error::InvalidOperatorError;
