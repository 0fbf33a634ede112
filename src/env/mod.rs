// Environment layer
// - lister.rs: PackageLister trait and the pip implementation
// - environment.rs: One interpreter installation and its package set
// - comparator.rs: Multi-environment comparison orchestration
// - error.rs: Environment and comparison errors

pub mod comparator;
pub mod environment;
pub mod error;
pub mod lister;

pub use comparator::{CompareOptions, EnvTarget, EnvironmentComparator};
pub use environment::Environment;
pub use error::{CompareError, EnvError};
pub use lister::{PackageLister, PipLister};
