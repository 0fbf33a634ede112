// Package model layer
// - metadata.rs: Metadata bundle and merge policy
// - record.rs: Single package identity + resolution
// - set.rs: Package collections and set algebra

pub mod metadata;
pub mod record;
pub mod set;

pub use metadata::MetadataBundle;
pub use record::PackageRecord;
pub use set::{PackageSet, ResolveOptions};
