//! Configuration loading.
//!
//! Hierarchical merging via figment: programmatic defaults, then the
//! project's `.signoff/` YAML files, then `SIGNOFF_*` environment
//! variables.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
