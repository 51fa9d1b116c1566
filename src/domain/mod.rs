//! Domain layer for the Signoff approval workflow engine
//!
//! This module contains core business logic, domain models, and ports.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{EngineError, EngineResult};
