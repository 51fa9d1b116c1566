//! CLI command implementations.

pub mod audit;
pub mod inbox;
pub mod init;
pub mod instance;
pub mod template;
