//! Command-line interface: clap types, command handlers, and output
//! formatting.

pub mod commands;
pub mod context;
pub mod output;
pub mod types;

pub use context::{AppContext, SqliteEngine};
pub use types::{Cli, Commands};

/// Print a command failure and exit non-zero.
///
/// The anyhow chain carries the handler's context lines; in JSON mode the
/// whole chain is emitted so scripted callers can inspect the cause.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let payload = serde_json::json!({
            "error": err.to_string(),
            "caused_by": chain,
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| err.to_string())
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
