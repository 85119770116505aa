pub mod commands;
pub mod handlers;
use crate::error::Error;

// Re-export commonly used items
pub use commands::ProvenanceCommands;
pub use handlers::handle_provenance_command;

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CLI_NAME: &str = "provenance-cli";

pub fn format_error(error: &Error) -> String {
    match error {
        Error::MalformedInput { field, shape } => {
            format!("Malformed input: field `{field}` is missing or invalid for a {shape} report")
        }
        Error::AmbiguousShape(msg) => format!("Ambiguous report shape: {msg}"),
        Error::HashComputation { path, reason } => {
            format!("Hash computation error for {path}: {reason}")
        }
        Error::DependencyResolution(msg) => format!("Dependency resolution error: {msg}"),
        Error::Capability(msg) => format!("Capability error: {msg}"),
        Error::OutputWrite { path, source } => format!("Cannot write output to {path}: {source}"),
        Error::Io(err) => format!("IO error: {err}"),
        Error::Json(err) => format!("JSON error: {err}"),
        Error::Initialization(msg) => format!("Initialization error: {msg}"),
    }
}

/// Helper function to print validation warnings to the user
pub fn print_validation_warning(message: &str) {
    eprintln!("Warning: {message}");
}
