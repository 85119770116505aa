use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required field for the detected report shape is missing or has the
    /// wrong type. Fatal; no output is written.
    #[error("malformed input: field `{field}` is missing or invalid for a {shape} report")]
    MalformedInput { field: String, shape: String },

    /// The report carries signals for more than one known shape. Fatal; the
    /// conflict is surfaced instead of guessing.
    #[error("ambiguous report shape: {0}")]
    AmbiguousShape(String),

    /// A single subject's content could not be hashed. Recovered per subject;
    /// the run continues with that subject marked as degraded.
    #[error("hash computation failed for {path}: {reason}")]
    HashComputation { path: String, reason: String },

    /// The SBOM was supplied but could not be read or projected. Fatal.
    #[error("dependency resolution error: {0}")]
    DependencyResolution(String),

    /// An external capability (hashing tool, version control) is unavailable
    /// entirely. Fatal; aborts before any output is written.
    #[error("capability error: {0}")]
    Capability(String),

    /// The destination for the provenance document cannot be written. Fatal.
    #[error("cannot write output to {path}: {source}")]
    OutputWrite {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("initialization error: {0}")]
    Initialization(String),
}
