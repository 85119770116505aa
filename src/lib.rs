//! # provenance-cli
//!
//! Converts a CI build farm's post-build metadata into a SLSA (Supply-chain
//! Levels for Software Artifacts) v1 provenance statement, following the
//! in-toto Statement v1 schema.
//!
//! The pipeline is a single synchronous pass: the post-build report is
//! flattened into one canonical shape ([`report`]), the declared artifacts
//! become digest-verified subjects ([`subject`]), an optional SBOM is
//! projected into resolved dependencies ([`sbom`]), and everything is folded
//! into one immutable statement and written out ([`assemble`]). External
//! hashing and version-control tools are reached through [`capability`]
//! traits so the whole pipeline runs deterministically under test.
//!
//! ## Quick Start
//!
//! ```bash
//! provenance-cli generate post-build.json \
//!     --sbom sbom.cdx.json \
//!     --results-dir ./results \
//!     --output provenance.json
//! ```

pub mod assemble;
pub mod capability;
pub mod cli;
pub mod error;
pub mod report;
pub mod sbom;
pub mod statement;
pub mod subject;
#[cfg(test)]
mod tests;

// Re-export error types
pub use error::{Error, Result};

/// Initialize logging for the CLI
pub fn init_logging() -> Result<()> {
    env_logger::try_init().map_err(|e| Error::Initialization(e.to_string()))
}
