//! # External Capabilities
//!
//! The pipeline delegates content hashing and version-control queries to
//! external tools through the traits below, so tests can substitute
//! deterministic stand-ins and the core never spawns a process directly.
//!
//! [`CapabilityError`] separates the two failure classes that matter to the
//! caller: a tool that is missing outright aborts the whole run, while a
//! tool that merely cannot read one target is recovered per subject.

use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The external tool itself cannot be invoked. Callers treat this as
    /// fatal for the whole run.
    #[error("{tool} is unavailable: {reason}")]
    Unavailable { tool: &'static str, reason: String },

    /// The tool ran but could not process this one target.
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Content-addressed hashing of a file or store path.
pub trait ContentHasher {
    fn content_hash(&self, path: &Path) -> Result<String, CapabilityError>;
}

/// Identity of a local version-control working copy.
pub trait VcsIdentity {
    fn identify(&self, workspace: &Path) -> Result<VcsInfo, CapabilityError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcsInfo {
    pub remote_url: String,
    pub commit: String,
}

/// Canonical store-path hasher: shells out to `nix-hash` so the recursive
/// directory-tree digest matches the published reference value bit-for-bit.
/// A locally reimplemented digest would not, since the tool hashes a
/// serialized form of the tree rather than raw file bytes.
#[derive(Debug, Default)]
pub struct NixHasher;

impl ContentHasher for NixHasher {
    fn content_hash(&self, path: &Path) -> Result<String, CapabilityError> {
        let output = Command::new("nix-hash")
            .args(["--base32", "--type", "sha256"])
            .arg(path)
            .output()
            .map_err(|e| CapabilityError::Unavailable {
                tool: "nix-hash",
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(CapabilityError::Unreadable {
                path: path.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Plain streaming SHA-256 over a single file, for build farms whose
/// artifacts are ordinary files rather than store trees.
#[derive(Debug, Default)]
pub struct Sha256FileHasher;

impl ContentHasher for Sha256FileHasher {
    fn content_hash(&self, path: &Path) -> Result<String, CapabilityError> {
        let mut file =
            std::fs::File::open(path).map_err(|e| CapabilityError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let bytes_read = file
                .read(&mut buffer)
                .map_err(|e| CapabilityError::Unreadable {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }
}

/// Queries the builder's own working copy through the `git` CLI.
#[derive(Debug, Default)]
pub struct GitCli;

impl GitCli {
    fn run(&self, workspace: &Path, args: &[&str]) -> Result<String, CapabilityError> {
        let output = Command::new("git")
            .arg("-C")
            .arg(workspace)
            .args(args)
            .output()
            .map_err(|e| CapabilityError::Unavailable {
                tool: "git",
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(CapabilityError::Unavailable {
                tool: "git",
                reason: format!(
                    "`git {}` failed in {}: {}",
                    args.join(" "),
                    workspace.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VcsIdentity for GitCli {
    fn identify(&self, workspace: &Path) -> Result<VcsInfo, CapabilityError> {
        let remote_url = self.run(workspace, &["remote", "get-url", "origin"])?;
        let commit = self.run(workspace, &["rev-parse", "HEAD"])?;
        Ok(VcsInfo { remote_url, commit })
    }
}
