use crate::capability::{CapabilityError, ContentHasher, VcsIdentity, VcsInfo};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::path::Path;

/// Deterministic hasher that digests the path string itself and records
/// every call, so tests can assert both laziness and exact call targets.
#[derive(Debug, Default)]
pub struct CountingHasher {
    paths: RefCell<Vec<String>>,
}

impl CountingHasher {
    pub fn calls(&self) -> usize {
        self.paths.borrow().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.paths.borrow().clone()
    }

    /// The digest this hasher will return for a given path.
    pub fn digest_for(path: &str) -> String {
        hex::encode(Sha256::digest(path.as_bytes()))
    }
}

impl ContentHasher for CountingHasher {
    fn content_hash(&self, path: &Path) -> Result<String, CapabilityError> {
        let path = path.to_string_lossy().into_owned();
        let digest = Self::digest_for(&path);
        self.paths.borrow_mut().push(path);
        Ok(digest)
    }
}

/// Hasher whose targets are never readable; exercises per-subject recovery.
#[derive(Debug, Default)]
pub struct UnreadableHasher;

impl ContentHasher for UnreadableHasher {
    fn content_hash(&self, path: &Path) -> Result<String, CapabilityError> {
        Err(CapabilityError::Unreadable {
            path: path.display().to_string(),
            reason: "stubbed read failure".to_string(),
        })
    }
}

/// Hasher standing in for a missing external tool; exercises the fatal path.
#[derive(Debug, Default)]
pub struct UnavailableHasher;

impl ContentHasher for UnavailableHasher {
    fn content_hash(&self, _path: &Path) -> Result<String, CapabilityError> {
        Err(CapabilityError::Unavailable {
            tool: "nix-hash",
            reason: "stubbed missing tool".to_string(),
        })
    }
}

/// Version-control capability answering with fixed values.
#[derive(Debug)]
pub struct StaticVcs {
    remote_url: String,
    commit: String,
}

impl StaticVcs {
    pub fn new(remote_url: &str, commit: &str) -> Self {
        Self {
            remote_url: remote_url.to_string(),
            commit: commit.to_string(),
        }
    }
}

impl VcsIdentity for StaticVcs {
    fn identify(&self, _workspace: &Path) -> Result<VcsInfo, CapabilityError> {
        Ok(VcsInfo {
            remote_url: self.remote_url.clone(),
            commit: self.commit.clone(),
        })
    }
}

/// Version-control capability that always fails.
#[derive(Debug, Default)]
pub struct UnavailableVcs;

impl VcsIdentity for UnavailableVcs {
    fn identify(&self, workspace: &Path) -> Result<VcsInfo, CapabilityError> {
        Err(CapabilityError::Unavailable {
            tool: "git",
            reason: format!("stubbed failure in {}", workspace.display()),
        })
    }
}
