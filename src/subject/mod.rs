//! # Subject Resolution
//!
//! Turns the build's declared artifacts into the statement's `subject` list
//! with verified content digests.
//!
//! The one rule that must never regress: a product whose report entry lacks
//! a precomputed hash (absent or empty string) always gets its digest
//! recomputed through the hashing capability. Treating a missing hash as
//! "no digest" would emit an unverifiable subject and defeat the point of
//! the attestation. Conversely, a supplied non-empty hash is used verbatim
//! and the hasher is not consulted.

use crate::capability::{CapabilityError, ContentHasher};
use crate::error::{Error, Result};
use crate::report::{BuildArtifacts, ProductRef};
use crate::statement::Subject;
use std::path::Path;

/// Subjects plus the locations that could not be digested. A non-empty
/// `degraded` list still yields a successful run, but the caller must
/// surface it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSubjects {
    pub subjects: Vec<Subject>,
    pub degraded: Vec<String>,
}

impl ResolvedSubjects {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Resolve the subject list for a build's artifacts, in source order.
///
/// Per-target hash failures are recovered locally: the subject is emitted
/// without a digest and recorded as degraded. An unavailable hashing tool
/// is escalated to a fatal [`Error::Capability`].
pub fn resolve_subjects(
    artifacts: &BuildArtifacts,
    hasher: &dyn ContentHasher,
) -> Result<ResolvedSubjects> {
    match artifacts {
        BuildArtifacts::OutputPaths(paths) => resolve_output_paths(paths, hasher),
        BuildArtifacts::Products(products) => resolve_products(products, hasher),
    }
}

fn resolve_output_paths(
    paths: &[String],
    hasher: &dyn ContentHasher,
) -> Result<ResolvedSubjects> {
    let mut subjects = Vec::new();
    let mut degraded = Vec::new();

    for path in paths {
        let entries = match list_entries(path) {
            Ok(entries) => entries,
            Err(reason) => {
                // Missing output directory: keep the location on record as
                // a digest-less subject rather than dropping it.
                log::warn!("cannot enumerate output path {path}: {reason}");
                subjects.push(Subject::partial(base_name(path), path.clone()));
                degraded.push(path.clone());
                continue;
            }
        };

        for entry in entries {
            let uri = format!("{path}/{entry}");
            push_hashed(&mut subjects, &mut degraded, entry, uri, hasher)?;
        }
    }

    Ok(ResolvedSubjects { subjects, degraded })
}

fn resolve_products(
    products: &[ProductRef],
    hasher: &dyn ContentHasher,
) -> Result<ResolvedSubjects> {
    let mut subjects = Vec::new();
    let mut degraded = Vec::new();

    for product in products {
        match &product.known_digest {
            // Use the precomputed value if non-empty, else compute.
            Some(digest) if !digest.is_empty() => {
                subjects.push(Subject::with_sha256(
                    product.name.clone(),
                    product.path.clone(),
                    digest.clone(),
                ));
            }
            _ => {
                push_hashed(
                    &mut subjects,
                    &mut degraded,
                    product.name.clone(),
                    product.path.clone(),
                    hasher,
                )?;
            }
        }
    }

    Ok(ResolvedSubjects { subjects, degraded })
}

fn push_hashed(
    subjects: &mut Vec<Subject>,
    degraded: &mut Vec<String>,
    name: String,
    uri: String,
    hasher: &dyn ContentHasher,
) -> Result<()> {
    match hasher.content_hash(Path::new(&uri)) {
        Ok(digest) => subjects.push(Subject::with_sha256(name, uri, digest)),
        Err(err @ CapabilityError::Unavailable { .. }) => {
            return Err(Error::Capability(err.to_string()));
        }
        Err(CapabilityError::Unreadable { path, reason }) => {
            log::warn!("{}", Error::HashComputation { path, reason });
            subjects.push(Subject::partial(name, uri.clone()));
            degraded.push(uri);
        }
    }
    Ok(())
}

/// Immediate entry names of a directory, sorted so repeated runs over the
/// same tree enumerate identically regardless of readdir order.
fn list_entries(path: &str) -> std::result::Result<Vec<String>, String> {
    let mut entries: Vec<String> = std::fs::read_dir(path)
        .map_err(|e| e.to_string())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    Ok(entries)
}

fn base_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
