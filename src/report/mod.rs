//! # Post-Build Report Normalization
//!
//! The build farm has emitted several incompatible post-build report layouts
//! over time. This module probes which layout a payload uses and flattens it
//! into one canonical [`BuildReport`], so the rest of the pipeline never
//! deals with raw JSON again.
//!
//! Three layouts are recognized, discriminated by field presence in a fixed
//! priority order (never by trial-and-error parsing):
//!
//! - **Inline**: the root payload itself carries the build fields and an
//!   `Output store paths` directory list.
//! - **Referenced**: the root payload points at a secondary build-info file
//!   (`Postbuild info` / `Build info path`) that carries the build fields
//!   and the `Output store paths` list; `Server` stays on the root.
//! - **Products**: like Referenced, but the secondary file carries a
//!   `products` manifest (`{name, path, sha256hash}`) instead of output
//!   directories.
//!
//! A payload matching two layouts at once is rejected, never guessed at.

use crate::error::{Error, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde_json::Value;
use std::fmt;

/// Report layout detected by the field-presence probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportShape {
    Inline,
    Referenced,
    Products,
}

impl fmt::Display for ReportShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportShape::Inline => write!(f, "inline"),
            ReportShape::Referenced => write!(f, "referenced build-info"),
            ReportShape::Products => write!(f, "product-manifest"),
        }
    }
}

/// One entry of a `products` manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRef {
    pub name: String,
    pub path: String,
    /// Precomputed sha256 from the report, kept verbatim. An empty string is
    /// preserved here and treated as absent by the subject resolver.
    pub known_digest: Option<String>,
}

/// The build's declared artifacts; which side is populated depends on the
/// report layout, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildArtifacts {
    /// Output directories whose immediate entries are the artifacts.
    OutputPaths(Vec<String>),
    /// An explicit artifact manifest.
    Products(Vec<ProductRef>),
}

/// Canonical post-build report, independent of the source layout.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub shape: ReportShape,
    /// Raw build id value; historical reports use both strings and numbers,
    /// and the original value is carried into `metadata.invocationId`.
    pub build_id: Value,
    pub server: Option<String>,
    pub system: Option<String>,
    pub jobset: Option<String>,
    pub project: Option<String>,
    pub job: Option<String>,
    pub derivation_path: String,
    pub started_at: i64,
    pub finished_at: i64,
    pub artifacts: BuildArtifacts,
}

impl BuildReport {
    /// Build id rendered as a string, for output-file templating.
    pub fn build_id_str(&self) -> String {
        match &self.build_id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn started_on_iso(&self) -> String {
        epoch_to_local_iso(self.started_at)
    }

    pub fn finished_on_iso(&self) -> String {
        epoch_to_local_iso(self.finished_at)
    }
}

/// Render an epoch-seconds instant as an ISO-8601 string without an offset
/// suffix, interpreting the instant in the platform-local timezone.
///
/// The local interpretation (rather than UTC) is inherited from the report
/// format and preserved on purpose: downstream provenance consumers expect
/// the producing system's own convention.
pub fn epoch_to_local_iso(secs: i64) -> String {
    match Local.timestamp_opt(secs, 0).earliest() {
        Some(dt) => dt.naive_local().format("%Y-%m-%dT%H:%M:%S").to_string(),
        // Nonexistent local instant (DST gap); render the UTC reading.
        None => DateTime::<Utc>::from_timestamp(secs, 0)
            .map(|dt| dt.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_default(),
    }
}

/// Secondary build-info file reference embedded in the root payload, if any.
///
/// `Postbuild info` is the newer field name and wins over the older
/// `Build info path`; an explicit override supplied by the caller takes
/// precedence over both (the caller applies that rule before loading).
pub fn secondary_reference(root: &Value) -> Option<&str> {
    root.get("Postbuild info")
        .or_else(|| root.get("Build info path"))
        .and_then(Value::as_str)
}

/// Flatten a root payload (plus the secondary build-info payload, when one
/// was located) into a [`BuildReport`].
///
/// Layout detection is a field-presence probe in fixed priority order:
/// an `Output store paths` list on the root selects the inline layout, a
/// secondary payload selects the referenced layouts, and within the
/// secondary payload `products` versus `Output store paths` discriminates
/// the manifest layout from the directory layout. Conflicting signals fail
/// with [`Error::AmbiguousShape`].
pub fn normalize(root: &Value, secondary: Option<&Value>) -> Result<BuildReport> {
    let inline_signal = root.get("Output store paths").is_some();
    let referenced_signal = secondary_reference(root).is_some() || secondary.is_some();

    if inline_signal && referenced_signal {
        return Err(Error::AmbiguousShape(
            "report carries both `Output store paths` and a build-info reference".to_string(),
        ));
    }

    if inline_signal {
        return normalize_inline(root);
    }

    let info = secondary.ok_or_else(|| malformed("Postbuild info", ReportShape::Referenced))?;
    normalize_referenced(root, info)
}

fn normalize_inline(root: &Value) -> Result<BuildReport> {
    let shape = ReportShape::Inline;
    let paths = req_string_array(root, "Output store paths", shape)?;
    let (started_at, finished_at) = timestamps(root, shape)?;

    Ok(BuildReport {
        shape,
        build_id: req_build_id(root, shape)?,
        server: opt_string(root, "Server"),
        system: opt_string(root, "System"),
        jobset: opt_string(root, "Jobset"),
        project: opt_string(root, "Project"),
        job: opt_string(root, "Job"),
        derivation_path: req_string(root, "Derivation store path", shape)?,
        started_at,
        finished_at,
        artifacts: BuildArtifacts::OutputPaths(paths),
    })
}

fn normalize_referenced(root: &Value, info: &Value) -> Result<BuildReport> {
    let products_signal = info.get("products").is_some();
    let paths_signal = info.get("Output store paths").is_some();

    let shape = match (products_signal, paths_signal) {
        (true, true) => {
            return Err(Error::AmbiguousShape(
                "build info carries both `products` and `Output store paths`".to_string(),
            ));
        }
        (true, false) => ReportShape::Products,
        (false, true) => ReportShape::Referenced,
        (false, false) => return Err(malformed("products", ReportShape::Referenced)),
    };

    let artifacts = match shape {
        ReportShape::Products => BuildArtifacts::Products(parse_products(info, shape)?),
        _ => BuildArtifacts::OutputPaths(req_string_array(info, "Output store paths", shape)?),
    };
    let (started_at, finished_at) = timestamps(info, shape)?;

    Ok(BuildReport {
        shape,
        build_id: req_build_id(root, shape)?,
        // `Server` never moved into the build-info file.
        server: opt_string(root, "Server"),
        system: opt_string(info, "System"),
        jobset: opt_string(info, "Jobset"),
        project: opt_string(info, "Project"),
        job: opt_string(info, "Job"),
        derivation_path: req_string(info, "Derivation store path", shape)?,
        started_at,
        finished_at,
        artifacts,
    })
}

fn parse_products(info: &Value, shape: ReportShape) -> Result<Vec<ProductRef>> {
    let entries = info
        .get("products")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("products", shape))?;

    entries
        .iter()
        .map(|entry| {
            Ok(ProductRef {
                name: req_string(entry, "name", shape)?,
                path: req_string(entry, "path", shape)?,
                known_digest: opt_string(entry, "sha256hash"),
            })
        })
        .collect()
}

fn timestamps(payload: &Value, shape: ReportShape) -> Result<(i64, i64)> {
    let started_at = req_i64(payload, "startTime", shape)?;
    let finished_at = req_i64(payload, "stopTime", shape)?;
    if finished_at < started_at {
        return Err(malformed("stopTime", shape));
    }
    Ok((started_at, finished_at))
}

fn malformed(field: &str, shape: ReportShape) -> Error {
    Error::MalformedInput {
        field: field.to_string(),
        shape: shape.to_string(),
    }
}

fn opt_string(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

fn req_string(payload: &Value, key: &str, shape: ReportShape) -> Result<String> {
    opt_string(payload, key).ok_or_else(|| malformed(key, shape))
}

fn req_i64(payload: &Value, key: &str, shape: ReportShape) -> Result<i64> {
    payload
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| malformed(key, shape))
}

fn req_string_array(payload: &Value, key: &str, shape: ReportShape) -> Result<Vec<String>> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| malformed(key, shape))?
        .iter()
        .map(|v| v.as_str().map(str::to_string).ok_or_else(|| malformed(key, shape)))
        .collect()
}

fn req_build_id(root: &Value, shape: ReportShape) -> Result<Value> {
    match root.get("Build ID") {
        Some(v @ Value::String(_)) | Some(v @ Value::Number(_)) => Ok(v.clone()),
        _ => Err(malformed("Build ID", shape)),
    }
}
