//! # Provenance Statement Model
//!
//! Serde model of an in-toto Statement v1 carrying a SLSA v1 build
//! provenance predicate. Struct field order deliberately matches the
//! serialized key order so that two runs over identical input produce
//! byte-identical JSON, which keeps provenance documents diff-stable for
//! reproducibility audits.
//!
//! ## Examples
//!
//! ```
//! use provenance_cli::statement::{ProvenanceStatement, STATEMENT_TYPE_V1};
//!
//! let json = serde_json::json!({
//!     "_type": "https://in-toto.io/Statement/v1",
//!     "subject": [],
//!     "predicateType": "https://slsa.dev/provenance/v1",
//!     "predicate": {
//!         "buildDefinition": {
//!             "buildType": "",
//!             "externalParameters": {},
//!             "internalParameters": {
//!                 "server": null, "system": null, "jobset": null,
//!                 "project": null, "job": null, "drvPath": "/nix/store/x.drv"
//!             },
//!             "resolvedDependencies": []
//!         },
//!         "runDetails": {
//!             "builder": { "id": "", "builderDependencies": [] },
//!             "metadata": {
//!                 "invocationId": 7,
//!                 "startedOn": "2024-01-01T00:00:00",
//!                 "finishedOn": "2024-01-01T00:01:00"
//!             },
//!             "byproducts": []
//!         }
//!     }
//! });
//! let statement: ProvenanceStatement = serde_json::from_value(json).unwrap();
//! assert_eq!(statement.statement_type, STATEMENT_TYPE_V1);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The in-toto Statement v1 type URI, fixed for every emitted document.
pub const STATEMENT_TYPE_V1: &str = "https://in-toto.io/Statement/v1";

/// The standard SLSA v1 build provenance in-toto predicate type URI.
pub const BUILD_PROVENANCE_PREDICATE_TYPE_V1: &str = "https://slsa.dev/provenance/v1";

/// The complete provenance document: one statement about one build.
///
/// Built once, serialized once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceStatement {
    #[serde(rename = "_type")]
    pub statement_type: String,
    pub subject: Vec<Subject>,
    #[serde(rename = "predicateType")]
    pub predicate_type: String,
    pub predicate: Predicate,
}

/// An artifact the statement attests to, identified by content digest.
///
/// A subject whose content could not be located carries an empty digest map
/// and the run reports it as degraded; it is never silently dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub digest: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Predicate {
    pub build_definition: BuildDefinition,
    pub run_details: RunDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDefinition {
    pub build_type: String,
    /// Always serialized, empty in every observed input. Kept as a map so
    /// callers with richer build systems can populate it.
    pub external_parameters: serde_json::Map<String, Value>,
    pub internal_parameters: InternalParameters,
    pub resolved_dependencies: Vec<ResolvedDependency>,
}

/// Build-configuration coordinates taken from the normalized report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalParameters {
    pub server: Option<String>,
    pub system: Option<String>,
    pub jobset: Option<String>,
    pub project: Option<String>,
    pub job: Option<String>,
    #[serde(rename = "drvPath")]
    pub drv_path: String,
}

/// A component projected out of the SBOM's flat component list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDependency {
    pub name: String,
    /// The component's `bom-ref`, treated as an opaque identifier.
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDetails {
    pub builder: Builder,
    pub metadata: InvocationMetadata,
    pub byproducts: Vec<Byproduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Builder {
    pub id: String,
    #[serde(rename = "builderDependencies")]
    pub builder_dependencies: Vec<BuilderDependency>,
}

/// Source revision of the tooling that produced the statement itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderDependency {
    pub uri: String,
    pub digest: GitDigest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitDigest {
    #[serde(rename = "gitCommit")]
    pub git_commit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationMetadata {
    /// The build id exactly as it appeared in the report; historical inputs
    /// carry it as either a JSON number or a string.
    #[serde(rename = "invocationId")]
    pub invocation_id: Value,
    #[serde(rename = "startedOn")]
    pub started_on: String,
    #[serde(rename = "finishedOn")]
    pub finished_on: String,
}

/// A file produced by the build that is not a primary subject, e.g. scan
/// reports or the provenance document itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Byproduct {
    pub name: String,
    pub uri: String,
}

impl Subject {
    /// Subject with a verified sha256 digest.
    pub fn with_sha256(name: impl Into<String>, uri: impl Into<String>, digest: String) -> Self {
        let mut map = BTreeMap::new();
        map.insert("sha256".to_string(), digest);
        Self {
            name: name.into(),
            uri: uri.into(),
            digest: map,
        }
    }

    /// Subject whose content could not be hashed; carries no digest.
    pub fn partial(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            digest: BTreeMap::new(),
        }
    }
}
