//! # Provenance Assembly
//!
//! Orchestrates the pipeline: normalize the report, resolve subjects and
//! SBOM dependencies, then fold everything plus the builder's own identity
//! into one [`ProvenanceStatement`] and persist it. All knobs that the
//! historical converter kept as module-level constants live in
//! [`AssembleConfig`], an immutable value handed in by the caller.

use crate::capability::{ContentHasher, VcsIdentity};
use crate::error::{Error, Result};
use crate::report::{self, BuildReport};
use crate::sbom;
use crate::statement::{
    Builder, BuilderDependency, BuildDefinition, Byproduct, GitDigest, InvocationMetadata,
    Predicate, ProvenanceStatement, InternalParameters, RunDetails,
    BUILD_PROVENANCE_PREDICATE_TYPE_V1, STATEMENT_TYPE_V1,
};
use crate::subject::{self, ResolvedSubjects};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Where the builder's own source revision comes from.
#[derive(Debug, Clone)]
pub enum BuilderDependencySource {
    /// Repository URIs with commit hashes baked in when the tool was built.
    Static(Vec<BuilderDependency>),
    /// Query the working copy at this path through the VCS capability.
    /// Failure is fatal: a statement that cannot assert its own provenance
    /// is worthless.
    Workspace(PathBuf),
}

/// Where the byproduct list comes from.
#[derive(Debug, Clone)]
pub enum ByproductSource {
    None,
    /// Immediate entries of a local results directory.
    ResultsDir(PathBuf),
    /// Expected filenames under a remote cache; asserted, never checked
    /// against the remote.
    CacheTemplate {
        base_url: String,
        filenames: Vec<String>,
    },
}

/// Destination of the serialized statement.
#[derive(Debug, Clone)]
pub enum OutputTarget {
    Path(PathBuf),
    /// `provenance_{buildId}.json` inside this directory.
    BuildIdTemplate(PathBuf),
}

/// Immutable assembly configuration; see [`AssembleConfig::default`] for
/// the documented defaults.
#[derive(Debug, Clone)]
pub struct AssembleConfig {
    /// URI identifying the build's recipe format.
    pub build_type_uri: String,
    /// URI identifying the builder.
    pub builder_id_uri: String,
    /// Extension point; empty in every observed input.
    pub external_parameters: serde_json::Map<String, Value>,
    pub builder_dependencies: BuilderDependencySource,
    pub byproducts: ByproductSource,
    pub output: OutputTarget,
    pub pretty: bool,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            build_type_uri: String::new(),
            builder_id_uri: String::new(),
            external_parameters: serde_json::Map::new(),
            builder_dependencies: BuilderDependencySource::Static(
                default_builder_dependencies(),
            ),
            byproducts: ByproductSource::None,
            output: OutputTarget::Path(PathBuf::from("provenance.json")),
            pretty: true,
        }
    }
}

/// The CI repositories this converter ships from; commit hashes are filled
/// in by the workspace strategy when one is configured.
pub fn default_builder_dependencies() -> Vec<BuilderDependency> {
    vec![
        BuilderDependency {
            uri: "git+https://github.com/tiiuae/ci-private".to_string(),
            digest: GitDigest { git_commit: None },
        },
        BuilderDependency {
            uri: "git+https://github.com/tiiuae/ci-public".to_string(),
            digest: GitDigest { git_commit: None },
        },
    ]
}

/// Result of a pipeline run, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProvenance {
    pub statement: ProvenanceStatement,
    pub build_id: String,
    /// Subject locations emitted without a digest; empty on a clean run.
    pub degraded: Vec<String>,
}

/// Run the whole pipeline over pre-parsed payloads.
pub fn generate(
    root: &Value,
    secondary: Option<&Value>,
    sbom_doc: Option<&Value>,
    config: &AssembleConfig,
    hasher: &dyn ContentHasher,
    vcs: &dyn VcsIdentity,
) -> Result<GeneratedProvenance> {
    let build_report = report::normalize(root, secondary)?;
    let subjects = subject::resolve_subjects(&build_report.artifacts, hasher)?;
    let dependencies = sbom::resolve_dependencies(sbom_doc)?;
    assemble(&build_report, subjects, dependencies, config, vcs)
}

/// Fold the resolved pieces into the final statement.
pub fn assemble(
    build_report: &BuildReport,
    subjects: ResolvedSubjects,
    dependencies: Vec<crate::statement::ResolvedDependency>,
    config: &AssembleConfig,
    vcs: &dyn VcsIdentity,
) -> Result<GeneratedProvenance> {
    let builder_dependencies = resolve_builder_dependencies(config, vcs)?;
    let byproducts = resolve_byproducts(&config.byproducts, &build_report.build_id_str())?;

    let statement = ProvenanceStatement {
        statement_type: STATEMENT_TYPE_V1.to_string(),
        subject: subjects.subjects,
        predicate_type: BUILD_PROVENANCE_PREDICATE_TYPE_V1.to_string(),
        predicate: Predicate {
            build_definition: BuildDefinition {
                build_type: config.build_type_uri.clone(),
                external_parameters: config.external_parameters.clone(),
                internal_parameters: InternalParameters {
                    server: build_report.server.clone(),
                    system: build_report.system.clone(),
                    jobset: build_report.jobset.clone(),
                    project: build_report.project.clone(),
                    job: build_report.job.clone(),
                    drv_path: build_report.derivation_path.clone(),
                },
                resolved_dependencies: dependencies,
            },
            run_details: RunDetails {
                builder: Builder {
                    id: config.builder_id_uri.clone(),
                    builder_dependencies,
                },
                metadata: InvocationMetadata {
                    invocation_id: build_report.build_id.clone(),
                    started_on: build_report.started_on_iso(),
                    finished_on: build_report.finished_on_iso(),
                },
                byproducts,
            },
        },
    };

    Ok(GeneratedProvenance {
        statement,
        build_id: build_report.build_id_str(),
        degraded: subjects.degraded,
    })
}

fn resolve_builder_dependencies(
    config: &AssembleConfig,
    vcs: &dyn VcsIdentity,
) -> Result<Vec<BuilderDependency>> {
    match &config.builder_dependencies {
        BuilderDependencySource::Static(deps) => Ok(deps.clone()),
        BuilderDependencySource::Workspace(workspace) => {
            let info = vcs
                .identify(workspace)
                .map_err(|e| Error::Capability(e.to_string()))?;
            Ok(vec![BuilderDependency {
                uri: format!("git+{}", info.remote_url),
                digest: GitDigest {
                    git_commit: Some(info.commit),
                },
            }])
        }
    }
}

fn resolve_byproducts(source: &ByproductSource, build_id: &str) -> Result<Vec<Byproduct>> {
    match source {
        ByproductSource::None => Ok(Vec::new()),
        ByproductSource::ResultsDir(dir) => list_results_dir(dir),
        ByproductSource::CacheTemplate {
            base_url,
            filenames,
        } => Ok(filenames
            .iter()
            .map(|name| Byproduct {
                name: name.clone(),
                uri: format!("{base_url}{build_id}/{name}"),
            })
            .collect()),
    }
}

fn list_results_dir(dir: &Path) -> Result<Vec<Byproduct>> {
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        // An absent results directory simply means no byproducts.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::Io(e)),
    };

    let mut names: Vec<String> = read
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| Byproduct {
            uri: dir.join(&name).to_string_lossy().into_owned(),
            name,
        })
        .collect())
}

/// Destination path for a generated statement.
pub fn output_path(config: &AssembleConfig, build_id: &str) -> PathBuf {
    match &config.output {
        OutputTarget::Path(path) => path.clone(),
        OutputTarget::BuildIdTemplate(dir) => dir.join(format!("provenance_{build_id}.json")),
    }
}

/// Serialize the statement; key order follows struct field order, so the
/// bytes are stable across runs over identical input.
pub fn to_json(statement: &ProvenanceStatement, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(statement)?
    } else {
        serde_json::to_string(statement)?
    };
    Ok(json)
}

/// Serialize and persist in one step. The document is fully rendered in
/// memory before the destination is opened, so a failed run never leaves a
/// partial file behind.
pub fn write_statement(generated: &GeneratedProvenance, config: &AssembleConfig) -> Result<PathBuf> {
    let path = output_path(config, &generated.build_id);
    let json = to_json(&generated.statement, config.pretty)?;
    std::fs::write(&path, json).map_err(|source| Error::OutputWrite {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path)
}
