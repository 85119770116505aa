use crate::assemble::{self, AssembleConfig, BuilderDependencySource, OutputTarget};
use crate::error::Error;
use crate::report;
use crate::statement::ProvenanceStatement;
use crate::tests::common::{CountingHasher, StaticVcs, UnreadableHasher};
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::tempdir;

fn post_build_root() -> Value {
    json!({
        "Build ID": 42,
        "Server": "ci1",
        "Postbuild info": "/tmp/pb.json"
    })
}

fn build_info() -> Value {
    json!({
        "System": "x86_64-linux",
        "Jobset": "trunk",
        "Project": "demo",
        "Job": "build",
        "Derivation store path": "/nix/store/abc-demo.drv",
        "startTime": 1000,
        "stopTime": 1100,
        "products": [
            {"name": "out.tar", "path": "/tmp/out.tar", "sha256hash": "deadbeef"}
        ]
    })
}

fn vcs() -> StaticVcs {
    StaticVcs::new("https://github.com/tiiuae/ci-public", "abc123")
}

#[test]
fn test_end_to_end_product_manifest_report() {
    let root = post_build_root();
    let info = build_info();
    let hasher = CountingHasher::default();

    let generated = assemble::generate(
        &root,
        Some(&info),
        None,
        &AssembleConfig::default(),
        &hasher,
        &vcs(),
    )
    .unwrap();

    let statement = &generated.statement;
    assert_eq!(statement.statement_type, "https://in-toto.io/Statement/v1");
    assert_eq!(statement.predicate_type, "https://slsa.dev/provenance/v1");

    assert_eq!(statement.subject.len(), 1);
    assert_eq!(statement.subject[0].name, "out.tar");
    assert_eq!(statement.subject[0].uri, "/tmp/out.tar");
    assert_eq!(statement.subject[0].digest.get("sha256").unwrap(), "deadbeef");
    // The supplied digest was used verbatim; the hasher never ran.
    assert_eq!(hasher.calls(), 0);

    let metadata = &statement.predicate.run_details.metadata;
    assert_eq!(metadata.invocation_id, json!(42));
    assert_eq!(metadata.started_on, report::epoch_to_local_iso(1000));
    assert_eq!(metadata.finished_on, report::epoch_to_local_iso(1100));

    let internal = &statement.predicate.build_definition.internal_parameters;
    assert_eq!(internal.server.as_deref(), Some("ci1"));
    assert_eq!(internal.system.as_deref(), Some("x86_64-linux"));
    assert_eq!(internal.drv_path, "/nix/store/abc-demo.drv");

    assert!(statement.predicate.build_definition.resolved_dependencies.is_empty());
    assert!(generated.degraded.is_empty());
    assert_eq!(generated.build_id, "42");
}

#[test]
fn test_sbom_components_become_resolved_dependencies() {
    let sbom = json!({
        "components": [
            {"name": "libfoo", "bom-ref": "pkg:generic/libfoo@1.0"}
        ]
    });

    let generated = assemble::generate(
        &post_build_root(),
        Some(&build_info()),
        Some(&sbom),
        &AssembleConfig::default(),
        &CountingHasher::default(),
        &vcs(),
    )
    .unwrap();

    let deps = &generated.statement.predicate.build_definition.resolved_dependencies;
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].name, "libfoo");
    assert_eq!(deps[0].uri, "pkg:generic/libfoo@1.0");
}

#[test]
fn test_identical_input_produces_identical_bytes() {
    let config = AssembleConfig::default();
    let run = || {
        let generated = assemble::generate(
            &post_build_root(),
            Some(&build_info()),
            None,
            &config,
            &CountingHasher::default(),
            &vcs(),
        )
        .unwrap();
        assemble::to_json(&generated.statement, config.pretty).unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_statement_round_trips_through_json() {
    let generated = assemble::generate(
        &post_build_root(),
        Some(&build_info()),
        None,
        &AssembleConfig::default(),
        &CountingHasher::default(),
        &vcs(),
    )
    .unwrap();

    let json = assemble::to_json(&generated.statement, true).unwrap();
    let reparsed: ProvenanceStatement = serde_json::from_str(&json).unwrap();
    assert_eq!(reparsed, generated.statement);
}

#[test]
fn test_malformed_report_writes_no_output() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("provenance.json");
    let config = AssembleConfig {
        output: OutputTarget::Path(output.clone()),
        ..AssembleConfig::default()
    };

    let mut info = build_info();
    info.as_object_mut().unwrap().remove("Derivation store path");

    let result = assemble::generate(
        &post_build_root(),
        Some(&info),
        None,
        &config,
        &CountingHasher::default(),
        &vcs(),
    );

    match result {
        Err(Error::MalformedInput { field, .. }) => {
            assert_eq!(field, "Derivation store path")
        }
        other => panic!("expected MalformedInput, got {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_degraded_run_still_persists_a_statement() {
    let dir = tempdir().unwrap();
    let config = AssembleConfig {
        output: OutputTarget::BuildIdTemplate(dir.path().to_path_buf()),
        ..AssembleConfig::default()
    };

    let mut info = build_info();
    info["products"] = json!([{"name": "out.tar", "path": "/tmp/out.tar"}]);

    let generated = assemble::generate(
        &post_build_root(),
        Some(&info),
        None,
        &config,
        &UnreadableHasher,
        &vcs(),
    )
    .unwrap();
    assert_eq!(generated.degraded, vec!["/tmp/out.tar"]);
    assert!(generated.statement.subject[0].digest.is_empty());

    let path = assemble::write_statement(&generated, &config).unwrap();
    assert_eq!(path, dir.path().join("provenance_42.json"));
    assert!(path.exists());
}

#[test]
fn test_workspace_identity_lands_in_builder_dependencies() {
    let config = AssembleConfig {
        builder_dependencies: BuilderDependencySource::Workspace(PathBuf::from("/src/ci")),
        builder_id_uri: "https://ci.example/builder".to_string(),
        ..AssembleConfig::default()
    };

    let generated = assemble::generate(
        &post_build_root(),
        Some(&build_info()),
        None,
        &config,
        &CountingHasher::default(),
        &vcs(),
    )
    .unwrap();

    let builder = &generated.statement.predicate.run_details.builder;
    assert_eq!(builder.id, "https://ci.example/builder");
    assert_eq!(builder.builder_dependencies.len(), 1);
    assert_eq!(
        builder.builder_dependencies[0].uri,
        "git+https://github.com/tiiuae/ci-public"
    );
    assert_eq!(
        builder.builder_dependencies[0].digest.git_commit.as_deref(),
        Some("abc123")
    );
}
