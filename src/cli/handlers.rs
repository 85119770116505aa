use crate::error::{Error, Result};

use super::commands::{HasherChoice, ProvenanceCommands};
use crate::assemble::{
    self, AssembleConfig, BuilderDependencySource, ByproductSource, OutputTarget,
};
use crate::capability::{ContentHasher, GitCli, NixHasher, Sha256FileHasher};
use crate::report;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub fn handle_provenance_command(cmd: ProvenanceCommands) -> Result<()> {
    match cmd {
        ProvenanceCommands::Generate {
            report,
            buildinfo,
            sbom,
            results_dir,
            workspace,
            output,
            output_dir,
            cache_url,
            byproducts,
            build_type,
            builder_id,
            hasher,
            compact,
        } => {
            let root = read_json(&report)?;

            // Explicit --buildinfo wins over the reference embedded in the
            // report; the normalizer sees only the loaded payload.
            let secondary_path = buildinfo
                .or_else(|| report::secondary_reference(&root).map(PathBuf::from));
            let secondary = secondary_path.as_deref().map(read_json).transpose()?;

            let sbom_doc = sbom
                .as_deref()
                .map(|path| {
                    read_json(path).map_err(|e| {
                        Error::DependencyResolution(format!(
                            "cannot load SBOM {}: {e}",
                            path.display()
                        ))
                    })
                })
                .transpose()?;

            let config = AssembleConfig {
                build_type_uri: build_type,
                builder_id_uri: builder_id,
                builder_dependencies: match workspace {
                    Some(ws) => BuilderDependencySource::Workspace(ws),
                    None => BuilderDependencySource::Static(
                        assemble::default_builder_dependencies(),
                    ),
                },
                byproducts: match (results_dir, cache_url) {
                    (Some(dir), _) => ByproductSource::ResultsDir(dir),
                    (None, Some(base_url)) => ByproductSource::CacheTemplate {
                        base_url,
                        filenames: byproducts,
                    },
                    (None, None) => ByproductSource::None,
                },
                output: match (output, output_dir) {
                    (Some(path), _) => OutputTarget::Path(path),
                    (None, Some(dir)) => OutputTarget::BuildIdTemplate(dir),
                    (None, None) => OutputTarget::Path(PathBuf::from("provenance.json")),
                },
                pretty: !compact,
                ..AssembleConfig::default()
            };

            let hasher: Box<dyn ContentHasher> = match hasher {
                HasherChoice::Nix => Box::new(NixHasher),
                HasherChoice::Sha256 => Box::new(Sha256FileHasher),
            };

            let generated = assemble::generate(
                &root,
                secondary.as_ref(),
                sbom_doc.as_ref(),
                &config,
                hasher.as_ref(),
                &GitCli,
            )?;

            let path = assemble::write_statement(&generated, &config)?;
            log::info!("wrote provenance statement to {}", path.display());

            // Recovered per-subject failures are summarized once, here.
            if !generated.degraded.is_empty() {
                super::print_validation_warning(&format!(
                    "{} subject(s) emitted without a digest: {}",
                    generated.degraded.len(),
                    generated.degraded.join(", ")
                ));
            }

            Ok(())
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
