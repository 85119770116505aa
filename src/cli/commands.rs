use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum HasherChoice {
    /// Canonical recursive store-path hash via the external `nix-hash` tool
    Nix,
    /// Streaming SHA-256 over single files
    Sha256,
}

#[derive(Debug, Subcommand)]
pub enum ProvenanceCommands {
    /// Generate a SLSA v1 provenance statement from a post-build report
    Generate {
        /// Path to the post-build report JSON
        report: PathBuf,

        /// Path to the build-info file; overrides any reference embedded in
        /// the report
        #[arg(long = "buildinfo")]
        buildinfo: Option<PathBuf>,

        /// Path to a CycloneDX SBOM to project into resolvedDependencies
        #[arg(long = "sbom")]
        sbom: Option<PathBuf>,

        /// Local results directory to enumerate as byproducts
        #[arg(long = "results-dir")]
        results_dir: Option<PathBuf>,

        /// Builder working copy; its git remote and HEAD commit become the
        /// builderDependencies entry
        #[arg(long = "workspace")]
        workspace: Option<PathBuf>,

        /// Write the statement to this exact path (default: provenance.json)
        #[arg(long = "output", conflicts_with = "output_dir")]
        output: Option<PathBuf>,

        /// Write the statement as provenance_{buildId}.json in this directory
        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,

        /// Remote cache URL prefix for asserted byproducts
        /// ({url}{buildId}/{filename})
        #[arg(long = "cache-url", conflicts_with = "results_dir")]
        cache_url: Option<String>,

        /// Expected byproduct filenames under the cache URL (comma-separated)
        #[arg(long = "byproducts", num_args = 1.., value_delimiter = ',', requires = "cache_url")]
        byproducts: Vec<String>,

        /// URI identifying the build's recipe format
        #[arg(long = "build-type", default_value = "")]
        build_type: String,

        /// URI identifying the builder
        #[arg(long = "builder-id", default_value = "")]
        builder_id: String,

        /// Hashing capability for subjects without a precomputed digest
        #[arg(long = "hasher", value_enum, default_value = "nix")]
        hasher: HasherChoice,

        /// Emit compact JSON instead of pretty-printed
        #[arg(long = "compact")]
        compact: bool,
    },
}
