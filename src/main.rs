use clap::Parser;
use provenance_cli::{
    cli::{self, commands::ProvenanceCommands},
    error::Result,
};

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: ProvenanceCommands,
}

fn main() -> Result<()> {
    // Initialize logging
    provenance_cli::init_logging()?;

    // Parse command line arguments
    let cli = Cli::parse();

    // Handle commands
    let result = cli::handlers::handle_provenance_command(cli.command);

    // Format and display any errors
    if let Err(ref e) = result {
        eprintln!("{}", cli::format_error(e));
    }

    result
}
