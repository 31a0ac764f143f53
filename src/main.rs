use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use arcplan::cli::{
    check_command, expand_command, expand_options, flatten_command, format_check, Cli, Commands,
};

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Documents go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli.command) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Expand {
            tree_file,
            format,
            first_match,
            update,
        } => {
            let output = expand_command(
                &tree_file,
                format,
                &expand_options(first_match),
                update.as_deref(),
            )
            .with_context(|| format!("Failed to expand {}", tree_file.display()))?;
            println!("{}", output);
        }
        Commands::Flatten { plan_file, format } => {
            let output = flatten_command(&plan_file, format)
                .with_context(|| format!("Failed to flatten {}", plan_file.display()))?;
            print!("{}", output);
        }
        Commands::Check {
            tree_file,
            format,
            first_match,
            previous,
        } => {
            let report = check_command(
                &tree_file,
                format,
                &expand_options(first_match),
                previous.as_deref(),
            )
            .with_context(|| format!("Check failed for {}", tree_file.display()))?;
            print!("{}", format_check(&report));
        }
    }
    Ok(())
}
