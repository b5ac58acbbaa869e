use clap::Parser;
use colored::*;
use plasclass::cli::{Cli, Commands};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // PLASCLASS_LOG takes precedence over -v
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let log_level = std::env::var("PLASCLASS_LOG").unwrap_or_else(|_| default_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&log_level))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<plasclass::PlasClassError>() {
            Some(plasclass::PlasClassError::Config(_))
            | Some(plasclass::PlasClassError::MissingModel { .. })
            | Some(plasclass::PlasClassError::ModelShape { .. }) => 2,
            Some(plasclass::PlasClassError::Io(_)) => 3,
            Some(plasclass::PlasClassError::Parse(_))
            | Some(plasclass::PlasClassError::Serialization(_)) => 4,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Classify(args) => plasclass::cli::commands::classify::run(args, cli.threads),
        Commands::Features(args) => plasclass::cli::commands::features::run(args, cli.threads),
        Commands::Config(args) => plasclass::cli::commands::config::run(args),
    }
}
