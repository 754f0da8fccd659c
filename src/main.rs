// Rosetta - FHIR Client and Terminology Tools
// Copyright (c) 2025 Rosetta Contributors
// Licensed under the MIT License

use clap::Parser;
use rosetta::cli::{Cli, Commands};
use rosetta::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    // This is optional - if .env doesn't exist, it's silently ignored
    let _ = dotenvy::dotenv();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for command output
    let log_level = cli.log_level.as_deref().unwrap_or("info");
    if let Err(e) = init_logging(log_level, cli.log_json) {
        eprintln!("Failed to initialize logging: {e}");
        process::exit(5);
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Rosetta - FHIR Client and Terminology Tools"
    );

    // Execute command and get exit code
    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5 // Fatal error exit code
        }
    };

    // Exit with appropriate code
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::ValidateCode(args) => args.execute(&cli.config).await,
        Commands::Lookup(args) => args.execute(&cli.config).await,
        Commands::Expand(args) => args.execute(&cli.config).await,
        Commands::Translate(args) => args.execute(&cli.config).await,
        Commands::Subsumes(args) => args.execute(&cli.config).await,
        Commands::Read(args) => args.execute(&cli.config).await,
        Commands::Search(args) => args.execute(&cli.config).await,
        Commands::Create(args) => args.execute(&cli.config).await,
        Commands::Delete(args) => args.execute(&cli.config).await,
        Commands::Capabilities(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
