//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Rosetta using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Rosetta - FHIR Client and Terminology Tools
#[derive(Parser, Debug)]
#[command(name = "rosetta")]
#[command(version, about, long_about = None)]
#[command(author = "Rosetta Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "rosetta.toml", env = "ROSETTA_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ROSETTA_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON instead of human-readable lines
    #[arg(long, env = "ROSETTA_LOG_JSON")]
    pub log_json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a code against a code system or value set
    ValidateCode(commands::terminology::ValidateCodeArgs),

    /// Look up display name and properties for a code
    Lookup(commands::terminology::LookupArgs),

    /// Expand a value set into its member codes
    Expand(commands::terminology::ExpandArgs),

    /// Translate a code between code systems
    Translate(commands::terminology::TranslateArgs),

    /// Check whether one code subsumes another
    Subsumes(commands::terminology::SubsumesArgs),

    /// Read a resource from the FHIR server
    Read(commands::resource::ReadArgs),

    /// Search for resources on the FHIR server
    Search(commands::resource::SearchArgs),

    /// Create a resource from a JSON file
    Create(commands::resource::CreateArgs),

    /// Delete a resource from the FHIR server
    Delete(commands::resource::DeleteArgs),

    /// Show the FHIR server's capability statement
    Capabilities(commands::resource::CapabilitiesArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateConfigArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_validate_code() {
        let cli = Cli::parse_from([
            "rosetta",
            "validate-code",
            "--code",
            "29463-7",
            "--system",
            "loinc",
        ]);
        assert_eq!(cli.config, "rosetta.toml");
        assert!(matches!(cli.command, Commands::ValidateCode(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["rosetta", "--config", "custom.toml", "capabilities"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["rosetta", "--log-level", "debug", "capabilities"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_read_positionals() {
        let cli = Cli::parse_from(["rosetta", "read", "Patient", "123"]);
        match cli.command {
            Commands::Read(args) => {
                assert_eq!(args.resource_type, "Patient");
                assert_eq!(args.id, "123");
            }
            _ => panic!("expected read command"),
        }
    }

    #[test]
    fn test_cli_parse_expand_requires_url_or_id() {
        let result = Cli::try_parse_from(["rosetta", "expand"]);
        assert!(result.is_err());

        let cli = Cli::parse_from([
            "rosetta",
            "expand",
            "--url",
            "http://hl7.org/fhir/ValueSet/administrative-gender",
        ]);
        assert!(matches!(cli.command, Commands::Expand(_)));

        let both = Cli::try_parse_from([
            "rosetta",
            "expand",
            "--url",
            "http://example.org/vs",
            "--id",
            "my-vs",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn test_cli_parse_search_with_params() {
        let cli = Cli::parse_from([
            "rosetta",
            "search",
            "Observation",
            "--param",
            "patient=123",
            "--param",
            "code=29463-7",
        ]);
        match cli.command {
            Commands::Search(args) => assert_eq!(args.params.len(), 2),
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_cli_parse_subsumes() {
        let cli = Cli::parse_from([
            "rosetta",
            "subsumes",
            "--code-a",
            "49601007",
            "--code-b",
            "38341003",
            "--system",
            "snomed",
        ]);
        assert!(matches!(cli.command, Commands::Subsumes(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["rosetta", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
