//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand, ValueEnum};
use is_terminal::IsTerminal;
use std::path::PathBuf;

/// Schemata CLI - JSON Schema evaluation for drafts 6, 7, 2019-09 and 2020-12
///
/// Evaluates instances against schemas and reports validity, errors and
/// annotations. The `eval` subcommand follows the JSON Schema test-suite
/// runner contract.
#[derive(Parser, Debug)]
#[command(
    name = "schemata",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SCHEMATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output style for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputStyle,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate one instance against one schema, test-suite runner style
    Eval(EvalArgs),

    /// Validate a document against a schema and print the chosen output projection
    Validate(ValidateArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the eval command
///
/// Exit codes: 0 valid, -1 invalid, 1 input or system error, 2 unsupported
/// specification version.
#[derive(Parser, Debug)]
pub struct EvalArgs {
    /// Schema location as `<file>#<json-pointer>`
    #[arg(long, value_name = "FILE#POINTER")]
    pub schema: String,

    /// Instance location as `<file>#<json-pointer>`
    #[arg(long, value_name = "FILE#POINTER")]
    pub instance: String,

    /// Evaluate under this draft (6, 7, 2019-09, 2020-12 and their aliases)
    #[arg(long, value_name = "VERSION")]
    pub spec_version: Option<String>,

    /// Assert `format` instead of only annotating it
    #[arg(long)]
    pub validate_formats: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the schema document (JSON or YAML)
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Path to the instance document (JSON or YAML)
    #[arg(value_name = "INSTANCE")]
    pub instance: PathBuf,

    /// Output projection of the result tree
    #[arg(short, long, value_enum)]
    pub format: Option<ResultFormat>,

    /// Evaluate under this draft, ignoring `$schema`
    #[arg(long, value_name = "VERSION")]
    pub spec_version: Option<String>,

    /// Assert `format` instead of only annotating it
    #[arg(long)]
    pub validate_formats: bool,

    /// Fail unknown format names
    #[arg(long)]
    pub only_known_formats: bool,

    /// Stop evaluating a node's keywords after the first failure
    #[arg(long)]
    pub short_circuit: bool,

    /// Maximum nesting of schema evaluations
    #[arg(long, value_name = "DEPTH")]
    pub max_depth: Option<usize>,

    /// Resolve `data` keyword references
    #[arg(long)]
    pub data_references: bool,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output style options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputStyle {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Projection of the evaluation result tree
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResultFormat {
    /// Validity only
    Flag,
    /// Flat list of units
    Basic,
    /// Condensed hierarchy
    Detailed,
    /// Full hierarchy
    Hierarchical,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl From<ResultFormat> for schemata_core::OutputFormat {
    fn from(format: ResultFormat) -> Self {
        match format {
            ResultFormat::Flag => schemata_core::OutputFormat::Flag,
            ResultFormat::Basic => schemata_core::OutputFormat::Basic,
            ResultFormat::Detailed => schemata_core::OutputFormat::Detailed,
            ResultFormat::Hierarchical => schemata_core::OutputFormat::Hierarchical,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_eval_arguments() {
        let cli = Cli::parse_from([
            "schemata",
            "eval",
            "--schema",
            "tests.json#/0/schema",
            "--instance",
            "tests.json#/0/tests/1/data",
            "--spec-version",
            "draft-07",
        ]);
        match cli.command {
            Commands::Eval(args) => {
                assert_eq!(args.schema, "tests.json#/0/schema");
                assert_eq!(args.instance, "tests.json#/0/tests/1/data");
                assert_eq!(args.spec_version.as_deref(), Some("draft-07"));
                assert!(!args.validate_formats);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_level() {
        let cli = Cli::parse_from(["schemata", "-vv", "validate", "schema.json", "data.json"]);
        assert_eq!(cli.verbosity_level(), 2);

        let quiet = Cli::parse_from(["schemata", "--quiet", "validate", "schema.json", "data.json"]);
        assert_eq!(quiet.verbosity_level(), 0);
    }

    #[test]
    fn test_result_format_conversion() {
        let format: schemata_core::OutputFormat = ResultFormat::Detailed.into();
        assert_eq!(format, schemata_core::OutputFormat::Detailed);
    }
}
