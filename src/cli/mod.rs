//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Ordered, parallel and parameterized test runner
#[derive(Parser, Debug)]
#[command(name = "lambda-testkit")]
#[command(version)]
#[command(about = "Run the built-in test suites with first/last ordering and parameters")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run test suites
    Run(RunArgs),

    /// List available suites
    List(ListArgs),

    /// Manage configuration files
    Config(ConfigArgs),

    /// Show supported environment variables
    Env,
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suites to run (repeatable); all suites when omitted
    #[arg(short, long)]
    pub suite: Vec<String>,

    /// Force parallel execution of normal tests
    #[arg(short, long, conflicts_with = "sequential")]
    pub parallel: bool,

    /// Force sequential execution of normal tests
    #[arg(long)]
    pub sequential: bool,

    /// Only run test methods whose name contains this keyword
    #[arg(long)]
    pub filter: Option<String>,

    /// Sort normal tests alphabetically
    #[arg(long)]
    pub sorted: bool,

    /// Maximum concurrent tests (when parallel)
    #[arg(short, long)]
    pub concurrent: Option<usize>,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long, default_value = "table")]
    pub format: String,

    /// Configuration file
    #[arg(long)]
    pub config: Option<String>,

    /// Save results to file
    #[arg(short, long)]
    pub output: Option<String>,
}

impl RunArgs {
    /// Explicit parallelism from the flags, if any.
    pub fn parallel_override(&self) -> Option<bool> {
        match (self.parallel, self.sequential) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show test methods of each suite
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "./lambda-testkit.yaml")]
        output: String,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment overrides instead
        #[arg(short, long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate; the discovered file when omitted
        file: Option<String>,
    },
}
