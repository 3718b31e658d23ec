//! Lambda Testkit - ordered, parallel and parameterized test runner
//!
//! Runs the built-in demonstration suites through the execution engine.
//!
//! ## Usage
//!
//! ```bash
//! # Run every suite
//! lambda-testkit run
//!
//! # Run one suite sequentially, keeping only matching methods
//! lambda-testkit run --suite parameterized --sequential --filter greet
//!
//! # Machine-readable output
//! lambda-testkit run --format json --output results.json
//!
//! # List suites and their methods
//! lambda-testkit list --detailed
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

mod cli;

use cli::Args;
use lambda_testkit::classify::{alphabetical, name_filter};
use lambda_testkit::config::{print_env_help, ConfigFile, EnvConfig, RunnerConfig};
use lambda_testkit::demo::{self, Suite};
use lambda_testkit::executor::TestRunner;
use lambda_testkit::notify::TracingListener;
use lambda_testkit::output::{write_results_to_file, OutputFormat, ResultFormatter};
use lambda_testkit::utils::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        cli::Command::Run(run_args) => {
            run_suites(run_args, args.verbose).await?;
        }
        cli::Command::List(list_args) => {
            list_suites(list_args);
        }
        cli::Command::Config(config_args) => {
            init_logger(log_level(args.verbose, LogLevel::Warn));
            manage_config(config_args)?;
        }
        cli::Command::Env => {
            print_env_help();
            println!();
            EnvConfig::load().print_summary();
        }
    }

    Ok(())
}

fn log_level(verbose: bool, fallback: LogLevel) -> LogLevel {
    if verbose {
        LogLevel::Debug
    } else {
        fallback
    }
}

fn selected_suites(names: &[String]) -> Result<Vec<Suite>> {
    if names.is_empty() {
        return Ok(demo::all());
    }
    names
        .iter()
        .map(|name| {
            demo::find(name).ok_or_else(|| anyhow::anyhow!("Unknown suite: {name}"))
        })
        .collect()
}

async fn run_suites(args: cli::RunArgs, verbose: bool) -> Result<()> {
    let mut config = RunnerConfig::resolve(args.config.as_deref().map(Path::new))?;
    init_logger(log_level(verbose, config.log_level));

    if let Some(concurrent) = args.concurrent {
        config.max_concurrent = concurrent.max(1);
    }

    let format: OutputFormat = args
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let formatter = ResultFormatter::new(format);

    let mut runner = TestRunner::new(config);
    if let Some(keyword) = &args.filter {
        runner = runner.with_filter(name_filter(keyword.as_str()));
    }
    if args.sorted {
        runner = runner.with_sorter(alphabetical());
    }
    if let Some(parallel) = args.parallel_override() {
        runner = runner.with_parallel(parallel);
    }

    let suites = selected_suites(&args.suite)?;
    let classes: Vec<_> = suites.iter().map(Suite::build).collect();
    info!(
        "Running {} suite(s), max {} concurrent",
        classes.len(),
        runner.config().max_concurrent
    );

    let outcomes = runner.run_classes(&classes, Arc::new(TracingListener)).await;

    let mut summaries = Vec::new();
    let mut broken = 0;
    for (class, outcome) in classes.iter().zip(outcomes) {
        match outcome {
            Ok(summary) => {
                println!("{}", formatter.format_summary(&summary));
                summaries.push(summary);
            }
            Err(e) => {
                warn!("Suite {} was not run", class.name());
                println!("✗ {}: {e}", class.name());
                broken += 1;
            }
        }
    }

    if let Some(path) = &args.output {
        write_results_to_file(path, &summaries, format)?;
        println!("\n✓ Results saved to: {path}");
    }

    let failing = summaries.iter().filter(|s| !s.is_all_passed()).count();
    if broken > 0 || failing > 0 {
        anyhow::bail!("{failing} suite(s) had failures, {broken} could not be scheduled");
    }

    Ok(())
}

fn list_suites(args: cli::ListArgs) {
    let suites = demo::all();
    println!("\nAvailable Suites ({} total)\n", suites.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for suite in suites {
        println!("  {:15} {}", suite.name, suite.description);

        if args.detailed {
            let class = suite.build();
            let mode = match class.parallel_marker() {
                Some(true) => "parallel",
                Some(false) => "sequential",
                None => "default",
            };
            println!("  {:15} class {} ({mode})", "", class.name());
            for method in class.methods() {
                let mut tags = Vec::new();
                if method.first {
                    tags.push("first");
                }
                if method.last {
                    tags.push("last");
                }
                if method.ignored {
                    tags.push("ignored");
                }
                if !method.params.is_empty() {
                    tags.push("parameterized");
                }
                if tags.is_empty() {
                    println!("  {:15}   - {}", "", method.name);
                } else {
                    println!("  {:15}   - {} [{}]", "", method.name, tags.join(", "));
                }
            }
            println!();
        }
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::example().save(path)?;
            println!("✓ Configuration file created: {output}");
            println!("\nEdit the file to customize your settings.");
        }

        cli::ConfigAction::Show { env, format } => {
            if env {
                EnvConfig::load().print_summary();
            } else {
                let config = RunnerConfig::resolve(None)?;
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file.unwrap_or_else(|| {
                ConfigFile::find()
                    .map(|p| p.to_string_lossy().to_string())
                    .unwrap_or_else(|| "./lambda-testkit.yaml".to_string())
            });

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("✓ Configuration file is valid: {path}");
                }
                Err(e) => {
                    println!("✗ Configuration file is invalid: {path}");
                    println!("  Error: {e}");
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
