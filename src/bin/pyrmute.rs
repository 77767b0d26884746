//! Binary entry point for the pyrmute CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Rewrite one tree, emitting the rewritten tree as JSON
//! pyrmute rewrite unit.json
//!
//! # Rewrite every tree under a directory, emitting source and a debug dump
//! pyrmute rewrite trees/ --format source --dump
//!
//! # Print a tree as source
//! pyrmute render unit.json
//!
//! # Rewrite and execute a tree, reporting the final bindings
//! pyrmute exec unit.json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use pyrmute::cli::{run_exec, run_render, run_rewrite, OutputFormat};
use pyrmute::error::PyrmuteError;
use pyrmute::output::{emit_response, ErrorResponse};
use pyrmute::Config;

// ============================================================================
// CLI Structure
// ============================================================================

/// Rewrite mutation-style code into code that evolves persistent values.
#[derive(Parser, Debug)]
#[command(name = "pyrmute", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: pyrmute.toml in the current directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite JSON trees.
    Rewrite {
        /// Tree files, or directories to search for `*.json`.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Emit the rewritten tree or its rendered source.
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Write `<stem>-dump.py` beside each input.
        #[arg(long)]
        dump: bool,
    },

    /// Print a JSON tree as source.
    Render {
        path: PathBuf,
    },

    /// Execute a JSON tree with the evaluator.
    Exec {
        path: PathBuf,

        /// Run the tree as given instead of its rewrite.
        #[arg(long)]
        no_rewrite: bool,
    },
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Errors go to stdout as JSON, like every other response.
            let response = ErrorResponse::from_error(&err);
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();
            ExitCode::from(err.error_code().code())
        }
    }
}

/// Initialize tracing subscriber. `RUST_LOG` overrides `--log-level`.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_config(global: &GlobalArgs) -> Result<Config, PyrmuteError> {
    let config = match &global.config {
        Some(path) => {
            if !path.exists() {
                return Err(PyrmuteError::file_not_found(path));
            }
            Config::load(path)?
        }
        None => {
            let cwd = std::env::current_dir().map_err(|e| PyrmuteError::Internal {
                message: format!("cannot read current directory: {}", e),
            })?;
            Config::load_from_dir(&cwd)?
        }
    };
    Ok(config)
}

fn execute(cli: Cli) -> Result<(), PyrmuteError> {
    let mut stdout = io::stdout();
    let emitted = match cli.command {
        Command::Rewrite {
            paths,
            format,
            dump,
        } => {
            let config = load_config(&cli.global)?;
            let response = run_rewrite(&paths, &config, format, dump)?;
            emit_response(&response, &mut stdout)
        }
        Command::Render { path } => {
            let source = run_render(&path)?;
            stdout.write_all(source.as_bytes())
        }
        Command::Exec { path, no_rewrite } => {
            let config = load_config(&cli.global)?;
            let response = run_exec(&path, &config, !no_rewrite)?;
            emit_response(&response, &mut stdout)
        }
    };
    emitted.map_err(|e| PyrmuteError::Internal {
        message: format!("failed to write output: {}", e),
    })
}
