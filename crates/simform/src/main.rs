//! Simform - schema-driven configuration forms
//!
//! Single binary with subcommands:
//! - `simform check <schema>` - resolve a schema and list models and views
//! - `simform edit --set model.field=value --commit` - run edits headlessly
//! - `simform config` - show paths and settings

use clap::{Parser, Subcommand};
use simform::config::logs_dir;
use simform_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "simform", about = "Schema-driven configuration forms")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a schema document and show its models, views and types
    Check {
        /// Schema document (JSON)
        schema: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply field edits to loaded models, then commit or cancel them
    Edit {
        /// Schema document (defaults to `schema` in config.toml)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Model data file (defaults to `models` in config.toml)
        #[arg(short, long)]
        models: Option<PathBuf>,

        /// Field edit as model.field=value (repeatable)
        #[arg(long = "set", value_name = "MODEL.FIELD=VALUE")]
        set: Vec<String>,

        /// Commit every edited model
        #[arg(long, conflicts_with = "cancel")]
        commit: bool,

        /// Discard edits for every edited model
        #[arg(long)]
        cancel: bool,

        /// Write committed models to this file as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration paths and settings
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Check { json, .. } => *json,
        Commands::Edit { json, .. } => *json,
        Commands::Config { json } => *json,
    }
}

fn run_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Check { schema, json } => cli::check::run(cli::check::CheckArgs { schema, json }),
        Commands::Edit {
            schema,
            models,
            set,
            commit,
            cancel,
            output,
            json,
        } => cli::edit::run(cli::edit::EditArgs {
            schema,
            models,
            set,
            commit,
            cancel,
            output,
            json,
        }),
        Commands::Config { json } => cli::config::run(cli::config::ConfigArgs { json }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = command_wants_json(&cli.command);

    let log_dir = logs_dir();
    let _log_guard = match init_logging(LogConfig {
        app_name: "simform",
        log_dir: &log_dir,
        verbose: cli.verbose,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: {:#}", err);
            None
        }
    };

    match run_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
