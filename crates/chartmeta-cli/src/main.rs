//! Chartmeta CLI - Convert chart values to and from flat, typed parameters

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use std::str::FromStr;

mod commands;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "chartmeta")]
#[command(author = "Chartmeta Contributors")]
#[command(version)]
#[command(about = "Convert chart values to and from flat, typed parameters", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract flat parameters from values
    Extract {
        /// Meta info file (YAML or JSON)
        #[arg(short, long)]
        metainfo: PathBuf,

        /// Values file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Set values on command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,
    },

    /// Build nested values from flat parameters
    Construct {
        /// Meta info file (YAML or JSON)
        #[arg(short, long)]
        metainfo: PathBuf,

        /// Parameters file (JSON or YAML)
        #[arg(short, long)]
        params: PathBuf,

        /// Treat parameter values as plain user text instead of JSON
        #[arg(long)]
        user_input: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the meta info with defaults read from values
    Defaults {
        /// Meta info file (YAML or JSON)
        #[arg(short, long)]
        metainfo: PathBuf,

        /// Values file(s) to merge
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Lint a meta info file, and optionally values against it
    Lint {
        /// Meta info file (YAML or JSON)
        #[arg(short, long)]
        metainfo: PathBuf,

        /// Values file(s) to check
        #[arg(short = 'f', long = "values")]
        values: Vec<PathBuf>,

        /// Strict mode - treat values issues as errors
        #[arg(long)]
        strict: bool,
    },

    /// Deep merge values files
    Merge {
        /// Base values file
        base: PathBuf,

        /// Overlay values files, applied in order
        overlays: Vec<PathBuf>,

        /// Set values on command line (key=value)
        #[arg(long = "set")]
        set: Vec<String>,

        /// Remove keys whose overlay value is null
        #[arg(long)]
        delete_null: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(debug: bool) {
    let env = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_str(&env)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(report) = run(cli.command) {
        eprintln!("{:?}", report);
        std::process::exit(error::exit_code_for(&report));
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Extract {
            metainfo,
            values,
            set,
        } => commands::extract::run(&metainfo, &values, &set),

        Commands::Construct {
            metainfo,
            params,
            user_input,
            json,
        } => commands::construct::run(&metainfo, &params, user_input, json),

        Commands::Defaults {
            metainfo,
            values,
            json,
        } => commands::defaults::run(&metainfo, &values, json),

        Commands::Lint {
            metainfo,
            values,
            strict,
        } => commands::lint::run(&metainfo, &values, strict),

        Commands::Merge {
            base,
            overlays,
            set,
            delete_null,
            json,
        } => commands::merge::run(&base, &overlays, &set, delete_null, json),
    }
}
