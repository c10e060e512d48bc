mod commands;
mod output;

use clap::{ArgAction, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "plancheck",
    version,
    about = "QC cross-check of solar plan sets against the engineering project record"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a project record against a plan set
    Check {
        /// Project record export (.csv or .xlsx with Field/Value columns)
        record: PathBuf,

        /// Plan set (.pdf, or .txt with pages separated by form feeds)
        document: PathBuf,

        /// Custom JSON check profile
        #[arg(short, long, value_name = "FILE", conflicts_with = "preset")]
        profile: Option<PathBuf>,

        /// Predefined profile (default: plan-set)
        #[arg(long, value_name = "NAME")]
        preset: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write qc_results.csv and extracted_text.txt into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,

        /// Write a copy of the PDF with mismatched values highlighted
        #[arg(long, value_name = "OUT.pdf")]
        markup: Option<PathBuf>,

        /// Show explanations for matched fields too
        #[arg(long)]
        show_all: bool,
    },
    /// Print the page-indexed text and cover-sheet values of a plan set
    Extract {
        /// Plan set (.pdf or .txt)
        document: PathBuf,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        output: String,
    },
    /// Manage and inspect check profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List predefined profiles
    List,
    /// Show the fields and matching strategies of a predefined profile
    Show {
        /// Preset name (e.g., "plan-set")
        preset: String,
    },
    /// Print the JSON profile schema with field descriptions
    Schema,
    /// Validate a custom profile file
    Validate {
        /// Path to JSON profile
        file: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            record,
            document,
            profile,
            preset,
            output,
            export,
            markup,
            show_all,
        } => commands::check::run(
            &record, &document, profile, preset, &output, export, markup, show_all,
        ),
        Commands::Extract { document, output } => commands::extract::run(&document, &output),
        Commands::Profile { action } => match action {
            ProfileAction::List => commands::profile::list(),
            ProfileAction::Show { preset } => commands::profile::show(&preset),
            ProfileAction::Schema => commands::profile::schema(),
            ProfileAction::Validate { file } => commands::profile::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}
