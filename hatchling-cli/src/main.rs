//! Hatchling CLI
//!
//! Bootstraps a migration project, generates table schemas and runs the demo
//! posts server.

use clap::{Parser, Subcommand};
use colored::Colorize;
use hatchling::migration::{DEFAULT_LOCATION, DEFAULT_PROJECT_FILE, DEFAULT_SRC_FOLDER};
use hatchling::Settings;
use hatchling_cli::commands::{self, Workspace};
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "hatchling")]
#[command(about = "Project bootstrap and schema tool for hatchling applications")]
#[command(version = "0.1.0")]
struct Cli {
    /// Project file
    #[arg(long, default_value = DEFAULT_PROJECT_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Init config file and generate root migrate location
    Init {
        /// Migrate store location
        #[arg(long, default_value = DEFAULT_LOCATION)]
        location: String,

        /// Folder of the source, relative to the project root
        #[arg(short, long, default_value = DEFAULT_SRC_FOLDER)]
        src_folder: String,
    },

    /// Create the app migrate location and generate schemas
    InitDb,

    /// Print and apply CREATE TABLE statements for the registered models
    GenerateSchemas,

    /// Run the demo posts application
    Serve {
        /// Listen address (defaults to the configured server address)
        #[arg(long)]
        addr: Option<String>,

        /// Number of demo posts to insert
        #[arg(long, default_value = "100")]
        seed: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if let Err(e) = run(cli) {
        eprintln!("{} {e:#}", "Error:".red().bold());
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load()?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Init { location, src_folder } => {
            commands::init(
                &cwd,
                &cli.config,
                &location,
                &src_folder,
                &settings.database.app,
                &mut out,
            )?;
        }
        Commands::InitDb => {
            let workspace = Workspace::open(settings)?;
            commands::init_db(&cwd, &cli.config, &workspace, &mut out)?;
        }
        Commands::GenerateSchemas => {
            let workspace = Workspace::open(settings)?;
            commands::generate_schemas(&cwd, &cli.config, &workspace, &mut out)?;
        }
        Commands::Serve { addr, seed } => {
            drop(out);
            commands::serve(Workspace::open(settings)?, addr, seed)?;
        }
    }
    Ok(())
}
