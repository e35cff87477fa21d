use std::{
    error::Error,
    fs::OpenOptions,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Mutex,
};

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, prelude::*};

use crate::core::{
    flag::{self, SLOT_COUNT},
    manifest::Manifest,
    session::SystemClipboard,
};

mod core;
mod tui;

#[derive(Parser)]
#[command(
    name = "dark-flag-ctf",
    about = "Crypto CTF: an educational cryptography playground",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Challenge manifest (JSON)
    #[arg(long, env = "DARK_FLAG_MANIFEST", default_value = "manifest.json")]
    manifest: PathBuf,

    /// Directory holding the downloadable challenge files
    #[arg(long, env = "DARK_FLAG_CHALLENGES_DIR", default_value = "challenges")]
    challenges_dir: PathBuf,

    /// Write logs to this file
    #[arg(long, env = "DARK_FLAG_LOG")]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the master flag from four flags without starting the UI
    Assemble {
        #[arg(num_args = SLOT_COUNT, value_name = "FLAG", required = true)]
        flags: Vec<String>,
    },
    /// Print the challenges in the manifest
    List {
        /// Leave out decoy challenges
        #[arg(long)]
        real_only: bool,
    },
}

fn setup_tracing(
    log_file: Option<&Path>,
    verbose: bool,
    interactive: bool,
) -> Result<(), Box<dyn Error>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if verbose {
                EnvFilter::new("dark_flag_ctf=debug")
            } else {
                EnvFilter::new("dark_flag_ctf=info")
            }
        })
    };

    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(true);

        tracing_subscriber::registry()
            .with(filter())
            .with(file_layer)
            .init();
        info!(path = %path.display(), "tracing initialized");
        return Ok(());
    }

    // the ui owns the terminal, so without a log file it runs silent
    if !interactive {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(if verbose {
                tracing::Level::DEBUG
            } else {
                tracing::Level::WARN
            })
            .with_target(false)
            .init();
    }

    Ok(())
}

fn run_assemble(flags: Vec<String>) -> Result<ExitCode, Box<dyn Error>> {
    let flags: [String; SLOT_COUNT] = flags
        .try_into()
        .map_err(|_| format!("expected exactly {SLOT_COUNT} flags"))?;

    match flag::assemble(&flags) {
        Ok(master) => {
            println!("{master}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_list(manifest: &Path, real_only: bool) -> Result<ExitCode, Box<dyn Error>> {
    let manifest = Manifest::load(manifest)?;
    let challenges: Vec<_> = if real_only {
        manifest.real_challenges().collect()
    } else {
        manifest.challenges.iter().collect()
    };
    for challenge in challenges {
        println!(
            "{}\t{}\t{}\t{}",
            challenge.id,
            challenge.title,
            challenge.difficulty.label(),
            challenge.points
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn run_ui(manifest: &Path, challenges_dir: PathBuf) -> Result<ExitCode, Box<dyn Error>> {
    let manifest = Manifest::load(manifest);
    if let Err(e) = &manifest {
        warn!("{e}");
    }

    let mut app = tui::App::new(manifest, challenges_dir, Box::new(SystemClipboard));
    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result?;

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();
    setup_tracing(cli.log_file.as_deref(), cli.verbose, cli.command.is_none())?;

    match cli.command {
        Some(Commands::Assemble { flags }) => run_assemble(flags),
        Some(Commands::List { real_only }) => run_list(&cli.manifest, real_only),
        None => run_ui(&cli.manifest, cli.challenges_dir),
    }
}
