//! Command-line surface for the pointnotes store.
//!
//! # Responsibility
//! - Map subcommands onto state controller actions.
//! - Print results for humans, or the state snapshot as JSON.

use clap::{Parser, Subcommand};
use pointnotes_core::{
    AddOutcome, ControllerError, FileKeyValueStore, SqliteNoteRepository, StateController,
    StoreConfig,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pointnotes")]
#[command(about = "Local note list with a points counter", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the notes database and points file
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Key namespace for the points counter
    #[arg(long)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a note (no-op when the same text already exists)
    Add { text: String },

    /// Delete every note with exactly this text
    Delete { text: String },

    /// List notes in insertion order
    List {
        /// Print notes and points as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the points counter
    Points,
}

#[derive(Debug)]
enum CliError {
    Controller(ControllerError),
    Encode(serde_json::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Controller(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode state: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Controller(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<ControllerError> for CliError {
    fn from(value: ControllerError) -> Self {
        Self::Controller(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut controller = open_controller(cli.data_dir, cli.namespace)?;

    match cli.command {
        Commands::Add { text } => match controller.add_note(&text)? {
            AddOutcome::Added => println!("Added. points = {}", controller.points()),
            AddOutcome::Duplicate => println!("Already listed. points = {}", controller.points()),
        },
        Commands::Delete { text } => {
            let outcome = controller.delete_note(&text)?;
            println!(
                "Removed {} note(s). points = {}",
                outcome.removed_in_memory,
                controller.points()
            );
        }
        Commands::List { json } => {
            if json {
                println!("{}", serde_json::to_string(&controller.snapshot())?);
            } else if controller.notes().is_empty() {
                println!("No notes.");
            } else {
                for note in controller.notes() {
                    println!("- {note}");
                }
            }
        }
        Commands::Points => println!("{}", controller.points()),
    }

    Ok(())
}

fn open_controller(
    data_dir: Option<PathBuf>,
    namespace: Option<String>,
) -> Result<StateController<SqliteNoteRepository, FileKeyValueStore>, ControllerError> {
    let mut config = StoreConfig::from_env();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if let Some(namespace) = namespace {
        config = config.with_namespace(namespace);
    }

    let mut controller = StateController::open(&config)?;
    controller.load()?;
    Ok(controller)
}
