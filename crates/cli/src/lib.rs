pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::commands::ask::AskArgs;

#[derive(Debug, Parser)]
#[command(
    name = "penny",
    about = "Penny procurement assistant CLI",
    long_about = "Ask procurement questions, manage the purchase-order collection, and inspect runtime readiness.",
    after_help = "Examples:\n  penny ask \"which department spends the most?\"\n  penny ask \"orders placed\" --start-date 2013-07-01 --end-date 2013-09-30\n  penny seed\n  penny doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Classify a question and run the matching procurement query")]
    Ask {
        #[arg(help = "Question text", required_unless_present = "audio", conflicts_with = "audio")]
        text: Option<String>,
        #[arg(long, help = "Audio clip to transcribe instead of passing text")]
        audio: Option<PathBuf>,
        #[arg(long, help = "Start date (YYYY-MM-DD) for date-range questions")]
        start_date: Option<NaiveDate>,
        #[arg(long, help = "End date (YYYY-MM-DD) for date-range questions")]
        end_date: Option<NaiveDate>,
        #[arg(long, help = "Department name for department item questions")]
        department: Option<String>,
    },
    #[command(about = "List the intent catalog in classifier order")]
    Intents,
    #[command(about = "Show frequently asked questions")]
    Faq,
    #[command(about = "Create the procurement collection and its indexes if missing")]
    Migrate,
    #[command(about = "Load the deterministic demo dataset into an empty collection")]
    Seed {
        #[arg(long, help = "Append demo rows even when the collection already has data")]
        force: bool,
    },
    #[command(about = "Import procurement records from a JSON array file")]
    Import {
        #[arg(help = "Path to the JSON file")]
        path: PathBuf,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, classifier settings, and database readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask { text, audio, start_date, end_date, department } => {
            commands::ask::run(AskArgs { text, audio, start_date, end_date, department })
        }
        Command::Intents => commands::intents::run(),
        Command::Faq => commands::faq::run(),
        Command::Migrate => commands::migrate::run(),
        Command::Seed { force } => commands::seed::run(force),
        Command::Import { path } => commands::import::run(&path),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
