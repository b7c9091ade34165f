use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod auto_sync;
mod commands;
mod config;

use app::App;
use auto_sync::try_auto_sync;
use commands::{ConfigCommand, DayCommand, NoteCommand, SyncCommand, TodoCommand, WeekCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "daybook")]
#[command(version)]
#[command(about = "To-dos and day notes, synced through a GitHub Gist", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Gist to sync with (remembered for later runs)
    #[arg(long, global = true, value_name = "ID")]
    gist: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage to-dos
    Todo(TodoCommand),

    /// Manage day notes
    Note(NoteCommand),

    /// Show a day
    Day(DayCommand),

    /// Show a week
    Week(WeekCommand),

    /// Sync with a GitHub Gist
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daybook=warn,daybook_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for init command
    let cli_config_path = cli.config.clone();

    let config = Config::load(cli.config)?.with_gist_override(cli.gist);

    let command = match cli.command {
        Some(Commands::Config(cmd)) => return cmd.run(&config, cli_config_path),
        Some(command) => command,
        None => {
            println!("Use --help to see available commands");
            return Ok(());
        }
    };

    let app = App::open(config)?;

    // Fill an empty store from the gist and apply seed notes before showing data
    if reads_journal(&command) {
        app.prepare().await;
    }

    let result = execute_command(&command, &app).await;

    // Auto-sync AFTER write commands (only if command succeeded)
    if result.is_ok() && is_write_command(&command) {
        try_auto_sync(&app).await;
    }

    result
}

async fn execute_command(
    command: &Commands,
    app: &App,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Todo(cmd) => cmd.run(&app.journal)?,
        Commands::Note(cmd) => cmd.run(&app.journal)?,
        Commands::Day(cmd) => cmd.run(&app.journal, &app.calendar)?,
        Commands::Week(cmd) => cmd.run(&app.journal, &app.calendar)?,
        Commands::Sync(cmd) => cmd.run(app).await?,
        Commands::Config(_) => {}
    }

    Ok(())
}

/// Returns true if the command shows or edits journal data.
fn reads_journal(cmd: &Commands) -> bool {
    matches!(
        cmd,
        Commands::Todo(_) | Commands::Note(_) | Commands::Day(_) | Commands::Week(_)
    )
}

/// Returns true if the command is a write operation that should sync after execution.
fn is_write_command(cmd: &Commands) -> bool {
    match cmd {
        Commands::Todo(t) => t.is_write(),
        Commands::Note(n) => n.is_write(),
        _ => false,
    }
}
