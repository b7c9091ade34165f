//! Sync CLI commands for the GitHub Gist.

use clap::{Args, Subcommand};
use daybook_core::sync::{ErrorKind, SkipReason, SyncOutcome, SyncState, SyncTiming};
use daybook_core::{SyncError, SyncEvent};
use std::io::BufRead;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;

use super::todo::print_todos;
use crate::app::App;

/// Sync with a GitHub Gist
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: SyncSubcommand,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Fetch the gist and merge it into local data
    Pull,

    /// Upload local data to the gist (creates a private gist if none is set)
    Push {
        /// Read the GitHub token from the first line of stdin
        #[arg(long)]
        token_stdin: bool,
    },

    /// Show sync target, token and recent activity
    Status,

    /// Show or set the gist to sync with
    Target {
        /// Gist ID to use from now on
        id: Option<String>,
    },

    /// Show whether a GitHub token is available to this run
    Token,

    /// Keep syncing in the foreground, taking edits from stdin
    Watch {
        /// Read the GitHub token from the first line of stdin
        #[arg(long)]
        token_stdin: bool,
    },
}

impl SyncCommand {
    pub async fn run(&self, app: &App) -> Result<(), SyncCommandError> {
        match &self.command {
            SyncSubcommand::Pull => self.pull(app).await,
            SyncSubcommand::Push { token_stdin } => {
                if *token_stdin {
                    let mut token = String::new();
                    std::io::stdin().lock().read_line(&mut token)?;
                    app.engine.set_credential(&token);
                }
                self.push(app).await
            }
            SyncSubcommand::Status => {
                self.status(app);
                Ok(())
            }
            SyncSubcommand::Target { id } => self.target(app, id.as_deref()),
            SyncSubcommand::Token => {
                self.token(app);
                Ok(())
            }
            SyncSubcommand::Watch { token_stdin } => self.watch(app, *token_stdin).await,
        }
    }

    async fn pull(&self, app: &App) -> Result<(), SyncCommandError> {
        println!("Pulling from GitHub...");
        match app.engine.pull(false).await? {
            SyncOutcome::Pulled { todos, notes } => {
                println!("✓ Pulled: {} to-do(s), {} note(s) updated", todos, notes);
            }
            SyncOutcome::Skipped(reason) => println!("{}", skip_message(reason)),
            SyncOutcome::Pushed { .. } => {}
        }
        Ok(())
    }

    async fn push(&self, app: &App) -> Result<(), SyncCommandError> {
        println!("Pushing to GitHub...");
        match app.engine.push(false).await? {
            SyncOutcome::Pushed { doc_id, created } => {
                if created {
                    println!("✓ Created private gist {}", doc_id);
                    println!("  Use 'daybook --gist {}' on other devices.", doc_id);
                } else {
                    println!("✓ Pushed to gist {}", doc_id);
                }
            }
            SyncOutcome::Skipped(reason) => println!("{}", skip_message(reason)),
            SyncOutcome::Pulled { .. } => {}
        }
        Ok(())
    }

    fn status(&self, app: &App) {
        let status = app.engine.status();

        println!("Sync Configuration");
        println!("==================");
        println!();

        match (&status.target, status.target_source) {
            (Some(id), Some(source)) => println!("Target:    {} ({})", id, source),
            (Some(id), None) => println!("Target:    {}", id),
            (None, _) => println!("Target:    not set"),
        }
        println!(
            "Token:     {}",
            if status.has_credential {
                "present (this run only)"
            } else {
                "not set"
            }
        );
        println!(
            "Auto-sync: {}",
            if app.config.sync.auto_sync {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!("API:       {}", app.config.sync.api_url);
        println!("File:      {}", app.config.sync.file_name);
        println!();

        println!("Data dir:  {}", app.config.data_dir.value.display());
        println!(
            "Local:     {} to-do(s), {} note(s)",
            app.store.load_todos().len(),
            app.store.list_note_keys().len()
        );
        println!("State:     {}", state_name(status.state));
        if let Some(at) = status.last_pull_at {
            println!("Last pull: {}", at.to_rfc3339());
        }
        if let Some(at) = status.last_push_at {
            println!("Last push: {}", at.to_rfc3339());
        }
        if let Some(err) = &status.last_error {
            println!("Last error: {}", err);
        }

        if status.target.is_none() {
            println!();
            println!("To enable sync, either:");
            println!("  daybook sync target <GIST_ID>");
            println!("  DAYBOOK_GITHUB_TOKEN=... daybook sync push   (creates a private gist)");
        }
    }

    fn target(&self, app: &App, id: Option<&str>) -> Result<(), SyncCommandError> {
        let Some(id) = id else {
            match app.engine.target_id() {
                Some(current) => println!("{}", current),
                None => println!("No sync target set"),
            }
            return Ok(());
        };

        let id = id.trim();
        if id.is_empty() {
            return Err(SyncCommandError::InvalidTarget);
        }
        if !app.engine.set_target(id) {
            eprintln!("Warning: could not save the target; it applies to this run only");
        }
        println!("Sync target set to {}", id);
        Ok(())
    }

    fn token(&self, app: &App) {
        match app.config.token.as_deref().filter(|_| app.engine.has_credential()) {
            Some(token) => {
                println!("Token: {} (from DAYBOOK_GITHUB_TOKEN)", mask_token(token));
                println!("It is kept in memory for this run and never written to disk.");
            }
            None => {
                println!("Token: not set");
                println!();
                println!("Pushing needs a GitHub token with the 'gist' scope. Provide it with:");
                println!("  DAYBOOK_GITHUB_TOKEN=<token> daybook sync push");
                println!("  daybook sync push --token-stdin");
            }
        }
    }

    async fn watch(&self, app: &App, token_stdin: bool) -> Result<(), SyncCommandError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        if token_stdin {
            let token = lines.next_line().await?.unwrap_or_default();
            app.engine.set_credential(&token);
        }

        print_watch_banner(app, app.engine.timing());

        let (stop, stopped) = oneshot::channel::<()>();
        let runner = tokio::spawn({
            let engine = app.engine.clone();
            let events = app.events.subscribe();
            async move {
                engine
                    .run(events, async {
                        let _ = stopped.await;
                    })
                    .await
            }
        });
        app.events.emit(SyncEvent::Resumed);

        let mut stdin_open = true;
        let mut edited = false;
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                line = lines.next_line(), if stdin_open => match line? {
                    Some(line) => match handle_line(app, line.trim()) {
                        LineResult::Continue => {}
                        LineResult::Edited => edited = true,
                        LineResult::Quit => break,
                    },
                    None => stdin_open = false,
                },
            }
        }

        let _ = stop.send(());
        runner
            .await
            .map_err(|e| SyncCommandError::RuntimeError(e.to_string()))?;

        if edited {
            // The debounced push may not have fired yet.
            if let Some(SyncOutcome::Pushed { doc_id, .. }) = app.engine.auto_push().await {
                println!("✓ Pushed to gist {}", doc_id);
            }
        }
        println!("Stopped watching.");
        Ok(())
    }
}

enum LineResult {
    Continue,
    Edited,
    Quit,
}

fn handle_line(app: &App, line: &str) -> LineResult {
    let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let journal = &app.journal;

    let result = match cmd {
        "" => return LineResult::Continue,
        "quit" | "exit" => return LineResult::Quit,
        "help" => {
            println!("  add <text>     add a to-do");
            println!("  done <id>      mark a to-do done");
            println!("  undo <id>      mark a to-do open");
            println!("  remove <id>    remove a to-do");
            println!("  note <text>    replace today's note");
            println!("  list           list to-dos");
            println!("  pull           pull now (if not too soon)");
            println!("  quit           stop watching");
            return LineResult::Continue;
        }
        "list" => {
            print_todos(&journal.todos());
            return LineResult::Continue;
        }
        "pull" => {
            app.events.emit(SyncEvent::Resumed);
            return LineResult::Continue;
        }
        "add" => journal.add_todo(rest).map(|t| format!("Added: {}", t.text)),
        "done" => journal.set_done(rest, true).map(|t| format!("Done: {}", t.text)),
        "undo" => journal.set_done(rest, false).map(|t| format!("Reopened: {}", t.text)),
        "remove" => journal.remove_todo(rest).map(|t| format!("Removed: {}", t.text)),
        "note" => {
            let today = chrono::Local::now().date_naive();
            journal
                .set_note(today, rest)
                .map(|()| format!("Saved note for {}", today))
        }
        other => {
            println!("Unknown command '{}'. Type 'help'.", other);
            return LineResult::Continue;
        }
    };

    match result {
        Ok(message) => {
            println!("{}", message);
            LineResult::Edited
        }
        Err(e) => {
            println!("Error: {}", e);
            LineResult::Continue
        }
    }
}

fn print_watch_banner(app: &App, timing: SyncTiming) {
    match app.engine.target_id() {
        Some(id) => println!("Watching gist {}", id),
        None => println!("No sync target set; edits stay local until one is set"),
    }
    if !app.engine.has_credential() {
        println!("No token: changes will not be pushed");
    }
    println!(
        "Pulling every {}s when idle, pushing {}ms after the last edit.",
        timing.pull_interval.as_secs(),
        timing.debounce.as_millis()
    );
    println!("Type 'help' for commands, Ctrl-C to stop.");
}

fn skip_message(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::NoTarget => {
            "No sync target yet. Set one with 'daybook sync target <ID>' or push to create a gist."
        }
        SkipReason::NoCredential => "A GitHub token is required to push.",
        SkipReason::InvalidDocument => "The gist does not contain a daybook sync file.",
        SkipReason::InFlight => "A sync is already running.",
    }
}

fn state_name(state: SyncState) -> &'static str {
    match state {
        SyncState::Idle => "idle",
        SyncState::Pulling => "pulling",
        SyncState::Pushing => "pushing",
    }
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    SyncError(SyncError),
    IoError(std::io::Error),
    InvalidTarget,
    RuntimeError(String),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::SyncError(e) if e.kind() == ErrorKind::Credential => write!(
                f,
                "{}. Set DAYBOOK_GITHUB_TOKEN or pass --token-stdin.",
                e
            ),
            SyncCommandError::SyncError(e) => write!(f, "{}", e),
            SyncCommandError::IoError(e) => write!(f, "I/O error: {}", e),
            SyncCommandError::InvalidTarget => write!(f, "Gist ID cannot be empty"),
            SyncCommandError::RuntimeError(e) => write!(f, "Runtime error: {}", e),
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::SyncError(e) => Some(e),
            SyncCommandError::IoError(e) => Some(e),
            SyncCommandError::InvalidTarget | SyncCommandError::RuntimeError(_) => None,
        }
    }
}

impl From<SyncError> for SyncCommandError {
    fn from(e: SyncError) -> Self {
        SyncCommandError::SyncError(e)
    }
}

impl From<std::io::Error> for SyncCommandError {
    fn from(e: std::io::Error) -> Self {
        SyncCommandError::IoError(e)
    }
}
