use clap::{Args, Subcommand};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Initialize configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# daybook configuration

# Where the local store lives (default: platform data dir + /daybook)
# data_dir: ~/.local/share/daybook

sync:
  # Gist to use when none was given with --gist or saved by an earlier run
  # default_gist_id: ""
  # Push after every change made from the command line
  auto_sync: false

# Namespace for day notes
notes_scope:
  owner: me
  repo: journal
  branch: main

# Notes written into days that have none yet
# seed_notes:
#   "2026-02-09": "Lesson at 17:30"

# Highlighted days (style: vacation, blue or red)
# calendar_events:
#   - start: "2026-03-01"
#     end: "2026-03-07"
#     text: Trip
#     style: vacation
"#;

impl ConfigCommand {
    pub fn run(
        &self,
        config: &Config,
        cli_config_path: Option<PathBuf>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => print_config(config),
                }
                Ok(())
            }

            ConfigSubcommand::Init => {
                let config_path = cli_config_path.unwrap_or_else(Config::default_config_path);

                if config_path.exists() {
                    println!("Config file already exists: {}", config_path.display());
                    println!("Use 'daybook config show' to view current configuration.");
                    return Ok(());
                }

                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                let mut file = fs::File::create(&config_path)?;
                file.write_all(DEFAULT_CONFIG.as_bytes())?;

                println!("Created config file: {}", config_path.display());
                println!("\nEdit this file to customize your settings.");
                Ok(())
            }
        }
    }
}

fn print_config(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    if let Some(path) = &config.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        );
    }
    println!();

    println!("data_dir: {}", config.data_dir.value.display());
    println!("  source: {}", config.data_dir.source);
    println!();

    match &config.gist_id {
        Some(gist) => {
            println!("gist_id: {}", gist.value);
            println!("  source: {}", gist.source);
        }
        None => println!("gist_id: (not given for this run)"),
    }
    println!(
        "github token: {}",
        if config.token.is_some() {
            "set (environment)"
        } else {
            "not set"
        }
    );
    println!();

    let sync = &config.sync;
    println!("sync:");
    println!(
        "  default_gist_id: {}",
        sync.default_gist_id.as_deref().unwrap_or("(none)")
    );
    println!("  api_url: {}", sync.api_url);
    println!("  file_name: {}", sync.file_name);
    println!("  auto_sync: {}", sync.auto_sync);
    let timing = sync.timing.to_timing();
    println!(
        "  timing: debounce {}ms, pull every {}ms, quiet {}ms, pull gap {}ms, push gap {}ms",
        timing.debounce.as_millis(),
        timing.pull_interval.as_millis(),
        timing.quiet_after_change.as_millis(),
        timing.min_pull_gap.as_millis(),
        timing.min_push_gap.as_millis()
    );
    println!();

    println!("notes_scope: {}", config.notes_scope);
    println!("seed_notes: {}", config.seed_notes.len());
    println!("calendar_events: {}", config.calendar_events.len());
}
