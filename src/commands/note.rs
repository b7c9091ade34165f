use chrono::Duration;
use clap::{Args, Subcommand};
use daybook_core::Journal;
use std::io::Read;

use super::{day_or_today, parse_day, OutputFormat};

#[derive(Args)]
pub struct NoteCommand {
    #[command(subcommand)]
    pub command: NoteSubcommand,
}

#[derive(Subcommand)]
pub enum NoteSubcommand {
    /// Write the note of a day, replacing what was there
    Set {
        /// Day (YYYY-MM-DD, today, yesterday, tomorrow)
        date: String,

        /// Note text; read from stdin when omitted
        text: Vec<String>,
    },

    /// Show the note of a day
    Show {
        /// Day (YYYY-MM-DD, today, yesterday, tomorrow), defaults to today
        date: Option<String>,
    },

    /// List notes in a date range
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Start date, defaults to 7 days before the end date
        #[arg(long)]
        from: Option<String>,

        /// End date, defaults to today
        #[arg(long)]
        to: Option<String>,
    },
}

impl NoteCommand {
    pub fn run(&self, journal: &Journal) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            NoteSubcommand::Set { date, text } => {
                let date = parse_day(date)?;
                let text = if text.is_empty() {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                } else {
                    text.join(" ")
                };
                journal.set_note(date, &text)?;
                if text.trim().is_empty() {
                    println!("Cleared note for {}", date);
                } else {
                    println!("Saved note for {}", date);
                }
            }
            NoteSubcommand::Show { date } => {
                let date = day_or_today(date.as_deref())?;
                match journal.note(date).filter(|n| !n.trim().is_empty()) {
                    Some(note) => println!("{}", note),
                    None => println!("No note for {}", date),
                }
            }
            NoteSubcommand::List { format, from, to } => {
                let to = day_or_today(to.as_deref())?;
                let from = match from {
                    Some(d) => parse_day(d)?,
                    None => to - Duration::days(7),
                };
                let notes = journal.notes_between(from, to);

                match format {
                    OutputFormat::Json => {
                        let map: serde_json::Map<String, serde_json::Value> = notes
                            .into_iter()
                            .map(|(date, text)| (date.to_string(), text.into()))
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&map)?);
                    }
                    OutputFormat::Text => {
                        if notes.is_empty() {
                            println!("No notes found for {} to {}", from, to);
                            return Ok(());
                        }
                        for (i, (date, text)) in notes.iter().enumerate() {
                            if i > 0 {
                                println!();
                            }
                            println!("{}", date);
                            println!("{}", "-".repeat(10));
                            for line in text.lines() {
                                println!("  {}", line);
                            }
                        }
                        println!("\nTotal: {} note(s)", notes.len());
                    }
                }
            }
        }
        Ok(())
    }

    pub fn is_write(&self) -> bool {
        matches!(self.command, NoteSubcommand::Set { .. })
    }
}
