use clap::{Args, Subcommand};
use daybook_core::{Journal, TodoItem};

use super::OutputFormat;

const SHORT_ID_LEN: usize = 8;

#[derive(Args)]
pub struct TodoCommand {
    #[command(subcommand)]
    pub command: TodoSubcommand,
}

#[derive(Subcommand)]
pub enum TodoSubcommand {
    /// Add a to-do at the top of the list
    Add {
        /// Text of the to-do
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List to-dos
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only show to-dos that are not done
        #[arg(long)]
        open: bool,
    },

    /// Mark a to-do as done
    Done {
        /// To-do ID (or a unique prefix of it)
        id: String,
    },

    /// Mark a to-do as not done
    Undo {
        /// To-do ID (or a unique prefix of it)
        id: String,
    },

    /// Remove a to-do
    Remove {
        /// To-do ID (or a unique prefix of it)
        id: String,
    },
}

impl TodoCommand {
    pub fn run(&self, journal: &Journal) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TodoSubcommand::Add { text } => {
                let item = journal.add_todo(&text.join(" "))?;
                println!("Added to-do: {}", item.text);
                println!("  ID: {}", short_id(&item));
            }
            TodoSubcommand::List { format, open } => {
                let todos: Vec<TodoItem> = journal
                    .todos()
                    .into_iter()
                    .filter(|t| !*open || !t.done)
                    .collect();
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&todos)?);
                    }
                    OutputFormat::Text => print_todos(&todos),
                }
            }
            TodoSubcommand::Done { id } => {
                let item = journal.set_done(id, true)?;
                println!("Done: {}", item.text);
            }
            TodoSubcommand::Undo { id } => {
                let item = journal.set_done(id, false)?;
                println!("Reopened: {}", item.text);
            }
            TodoSubcommand::Remove { id } => {
                let item = journal.remove_todo(id)?;
                println!("Removed: {}", item.text);
            }
        }
        Ok(())
    }

    pub fn is_write(&self) -> bool {
        !matches!(self.command, TodoSubcommand::List { .. })
    }
}

pub fn print_todos(todos: &[TodoItem]) {
    if todos.is_empty() {
        println!("No to-dos.");
        return;
    }
    for item in todos {
        println!("  {:<8}  {}", short_id(item), item);
    }
    let open = todos.iter().filter(|t| !t.done).count();
    println!("\nTotal: {} to-do(s), {} open", todos.len(), open);
}

fn short_id(item: &TodoItem) -> &str {
    item.id
        .char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(item.id.as_str(), |(idx, _)| &item.id[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        let item = TodoItem::new("x").with_id("0123456789abcdef");
        assert_eq!(short_id(&item), "01234567");

        let item = TodoItem::new("x").with_id("abc");
        assert_eq!(short_id(&item), "abc");
    }
}
