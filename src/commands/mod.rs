mod config_cmd;
mod day;
mod note;
mod sync_cmd;
mod todo;

pub use config_cmd::ConfigCommand;
pub use day::{DayCommand, WeekCommand};
pub use note::NoteCommand;
pub use sync_cmd::SyncCommand;
pub use todo::TodoCommand;

use chrono::{Duration, Local, NaiveDate};
use clap::ValueEnum;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Parses `today`, `yesterday`, `tomorrow` or `YYYY-MM-DD`.
pub fn parse_day(value: &str) -> Result<NaiveDate, String> {
    let today = Local::now().date_naive();
    match value.trim().to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(today - Duration::days(1)),
        "tomorrow" => Ok(today + Duration::days(1)),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", value)),
    }
}

/// Parses an optional day argument, defaulting to today.
pub fn day_or_today(value: Option<&str>) -> Result<NaiveDate, String> {
    value.map_or_else(|| Ok(Local::now().date_naive()), parse_day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day() {
        let today = Local::now().date_naive();
        assert_eq!(parse_day("today").unwrap(), today);
        assert_eq!(parse_day("Yesterday").unwrap(), today - Duration::days(1));
        assert_eq!(
            parse_day("2026-02-09").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 9).unwrap()
        );
        assert!(parse_day("2026-02-30").is_err());
        assert!(parse_day("next week").is_err());
        assert_eq!(day_or_today(None).unwrap(), today);
    }
}
