use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use daybook_core::models::calendar::{events_for_date, primary_color, text_for, week_of};
use daybook_core::{CalendarEvent, DayColor, Journal};

use super::day_or_today;
use super::todo::print_todos;

/// Show one day: events, note and (for today) the to-do list
#[derive(Args)]
pub struct DayCommand {
    /// Day (YYYY-MM-DD, today, yesterday, tomorrow), defaults to today
    pub date: Option<String>,
}

impl DayCommand {
    pub fn run(
        &self,
        journal: &Journal,
        calendar: &[CalendarEvent],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let date = day_or_today(self.date.as_deref())?;
        let events = events_for_date(calendar, date);

        let header = date.format("%A %Y-%m-%d").to_string();
        match primary_color(&events) {
            Some(color) => println!("{}  [{}]", header, color_name(color)),
            None => println!("{}", header),
        }
        println!("{}", "=".repeat(header.len()));

        if !events.is_empty() {
            println!("\nEvents:");
            for line in text_for(&events).lines() {
                println!("  {}", line);
            }
        }

        println!("\nNote:");
        match journal.note(date).filter(|n| !n.trim().is_empty()) {
            Some(note) => {
                for line in note.lines() {
                    println!("  {}", line);
                }
            }
            None => println!("  (empty)"),
        }

        if date == Local::now().date_naive() {
            println!("\nTo-dos:");
            print_todos(&journal.todos());
        }

        Ok(())
    }
}

/// Show a Sunday-to-Saturday week with events and notes
#[derive(Args)]
pub struct WeekCommand {
    /// Any day in the week, defaults to today
    pub date: Option<String>,

    /// Weeks to move from that day (negative for earlier weeks)
    #[arg(long, allow_hyphen_values = true, default_value = "0")]
    pub offset: i64,
}

impl WeekCommand {
    pub fn run(
        &self,
        journal: &Journal,
        calendar: &[CalendarEvent],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let anchor = day_or_today(self.date.as_deref())? + Duration::weeks(self.offset);
        let days = week_of(anchor);
        let today = Local::now().date_naive();

        println!("Week of {} to {}", days[0], days[6]);
        println!("{}", "-".repeat(28));
        for date in days {
            println!("{}", week_line(journal, calendar, date, date == today));
        }
        Ok(())
    }
}

fn week_line(
    journal: &Journal,
    calendar: &[CalendarEvent],
    date: NaiveDate,
    is_today: bool,
) -> String {
    let events = events_for_date(calendar, date);
    let marker = if is_today { '>' } else { ' ' };
    let mut line = format!("{} {}", marker, date.format("%a %m-%d"));

    if let Some(color) = primary_color(&events) {
        line.push_str(&format!(" [{}]", color_name(color)));
    }
    let texts = text_for(&events);
    if !texts.is_empty() {
        line.push_str(&format!("  {}", texts.replace('\n', "; ")));
    }
    if let Some(first) = journal
        .note(date)
        .as_deref()
        .and_then(|n| n.lines().map(str::trim).find(|l| !l.is_empty()))
    {
        line.push_str(&format!("  | {}", first));
    }
    line
}

fn color_name(color: DayColor) -> &'static str {
    match color {
        DayColor::Green => "green",
        DayColor::Blue => "blue",
        DayColor::Red => "red",
    }
}
