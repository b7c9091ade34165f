//! Configured calendar events and week helpers.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::note::parse_iso_date;

/// Highlight applied to a day that carries events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStyle {
    Vacation,
    Blue,
    Red,
}

/// Color used to paint a day, derived from the styles of its events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayColor {
    Green,
    Blue,
    Red,
}

/// An event as written in the config file.
///
/// Either `date` for a single day or `start`/`end` for a range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// A validated event spanning `start..=end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub text: String,
    pub style: Option<EventStyle>,
}

impl CalendarEvent {
    /// Validates a config entry.
    ///
    /// `start` falls back to `date`, `end` to `start`. Reversed ranges are
    /// swapped. Returns `None` for blank text or malformed dates. Unknown
    /// styles are treated as unstyled.
    pub fn normalize(entry: &EventEntry) -> Option<Self> {
        let non_blank = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let date = non_blank(&entry.date);
        let start = non_blank(&entry.start).or_else(|| date.clone())?;
        let end = non_blank(&entry.end).unwrap_or_else(|| start.clone());

        let text = entry.text.trim();
        if text.is_empty() {
            return None;
        }

        let a = parse_iso_date(&start).ok()?;
        let b = parse_iso_date(&end).ok()?;
        let (start, end) = if a <= b { (a, b) } else { (b, a) };

        let style = match entry.style.as_deref().map(str::trim) {
            Some("vacation") => Some(EventStyle::Vacation),
            Some("blue") => Some(EventStyle::Blue),
            Some("red") => Some(EventStyle::Red),
            _ => None,
        };

        Some(Self {
            start,
            end,
            text: text.to_string(),
            style,
        })
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Normalizes every configured entry, dropping invalid ones.
pub fn normalize_all(entries: &[EventEntry]) -> Vec<CalendarEvent> {
    entries.iter().filter_map(CalendarEvent::normalize).collect()
}

/// Events that cover `date`, in config order.
pub fn events_for_date(events: &[CalendarEvent], date: NaiveDate) -> Vec<&CalendarEvent> {
    events.iter().filter(|e| e.covers(date)).collect()
}

/// Vacation wins over blue, blue over red.
pub fn primary_color(events: &[&CalendarEvent]) -> Option<DayColor> {
    let has = |style| events.iter().any(|e| e.style == Some(style));
    if has(EventStyle::Vacation) {
        Some(DayColor::Green)
    } else if has(EventStyle::Blue) {
        Some(DayColor::Blue)
    } else if has(EventStyle::Red) {
        Some(DayColor::Red)
    } else {
        None
    }
}

/// Joins event texts with newlines.
pub fn text_for(events: &[&CalendarEvent]) -> String {
    events
        .iter()
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The Sunday-to-Saturday week containing `date`.
pub fn week_of(date: NaiveDate) -> [NaiveDate; 7] {
    let offset = date.weekday().num_days_from_sunday() as i64;
    let start = date - Duration::days(offset);
    std::array::from_fn(|i| start + Duration::days(i as i64))
}
