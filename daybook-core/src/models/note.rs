//! Day notes and their scoped storage keys.
//!
//! A note key looks like `daybook_day_notes_v1:<owner>/<repo>/<branch>:<YYYY-MM-DD>`.
//! The scope lets one local store hold several independent journals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Prefix shared by every note key, including the trailing separator.
pub const NOTES_PREFIX: &str = "daybook_day_notes_v1:";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NoteKeyError {
    #[error("Not a note key: {0}")]
    MissingPrefix(String),

    #[error("Note key has no date: {0}")]
    MissingDate(String),

    #[error("Invalid note date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid note scope '{0}', expected owner/repo/branch")]
    InvalidScope(String),
}

/// Namespace a set of notes belongs to.
///
/// Missing fields deserialize to the defaults (`me/journal/main`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesScope {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl NotesScope {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
        }
    }

    pub fn key_for(&self, date: NaiveDate) -> NoteKey {
        NoteKey {
            scope: self.clone(),
            date,
        }
    }
}

impl Default for NotesScope {
    fn default() -> Self {
        Self::new("me", "journal", "main")
    }
}

impl fmt::Display for NotesScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.owner, self.repo, self.branch)
    }
}

/// Composite key of a single day note.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteKey {
    pub scope: NotesScope,
    pub date: NaiveDate,
}

impl NoteKey {
    /// Parses a storage key back into scope and date.
    ///
    /// The branch may itself contain `/`; owner and repo may not.
    pub fn parse(key: &str) -> Result<Self, NoteKeyError> {
        let rest = key
            .strip_prefix(NOTES_PREFIX)
            .ok_or_else(|| NoteKeyError::MissingPrefix(key.to_string()))?;
        let (scope, date) = rest
            .rsplit_once(':')
            .ok_or_else(|| NoteKeyError::MissingDate(key.to_string()))?;
        let date = parse_iso_date(date)?;

        let mut parts = scope.splitn(3, '/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), Some(branch))
                if !owner.is_empty() && !repo.is_empty() && !branch.is_empty() =>
            {
                Ok(Self {
                    scope: NotesScope::new(owner, repo, branch),
                    date,
                })
            }
            _ => Err(NoteKeyError::InvalidScope(scope.to_string())),
        }
    }

    pub fn is_note_key(key: &str) -> bool {
        key.starts_with(NOTES_PREFIX)
    }
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}:{}",
            NOTES_PREFIX,
            self.scope,
            self.date.format(DATE_FORMAT)
        )
    }
}

/// True for strings shaped exactly like `YYYY-MM-DD`.
pub fn is_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parses a `YYYY-MM-DD` string into a calendar date.
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, NoteKeyError> {
    if !is_iso_date(s) {
        return Err(NoteKeyError::InvalidDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| NoteKeyError::InvalidDate(s.to_string()))
}
