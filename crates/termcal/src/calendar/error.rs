//! Error types for term configuration and calendar export.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while projecting or exporting calendars.
#[derive(Debug, Error)]
pub enum CalendarError {
    /// Term ends before it starts
    #[error("Term window ends ({end}) before it starts ({start})")]
    InvalidTermWindow { start: NaiveDate, end: NaiveDate },

    /// Configuration file could not be parsed
    #[error("Invalid term configuration: {message}")]
    Config { message: String },

    /// Two semester labels would be written to the same calendar file
    #[error("Semesters {first:?} and {second:?} would both be written to {file_name}")]
    FileNameCollision {
        first: String,
        second: String,
        file_name: String,
    },

    /// Reading configuration or writing a calendar file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CalendarError {
    fn from(err: serde_json::Error) -> Self {
        CalendarError::Config {
            message: err.to_string(),
        }
    }
}
