//! Error types for the schedule table parser.

use thiserror::Error;

/// Errors that can occur while turning a schedule page into class records.
///
/// None of these are recovered from: a single bad row aborts the whole page,
/// since a misread row could attach meetings to the wrong class or semester.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// No text anchor naming a semester was found inside a table
    #[error("Could not locate the schedule table (no Spring/Summer/Fall/Winter label inside a table)")]
    TableNotFound,

    /// Row shape matches neither a class row nor a placeholder
    #[error(
        "Invalid row {row} of {table} (semester: {}, after: {}): {content}",
        .semester.as_deref().unwrap_or("<none>"),
        .previous.as_deref().unwrap_or("<column headings>")
    )]
    MalformedRow {
        row: usize,
        semester: Option<String>,
        /// Start tag of the schedule table
        table: String,
        /// Text of the row before this one
        previous: Option<String>,
        content: String,
    },

    /// A class or placeholder row appeared before any semester header
    #[error("Row {row} does not follow a row that specifies a semester: {content}")]
    MissingSemester { row: usize, content: String },

    /// A well-shaped class row whose contents could not be read
    #[error("Invalid class in row {row}: {source}")]
    InvalidClass {
        row: usize,
        content: String,
        #[source]
        source: Box<ScheduleError>,
    },

    /// Building/room pair is neither a location, "NO ROOM", nor a line break
    #[error("Invalid building or room: {building}, {room}")]
    InvalidLocation { building: String, room: String },

    /// An event cell held markup where text was expected
    #[error("Invalid {column} entry: {content}")]
    InvalidEventCell {
        column: &'static str,
        content: String,
    },

    /// Day token is not a known weekday code
    #[error("Invalid weekday: {token:?}")]
    InvalidWeekday { token: String },

    /// Start/stop text does not follow the 12-hour `H:MMAM` format
    #[error("Invalid time: {text:?}")]
    InvalidTime { text: String },

    /// Stop time is not after start time
    #[error("Meeting stops at {stop} but starts at {start}")]
    InvalidTimeRange { start: String, stop: String },

    /// The five event columns do not have the same number of entries
    #[error(
        "Event columns differ in length (buildings {buildings}, rooms {rooms}, days {days}, starts {starts}, stops {stops})"
    )]
    MismatchedEventColumns {
        buildings: usize,
        rooms: usize,
        days: usize,
        starts: usize,
        stops: usize,
    },
}

impl ScheduleError {
    /// Returns the table row this error was raised for, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            ScheduleError::MalformedRow { row, .. }
            | ScheduleError::MissingSemester { row, .. }
            | ScheduleError::InvalidClass { row, .. } => Some(*row),
            _ => None,
        }
    }
}
