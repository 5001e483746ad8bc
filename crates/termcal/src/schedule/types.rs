/// Types for parsed schedule data
use chrono::NaiveTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day of the week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "MO")]
    Monday,
    #[serde(rename = "TU")]
    Tuesday,
    #[serde(rename = "WE")]
    Wednesday,
    #[serde(rename = "TH")]
    Thursday,
    #[serde(rename = "FR")]
    Friday,
    #[serde(rename = "SA")]
    Saturday,
    #[serde(rename = "SU")]
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Position in the week, Monday = 0.
    pub fn index(self) -> u32 {
        match self {
            Weekday::Monday => 0,
            Weekday::Tuesday => 1,
            Weekday::Wednesday => 2,
            Weekday::Thursday => 3,
            Weekday::Friday => 4,
            Weekday::Saturday => 5,
            Weekday::Sunday => 6,
        }
    }

    /// Two-letter code used both by the schedule page and by RRULE `BYDAY`.
    pub fn code(self) -> &'static str {
        match self {
            Weekday::Monday => "MO",
            Weekday::Tuesday => "TU",
            Weekday::Wednesday => "WE",
            Weekday::Thursday => "TH",
            Weekday::Friday => "FR",
            Weekday::Saturday => "SA",
            Weekday::Sunday => "SU",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Weekday::ALL[day.num_days_from_monday() as usize]
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Weekday::ALL
            .into_iter()
            .find(|day| day.code() == code)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A campus building, keyed by its abbreviation (e.g. "CAS").
///
/// Descriptions are not stored here; see [`crate::buildings::BuildingDirectory`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Building {
    pub abbreviation: String,
}

impl Building {
    pub fn new(abbreviation: impl Into<String>) -> Self {
        Self {
            abbreviation: abbreviation.into(),
        }
    }
}

/// Where a meeting takes place. Building and room only ever come as a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub building: Building,
    pub room: String,
}

/// One weekly meeting slot of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingEvent {
    /// `None` for "NO ROOM" meetings (independent study and the like)
    pub location: Option<Location>,
    pub day: Weekday,
    pub start: NaiveTime,
    pub stop: NaiveTime,
}

impl MeetingEvent {
    pub fn building(&self) -> Option<&Building> {
        self.location.as_ref().map(|l| &l.building)
    }

    pub fn room(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.room.as_str())
    }
}

/// One class row group of the schedule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub semester: String,
    pub abbreviation: String,      // e.g., "CAS CS 101 A1"
    pub status: String,            // e.g., "Web Reg"
    pub credit_hours: String,      // kept as text, may be "var"
    pub title: String,
    pub instructor: String,
    pub topic: String,
    pub class_type: String,        // e.g., "Lec", "Dis"
    pub notes: String,
    pub events: Vec<MeetingEvent>,
}

/// Semester label -> classes, in the order semesters first appear on the page.
pub type SemesterSchedule = IndexMap<String, Vec<ClassRecord>>;

/// Row counters collected while walking the schedule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub rows: usize,
    pub classes: usize,
    pub placeholders: usize,
    /// Header rows whose label was markup rather than text
    pub dividers: usize,
}

/// Result of parsing one schedule page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSchedule {
    pub semesters: SemesterSchedule,
    pub stats: ParseStats,
}
