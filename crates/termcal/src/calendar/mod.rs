//! Projection of weekly meetings onto a term calendar.

mod config;
mod error;
pub mod ics;
pub mod timezone;

pub use config::TermConfig;
pub use error::CalendarError;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buildings::BuildingDirectory;
use crate::schedule::{ClassRecord, SemesterSchedule, Weekday};

/// The dates a term's recurring events may fall on, in one fixed zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermWindow {
    start: NaiveDate,
    end: NaiveDate,
    timezone: Tz,
    week_start: Weekday,
}

impl TermWindow {
    /// Creates a window running from `start` through `end`, both inclusive.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        timezone: Tz,
    ) -> Result<Self, CalendarError> {
        if end < start {
            return Err(CalendarError::InvalidTermWindow { start, end });
        }
        Ok(Self {
            start,
            end,
            timezone,
            week_start: Weekday::Monday,
        })
    }

    /// Sets the first day of the week used by exported recurrence rules.
    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// First date on or after the term start that falls on `day`.
    pub fn first_occurrence(&self, day: Weekday) -> NaiveDate {
        let start_day = Weekday::from(self.start.weekday());
        let offset = (i64::from(day.index()) - i64::from(start_day.index())).rem_euclid(7);
        self.start + Days::new(offset as u64)
    }

    /// Last date on or before the term end that falls on `day`.
    pub fn last_occurrence(&self, day: Weekday) -> NaiveDate {
        let end_day = Weekday::from(self.end.weekday());
        let offset = (i64::from(end_day.index()) - i64::from(day.index())).rem_euclid(7);
        self.end - Days::new(offset as u64)
    }
}

/// One weekly recurring calendar entry, derived from a single meeting event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Class abbreviation
    pub summary: String,
    /// Start of the first occurrence
    pub start: DateTime<Tz>,
    /// End of the first occurrence
    pub end: DateTime<Tz>,
    /// End of day on the last occurrence
    pub until: DateTime<Tz>,
    pub weekday: Weekday,
    pub location: Option<String>,
}

impl CalendarEvent {
    pub fn first_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn last_date(&self) -> NaiveDate {
        self.until.date_naive()
    }

    /// False when the weekday never falls inside the term window.
    pub fn occurs(&self) -> bool {
        self.first_date() <= self.last_date()
    }
}

fn end_of_day(date: NaiveDate, tz: Tz) -> DateTime<Tz> {
    timezone::localize(tz, date.and_time(NaiveTime::default()) + Duration::seconds(86_399))
}

/// Projects every meeting of one semester's classes onto the term window.
///
/// Events are returned in class order, then meeting order. Events whose
/// weekday misses the window are still returned; see [`CalendarEvent::occurs`].
pub fn project_semester(
    classes: &[ClassRecord],
    window: &TermWindow,
    buildings: &BuildingDirectory,
) -> Vec<CalendarEvent> {
    classes
        .iter()
        .flat_map(|class| {
            class.events.iter().map(move |event| {
                let tz = window.timezone();
                let first = window.first_occurrence(event.day);
                let last = window.last_occurrence(event.day);
                CalendarEvent {
                    summary: class.abbreviation.clone(),
                    start: timezone::localize(tz, first.and_time(event.start)),
                    end: timezone::localize(tz, first.and_time(event.stop)),
                    until: end_of_day(last, tz),
                    weekday: event.day,
                    location: event.location.as_ref().map(|location| {
                        format!("{} {}", location.room, buildings.describe(&location.building))
                    }),
                }
            })
        })
        .collect()
}

/// Projects each semester independently.
pub fn project_schedule(
    schedule: &SemesterSchedule,
    window: &TermWindow,
    buildings: &BuildingDirectory,
) -> IndexMap<String, Vec<CalendarEvent>> {
    schedule
        .iter()
        .map(|(semester, classes)| {
            let events = project_semester(classes, window, buildings);
            debug!(semester = %semester, events = events.len(), "Projected semester");
            (semester.clone(), events)
        })
        .collect()
}
