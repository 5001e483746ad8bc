//! Turns a student's registration schedule page into per-semester calendars.
//!
//! [`schedule`] parses the page into semesters, classes and weekly meetings.
//! [`calendar`] projects those meetings onto a term window and writes
//! iCalendar files. [`buildings`] resolves building descriptions for event
//! locations, [`db`] keeps parsed snapshots and [`rooms`] builds per-building
//! occupancy grids.

pub mod buildings;
pub mod calendar;
pub mod db;
pub mod rooms;
pub mod sanitize;
pub mod schedule;

pub use calendar::{project_schedule, CalendarEvent, TermConfig, TermWindow};
pub use schedule::{parse_schedule_html, parse_schedule_page, ParsedSchedule, ScheduleError};
