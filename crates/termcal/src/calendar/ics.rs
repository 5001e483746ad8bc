//! iCalendar (RFC 5545) export, one file per semester.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::error::CalendarError;
use super::timezone::{format_offset, observances, to_utc};
use super::{CalendarEvent, TermWindow};
use crate::sanitize::file_stem;

const PRODID: &str = "-//termcal//Term Schedule Export//EN";

/// Content lines longer than this many octets are folded.
const MAX_LINE_OCTETS: usize = 75;

const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Escapes a TEXT property value.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// Appends one content line, folded and CRLF terminated.
fn push_line(out: &mut String, line: &str) {
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(ch);
        width += len;
    }
    out.push_str("\r\n");
}

fn local(value: NaiveDateTime) -> String {
    value.format(LOCAL_FORMAT).to_string()
}

fn utc(value: &DateTime<Tz>) -> String {
    to_utc(value).format(UTC_FORMAT).to_string()
}

/// Stable identifier, so re-exports update events instead of duplicating them.
fn event_uid(semester: &str, index: usize, event: &CalendarEvent) -> String {
    let digest = Sha256::digest(
        format!(
            "{semester}|{index}|{}|{}",
            event.summary,
            local(event.start.naive_local())
        )
        .as_bytes(),
    );
    let hex = format!("{digest:x}");
    format!("{}@termcal", &hex[..32])
}

/// Writes the VTIMEZONE for the window's zone, covering the whole term.
fn push_timezone(out: &mut String, window: &TermWindow) {
    let tz = window.timezone();
    push_line(out, "BEGIN:VTIMEZONE");
    push_line(out, &format!("TZID:{}", tz.name()));

    for observance in observances(tz, window.start(), window.end()) {
        let kind = if observance.daylight { "DAYLIGHT" } else { "STANDARD" };
        push_line(out, &format!("BEGIN:{kind}"));
        push_line(out, &format!("DTSTART:{}", local(observance.onset)));
        push_line(
            out,
            &format!("TZOFFSETFROM:{}", format_offset(observance.offset_from)),
        );
        push_line(out, &format!("TZOFFSETTO:{}", format_offset(observance.offset_to)));
        push_line(out, &format!("END:{kind}"));
    }

    push_line(out, "END:VTIMEZONE");
}

/// Renders one semester as a VCALENDAR document.
///
/// Events that never occur inside the term window are left out.
pub fn render_calendar(
    semester: &str,
    events: &[CalendarEvent],
    window: &TermWindow,
    stamp: DateTime<Utc>,
) -> String {
    let tzid = window.timezone().name();
    let mut out = String::new();

    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, &format!("PRODID:{PRODID}"));
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, &format!("X-WR-CALNAME:{}", escape_text(semester)));
    push_line(&mut out, &format!("X-WR-TIMEZONE:{tzid}"));
    push_timezone(&mut out, window);

    for (index, event) in events.iter().enumerate() {
        if !event.occurs() {
            warn!(
                semester = %semester,
                class = %event.summary,
                weekday = %event.weekday,
                "Weekday never falls inside the term window, skipping event"
            );
            continue;
        }

        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{}", event_uid(semester, index, event)));
        push_line(&mut out, &format!("DTSTAMP:{}", stamp.format(UTC_FORMAT)));
        push_line(&mut out, &format!("SUMMARY:{}", escape_text(&event.summary)));
        push_line(
            &mut out,
            &format!("DTSTART;TZID={tzid}:{}", local(event.start.naive_local())),
        );
        push_line(
            &mut out,
            &format!("DTEND;TZID={tzid}:{}", local(event.end.naive_local())),
        );
        // UNTIL must be UTC when DTSTART carries a TZID.
        push_line(
            &mut out,
            &format!(
                "RRULE:FREQ=WEEKLY;UNTIL={};BYDAY={};WKST={}",
                utc(&event.until),
                event.weekday.code(),
                window.week_start().code()
            ),
        );
        if let Some(location) = &event.location {
            push_line(&mut out, &format!("LOCATION:{}", escape_text(location)));
        }
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

/// File name for a semester's calendar, e.g. "Spring_2023.ics".
pub fn calendar_file_name(semester: &str) -> String {
    match file_stem(semester) {
        Some(stem) => format!("{stem}.ics"),
        None => "semester.ics".to_string(),
    }
}

/// Writes one semester's calendar into `dir`.
pub fn export_semester(
    dir: &Path,
    semester: &str,
    events: &[CalendarEvent],
    window: &TermWindow,
    stamp: DateTime<Utc>,
) -> Result<PathBuf, CalendarError> {
    let path = dir.join(calendar_file_name(semester));
    fs::write(&path, render_calendar(semester, events, window, stamp))?;
    info!(
        semester = %semester,
        events = events.len(),
        path = %path.display(),
        "Wrote calendar"
    );
    Ok(path)
}

/// Fails if two semester labels map to the same file name.
fn check_file_names<'a>(semesters: impl IntoIterator<Item = &'a str>) -> Result<(), CalendarError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for semester in semesters {
        let file_name = calendar_file_name(semester);
        if let Some(first) = seen.get(&file_name) {
            return Err(CalendarError::FileNameCollision {
                first: first.to_string(),
                second: semester.to_string(),
                file_name,
            });
        }
        seen.insert(file_name, semester);
    }
    Ok(())
}

/// Writes every semester's calendar into `dir`, creating it if needed.
///
/// Nothing is written if two semesters would share a file.
pub fn export_schedule(
    dir: &Path,
    projected: &IndexMap<String, Vec<CalendarEvent>>,
    window: &TermWindow,
) -> Result<Vec<PathBuf>, CalendarError> {
    check_file_names(projected.keys().map(String::as_str))?;
    fs::create_dir_all(dir)?;
    let stamp = Utc::now();
    projected
        .iter()
        .map(|(semester, events)| export_semester(dir, semester, events, window, stamp))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::timezone::localize;
    use crate::schedule::Weekday;
    use chrono::{NaiveDate, TimeZone};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        let naive = NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap();
        localize(Tz::America__New_York, naive)
    }

    fn window() -> TermWindow {
        TermWindow::new(
            NaiveDate::from_ymd_opt(2023, 1, 19).unwrap(),
            NaiveDate::from_ymd_opt(2023, 5, 3).unwrap(),
            Tz::America__New_York,
        )
        .unwrap()
    }

    fn monday_event() -> CalendarEvent {
        CalendarEvent {
            summary: "CAS CS 101 A1".to_string(),
            start: at(2023, 1, 23, 10, 0, 0),
            end: at(2023, 1, 23, 11, 15, 0),
            until: at(2023, 5, 1, 23, 59, 59),
            weekday: Weekday::Monday,
            location: Some("101 College of Arts, Sciences".to_string()),
        }
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_render_weekly_event() {
        let ics = render_calendar("Spring 2023", &[monday_event()], &window(), stamp());

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(ics.contains("X-WR-CALNAME:Spring 2023\r\n"));
        assert!(ics.contains("DTSTAMP:20230110T120000Z\r\n"));
        assert!(ics.contains("SUMMARY:CAS CS 101 A1\r\n"));
        assert!(ics.contains("DTSTART;TZID=America/New_York:20230123T100000\r\n"));
        assert!(ics.contains("DTEND;TZID=America/New_York:20230123T111500\r\n"));
        assert!(ics.contains("RRULE:FREQ=WEEKLY;UNTIL=20230502T035959Z;BYDAY=MO;WKST=MO\r\n"));
        assert!(ics.contains("LOCATION:101 College of Arts\\, Sciences\r\n"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn test_calendar_defines_its_timezone() {
        let ics = render_calendar("Spring 2023", &[monday_event()], &window(), stamp());

        let expected = "BEGIN:VTIMEZONE\r\n\
            TZID:America/New_York\r\n\
            BEGIN:STANDARD\r\n\
            DTSTART:20230119T000000\r\n\
            TZOFFSETFROM:-0500\r\n\
            TZOFFSETTO:-0500\r\n\
            END:STANDARD\r\n\
            BEGIN:DAYLIGHT\r\n\
            DTSTART:20230312T020000\r\n\
            TZOFFSETFROM:-0500\r\n\
            TZOFFSETTO:-0400\r\n\
            END:DAYLIGHT\r\n\
            END:VTIMEZONE\r\n";
        assert!(ics.contains(expected), "{ics}");

        // Every TZID used by an event has a definition, ahead of the events.
        let definition = ics.find("BEGIN:VTIMEZONE").unwrap();
        let first_event = ics.find("BEGIN:VEVENT").unwrap();
        assert!(definition < first_event);
    }

    #[test]
    fn test_utc_term_has_single_observance() {
        let window = TermWindow::new(
            NaiveDate::from_ymd_opt(2023, 1, 19).unwrap(),
            NaiveDate::from_ymd_opt(2023, 5, 3).unwrap(),
            Tz::UTC,
        )
        .unwrap();
        let ics = render_calendar("Spring 2023", &[], &window, stamp());
        assert!(ics.contains("TZID:UTC\r\nBEGIN:STANDARD\r\n"));
        assert_eq!(ics.matches("BEGIN:STANDARD").count(), 1);
        assert!(!ics.contains("BEGIN:DAYLIGHT"));
    }

    #[test]
    fn test_uid_is_stable_across_renders() {
        let first = render_calendar("Spring 2023", &[monday_event()], &window(), stamp());
        let second = render_calendar(
            "Spring 2023",
            &[monday_event()],
            &window(),
            Utc.with_ymd_and_hms(2023, 2, 1, 0, 0, 0).unwrap(),
        );
        let uid = |ics: &str| {
            ics.lines()
                .find(|l| l.starts_with("UID:"))
                .map(str::to_string)
        };
        assert!(uid(&first).is_some());
        assert_eq!(uid(&first), uid(&second));
    }

    #[test]
    fn test_non_occurring_event_is_left_out() {
        let mut never = monday_event();
        never.until = at(2023, 1, 16, 23, 59, 59);
        let ics = render_calendar("Spring 2023", &[never, monday_event()], &window(), stamp());
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn test_long_lines_are_folded() {
        let mut event = monday_event();
        event.location = Some("x".repeat(200));
        let ics = render_calendar("Spring 2023", &[event], &window(), stamp());
        for line in ics.split("\r\n") {
            assert!(line.len() <= MAX_LINE_OCTETS, "line too long: {line}");
        }
        let unfolded = ics.replace("\r\n ", "");
        assert!(unfolded.contains(&format!("LOCATION:{}\r\n", "x".repeat(200))));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a;b,c\\d\ne"), "a\\;b\\,c\\\\d\\ne");
    }

    #[test]
    fn test_calendar_file_name_is_filesystem_safe() {
        assert_eq!(calendar_file_name("Spring 2023"), "Spring_2023.ics");
        assert_eq!(calendar_file_name("Fall/Winter  2023 (A)"), "FallWinter_2023_A.ics");
        assert_eq!(calendar_file_name("\u{c9}t\u{e9} 2023"), "\u{c9}t\u{e9}_2023.ics");
        assert_eq!(calendar_file_name("../.."), "semester.ics");
    }

    #[test]
    fn test_export_schedule_writes_one_file_per_semester() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("calendars");
        let mut projected = IndexMap::new();
        projected.insert("Spring 2023".to_string(), vec![monday_event()]);
        projected.insert("Summer 2023".to_string(), Vec::new());

        let paths = export_schedule(&out, &projected, &window()).unwrap();
        assert_eq!(paths, [out.join("Spring_2023.ics"), out.join("Summer_2023.ics")]);

        let spring = fs::read_to_string(&paths[0]).unwrap();
        assert!(spring.contains("BYDAY=MO"));
        let summer = fs::read_to_string(&paths[1]).unwrap();
        assert!(!summer.contains("BEGIN:VEVENT"));
    }

    #[test]
    fn test_colliding_file_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("calendars");
        let mut projected = IndexMap::new();
        projected.insert("Spring 2023".to_string(), vec![monday_event()]);
        projected.insert("Spring/2023".to_string(), Vec::new());
        projected.insert("Spring  2023".to_string(), Vec::new());

        match export_schedule(&out, &projected, &window()) {
            Err(CalendarError::FileNameCollision {
                first,
                second,
                file_name,
            }) => {
                assert_eq!(first, "Spring 2023");
                assert_eq!(second, "Spring  2023");
                assert_eq!(file_name, "Spring_2023.ics");
            }
            other => panic!("expected a collision, got {other:?}"),
        }
        assert!(!out.exists());
    }
}
