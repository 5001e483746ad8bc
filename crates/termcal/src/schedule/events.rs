//! Meeting event extraction from the multi-valued columns of a class row.

use chrono::NaiveTime;

use super::error::ScheduleError;
use super::normalize::normalize;
use super::row::Fragment;
use super::types::{Building, Location, MeetingEvent, Weekday};

/// Format of start/stop cells, e.g. "2:00PM".
const TIME_FORMAT: &str = "%I:%M%p";

/// What one position of the building/room columns stands for.
#[derive(Debug)]
enum Slot {
    Located(Location),
    NoRoom,
    LineBreak,
}

fn classify_slot(building: &Fragment<'_>, room: &Fragment<'_>) -> Result<Slot, ScheduleError> {
    match (building, room) {
        (Fragment::Element(link), Fragment::Text(room_text)) if link.value().name() == "a" => {
            let abbreviation = normalize(&link.text().collect::<String>());
            if abbreviation.is_empty() {
                return Err(invalid_location(building, room));
            }
            Ok(Slot::Located(Location {
                building: Building::new(abbreviation),
                room: normalize(room_text),
            }))
        }
        (Fragment::Text(b), Fragment::Text(r)) if normalize(b) == "NO" && normalize(r) == "ROOM" => {
            Ok(Slot::NoRoom)
        }
        _ if building.is_element("br") && room.is_element("br") => Ok(Slot::LineBreak),
        _ => Err(invalid_location(building, room)),
    }
}

fn invalid_location(building: &Fragment<'_>, room: &Fragment<'_>) -> ScheduleError {
    ScheduleError::InvalidLocation {
        building: building.describe(),
        room: room.describe(),
    }
}

fn expect_text<'a>(column: &'static str, fragment: &Fragment<'a>) -> Result<&'a str, ScheduleError> {
    match fragment {
        Fragment::Text(text) => Ok(*text),
        Fragment::Element(_) => Err(ScheduleError::InvalidEventCell {
            column,
            content: fragment.describe(),
        }),
    }
}

/// Splits a day list such as "MO,WE" into weekdays.
pub fn parse_days(text: &str) -> Result<Vec<Weekday>, ScheduleError> {
    normalize(text)
        .split(',')
        .map(|token| {
            token.parse::<Weekday>().map_err(|_| ScheduleError::InvalidWeekday {
                token: token.to_string(),
            })
        })
        .collect()
}

/// Parses a 12-hour clock time such as "2:00PM" or "10:30 am".
pub fn parse_time(text: &str) -> Result<NaiveTime, ScheduleError> {
    let compact: String = normalize(text).chars().filter(|c| *c != ' ').collect();
    NaiveTime::parse_from_str(&compact, TIME_FORMAT).map_err(|_| ScheduleError::InvalidTime {
        text: text.to_string(),
    })
}

/// Builds the meeting events of one class from its five parallel columns.
///
/// Positions are read in lock-step. A position whose building and room are
/// both `<br>` is skipped without disturbing the alignment of the other
/// columns. Every weekday listed at a position yields its own event.
pub fn extract_events(
    buildings: &[Fragment<'_>],
    rooms: &[Fragment<'_>],
    days: &[Fragment<'_>],
    starts: &[Fragment<'_>],
    stops: &[Fragment<'_>],
) -> Result<Vec<MeetingEvent>, ScheduleError> {
    let len = buildings.len();
    if [rooms.len(), days.len(), starts.len(), stops.len()]
        .iter()
        .any(|&n| n != len)
    {
        return Err(ScheduleError::MismatchedEventColumns {
            buildings: buildings.len(),
            rooms: rooms.len(),
            days: days.len(),
            starts: starts.len(),
            stops: stops.len(),
        });
    }

    let mut events = Vec::new();
    for i in 0..len {
        let location = match classify_slot(&buildings[i], &rooms[i])? {
            Slot::Located(location) => Some(location),
            Slot::NoRoom => None,
            Slot::LineBreak => continue,
        };

        let weekdays = parse_days(expect_text("days", &days[i])?)?;
        let start = parse_time(expect_text("start", &starts[i])?)?;
        let stop = parse_time(expect_text("stop", &stops[i])?)?;
        if stop <= start {
            return Err(ScheduleError::InvalidTimeRange {
                start: start.format("%H:%M").to_string(),
                stop: stop.format("%H:%M").to_string(),
            });
        }

        events.extend(weekdays.into_iter().map(|day| MeetingEvent {
            location: location.clone(),
            day,
            start,
            stop,
        }));
    }

    Ok(events)
}
