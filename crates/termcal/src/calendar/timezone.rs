//! Wall-clock to zoned time conversion and the zone rules calendars embed.

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::{OffsetComponents, Tz};

/// Places a wall-clock time in `tz`.
///
/// Ambiguous times (clocks turned back) take the earlier instant. Times
/// skipped by clocks turning forward are read with the offset in force
/// before the jump.
pub fn localize(tz: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let before = offset_seconds(tz, local - Duration::days(1));
            tz.from_utc_datetime(&(local - Duration::seconds(i64::from(before))))
        }
    }
}

/// UTC offset in seconds at a UTC instant.
fn offset_seconds(tz: Tz, utc: NaiveDateTime) -> i32 {
    tz.offset_from_utc_datetime(&utc).fix().local_minus_utc()
}

fn is_daylight(tz: Tz, utc: NaiveDateTime) -> bool {
    tz.offset_from_utc_datetime(&utc).dst_offset() != Duration::zero()
}

/// One STANDARD or DAYLIGHT block of a VTIMEZONE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observance {
    pub daylight: bool,
    /// Local time the observance begins, in the offset it replaces
    pub onset: NaiveDateTime,
    pub offset_from: i32,
    pub offset_to: i32,
}

/// Offset rules of `tz` covering the local dates `from` through `to`.
///
/// The first observance describes the offset in force at the start of
/// `from`; one more follows for every transition up to the end of `to`.
pub fn observances(tz: Tz, from: NaiveDate, to: NaiveDate) -> Vec<Observance> {
    let begin = localize(tz, from.and_time(NaiveTime::default())).naive_utc();
    let finish = localize(tz, to.and_time(NaiveTime::default())).naive_utc() + Duration::days(1);

    let initial = offset_seconds(tz, begin);
    let mut found = vec![Observance {
        daylight: is_daylight(tz, begin),
        onset: begin + Duration::seconds(i64::from(initial)),
        offset_from: initial,
        offset_to: initial,
    }];

    let state = |at: NaiveDateTime| (offset_seconds(tz, at), is_daylight(tz, at));

    let mut lo = begin;
    while lo < finish {
        let hi = (lo + Duration::days(1)).min(finish);
        let before = state(lo);
        if state(hi) != before {
            // Narrow down to the first second with the new offset.
            let (mut a, mut b) = (lo, hi);
            while b - a > Duration::seconds(1) {
                let mid = a + Duration::seconds((b - a).num_seconds() / 2);
                if state(mid) == before {
                    a = mid;
                } else {
                    b = mid;
                }
            }
            let (offset_to, daylight) = state(b);
            found.push(Observance {
                daylight,
                onset: b + Duration::seconds(i64::from(before.0)),
                offset_from: before.0,
                offset_to,
            });
        }
        lo = hi;
    }

    found
}

/// `+HHMM`, or `+HHMMSS` for offsets with seconds.
pub fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let total = seconds.unsigned_abs();
    let (hours, minutes, secs) = (total / 3600, total % 3600 / 60, total % 60);
    if secs == 0 {
        format!("{sign}{hours:02}{minutes:02}")
    } else {
        format!("{sign}{hours:02}{minutes:02}{secs:02}")
    }
}

/// Converts a zoned time to UTC.
pub fn to_utc(dt: &DateTime<Tz>) -> DateTime<Utc> {
    dt.with_timezone(&Utc)
}
