//! Room occupancy grids, one per building and semester.
//!
//! Every located meeting of a semester is filed under building -> room ->
//! weekday, and each building is rendered as a table with one row per room.
//! Each semester gets its own set of grids.

use chrono::NaiveTime;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::sanitize::file_stem;
use crate::schedule::{ClassRecord, SemesterSchedule, Weekday};

/// One class occupying a room on some weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSlot {
    pub start: NaiveTime,
    pub stop: NaiveTime,
    pub abbreviation: String,
}

impl RoomSlot {
    /// Cell text, e.g. "10:00-11:15 CAS CS 101 A1".
    pub fn label(&self) -> String {
        format!(
            "{}-{} {}",
            self.start.format("%H:%M"),
            self.stop.format("%H:%M"),
            self.abbreviation
        )
    }
}

pub type RoomWeek = BTreeMap<Weekday, Vec<RoomSlot>>;

/// building -> room -> weekday -> slots sorted by start time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomOccupancy {
    buildings: BTreeMap<String, BTreeMap<String, RoomWeek>>,
}

impl RoomOccupancy {
    /// Collects every located meeting of one semester's classes.
    ///
    /// Room names are upper-cased so "b12" and "B12" share a row.
    pub fn from_classes(classes: &[ClassRecord]) -> Self {
        let mut buildings: BTreeMap<String, BTreeMap<String, RoomWeek>> = BTreeMap::new();

        for class in classes {
            for event in &class.events {
                let Some(location) = &event.location else {
                    continue;
                };
                buildings
                    .entry(location.building.abbreviation.clone())
                    .or_default()
                    .entry(location.room.to_uppercase())
                    .or_default()
                    .entry(event.day)
                    .or_default()
                    .push(RoomSlot {
                        start: event.start,
                        stop: event.stop,
                        abbreviation: class.abbreviation.clone(),
                    });
            }
        }

        for slots in buildings
            .values_mut()
            .flat_map(|rooms| rooms.values_mut())
            .flat_map(|week| week.values_mut())
        {
            slots.sort_by_key(|slot| slot.start);
        }

        Self { buildings }
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn buildings(&self) -> impl Iterator<Item = &str> {
        self.buildings.keys().map(String::as_str)
    }

    pub fn rooms(&self, building: &str) -> Option<&BTreeMap<String, RoomWeek>> {
        self.buildings.get(building)
    }

    /// Grid rows for one building, or `None` if it has no located meetings.
    ///
    /// Each row starts with the room, then for every weekday a label cell
    /// followed by that day's slots, padded to the busiest room's count.
    /// Basement rooms (starting with "B") come first.
    pub fn grid(&self, building: &str) -> Option<Vec<Vec<String>>> {
        let rooms = self.buildings.get(building)?;

        let mut names: Vec<&String> = rooms.keys().collect();
        names.sort_by(|a, b| (!a.starts_with('B'), a).cmp(&(!b.starts_with('B'), b)));

        let widths: BTreeMap<Weekday, usize> = Weekday::ALL
            .into_iter()
            .map(|day| {
                let busiest = rooms
                    .values()
                    .map(|week| week.get(&day).map_or(0, Vec::len))
                    .max()
                    .unwrap_or(0);
                (day, busiest)
            })
            .collect();

        let grid = names
            .into_iter()
            .map(|room| {
                let week = &rooms[room];
                let mut row = vec![room.clone()];
                for day in Weekday::ALL {
                    row.push(day.name().to_string());
                    let slots = week.get(&day).map(Vec::as_slice).unwrap_or_default();
                    row.extend(slots.iter().map(RoomSlot::label));
                    row.resize(row.len() + widths[&day] - slots.len(), String::new());
                }
                row
            })
            .collect();

        Some(grid)
    }
}

fn render_tsv(grid: &[Vec<String>]) -> String {
    let mut out = String::new();
    for row in grid {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| cell.replace(['\t', '\n', '\r'], " "))
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

/// File name for a building's grid, e.g. "CAS.tsv".
fn grid_file_name(building: &str) -> String {
    match file_stem(building) {
        Some(stem) => format!("{stem}.tsv"),
        None => "building.tsv".to_string(),
    }
}

/// Directory name for a semester's grids, e.g. "Spring_2023".
fn semester_dir_name(semester: &str) -> String {
    file_stem(semester).unwrap_or_else(|| "semester".to_string())
}

/// Writes one TSV grid per building into `dir`, creating it if needed.
pub fn export_occupancy(dir: &Path, occupancy: &RoomOccupancy) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut paths = Vec::new();
    for building in occupancy.buildings() {
        let Some(grid) = occupancy.grid(building) else {
            continue;
        };
        let path = dir.join(grid_file_name(building));
        fs::write(&path, render_tsv(&grid))?;
        info!(
            building = %building,
            rooms = grid.len(),
            path = %path.display(),
            "Wrote room occupancy"
        );
        paths.push(path);
    }

    Ok(paths)
}

/// Writes grids for every semester, each into its own subdirectory of `dir`.
///
/// Fails before writing anything if two semesters map to the same
/// directory name.
pub fn export_schedule_occupancy(dir: &Path, schedule: &SemesterSchedule) -> io::Result<Vec<PathBuf>> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for semester in schedule.keys() {
        let name = semester_dir_name(semester);
        if let Some(first) = seen.get(&name) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("semesters {first:?} and {semester:?} would both be written to {name}"),
            ));
        }
        seen.insert(name, semester);
    }

    let mut paths = Vec::new();
    for (semester, classes) in schedule {
        let occupancy = RoomOccupancy::from_classes(classes);
        if occupancy.is_empty() {
            info!(semester = %semester, "No located meetings, skipping room grids");
            continue;
        }
        paths.extend(export_occupancy(&dir.join(semester_dir_name(semester)), &occupancy)?);
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Building, Location, MeetingEvent};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn meeting(building: Option<(&str, &str)>, day: Weekday, start: NaiveTime) -> MeetingEvent {
        MeetingEvent {
            location: building.map(|(b, r)| Location {
                building: Building::new(b),
                room: r.to_string(),
            }),
            day,
            start,
            stop: start + chrono::Duration::minutes(50),
        }
    }

    fn class(abbreviation: &str, events: Vec<MeetingEvent>) -> ClassRecord {
        ClassRecord {
            semester: String::new(),
            abbreviation: abbreviation.to_string(),
            status: "Web Reg".to_string(),
            credit_hours: "4.0".to_string(),
            title: String::new(),
            instructor: String::new(),
            topic: String::new(),
            class_type: "Lec".to_string(),
            notes: String::new(),
            events,
        }
    }

    fn classes() -> Vec<ClassRecord> {
        vec![
            class(
                "CAS CS 111 A1",
                vec![
                    meeting(Some(("CAS", "313")), Weekday::Monday, time(13, 25)),
                    meeting(Some(("CAS", "313")), Weekday::Monday, time(9, 5)),
                ],
            ),
            class(
                "CAS MA 123 A1",
                vec![
                    meeting(Some(("CAS", "b12")), Weekday::Tuesday, time(8, 0)),
                    meeting(None, Weekday::Friday, time(8, 0)),
                ],
            ),
            class(
                "ENG EK 103 A1",
                vec![meeting(Some(("PHO", "203")), Weekday::Monday, time(10, 10))],
            ),
        ]
    }

    #[test]
    fn test_unlocated_meetings_are_ignored() {
        let occupancy = RoomOccupancy::from_classes(&classes());
        let buildings: Vec<_> = occupancy.buildings().collect();
        assert_eq!(buildings, ["CAS", "PHO"]);

        let cas = occupancy.rooms("CAS").unwrap();
        assert_eq!(cas.len(), 2);
        assert!(cas.contains_key("B12"));
        assert!(!cas["B12"].contains_key(&Weekday::Friday));
    }

    #[test]
    fn test_slots_are_sorted_by_start() {
        let occupancy = RoomOccupancy::from_classes(&classes());
        let monday = &occupancy.rooms("CAS").unwrap()["313"][&Weekday::Monday];
        let labels: Vec<_> = monday.iter().map(RoomSlot::label).collect();
        assert_eq!(labels, ["09:05-09:55 CAS CS 111 A1", "13:25-14:15 CAS CS 111 A1"]);
    }

    #[test]
    fn test_grid_puts_basement_first_and_pads_days() {
        let occupancy = RoomOccupancy::from_classes(&classes());
        let grid = occupancy.grid("CAS").unwrap();
        assert_eq!(grid.len(), 2);

        // 1 room cell + 7 day labels + 2 Monday slots + 1 Tuesday slot
        assert!(grid.iter().all(|row| row.len() == 11));

        let basement = &grid[0];
        assert_eq!(basement[0], "B12");
        assert_eq!(&basement[1..5], ["Monday", "", "", "Tuesday"]);
        assert_eq!(basement[5], "08:00-08:50 CAS MA 123 A1");

        let upper = &grid[1];
        assert_eq!(upper[0], "313");
        assert_eq!(upper[2], "09:05-09:55 CAS CS 111 A1");
        assert_eq!(upper[4], "Tuesday");
        assert_eq!(upper[5], "");

        assert!(occupancy.grid("XYZ").is_none());
    }

    #[test]
    fn test_export_writes_one_tsv_per_building() {
        let dir = tempfile::tempdir().unwrap();
        let occupancy = RoomOccupancy::from_classes(&classes());
        let paths = export_occupancy(dir.path(), &occupancy).unwrap();
        assert_eq!(paths, [dir.path().join("CAS.tsv"), dir.path().join("PHO.tsv")]);

        let pho = fs::read_to_string(&paths[1]).unwrap();
        assert!(pho.starts_with("203\tMonday\t10:10-11:00 ENG EK 103 A1\tTuesday\t"));
        assert_eq!(pho.lines().count(), 1);
    }

    #[test]
    fn test_empty_schedule_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let occupancy = RoomOccupancy::from_classes(&[]);
        assert!(occupancy.is_empty());
        assert!(export_occupancy(dir.path(), &occupancy).unwrap().is_empty());
        assert!(export_schedule_occupancy(dir.path(), &SemesterSchedule::new())
            .unwrap()
            .is_empty());
    }

    fn same_slot_in_two_semesters() -> SemesterSchedule {
        let mut schedule = SemesterSchedule::new();
        schedule.insert(
            "Spring 2023".to_string(),
            vec![class(
                "CAS CS 101 A1",
                vec![meeting(Some(("CAS", "101")), Weekday::Monday, time(10, 0))],
            )],
        );
        schedule.insert(
            "Fall 2023".to_string(),
            vec![class(
                "CAS CS 210 A1",
                vec![meeting(Some(("CAS", "101")), Weekday::Monday, time(10, 0))],
            )],
        );
        schedule
    }

    #[test]
    fn test_semesters_get_separate_grids() {
        let dir = tempfile::tempdir().unwrap();
        let paths = export_schedule_occupancy(dir.path(), &same_slot_in_two_semesters()).unwrap();
        assert_eq!(
            paths,
            [
                dir.path().join("Spring_2023").join("CAS.tsv"),
                dir.path().join("Fall_2023").join("CAS.tsv"),
            ]
        );

        let spring = fs::read_to_string(&paths[0]).unwrap();
        let row: Vec<_> = spring.trim_end().split('\t').collect();
        // One Monday slot, not two clashing ones.
        assert_eq!(&row[..4], ["101", "Monday", "10:00-10:50 CAS CS 101 A1", "Tuesday"]);

        let fall = fs::read_to_string(&paths[1]).unwrap();
        assert!(fall.contains("CAS CS 210 A1"));
        assert!(!fall.contains("CAS CS 101 A1"));
    }

    #[test]
    fn test_colliding_semester_directories_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut schedule = same_slot_in_two_semesters();
        let spring = schedule["Spring 2023"].clone();
        schedule.insert("Spring_2023".to_string(), spring);

        let err = export_schedule_occupancy(dir.path(), &schedule).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert!(!dir.path().join("Spring_2023").exists());
    }
}
