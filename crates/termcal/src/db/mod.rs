/// Database module for storing parsed schedules between pipeline stages

mod types;

pub use types::StoredDocument;

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::schedule::{
    Building, ClassRecord, Location, MeetingEvent, ParseStats, ParsedSchedule, SemesterSchedule,
    Weekday,
};

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_schedules.sql");

/// Identifies a schedule page by the SHA-256 of its raw bytes.
pub fn document_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub struct ScheduleDbManager {
    db: Connection,
}

impl ScheduleDbManager {
    /// Opens (or creates) the snapshot database and initializes the schema
    ///
    /// Pass `":memory:"` for a throwaway database.
    pub fn new(db_path: &str) -> Result<Self> {
        let db = Connection::open(db_path)?;
        db.execute_batch(SCHEMA_SQL)?;
        Ok(Self { db })
    }

    /// Checks if a page has already been stored
    pub fn has_document(&self, digest: &str) -> Result<bool> {
        let count: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM documents WHERE digest = ?",
            [digest],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// The most recently stored page, if any
    pub fn latest_document(&self) -> Result<Option<StoredDocument>> {
        self.db
            .query_row(
                "SELECT digest, source, row_count, class_count, placeholder_count, divider_count, created_at
                 FROM documents
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
                [],
                document_from_row,
            )
            .optional()
    }

    /// Looks up a stored page by digest
    pub fn get_document(&self, digest: &str) -> Result<Option<StoredDocument>> {
        self.db
            .query_row(
                "SELECT digest, source, row_count, class_count, placeholder_count, divider_count, created_at
                 FROM documents
                 WHERE digest = ?",
                [digest],
                document_from_row,
            )
            .optional()
    }

    /// Stores a parsed page with all its semesters, classes and meetings
    ///
    /// A previous snapshot with the same digest is replaced. Everything is
    /// written in one transaction.
    pub fn save_schedule(
        &mut self,
        digest: &str,
        source: Option<&str>,
        parsed: &ParsedSchedule,
    ) -> Result<()> {
        let tx = self.db.transaction()?;

        // Cascades to semesters, classes and meetings
        tx.execute("DELETE FROM documents WHERE digest = ?", [digest])?;

        tx.execute(
            "INSERT INTO documents (digest, source, row_count, class_count, placeholder_count, divider_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))",
            params![
                digest,
                source,
                parsed.stats.rows as i64,
                parsed.stats.classes as i64,
                parsed.stats.placeholders as i64,
                parsed.stats.dividers as i64,
            ],
        )?;

        for (semester_pos, (label, classes)) in parsed.semesters.iter().enumerate() {
            tx.execute(
                "INSERT INTO semesters (digest, position, label) VALUES (?1, ?2, ?3)",
                params![digest, semester_pos as i64, label],
            )?;
            let semester_id = tx.last_insert_rowid();

            for (class_pos, class) in classes.iter().enumerate() {
                tx.execute(
                    "INSERT INTO classes (
                        semester_id, position, abbreviation, status, credit_hours,
                        title, instructor, topic, class_type, notes
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        semester_id,
                        class_pos as i64,
                        class.abbreviation,
                        class.status,
                        class.credit_hours,
                        class.title,
                        class.instructor,
                        class.topic,
                        class.class_type,
                        class.notes,
                    ],
                )?;
                let class_id = tx.last_insert_rowid();

                for (meeting_pos, event) in class.events.iter().enumerate() {
                    tx.execute(
                        "INSERT INTO meetings (
                            class_id, position, building, room, weekday, start_time, stop_time
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            class_id,
                            meeting_pos as i64,
                            event.building().map(|b| b.abbreviation.as_str()),
                            event.room(),
                            event.day.code(),
                            event.start,
                            event.stop,
                        ],
                    )?;
                }
            }
        }

        tx.commit()?;

        info!(
            digest = %digest,
            semesters = parsed.semesters.len(),
            classes = parsed.stats.classes,
            "Stored schedule snapshot"
        );

        Ok(())
    }

    /// Loads a stored page back into a parsed schedule
    pub fn load_schedule(&self, digest: &str) -> Result<Option<ParsedSchedule>> {
        let Some(document) = self.get_document(digest)? else {
            return Ok(None);
        };

        let mut semester_stmt = self.db.prepare_cached(
            "SELECT semester_id, label FROM semesters WHERE digest = ? ORDER BY position",
        )?;
        let semesters: Vec<(i64, String)> = semester_stmt
            .query_map([digest], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>>>()?;

        let mut schedule = SemesterSchedule::new();
        for (semester_id, label) in semesters {
            let classes = self.load_classes(semester_id, &label)?;
            schedule.insert(label, classes);
        }

        Ok(Some(ParsedSchedule {
            semesters: schedule,
            stats: document.stats,
        }))
    }

    fn load_classes(&self, semester_id: i64, semester: &str) -> Result<Vec<ClassRecord>> {
        let mut class_stmt = self.db.prepare_cached(
            "SELECT class_id, abbreviation, status, credit_hours, title, instructor, topic, class_type, notes
             FROM classes
             WHERE semester_id = ?
             ORDER BY position",
        )?;

        let rows: Vec<(i64, ClassRecord)> = class_stmt
            .query_map([semester_id], |row| {
                Ok((
                    row.get(0)?,
                    ClassRecord {
                        semester: semester.to_string(),
                        abbreviation: row.get(1)?,
                        status: row.get(2)?,
                        credit_hours: row.get(3)?,
                        title: row.get(4)?,
                        instructor: row.get(5)?,
                        topic: row.get(6)?,
                        class_type: row.get(7)?,
                        notes: row.get(8)?,
                        events: Vec::new(),
                    },
                ))
            })?
            .collect::<Result<Vec<_>>>()?;

        let mut meeting_stmt = self.db.prepare_cached(
            "SELECT building, room, weekday, start_time, stop_time
             FROM meetings
             WHERE class_id = ?
             ORDER BY position",
        )?;

        let mut classes = Vec::with_capacity(rows.len());
        for (class_id, mut class) in rows {
            class.events = meeting_stmt
                .query_map([class_id], meeting_from_row)?
                .collect::<Result<Vec<_>>>()?;
            classes.push(class);
        }

        Ok(classes)
    }
}

fn document_from_row(row: &Row<'_>) -> Result<StoredDocument> {
    let count = |idx: usize| -> Result<usize> { Ok(row.get::<_, i64>(idx)? as usize) };
    Ok(StoredDocument {
        digest: row.get(0)?,
        source: row.get(1)?,
        stats: ParseStats {
            rows: count(2)?,
            classes: count(3)?,
            placeholders: count(4)?,
            dividers: count(5)?,
        },
        created_at: row.get(6)?,
    })
}

fn meeting_from_row(row: &Row<'_>) -> Result<MeetingEvent> {
    let building: Option<String> = row.get(0)?;
    let room: Option<String> = row.get(1)?;
    let location = match (building, room) {
        (Some(abbreviation), Some(room)) => Some(Location {
            building: Building::new(abbreviation),
            room,
        }),
        (None, None) => None,
        _ => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                0,
                Type::Text,
                "building and room must both be set or both be null".into(),
            ))
        }
    };

    let code: String = row.get(2)?;
    let day = code.parse::<Weekday>().map_err(|token| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("invalid weekday {token:?}").into(),
        )
    })?;

    Ok(MeetingEvent {
        location,
        day,
        start: row.get(3)?,
        stop: row.get(4)?,
    })
}
