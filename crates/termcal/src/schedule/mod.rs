/// Schedule page parsing module
mod error;
mod events;
mod normalize;
mod row;
mod types;

pub use error::ScheduleError;
pub use events::{extract_events, parse_days, parse_time};
pub use normalize::{decode_latin1, normalize};
pub use row::{classify_row, ClassCells, Fragment, RowBody, RowKind};
pub use types::*;

use regex::Regex;
use scraper::{ElementRef, Html, Node};
use std::sync::LazyLock;
use tracing::{debug, info};

// The first text mentioning a season marks the schedule table.
static SEMESTER_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Spring|Summer|Fall|Winter").unwrap());

/// Parses a schedule page as fetched from the registration system.
///
/// The page is served as ISO-8859-1 and is decoded before parsing.
///
/// # Arguments
/// * `bytes` - Raw page bytes
///
/// # Returns
/// * `Ok(ParsedSchedule)` - Classes grouped by semester, plus row counters
/// * `Err(ScheduleError)` - If any row of the table could not be read
pub fn parse_schedule_page(bytes: &[u8]) -> Result<ParsedSchedule, ScheduleError> {
    parse_schedule_html(&decode_latin1(bytes))
}

/// Parses an already decoded schedule page.
///
/// Nothing is returned unless every row of the table was understood.
pub fn parse_schedule_html(html: &str) -> Result<ParsedSchedule, ScheduleError> {
    let document = Html::parse_document(html);
    let table = find_schedule_table(&document).ok_or(ScheduleError::TableNotFound)?;
    let parsed = parse_schedule_table(table)?;

    info!(
        semesters = parsed.semesters.len(),
        classes = parsed.stats.classes,
        placeholders = parsed.stats.placeholders,
        dividers = parsed.stats.dividers,
        "Parsed schedule table"
    );

    Ok(parsed)
}

/// Finds the table enclosing the first semester label on the page.
fn find_schedule_table(document: &Html) -> Option<ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter(|node| matches!(node.value(), Node::Text(text) if SEMESTER_ANCHOR.is_match(text)))
        .find_map(|node| {
            node.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "table")
        })
}

/// Rows that belong to `table` itself, not to tables nested in its cells.
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

/// Walks the schedule table top to bottom, tracking the current semester.
fn parse_schedule_table(table: ElementRef<'_>) -> Result<ParsedSchedule, ScheduleError> {
    let mut semesters = SemesterSchedule::new();
    let mut stats = ParseStats::default();
    let mut current: Option<String> = None;
    let mut previous: Option<ElementRef<'_>> = None;

    // Row 0 holds the column headings.
    for (index, row) in table_rows(table).into_iter().enumerate().skip(1) {
        stats.rows += 1;

        let body = match classify_row(row) {
            RowKind::SemesterHeader { label, body } => {
                debug!(row = index, semester = %label, "Semester header");
                semesters.entry(label.clone()).or_default();
                current = Some(label);
                body
            }
            RowKind::Divider => {
                stats.dividers += 1;
                debug!(row = index, "Ignoring divider row");
                continue;
            }
            RowKind::Continuation(body) => body,
        };

        match body {
            RowBody::ClassData(cells) => {
                let Some(semester) = current.as_deref() else {
                    return Err(ScheduleError::MissingSemester {
                        row: index,
                        content: row.html(),
                    });
                };
                let record =
                    build_class_record(semester, &cells).map_err(|source| ScheduleError::InvalidClass {
                        row: index,
                        content: row.html(),
                        source: Box::new(source),
                    })?;
                semesters.entry(semester.to_string()).or_default().push(record);
                stats.classes += 1;
            }
            RowBody::Placeholder => {
                if current.is_none() {
                    return Err(ScheduleError::MissingSemester {
                        row: index,
                        content: row.html(),
                    });
                }
                stats.placeholders += 1;
            }
            RowBody::Malformed => {
                return Err(ScheduleError::MalformedRow {
                    row: index,
                    semester: current,
                    table: opening_tag(table),
                    previous: previous.map(row_excerpt),
                    content: row.html(),
                });
            }
        }
        previous = Some(row);
    }

    Ok(ParsedSchedule { semesters, stats })
}

/// Start tag of `el` with its attributes, e.g. `<table border="1">`.
fn opening_tag(el: ElementRef<'_>) -> String {
    let mut tag = format!("<{}", el.value().name());
    for (name, value) in el.value().attrs() {
        tag.push_str(&format!(" {name}=\"{value}\""));
    }
    tag.push('>');
    tag
}

/// Normalized text of a row, cut to a readable length.
fn row_excerpt(row: ElementRef<'_>) -> String {
    const MAX_CHARS: usize = 80;
    let text = row
        .text()
        .map(normalize)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    match text.char_indices().nth(MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

fn build_class_record(semester: &str, cells: &ClassCells<'_>) -> Result<ClassRecord, ScheduleError> {
    let events = extract_events(
        &cells.buildings,
        &cells.rooms,
        &cells.days,
        &cells.starts,
        &cells.stops,
    )?;
    Ok(assemble_class(semester, cells, events))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    normalize(&cell.text().collect::<String>())
}

/// Puts the normalized scalar fields and the extracted events together.
fn assemble_class(semester: &str, cells: &ClassCells<'_>, events: Vec<MeetingEvent>) -> ClassRecord {
    ClassRecord {
        semester: semester.to_string(),
        abbreviation: cell_text(cells.abbreviation),
        status: cell_text(cells.status),
        credit_hours: cell_text(cells.credit_hours),
        title: normalize(&cells.title.text()),
        instructor: normalize(&cells.instructor.text()),
        topic: cell_text(cells.topic),
        class_type: cell_text(cells.class_type),
        notes: cell_text(cells.notes),
        events,
    }
}
