//! Row shape classification for the schedule table.
//!
//! The schedule page wraps almost every cell value in a `<font>` element and
//! separates the entries of multi-valued cells with `<br>`. Classification only
//! looks at shape; reading values out of a class row happens in `events` and
//! in the table parser.

use scraper::{ElementRef, Node};

use super::normalize::{is_layout_whitespace, normalize};

/// Element that wraps cell values throughout the schedule table.
const WRAPPER_TAG: &str = "font";

/// Number of cells in a class row, not counting the semester cell.
const CLASS_ROW_CELLS: usize = 13;

/// Normalized text of the "nothing registered" placeholder row.
const PLACEHOLDER_TEXT: &str = "no reg activity";

/// One child of a cell, with indentation-only text dropped.
#[derive(Debug, Clone, Copy)]
pub enum Fragment<'a> {
    Text(&'a str),
    Element(ElementRef<'a>),
}

impl<'a> Fragment<'a> {
    /// Text content, flattened for elements.
    pub fn text(&self) -> String {
        match self {
            Fragment::Text(text) => text.to_string(),
            Fragment::Element(el) => el.text().collect(),
        }
    }

    pub fn is_element(&self, name: &str) -> bool {
        matches!(self, Fragment::Element(el) if el.value().name() == name)
    }

    /// Markup for error messages.
    pub fn describe(&self) -> String {
        match self {
            Fragment::Text(text) => format!("{text:?}"),
            Fragment::Element(el) => el.html(),
        }
    }
}

/// Lists the meaningful children of an element.
pub fn fragments(el: ElementRef<'_>) -> Vec<Fragment<'_>> {
    el.children()
        .filter_map(|child| match child.value() {
            Node::Text(text) if !is_layout_whitespace(text) => Some(Fragment::Text(&**text)),
            Node::Element(_) => ElementRef::wrap(child).map(Fragment::Element),
            _ => None,
        })
        .collect()
}

/// Children of the `<font>` wrapper that opens `cell`, if it has one.
fn wrapped_fragments(cell: ElementRef<'_>) -> Option<Vec<Fragment<'_>>> {
    match fragments(cell).first() {
        Some(Fragment::Element(wrapper)) if wrapper.value().name() == WRAPPER_TAG => {
            Some(fragments(*wrapper))
        }
        _ => None,
    }
}

/// The `<td>` children of a row.
pub fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect()
}

/// The cells of a class row, checked for shape but not yet read.
#[derive(Debug, Clone)]
pub struct ClassCells<'a> {
    pub abbreviation: ElementRef<'a>,
    pub status: ElementRef<'a>,
    pub credit_hours: ElementRef<'a>,
    pub title: Fragment<'a>,
    pub instructor: Fragment<'a>,
    pub topic: ElementRef<'a>,
    pub class_type: ElementRef<'a>,
    pub buildings: Vec<Fragment<'a>>,
    pub rooms: Vec<Fragment<'a>>,
    pub days: Vec<Fragment<'a>>,
    pub starts: Vec<Fragment<'a>>,
    pub stops: Vec<Fragment<'a>>,
    pub notes: ElementRef<'a>,
}

/// What follows the (optional) semester cell of a row.
#[derive(Debug, Clone)]
pub enum RowBody<'a> {
    ClassData(Box<ClassCells<'a>>),
    Placeholder,
    Malformed,
}

/// Classification of one table row.
#[derive(Debug, Clone)]
pub enum RowKind<'a> {
    /// Opens a semester group; the rest of the row is classified as well.
    SemesterHeader { label: String, body: RowBody<'a> },
    /// A header whose label is markup (e.g. a horizontal rule); skipped whole.
    Divider,
    /// Any row without a semester cell.
    Continuation(RowBody<'a>),
}

/// Classifies a row by looking at its cells.
pub fn classify_row(row: ElementRef<'_>) -> RowKind<'_> {
    let cells = row_cells(row);

    if let Some((first, rest)) = cells.split_first() {
        if first.value().attr("rowspan").is_some() {
            if let Some(label) = wrapped_fragments(*first).and_then(|f| f.first().copied()) {
                return match label {
                    Fragment::Text(text) => {
                        let label = normalize(text);
                        if label.is_empty() {
                            RowKind::Divider
                        } else {
                            RowKind::SemesterHeader {
                                label,
                                body: classify_body(rest),
                            }
                        }
                    }
                    Fragment::Element(_) => RowKind::Divider,
                };
            }
        }
    }

    RowKind::Continuation(classify_body(&cells))
}

fn classify_body<'a>(cells: &[ElementRef<'a>]) -> RowBody<'a> {
    if let Some(class) = match_class_cells(cells) {
        return RowBody::ClassData(Box::new(class));
    }

    match cells.first() {
        Some(first) if normalize(&first.text().collect::<String>()) == PLACEHOLDER_TEXT => {
            RowBody::Placeholder
        }
        _ => RowBody::Malformed,
    }
}

fn match_class_cells<'a>(cells: &[ElementRef<'a>]) -> Option<ClassCells<'a>> {
    let cells: &[ElementRef<'a>; CLASS_ROW_CELLS] = cells.try_into().ok()?;
    let [abbreviation, _blank, status, credit_hours, title_block, topic, class_type, buildings, rooms, days, starts, stops, notes] =
        cells;

    // Title and instructor share one cell, separated by a line break.
    let (title, instructor) = match wrapped_fragments(*title_block)?.as_slice() {
        [title, _, instructor] => (*title, *instructor),
        _ => return None,
    };

    Some(ClassCells {
        abbreviation: *abbreviation,
        status: *status,
        credit_hours: *credit_hours,
        title,
        instructor,
        topic: *topic,
        class_type: *class_type,
        buildings: wrapped_fragments(*buildings)?,
        rooms: wrapped_fragments(*rooms)?,
        days: wrapped_fragments(*days)?,
        starts: wrapped_fragments(*starts)?,
        stops: wrapped_fragments(*stops)?,
        notes: *notes,
    })
}
