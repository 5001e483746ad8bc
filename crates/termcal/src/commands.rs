use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use termcal::buildings::resolve_buildings;
use termcal::calendar::{ics, project_schedule, TermConfig};
use termcal::db::{document_digest, ScheduleDbManager};
use termcal::rooms::export_schedule_occupancy;
use termcal::schedule::{parse_schedule_page, ParsedSchedule, SemesterSchedule};

use crate::cli::{ConvertArgs, ExportArgs, ParseArgs, RoomsArgs};

fn open_db(path: &Path) -> Result<ScheduleDbManager> {
    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("database path is not valid UTF-8: {}", path.display()))?;
    ScheduleDbManager::new(path_str)
        .with_context(|| format!("failed to open database {}", path.display()))
}

fn parse_page(path: &Path, bytes: &[u8]) -> Result<ParsedSchedule> {
    parse_schedule_page(bytes)
        .with_context(|| format!("failed to parse schedule page {}", path.display()))
}

fn read_page(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Loads the requested snapshot, or the newest one.
fn load_snapshot(db: &ScheduleDbManager, document: Option<&str>) -> Result<ParsedSchedule> {
    let digest = match document {
        Some(digest) => digest.to_string(),
        None => match db.latest_document()? {
            Some(stored) => stored.digest,
            None => bail!("no schedule has been stored yet, run `termcal parse` first"),
        },
    };

    db.load_schedule(&digest)?
        .ok_or_else(|| anyhow!("no stored schedule with digest {digest}"))
}

async fn write_calendars(parsed: &ParsedSchedule, config_path: &Path, out_dir: &Path) -> Result<()> {
    let config = TermConfig::load(config_path)
        .with_context(|| format!("failed to load term config {}", config_path.display()))?;
    let window = config.window()?;

    let buildings = resolve_buildings(config.buildings.as_ref(), &parsed.semesters).await?;
    let projected = project_schedule(&parsed.semesters, &window, &buildings);
    let paths = ics::export_schedule(out_dir, &projected, &window)?;

    info!(
        calendars = paths.len(),
        buildings = buildings.len(),
        out_dir = %out_dir.display(),
        "Export complete"
    );
    Ok(())
}

pub fn parse(args: ParseArgs) -> Result<()> {
    let bytes = read_page(&args.input)?;
    let digest = document_digest(&bytes);
    let mut db = open_db(&args.db)?;

    if !args.force && db.has_document(&digest)? {
        info!(digest = %digest, "Page already stored, skipping");
        return Ok(());
    }

    let parsed = parse_page(&args.input, &bytes)?;
    let source = args.input.display().to_string();
    db.save_schedule(&digest, Some(&source), &parsed)?;

    println!("{digest}");
    Ok(())
}

pub async fn export(args: ExportArgs) -> Result<()> {
    let db = open_db(&args.db)?;
    let parsed = load_snapshot(&db, args.document.as_deref())?;
    write_calendars(&parsed, &args.config, &args.out_dir).await
}

pub async fn convert(args: ConvertArgs) -> Result<()> {
    let bytes = read_page(&args.input)?;
    let parsed = parse_page(&args.input, &bytes)?;
    write_calendars(&parsed, &args.config, &args.out_dir).await
}

pub fn rooms(args: RoomsArgs) -> Result<()> {
    let db = open_db(&args.db)?;
    let parsed = load_snapshot(&db, args.document.as_deref())?;

    let mut semesters = parsed.semesters;
    if let Some(label) = &args.semester {
        let classes = semesters
            .shift_remove(label)
            .ok_or_else(|| anyhow!("no semester {label:?} in the stored schedule"))?;
        semesters = SemesterSchedule::from([(label.clone(), classes)]);
    }

    let paths = export_schedule_occupancy(&args.out_dir, &semesters)
        .with_context(|| format!("failed to write grids to {}", args.out_dir.display()))?;

    info!(grids = paths.len(), out_dir = %args.out_dir.display(), "Room grids written");
    Ok(())
}
