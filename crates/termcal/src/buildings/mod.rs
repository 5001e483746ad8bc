//! Building description lookup.
//!
//! Parsing only ever records building abbreviations. Descriptions are resolved
//! afterwards, once per distinct abbreviation, into a [`BuildingDirectory`]
//! that the calendar projector consults. Parsed events are never modified.

mod client;
mod error;

pub use client::{HttpBuildingLookup, HttpLookupConfig};
pub use error::BuildingLookupError;

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schedule::{Building, SemesterSchedule};

/// Source of building descriptions.
pub trait BuildingLookup: Send + Sync {
    /// Describes one building. `Ok(None)` means the source has no entry for it.
    fn describe(
        &self,
        abbreviation: &str,
    ) -> impl Future<Output = Result<Option<String>, BuildingLookupError>> + Send;
}

/// Descriptions read from a JSON object of abbreviation -> description.
#[derive(Debug, Clone, Default)]
pub struct StaticBuildingLookup {
    descriptions: HashMap<String, String>,
}

impl StaticBuildingLookup {
    pub fn new(descriptions: HashMap<String, String>) -> Self {
        Self { descriptions }
    }

    /// Loads descriptions from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, BuildingLookupError> {
        let content = fs::read_to_string(path)?;
        let descriptions: HashMap<String, String> = serde_json::from_str(&content)?;
        Ok(Self::new(descriptions))
    }
}

impl BuildingLookup for StaticBuildingLookup {
    async fn describe(&self, abbreviation: &str) -> Result<Option<String>, BuildingLookupError> {
        Ok(self.descriptions.get(abbreviation).cloned())
    }
}

/// Where building descriptions come from, as written in the term configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildingSource {
    File { path: PathBuf },
    Http(HttpLookupConfig),
}

/// Abbreviation -> description side table, safe to share between projections.
#[derive(Debug, Default)]
pub struct BuildingDirectory {
    descriptions: DashMap<String, String>,
}

impl BuildingDirectory {
    /// Creates an empty directory; every building is then shown by abbreviation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, abbreviation: impl Into<String>, description: impl Into<String>) {
        self.descriptions
            .insert(abbreviation.into(), description.into());
    }

    /// Description of a building, falling back to its abbreviation.
    pub fn describe(&self, building: &Building) -> String {
        self.descriptions
            .get(&building.abbreviation)
            .map(|entry| entry.value().clone())
            .unwrap_or_else(|| building.abbreviation.clone())
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

impl FromIterator<(String, String)> for BuildingDirectory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            descriptions: iter.into_iter().collect(),
        }
    }
}

/// Every building abbreviation referenced by the schedule, deduplicated.
pub fn distinct_buildings(schedule: &SemesterSchedule) -> BTreeSet<String> {
    schedule
        .values()
        .flatten()
        .flat_map(|class| &class.events)
        .filter_map(|event| event.building())
        .map(|building| building.abbreviation.clone())
        .collect()
}

/// Looks up every abbreviation, at most `concurrency` at a time.
///
/// Failed or empty lookups are logged and left out of the directory, so
/// those buildings keep their bare abbreviation.
pub async fn enrich_buildings<L: BuildingLookup>(
    lookup: &L,
    abbreviations: impl IntoIterator<Item = String>,
    concurrency: usize,
) -> BuildingDirectory {
    let directory = BuildingDirectory::new();
    let mut failures = 0usize;

    let mut lookups = stream::iter(abbreviations)
        .map(|abbreviation| async move {
            let result = lookup.describe(&abbreviation).await;
            (abbreviation, result)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((abbreviation, result)) = lookups.next().await {
        match result {
            Ok(Some(description)) => directory.insert(abbreviation, description),
            Ok(None) => {
                warn!(building = %abbreviation, "No description found, using abbreviation");
            }
            Err(e) => {
                failures += 1;
                warn!(building = %abbreviation, error = %e, "Building lookup failed, using abbreviation");
            }
        }
    }

    info!(
        described = directory.len(),
        failures = failures,
        "Building lookup finished"
    );

    directory
}

/// Builds the directory for a schedule from the configured source.
///
/// Only a source that cannot be set up at all is an error; individual
/// lookups degrade to the abbreviation.
pub async fn resolve_buildings(
    source: Option<&BuildingSource>,
    schedule: &SemesterSchedule,
) -> Result<BuildingDirectory, BuildingLookupError> {
    let abbreviations = distinct_buildings(schedule);

    match source {
        None => Ok(BuildingDirectory::new()),
        Some(BuildingSource::File { path }) => {
            let lookup = StaticBuildingLookup::from_file(path)?;
            Ok(enrich_buildings(&lookup, abbreviations, 1).await)
        }
        Some(BuildingSource::Http(config)) => {
            let lookup = HttpBuildingLookup::new(config)?;
            Ok(enrich_buildings(&lookup, abbreviations, config.concurrency).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{ClassRecord, Location, MeetingEvent, Weekday};
    use chrono::NaiveTime;

    /// Fails for one abbreviation, knows nothing about another.
    struct FlakyLookup;

    impl BuildingLookup for FlakyLookup {
        async fn describe(&self, abbreviation: &str) -> Result<Option<String>, BuildingLookupError> {
            match abbreviation {
                "CAS" => Ok(Some("College of Arts & Sciences".to_string())),
                "PHO" => Err(BuildingLookupError::Network {
                    message: "connection reset".to_string(),
                }),
                _ => Ok(None),
            }
        }
    }

    fn class_in(building: Option<&str>) -> ClassRecord {
        ClassRecord {
            semester: "Spring 2023".to_string(),
            abbreviation: "CAS CS 101 A1".to_string(),
            status: String::new(),
            credit_hours: String::new(),
            title: String::new(),
            instructor: String::new(),
            topic: String::new(),
            class_type: String::new(),
            notes: String::new(),
            events: vec![MeetingEvent {
                location: building.map(|b| Location {
                    building: Building::new(b),
                    room: "101".to_string(),
                }),
                day: Weekday::Monday,
                start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                stop: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            }],
        }
    }

    #[test]
    fn test_distinct_buildings_skips_unlocated_events() {
        let mut schedule = SemesterSchedule::new();
        schedule.insert(
            "Spring 2023".to_string(),
            vec![class_in(Some("PHO")), class_in(None), class_in(Some("CAS"))],
        );
        schedule.insert("Fall 2023".to_string(), vec![class_in(Some("CAS"))]);

        let buildings: Vec<_> = distinct_buildings(&schedule).into_iter().collect();
        assert_eq!(buildings, ["CAS", "PHO"]);
    }

    #[tokio::test]
    async fn test_enrichment_falls_back_on_failure() {
        let abbreviations = ["CAS", "PHO", "EPC"].map(String::from);
        let directory = enrich_buildings(&FlakyLookup, abbreviations, 2).await;

        assert_eq!(directory.len(), 1);
        assert_eq!(
            directory.describe(&Building::new("CAS")),
            "College of Arts & Sciences"
        );
        assert_eq!(directory.describe(&Building::new("PHO")), "PHO");
        assert_eq!(directory.describe(&Building::new("EPC")), "EPC");
    }

    #[tokio::test]
    async fn test_resolve_without_source_uses_abbreviations() {
        let mut schedule = SemesterSchedule::new();
        schedule.insert("Spring 2023".to_string(), vec![class_in(Some("CAS"))]);

        let directory = resolve_buildings(None, &schedule).await.unwrap();
        assert!(directory.is_empty());
        assert_eq!(directory.describe(&Building::new("CAS")), "CAS");
    }

    #[tokio::test]
    async fn test_resolve_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildings.json");
        fs::write(&path, r#"{"CAS": "College of Arts & Sciences", "LAW": "Law Tower"}"#).unwrap();

        let mut schedule = SemesterSchedule::new();
        schedule.insert("Spring 2023".to_string(), vec![class_in(Some("CAS"))]);

        let directory = resolve_buildings(Some(&BuildingSource::File { path }), &schedule)
            .await
            .unwrap();
        // Only buildings used by the schedule are looked up.
        assert_eq!(directory.len(), 1);
        assert_eq!(
            directory.describe(&Building::new("CAS")),
            "College of Arts & Sciences"
        );
    }

    #[test]
    fn test_building_source_config_shapes() {
        let file: BuildingSource =
            serde_json::from_str(r#"{"kind": "file", "path": "buildings.json"}"#).unwrap();
        assert_eq!(
            file,
            BuildingSource::File {
                path: PathBuf::from("buildings.json")
            }
        );

        let http: BuildingSource = serde_json::from_str(
            r#"{"kind": "http", "url": "https://example.edu/bldg", "query_param": "code", "selector": "td"}"#,
        )
        .unwrap();
        match http {
            BuildingSource::Http(config) => {
                assert_eq!(config.timeout_secs, 10);
                assert_eq!(config.concurrency, 8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
