/// Term configuration loaded from JSON
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::error::CalendarError;
use super::TermWindow;
use crate::buildings::BuildingSource;
use crate::schedule::Weekday;

fn default_timezone() -> Tz {
    Tz::America__New_York
}

fn default_week_start() -> Weekday {
    Weekday::Monday
}

/// Everything the calendar export needs besides the schedule itself.
///
/// ```json
/// {
///   "term_start": "2023-01-19",
///   "term_end": "2023-05-03",
///   "timezone": "America/New_York",
///   "buildings": { "kind": "file", "path": "buildings.json" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermConfig {
    pub term_start: NaiveDate,
    pub term_end: NaiveDate,
    /// IANA zone the meeting times are given in; unknown names are rejected
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    #[serde(default = "default_week_start")]
    pub week_start: Weekday,
    /// Building description source; abbreviations are used when absent
    #[serde(default)]
    pub buildings: Option<BuildingSource>,
}

impl TermConfig {
    /// Loads and validates a term configuration file
    ///
    /// A relative building file path is taken relative to the configuration
    /// file's directory.
    ///
    /// # Arguments
    /// * `path` - Path to the JSON configuration
    ///
    /// # Returns
    /// * `Ok(TermConfig)` - Configuration with a valid term window
    /// * `Err` - If the file can't be read or parsed, or the window is empty
    pub fn load(path: &Path) -> Result<Self, CalendarError> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_json(&content)?;

        if let Some(BuildingSource::File { path: buildings }) = &mut config.buildings {
            if buildings.is_relative() {
                if let Some(dir) = path.parent() {
                    *buildings = dir.join(&*buildings);
                }
            }
        }

        Ok(config)
    }

    /// Parses and validates configuration text.
    pub fn from_json(content: &str) -> Result<Self, CalendarError> {
        let config: TermConfig = serde_json::from_str(content)?;
        config.window()?;
        Ok(config)
    }

    /// The term window described by this configuration.
    pub fn window(&self) -> Result<TermWindow, CalendarError> {
        Ok(
            TermWindow::new(self.term_start, self.term_end, self.timezone)?
                .with_week_start(self.week_start),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_apply() {
        let config =
            TermConfig::from_json(r#"{"term_start": "2023-01-19", "term_end": "2023-05-03"}"#)
                .unwrap();
        assert_eq!(config.timezone, Tz::America__New_York);
        assert_eq!(config.week_start, Weekday::Monday);
        assert_eq!(config.buildings, None);
    }

    #[test]
    fn test_timezone_is_parsed_and_checked() {
        let config = TermConfig::from_json(
            r#"{"term_start": "2023-01-19", "term_end": "2023-05-03", "timezone": "Europe/Paris"}"#,
        )
        .unwrap();
        assert_eq!(config.window().unwrap().timezone(), Tz::Europe__Paris);

        let err = TermConfig::from_json(
            r#"{"term_start": "2023-01-19", "term_end": "2023-05-03", "timezone": "Not/AZone"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CalendarError::Config { .. }));
    }

    #[test]
    fn test_inverted_window_is_rejected() {
        let err =
            TermConfig::from_json(r#"{"term_start": "2023-05-03", "term_end": "2023-01-19"}"#)
                .unwrap_err();
        assert!(matches!(err, CalendarError::InvalidTermWindow { .. }));
    }

    #[test]
    fn test_bad_date_is_a_config_error() {
        let err = TermConfig::from_json(r#"{"term_start": "Jan 19", "term_end": "2023-05-03"}"#)
            .unwrap_err();
        assert!(matches!(err, CalendarError::Config { .. }));
    }

    #[test]
    fn test_load_resolves_building_file_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("term.json");
        fs::write(
            &path,
            r#"{"term_start": "2024-01-18", "term_end": "2024-05-01", "week_start": "SU",
                "buildings": {"kind": "file", "path": "buildings.json"}}"#,
        )
        .unwrap();

        let config = TermConfig::load(&path).unwrap();
        assert_eq!(config.week_start, Weekday::Sunday);
        assert_eq!(
            config.buildings,
            Some(BuildingSource::File {
                path: dir.path().join("buildings.json")
            })
        );
        assert_ne!(
            config.buildings,
            Some(BuildingSource::File {
                path: PathBuf::from("buildings.json")
            })
        );
    }
}
