//! Error types for building lookups.

use thiserror::Error;

/// Errors raised by a building lookup.
///
/// A failed lookup for one building leaves it shown by its abbreviation;
/// only a source that cannot be set up fails the export.
#[derive(Debug, Error, Clone)]
pub enum BuildingLookupError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Server returned an unexpected response
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// Lookup settings could not be used (bad URL, bad selector)
    #[error("Invalid lookup configuration: {message}")]
    Config { message: String },

    /// Building description file could not be read or parsed
    #[error("Failed to load building descriptions: {message}")]
    File { message: String },
}

impl From<reqwest::Error> for BuildingLookupError {
    fn from(err: reqwest::Error) -> Self {
        BuildingLookupError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for BuildingLookupError {
    fn from(err: url::ParseError) -> Self {
        BuildingLookupError::Config {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for BuildingLookupError {
    fn from(err: std::io::Error) -> Self {
        BuildingLookupError::File {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BuildingLookupError {
    fn from(err: serde_json::Error) -> Self {
        BuildingLookupError::File {
            message: err.to_string(),
        }
    }
}
