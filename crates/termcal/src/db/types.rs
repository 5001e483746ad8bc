/// Database types for stored schedule snapshots

use crate::schedule::ParseStats;

/// A stored schedule page, without its classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub digest: String,
    pub source: Option<String>,
    pub stats: ParseStats,
    pub created_at: String,
}
