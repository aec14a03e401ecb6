use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One upstream record as delivered by the open-data API.
///
/// Field names are origin-defined; the normalizer maps them onto
/// [`NormalizedRecord`] heuristically.
pub type RawRecord = Map<String, Value>;

/// Fixed-shape view of a sensor event.
///
/// Every field is an empty string when no source field matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub timestamp: String,
    pub status: String,
    pub entity_id: String,
    pub location: String,
    pub zone: String,
}

impl NormalizedRecord {
    /// Records without a timestamp or bay id carry no availability signal.
    pub fn is_usable(&self) -> bool {
        !self.timestamp.is_empty() && !self.entity_id.is_empty()
    }
}
