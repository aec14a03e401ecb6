//! Heuristic mapping of upstream records onto [`NormalizedRecord`]
//!
//! The open-data feed has renamed fields more than once, so each target field
//! is resolved from an ordered list of candidate keys. Timestamp and bay id
//! additionally fall back to a keyword scan over all keys.

use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{NormalizedRecord, RawRecord};

/// Target field of a [`NormalizedRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    Status,
    EntityId,
    Location,
    Zone,
}

/// Candidate source keys per target, highest priority first.
pub const FIELD_CANDIDATES: [(Field, &[&str]); 5] = [
    (Field::Timestamp, &["lastupdated", "updated_at", "timestamp", "date_time"]),
    (Field::Status, &["status", "bay_status", "description", "state"]),
    (Field::EntityId, &["bay_id", "id", "kerbside_id", "sensor_id"]),
    (Field::Location, &["location", "address", "street"]),
    (Field::Zone, &["zone_number", "zone", "zone_id"]),
];

const TIMESTAMP_KEYWORDS: &[&str] = &["time", "date", "update"];
const ENTITY_KEYWORDS: &[&str] = &["id", "bay", "sensor"];

/// Map one raw record. Never fails; unmatched fields stay empty.
pub fn normalize_record(record: &RawRecord) -> NormalizedRecord {
    let mut out = NormalizedRecord::default();

    for (field, candidates) in FIELD_CANDIDATES.iter() {
        let value = candidates
            .iter()
            .find_map(|key| record.get(*key).filter(|v| is_truthy(v)))
            .map(render_value)
            .unwrap_or_default();

        match field {
            Field::Timestamp => out.timestamp = value,
            Field::Status => out.status = value,
            Field::EntityId => out.entity_id = value,
            Field::Location => out.location = value,
            Field::Zone => out.zone = value,
        }
    }

    if out.timestamp.is_empty() {
        out.timestamp = keyword_scan(record, TIMESTAMP_KEYWORDS).unwrap_or_default();
    }
    if out.entity_id.is_empty() {
        out.entity_id = keyword_scan(record, ENTITY_KEYWORDS).unwrap_or_default();
    }

    out
}

/// Map a batch of upstream JSON values.
///
/// Any element that is not an object poisons the whole batch, which then
/// yields no records rather than an error.
pub fn normalize_batch(records: &[Value]) -> Vec<NormalizedRecord> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(records.len());
    for (idx, value) in records.iter().enumerate() {
        match value.as_object() {
            Some(record) => out.push(normalize_record(record)),
            None => {
                warn!(index = idx, "upstream record is not an object, discarding batch");
                return Vec::new();
            }
        }
    }

    debug!(count = out.len(), "normalized upstream records");
    out
}

/// First key (in record order) whose lowercase name contains any keyword.
fn keyword_scan(record: &RawRecord, keywords: &[&str]) -> Option<String> {
    record
        .iter()
        .find(|(key, _)| {
            let key = key.to_lowercase();
            keywords.iter().any(|kw| key.contains(kw))
        })
        .map(|(_, value)| render_value(value))
}

/// Whether a value counts as present: null, empty, zero and false do not.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_earliest_candidate_wins() {
        let raw = record(json!({
            "date_time": "2024-01-01T03:00:00Z",
            "timestamp": "2024-01-01T02:00:00Z",
            "lastupdated": "2024-01-01T01:00:00Z",
        }));
        let normalized = normalize_record(&raw);
        assert_eq!(normalized.timestamp, "2024-01-01T01:00:00Z");
    }

    #[test]
    fn test_empty_candidate_is_skipped() {
        let raw = record(json!({
            "lastupdated": "",
            "updated_at": "2024-01-01T05:00:00Z",
        }));
        assert_eq!(normalize_record(&raw).timestamp, "2024-01-01T05:00:00Z");
    }

    #[test]
    fn test_melbourne_sensor_record() {
        let raw = record(json!({
            "lastupdated": "2024-06-03T04:27:12+00:00",
            "status_timestamp": "2024-06-03T04:20:00+00:00",
            "zone_number": 7553,
            "status_description": "Unoccupied",
            "kerbsideid": 56874,
            "location": {"lon": 144.96, "lat": -37.81},
        }));
        let normalized = normalize_record(&raw);

        assert_eq!(normalized.timestamp, "2024-06-03T04:27:12+00:00");
        assert_eq!(normalized.zone, "7553");
        // no direct id candidate: keyword scan picks the first key containing "id"
        assert_eq!(normalized.entity_id, "56874");
        assert_eq!(normalized.location, r#"{"lon":144.96,"lat":-37.81}"#);
        assert_eq!(normalized.status, "");
    }

    #[test]
    fn test_timestamp_keyword_fallback_uses_record_order() {
        let raw = record(json!({
            "bay_id": "B1",
            "EventDate": "2024-02-02",
            "StatusTime": "2024-02-02T10:00:00Z",
        }));
        let normalized = normalize_record(&raw);
        assert_eq!(normalized.timestamp, "2024-02-02");
        assert_eq!(normalized.entity_id, "B1");
    }

    #[rstest]
    #[case(json!(null), false)]
    #[case(json!(""), false)]
    #[case(json!(0), false)]
    #[case(json!(false), false)]
    #[case(json!([]), false)]
    #[case(json!("x"), true)]
    #[case(json!(12), true)]
    #[case(json!({"a": 1}), true)]
    fn test_truthiness(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(is_truthy(&value), expected);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let normalized = normalize_record(&record(json!({"foo": "bar"})));
        assert_eq!(normalized, NormalizedRecord::default());
    }

    #[test]
    fn test_batch_with_non_object_is_empty() {
        let batch = vec![json!({"id": "1", "timestamp": "2024-01-01"}), json!(42)];
        assert!(normalize_batch(&batch).is_empty());
        assert!(normalize_batch(&[]).is_empty());
    }

    #[test]
    fn test_batch_maps_every_record() {
        let batch = vec![
            json!({"id": "1", "timestamp": "2024-01-01T00:00:00Z", "zone": "A"}),
            json!({"sensor_id": "2", "updated_at": "2024-01-01T01:00:00Z"}),
        ];
        let out = normalize_batch(&batch);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].zone, "A");
        assert_eq!(out[1].entity_id, "2");
    }
}
