// Drop ingestion - loosely shaped store documents in, strict targets out

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};
use shared::{Coordinate, NewDrop, Target};
use thiserror::Error;
use tracing::warn;

/// Why a stored document could not become a target
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RejectReason {
    #[error("document is not an object")]
    NotAnObject,

    #[error("missing or non-string id")]
    MissingId,

    #[error("missing or non-string message")]
    MissingMessage,

    #[error("missing coordinates")]
    MissingCoordinates,

    #[error("coordinates out of range: {0}")]
    OutOfRange(Coordinate),
}

/// Convert one document into a target.
///
/// Coordinates are read from top-level `latitude`/`longitude`, or from a
/// nested `location: { lat, lng }` object. `createdAt` may be an RFC 3339
/// string or epoch milliseconds; when absent the current time is used.
pub fn parse_target(document: &Value) -> Result<Target, RejectReason> {
    let object = document.as_object().ok_or(RejectReason::NotAnObject)?;

    let id = object
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(RejectReason::MissingId)?;

    let message = object
        .get("message")
        .and_then(Value::as_str)
        .ok_or(RejectReason::MissingMessage)?;

    let coordinate = coordinate_of(object).ok_or(RejectReason::MissingCoordinates)?;
    if !coordinate.is_finite() || !coordinate.is_within_bounds() {
        return Err(RejectReason::OutOfRange(coordinate));
    }

    Ok(Target {
        id: id.to_string(),
        coordinate,
        message: message.to_string(),
        created_at: created_at_of(object).unwrap_or_else(Utc::now),
    })
}

fn coordinate_of(object: &Map<String, Value>) -> Option<Coordinate> {
    let flat = object
        .get("latitude")
        .and_then(Value::as_f64)
        .zip(object.get("longitude").and_then(Value::as_f64));

    let nested = || {
        let location = object.get("location")?.as_object()?;
        location
            .get("lat")
            .and_then(Value::as_f64)
            .zip(location.get("lng").and_then(Value::as_f64))
    };

    flat.or_else(nested)
        .map(|(latitude, longitude)| Coordinate::new(latitude, longitude))
}

fn created_at_of(object: &Map<String, Value>) -> Option<DateTime<Utc>> {
    match object.get("createdAt")? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
        _ => None,
    }
}

/// Convert a batch, skipping (and logging) every document that does not qualify
pub fn ingest_documents<I>(documents: I) -> Vec<Target>
where
    I: IntoIterator<Item = Value>,
{
    documents
        .into_iter()
        .filter_map(|document| match parse_target(&document) {
            Ok(target) => Some(target),
            Err(reason) => {
                let id = document.get("id").and_then(Value::as_str).unwrap_or("?");
                warn!(drop_id = %id, "Skipping malformed drop: {}", reason);
                None
            }
        })
        .collect()
}

/// The document written for a new drop
pub fn drop_document(id: &str, drop: &NewDrop, created_at: DateTime<Utc>) -> Value {
    json!({
        "id": id,
        "message": drop.message,
        "latitude": drop.coordinate.latitude,
        "longitude": drop.coordinate.longitude,
        "createdAt": created_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_document() {
        let doc = json!({
            "id": "d1",
            "message": "under the bench",
            "latitude": 28.364,
            "longitude": 77.534,
            "createdAt": "2024-03-01T10:00:00Z",
        });

        let target = parse_target(&doc).unwrap();
        assert_eq!(target.id, "d1");
        assert_eq!(target.coordinate, Coordinate::new(28.364, 77.534));
        assert_eq!(target.created_at.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_nested_location_and_millis() {
        let doc = json!({
            "id": "d2",
            "message": "by the fountain",
            "location": { "lat": 28.363, "lng": 77.533 },
            "createdAt": 1_700_000_000_000_i64,
        });

        let target = parse_target(&doc).unwrap();
        assert_eq!(target.coordinate, Coordinate::new(28.363, 77.533));
        assert_eq!(target.created_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(parse_target(&json!([1, 2])), Err(RejectReason::NotAnObject));
        assert_eq!(
            parse_target(&json!({ "id": 7, "message": "m", "latitude": 1.0, "longitude": 1.0 })),
            Err(RejectReason::MissingId)
        );
        assert_eq!(
            parse_target(&json!({ "id": "x", "latitude": 1.0, "longitude": 1.0 })),
            Err(RejectReason::MissingMessage)
        );
        assert_eq!(
            parse_target(&json!({ "id": "x", "message": "m", "latitude": "28.3", "longitude": 77.5 })),
            Err(RejectReason::MissingCoordinates)
        );
        assert!(matches!(
            parse_target(&json!({ "id": "x", "message": "m", "latitude": 91.0, "longitude": 0.0 })),
            Err(RejectReason::OutOfRange(_))
        ));
    }

    #[test]
    fn test_ingest_skips_bad_documents() {
        let targets = ingest_documents(vec![
            json!({ "id": "ok", "message": "m", "latitude": 1.0, "longitude": 2.0 }),
            json!({ "id": "bad", "message": "m" }),
            json!(null),
        ]);

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].id, "ok");
    }

    #[test]
    fn test_drop_document_parses_back() {
        let drop = NewDrop {
            coordinate: Coordinate::new(28.365, 77.535),
            message: "trophy".to_string(),
        };
        let now = Utc::now();
        let doc = drop_document("abc", &drop, now);

        let target = parse_target(&doc).unwrap();
        assert_eq!(target.id, "abc");
        assert_eq!(target.message, "trophy");
        assert_eq!(target.coordinate, drop.coordinate);
    }
}
