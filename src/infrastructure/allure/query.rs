//! Encoding of the `search` query parameter.
//!
//! Allure expects the filter list as base64 of a JSON array of filter objects.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One search filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: i64,
}

impl SearchFilter {
    /// Launches created at or after `window_start`.
    pub fn created_after(window_start: DateTime<Utc>) -> Self {
        Self {
            id: "createdAfter".to_string(),
            kind: "long".to_string(),
            value: window_start.timestamp_millis(),
        }
    }
}

/// Encode filters as base64 of their JSON array.
pub fn encode_search(filters: &[SearchFilter]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(filters)?;
    Ok(BASE64.encode(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn decode(encoded: &str) -> serde_json::Value {
        let bytes = BASE64.decode(encoded).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_created_after_uses_epoch_millis() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let window_start = now - Duration::minutes(200);

        let encoded = encode_search(&[SearchFilter::created_after(window_start)]).unwrap();
        let decoded = decode(&encoded);

        let array = decoded.as_array().unwrap();
        assert_eq!(array.len(), 1);
        assert_eq!(array[0]["id"], "createdAfter");
        assert_eq!(array[0]["type"], "long");
        assert_eq!(array[0]["value"], window_start.timestamp_millis());
        assert_eq!(array[0]["value"], 1_709_282_400_000_i64);
    }
}
