//! Timestamp utilities
//!
//! Verification timestamps travel as integer Unix epoch milliseconds, the
//! format the relay has always emitted. Older exports stored RFC 3339
//! strings, so decoding accepts either.

use chrono::{DateTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a timestamp to Unix epoch milliseconds
pub fn to_epoch_millis(timestamp: &DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// Convert Unix epoch milliseconds to a timestamp
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Serde adapter: `DateTime<Utc>` <-> epoch milliseconds
///
/// Use with `#[serde(with = "solar_common::time::epoch_millis")]`.
pub mod epoch_millis {
    use super::{from_epoch_millis, to_epoch_millis};
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireTimestamp {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(to_epoch_millis(timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = match WireTimestamp::deserialize(deserializer)? {
            WireTimestamp::Int(millis) => millis,
            WireTimestamp::Float(millis) if millis.is_finite() => millis.round() as i64,
            WireTimestamp::Float(millis) => {
                return Err(D::Error::custom(format!("invalid timestamp: {}", millis)))
            }
            WireTimestamp::Text(text) => {
                let text = text.trim();
                if let Ok(millis) = text.parse::<i64>() {
                    millis
                } else {
                    return DateTime::parse_from_rfc3339(text)
                        .map(|parsed| parsed.with_timezone(&Utc))
                        .map_err(|e| {
                            D::Error::custom(format!("invalid timestamp '{}': {}", text, e))
                        });
                }
            }
        };

        from_epoch_millis(millis)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {}", millis)))
    }
}
