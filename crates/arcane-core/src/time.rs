// SPDX-FileCopyrightText: 2026 Arcane Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp normalization for document fields.
//!
//! Persisted documents carry timestamps either as a plain epoch-millis
//! number or as a store-native `{seconds, nanos}` object. Readers normalize
//! both forms to epoch millis; writers always emit the numeric form.

use serde::{Deserialize, Deserializer};

/// Current wall-clock time as epoch millis.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The two timestamp encodings accepted inside document bodies.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Native {
        seconds: i64,
        #[serde(default)]
        nanos: i64,
    },
}

impl RawTimestamp {
    fn to_millis(&self) -> i64 {
        match *self {
            RawTimestamp::Millis(ms) => ms,
            RawTimestamp::Native { seconds, nanos } => {
                seconds * 1_000 + nanos / 1_000_000
            }
        }
    }
}

/// Deserializes a required timestamp field into epoch millis.
pub fn deserialize_millis<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    RawTimestamp::deserialize(deserializer).map(|raw| raw.to_millis())
}

/// Deserializes an optional timestamp field into epoch millis.
pub fn deserialize_opt_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    Ok(raw.map(|r| r.to_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Doc {
        #[serde(deserialize_with = "deserialize_millis")]
        created_at: i64,
    }

    #[test]
    fn numeric_epoch_passes_through() {
        let doc: Doc = serde_json::from_str(r#"{"created_at": 1754000000123}"#).unwrap();
        assert_eq!(doc.created_at, 1_754_000_000_123);
    }

    #[test]
    fn native_timestamp_converts_to_millis() {
        let doc: Doc =
            serde_json::from_str(r#"{"created_at": {"seconds": 1754000000, "nanos": 500000000}}"#)
                .unwrap();
        assert_eq!(doc.created_at, 1_754_000_000_500);
    }

    #[test]
    fn native_timestamp_without_nanos() {
        let doc: Doc =
            serde_json::from_str(r#"{"created_at": {"seconds": 10}}"#).unwrap();
        assert_eq!(doc.created_at, 10_000);
    }

    #[test]
    fn non_timestamp_value_is_rejected() {
        let result = serde_json::from_str::<Doc>(r#"{"created_at": "yesterday"}"#);
        assert!(result.is_err());
    }
}
