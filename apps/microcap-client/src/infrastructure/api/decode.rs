//! Response body decoding.
//!
//! Wire keys are snake_case and are declared on each record with serde
//! attributes. Dates are ISO-8601 by default; a `DateStrategy::PlainDate`
//! rewrites named fields holding `YYYY-MM-DD` into midnight UTC timestamps
//! before the typed decode runs.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// How dates in a response body are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateStrategy {
    /// RFC 3339 timestamps everywhere.
    #[default]
    Iso8601,
    /// The named fields carry plain `YYYY-MM-DD` dates at any depth.
    PlainDate {
        /// Object keys whose string values are plain dates.
        fields: &'static [&'static str],
    },
}

/// Decode a 2xx body into `T`.
///
/// An empty or whitespace-only body decodes as `{}`.
pub fn decode_body<T: DeserializeOwned>(
    body: &[u8],
    strategy: DateStrategy,
) -> Result<T, serde_json::Error> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };

    match strategy {
        DateStrategy::Iso8601 => serde_json::from_slice(body),
        DateStrategy::PlainDate { fields } => {
            let mut value: Value = serde_json::from_slice(body)?;
            normalize_plain_dates(&mut value, fields);
            serde_json::from_value(value)
        }
    }
}

fn normalize_plain_dates(value: &mut Value, fields: &[&str]) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if fields.contains(&key.as_str()) {
                    if let Value::String(s) = child
                        && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
                    {
                        *s = format!("{s}T00:00:00Z");
                    }
                } else {
                    normalize_plain_dates(child, fields);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                normalize_plain_dates(item, fields);
            }
        }
        _ => {}
    }
}
