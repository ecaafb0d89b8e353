//! Stream Codec
//!
//! Decodes inbound text frames from the quote stream. Frames are normally a
//! JSON array of event objects; a bare object is accepted too.
//!
//! ```json
//! [{"ev":"status","status":"auth_success","message":"authenticated"}]
//! [{"ev":"Q","sym":"ACME","p":5.25}]
//! ```

use serde_json::Value;

/// Codec errors.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// JSON decoding failed.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame is neither an array nor an object.
    #[error("invalid frame format: {0}")]
    InvalidFormat(String),
}

/// One decoded stream event.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Authentication accepted.
    AuthSuccess,
    /// Authentication rejected.
    AuthFailed,
    /// Any other status update, e.g. `connected` or `success`.
    Status(String),
    /// Latest price for a ticker.
    Quote {
        /// Ticker symbol.
        ticker: String,
        /// Price.
        price: f64,
    },
    /// An event this client does not use.
    Ignored,
}

impl StreamMessage {
    /// Short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AuthSuccess | Self::AuthFailed | Self::Status(_) => "status",
            Self::Quote { .. } => "quote",
            Self::Ignored => "ignored",
        }
    }
}

/// Decode a text frame into its events.
///
/// # Errors
///
/// Returns an error if the frame is not JSON or not an array/object.
/// Individual unrecognized or malformed events decode as `Ignored`.
pub fn decode_frame(text: &str) -> Result<Vec<StreamMessage>, FrameError> {
    let trimmed = text.trim();

    if trimmed.starts_with('[') {
        let events: Vec<Value> = serde_json::from_str(trimmed)?;
        Ok(events.iter().map(decode_event).collect())
    } else if trimmed.starts_with('{') {
        let event: Value = serde_json::from_str(trimmed)?;
        Ok(vec![decode_event(&event)])
    } else {
        let preview: String = trimmed.chars().take(50).collect();
        Err(FrameError::InvalidFormat(format!(
            "expected JSON array or object, got: {preview}..."
        )))
    }
}

fn decode_event(event: &Value) -> StreamMessage {
    match event.get("ev").and_then(Value::as_str) {
        Some("status") => match event.get("status").and_then(Value::as_str) {
            Some("auth_success") => StreamMessage::AuthSuccess,
            Some("auth_failed") => StreamMessage::AuthFailed,
            Some(other) => StreamMessage::Status(other.to_string()),
            None => StreamMessage::Ignored,
        },
        Some("Q") => {
            let ticker = event.get("sym").and_then(Value::as_str);
            let price = event.get("p").and_then(Value::as_f64);
            match (ticker, price) {
                (Some(ticker), Some(price)) if !ticker.is_empty() && price.is_finite() => {
                    StreamMessage::Quote {
                        ticker: ticker.to_string(),
                        price,
                    }
                }
                _ => StreamMessage::Ignored,
            }
        }
        _ => StreamMessage::Ignored,
    }
}
