//! Status classification and backoff for the request pipeline.
//!
//! | Status | Category | Retried |
//! |--------|----------|---------|
//! | 2xx | `Success` | - |
//! | 401 | `Unauthorized` | no |
//! | 403 | `Forbidden` | no |
//! | 5xx | `Transient` | yes, with exponential backoff |
//! | anything else | `Unexpected` | no |

use std::time::Duration;

use reqwest::StatusCode;

use crate::infrastructure::config::RetryConfig;

/// How the pipeline treats a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    /// Decode the body.
    Success,
    /// Session rejected.
    Unauthorized,
    /// Entitlement rejected.
    Forbidden,
    /// Server failure, worth retrying.
    Transient,
    /// Any other status.
    Unexpected,
}

/// Categorize HTTP status code for retry handling.
#[must_use]
pub const fn categorize_status(status: StatusCode) -> StatusCategory {
    match status.as_u16() {
        200..=299 => StatusCategory::Success,
        401 => StatusCategory::Unauthorized,
        403 => StatusCategory::Forbidden,
        500..=599 => StatusCategory::Transient,
        _ => StatusCategory::Unexpected,
    }
}

/// Deterministic exponential backoff.
///
/// Yields `max_retries` delays, starting at `initial_backoff` and multiplying
/// by `multiplier` each time, capped at `max_backoff`.
#[derive(Debug)]
pub struct ExponentialBackoff {
    retries: u32,
    max_retries: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    /// Start a fresh schedule.
    #[must_use]
    pub const fn new(config: &RetryConfig) -> Self {
        Self {
            retries: 0,
            max_retries: config.max_retries,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
        }
    }

    /// Delay before the next retry, or `None` once retries are exhausted.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.retries >= self.max_retries {
            return None;
        }
        self.retries += 1;

        let backoff = self.current_backoff.min(self.max_backoff);
        // A multiplier below 1.0 (or NaN) would shrink or invalidate the delay.
        let multiplier = if self.multiplier >= 1.0 {
            self.multiplier
        } else {
            1.0
        };
        let next = (self.current_backoff.as_secs_f64() * multiplier)
            .min(self.max_backoff.as_secs_f64());
        self.current_backoff = Duration::try_from_secs_f64(next).unwrap_or(self.max_backoff);

        Some(backoff)
    }

    /// Retries handed out so far.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(200, StatusCategory::Success ; "ok")]
    #[test_case(204, StatusCategory::Success ; "no content")]
    #[test_case(401, StatusCategory::Unauthorized ; "unauthorized")]
    #[test_case(403, StatusCategory::Forbidden ; "forbidden")]
    #[test_case(500, StatusCategory::Transient ; "internal error")]
    #[test_case(503, StatusCategory::Transient ; "unavailable")]
    #[test_case(599, StatusCategory::Transient ; "upper 5xx")]
    #[test_case(404, StatusCategory::Unexpected ; "not found")]
    #[test_case(429, StatusCategory::Unexpected ; "rate limited")]
    #[test_case(302, StatusCategory::Unexpected ; "redirect")]
    fn status_categories(code: u16, expected: StatusCategory) {
        let status = StatusCode::from_u16(code).unwrap();
        assert_eq!(categorize_status(status), expected);
    }

    #[test]
    fn default_schedule_is_one_then_two_seconds() {
        let mut backoff = ExponentialBackoff::new(&RetryConfig::default());

        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(1)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(2)));
        assert_eq!(backoff.next_backoff(), None);
        assert_eq!(backoff.retries(), 2);
    }

    #[test_case(-2.0 ; "negative")]
    #[test_case(0.5 ; "shrinking")]
    #[test_case(f64::NAN ; "nan")]
    fn bad_multiplier_keeps_constant_delay(multiplier: f64) {
        let config = RetryConfig {
            multiplier,
            ..RetryConfig::default()
        };
        let mut backoff = ExponentialBackoff::new(&config);

        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(1)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(1)));
        assert_eq!(backoff.next_backoff(), None);
    }

    #[test]
    fn infinite_multiplier_is_capped() {
        let config = RetryConfig {
            multiplier: f64::INFINITY,
            ..RetryConfig::default()
        };
        let mut backoff = ExponentialBackoff::new(&config);

        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(1)));
        assert_eq!(backoff.next_backoff(), Some(config.max_backoff));
    }

    #[test]
    fn backoff_respects_max() {
        let config = RetryConfig {
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            multiplier: 10.0,
            max_backoff: Duration::from_secs(5),
        };
        let mut backoff = ExponentialBackoff::new(&config);

        backoff.next_backoff();
        assert_eq!(backoff.next_backoff(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn zero_retries_never_waits() {
        let config = RetryConfig {
            max_retries: 0,
            ..RetryConfig::default()
        };
        assert!(ExponentialBackoff::new(&config).next_backoff().is_none());
    }
}
