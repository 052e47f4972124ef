//! Bounded retry for archive access.
//!
//! The pipeline talks to two kinds of archive endpoints with different
//! failure profiles: per-entry metadata queries get a short retry budget,
//! the full catalog listing a longer one. Both policies are fixed; there is
//! no backoff because the callers are batch jobs, not interactive.

use std::fmt::Display;

use crate::UtilsError;

/// Attempts allowed for a per-entry metadata query.
pub const QUERY_ATTEMPTS: u32 = 3;

/// Attempts allowed for a full catalog listing.
pub const CATALOG_ATTEMPTS: u32 = 10;

/// Run `operation` up to `max_attempts` times, returning the first success.
///
/// Each failed attempt is logged at warn with the attempt number. Once the
/// budget is exhausted the last error is surfaced as
/// [`UtilsError::RetriesExhausted`].
pub fn with_retries<T, E: Display>(
    label: &str,
    max_attempts: u32,
    mut operation: impl FnMut() -> Result<T, E>,
) -> Result<T, UtilsError> {
    let mut last_error = String::new();
    for attempt in 1..=max_attempts {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::warn!(
                    operation = label,
                    attempt,
                    max_attempts,
                    "Attempt failed: {err}"
                );
                last_error = err.to_string();
            }
        }
    }
    Err(UtilsError::RetriesExhausted {
        operation: label.to_string(),
        attempts: max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeds_first_try() {
        let result = with_retries("op", 3, || Ok::<i32, String>(7));
        assert_eq!(result.expect("first attempt succeeds"), 7);
    }

    #[test]
    fn test_recovers_after_failures() {
        let mut calls = 0;
        let result = with_retries("op", 3, || {
            calls += 1;
            if calls < 3 {
                Err("transient")
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.expect("third attempt succeeds"), 3);
    }

    #[test]
    fn test_exhausts_budget() {
        let mut calls = 0;
        let result: Result<(), UtilsError> = with_retries("listing", 10, || {
            calls += 1;
            Err::<(), _>("down")
        });
        assert_eq!(calls, 10);
        let err = result.expect_err("budget exhausted");
        assert!(err.to_string().contains("after 10 attempts"));
        assert!(err.to_string().contains("down"));
    }
}
