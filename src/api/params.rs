//! Query-parameter parsing shared by the handlers.
//!
//! Validation happens before any upstream call. Error messages are part of
//! the API contract and must stay stable.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{DevcostError, Result};
use crate::models::{TimeWindow, DEFAULT_UNUSED_FOR_DAYS};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Optional paired `start`/`end` date parameters.
#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Resolve the query window: both dates, neither (trailing week), or a 400.
pub fn parse_window(start: Option<&str>, end: Option<&str>) -> Result<TimeWindow> {
    match (start, end) {
        (None, None) => Ok(TimeWindow::trailing_week()),
        (Some(start), Some(end)) => {
            let start = NaiveDate::parse_from_str(start, DATE_FORMAT).map_err(|_| {
                DevcostError::validation("Invalid start date format, use YYYY-MM-DD")
            })?;
            let end = NaiveDate::parse_from_str(end, DATE_FORMAT).map_err(|_| {
                DevcostError::validation("Invalid end date format, use YYYY-MM-DD")
            })?;
            TimeWindow::from_dates(start, end)
        }
        _ => Err(DevcostError::validation(
            "Both start and end dates must be provided together",
        )),
    }
}

/// Parse `unusedForDays`, defaulting when absent. Must be a positive integer.
pub fn parse_unused_for_days(raw: Option<&str>) -> Result<i64> {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Ok(DEFAULT_UNUSED_FOR_DAYS);
    };
    match raw.parse::<i64>() {
        Ok(days) if days >= 1 => Ok(days),
        _ => Err(DevcostError::validation(
            "Invalid unusedForDays, must be a positive integer",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults_to_trailing_week() {
        let window = parse_window(None, None).unwrap();
        assert_eq!((window.end - window.start).num_days(), 7);
    }

    #[test]
    fn test_window_requires_both_dates() {
        for (start, end) in [(Some("2025-05-01"), None), (None, Some("2025-05-07"))] {
            let err = parse_window(start, end).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Both start and end dates must be provided together"
            );
        }
    }

    #[test]
    fn test_window_rejects_bad_date_formats() {
        let err = parse_window(Some("05/01/2025"), Some("2025-05-07")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid start date format, use YYYY-MM-DD");

        let err = parse_window(Some("2025-05-01"), Some("next week")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid end date format, use YYYY-MM-DD");
    }

    #[test]
    fn test_window_rejects_reversed_range() {
        let err = parse_window(Some("2025-05-07"), Some("2025-05-01")).unwrap_err();
        assert_eq!(err.to_string(), "End date must be after start date");
    }

    #[test]
    fn test_window_parses_valid_range() {
        let window = parse_window(Some("2025-05-01"), Some("2025-05-07")).unwrap();
        assert_eq!(window.start_date(), "2025-05-01");
        assert_eq!(window.end_date(), "2025-05-07");
    }

    #[test]
    fn test_unused_for_days_default() {
        assert_eq!(parse_unused_for_days(None).unwrap(), 90);
        assert_eq!(parse_unused_for_days(Some("")).unwrap(), 90);
    }

    #[test]
    fn test_unused_for_days_accepts_positive() {
        assert_eq!(parse_unused_for_days(Some("30")).unwrap(), 30);
        assert_eq!(parse_unused_for_days(Some("1")).unwrap(), 1);
    }

    #[test]
    fn test_unused_for_days_rejects_nonpositive_and_garbage() {
        for raw in ["0", "-5", "ten", "3.5"] {
            let err = parse_unused_for_days(Some(raw)).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Invalid unusedForDays, must be a positive integer"
            );
        }
    }
}
