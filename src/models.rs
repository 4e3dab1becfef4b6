//! Wire types shared by the API layer and the AWS query layer.
//!
//! Everything here is built fresh from upstream responses while handling one
//! request and serialized straight to JSON; nothing persists.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{DevcostError, Result};

/// Default inactivity threshold in days when `unusedForDays` is absent.
pub const DEFAULT_UNUSED_FOR_DAYS: i64 = 90;

/// A resource returned by the tag lookup, labelled by parsing its ARN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub resource_arn: String,
    pub resource_type: String,
    pub tags: HashMap<String, String>,
}

/// A paid resource classified as unused by one of the per-service checkers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedResource {
    pub resource_type: String,
    pub resource_id: String,
    pub reason: String,
}

/// Aggregated cost for one tag value over the query window, with a nested
/// per-service breakdown. Currency is fixed to USD regardless of the billing
/// account's actual currency; a known limitation kept on purpose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCost {
    pub tag_key: String,
    pub tag_value: String,
    pub cost: f64,
    pub currency: String,
    pub resources: Vec<ResourceCost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
}

/// One per-service cost line inside a `TagCost`. The grouping dimension is the
/// service name, so `resource_id` stays empty at this granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceCost {
    pub resource_type: String,
    pub resource_id: String,
    pub cost: f64,
}

/// Cost attributed to one `project` tag value. The amount string is passed
/// through from Cost Explorer verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCost {
    pub project: String,
    pub cost: String,
    pub currency: String,
}

/// Query time window. Invariant: `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window from calendar dates (midnight UTC on both ends).
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(DevcostError::validation(
                "End date must be after start date",
            ));
        }
        Ok(Self {
            start: start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
            end: end.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc(),
        })
    }

    /// The default window: trailing seven days from now.
    pub fn trailing_week() -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::days(7),
            end,
        }
    }

    /// Start date formatted for Cost Explorer (`YYYY-MM-DD`).
    pub fn start_date(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// End date formatted for Cost Explorer (`YYYY-MM-DD`).
    pub fn end_date(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_rejects_reversed_dates() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 7).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let err = TimeWindow::from_dates(start, end).unwrap_err();
        assert_eq!(err.to_string(), "End date must be after start date");
    }

    #[test]
    fn test_window_accepts_equal_dates() {
        let day = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let window = TimeWindow::from_dates(day, day).unwrap();
        assert_eq!(window.start, window.end);
        assert_eq!(window.start_date(), "2025-05-01");
    }

    #[test]
    fn test_trailing_week_spans_seven_days() {
        let window = TimeWindow::trailing_week();
        assert_eq!((window.end - window.start).num_days(), 7);
    }

    #[test]
    fn test_unused_resource_serializes_snake_case() {
        let r = UnusedResource {
            resource_type: "ebs:volume".to_string(),
            resource_id: "vol-0abc".to_string(),
            reason: "Unattached".to_string(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["resource_type"], "ebs:volume");
        assert_eq!(json["reason"], "Unattached");
    }
}
