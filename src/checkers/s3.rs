//! S3 checker: buckets with no requests over the window.
//!
//! Request metrics only exist for buckets with a request-metrics filter
//! configured; buckets without one report no data and classify as unused,
//! matching the zero-activity rule used by the other metric checks.

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use std::sync::Arc;
use tracing::{info, warn};

use super::{CheckOutcome, ResourceChecker};
use crate::aws::metrics::{has_activity, MetricQuery, MetricsSource, Stat, DAILY_PERIOD};
use crate::error::{DevcostError, Result};
use crate::models::{TimeWindow, UnusedResource};

pub struct S3BucketChecker {
    client: aws_sdk_s3::Client,
    metrics: Arc<dyn MetricsSource>,
}

impl S3BucketChecker {
    pub fn new(client: aws_sdk_s3::Client, metrics: Arc<dyn MetricsSource>) -> Self {
        Self { client, metrics }
    }
}

pub(crate) async fn is_bucket_unused(
    metrics: &dyn MetricsSource,
    bucket_name: &str,
    window: &TimeWindow,
) -> Result<bool> {
    let query = MetricQuery {
        id: "requests",
        namespace: "AWS/S3",
        metric_name: "AllRequests",
        dimensions: vec![
            ("BucketName", bucket_name.to_string()),
            ("FilterId", "EntireBucket".to_string()),
        ],
        stat: Stat::Sum,
        period: DAILY_PERIOD,
    };
    let series = metrics.fetch(&[query], window).await?;
    Ok(!has_activity(&series))
}

#[async_trait]
impl ResourceChecker for S3BucketChecker {
    fn name(&self) -> &'static str {
        "s3-buckets"
    }

    async fn check(&self, window: &TimeWindow, unused_for_days: i64) -> CheckOutcome {
        let response = match self.client.list_buckets().send().await {
            Ok(r) => r,
            Err(e) => {
                return CheckOutcome::partial(
                    Vec::new(),
                    DevcostError::aws("failed to list S3 buckets", DisplayErrorContext(&e)),
                );
            }
        };

        let mut unused = Vec::new();
        for bucket in response.buckets() {
            let Some(bucket_name) = bucket.name() else {
                continue;
            };
            match is_bucket_unused(&*self.metrics, bucket_name, window).await {
                Ok(true) => {
                    info!("found unused S3 bucket: {bucket_name}");
                    unused.push(UnusedResource {
                        resource_type: "s3:bucket".to_string(),
                        resource_id: bucket_name.to_string(),
                        reason: format!("No requests for {unused_for_days} days"),
                    });
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("failed to get metrics for S3 bucket {bucket_name}: {e}");
                }
            }
        }
        CheckOutcome::ok(unused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::metrics::testing::FixtureMetrics;

    #[tokio::test]
    async fn test_bucket_with_no_request_metrics_is_unused() {
        let metrics = FixtureMetrics::new();
        assert!(is_bucket_unused(&metrics, "logs", &TimeWindow::trailing_week())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_bucket_with_requests_is_used() {
        let metrics = FixtureMetrics::new().with_values("logs", vec![120.0]);
        assert!(!is_bucket_unused(&metrics, "logs", &TimeWindow::trailing_week())
            .await
            .unwrap());
    }
}
