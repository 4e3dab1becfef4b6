//! Lambda checker: functions with no invocations over the window.

use async_trait::async_trait;
use aws_sdk_lambda::error::DisplayErrorContext;
use std::sync::Arc;
use tracing::{info, warn};

use super::{CheckOutcome, ResourceChecker};
use crate::aws::metrics::{has_activity, MetricQuery, MetricsSource, Stat, HOURLY_PERIOD};
use crate::error::{DevcostError, Result};
use crate::models::{TimeWindow, UnusedResource};

pub struct LambdaFunctionChecker {
    client: aws_sdk_lambda::Client,
    metrics: Arc<dyn MetricsSource>,
}

impl LambdaFunctionChecker {
    pub fn new(client: aws_sdk_lambda::Client, metrics: Arc<dyn MetricsSource>) -> Self {
        Self { client, metrics }
    }
}

pub(crate) async fn is_function_unused(
    metrics: &dyn MetricsSource,
    function_arn: &str,
    window: &TimeWindow,
) -> Result<bool> {
    let query = MetricQuery {
        id: "invocations",
        namespace: "AWS/Lambda",
        metric_name: "Invocations",
        dimensions: vec![("FunctionName", function_arn.to_string())],
        stat: Stat::Sum,
        period: HOURLY_PERIOD,
    };
    let series = metrics.fetch(&[query], window).await?;
    Ok(!has_activity(&series))
}

/// Classify one function; the reason carries the caller's threshold.
pub(crate) async fn classify_function(
    metrics: &dyn MetricsSource,
    function_arn: &str,
    window: &TimeWindow,
    unused_for_days: i64,
) -> Result<Option<UnusedResource>> {
    if is_function_unused(metrics, function_arn, window).await? {
        return Ok(Some(UnusedResource {
            resource_type: "lambda:function".to_string(),
            resource_id: function_arn.to_string(),
            reason: format!("No invocations for {unused_for_days} days"),
        }));
    }
    Ok(None)
}

#[async_trait]
impl ResourceChecker for LambdaFunctionChecker {
    fn name(&self) -> &'static str {
        "lambda-functions"
    }

    async fn check(&self, window: &TimeWindow, unused_for_days: i64) -> CheckOutcome {
        let response = match self.client.list_functions().send().await {
            Ok(r) => r,
            Err(e) => {
                return CheckOutcome::partial(
                    Vec::new(),
                    DevcostError::aws("failed to list Lambda functions", DisplayErrorContext(&e)),
                );
            }
        };

        let mut unused = Vec::new();
        for function in response.functions() {
            let Some(function_arn) = function.function_arn() else {
                continue;
            };
            match classify_function(&*self.metrics, function_arn, window, unused_for_days).await
            {
                Ok(Some(resource)) => {
                    info!("found unused Lambda function: {function_arn}");
                    unused.push(resource);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("failed to check usage for Lambda {function_arn}: {e}");
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
    async fn test_function_with_no_datapoints_is_unused() {
        let metrics = FixtureMetrics::new();
        assert!(is_function_unused(&metrics, "arn:fn", &TimeWindow::trailing_week())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_function_with_invocations_is_used() {
        let metrics = FixtureMetrics::new().with_values("arn:fn", vec![0.0, 2.0]);
        assert!(!is_function_unused(&metrics, "arn:fn", &TimeWindow::trailing_week())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_function_with_all_zero_sums_is_unused() {
        let metrics = FixtureMetrics::new().with_values("arn:fn", vec![0.0, 0.0, 0.0]);
        assert!(is_function_unused(&metrics, "arn:fn", &TimeWindow::trailing_week())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_reason_carries_caller_threshold() {
        // unusedForDays=30 and no datapoints over the window.
        let metrics = FixtureMetrics::new();
        let classified = classify_function(&metrics, "arn:fn", &TimeWindow::trailing_week(), 30)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(classified.resource_type, "lambda:function");
        assert_eq!(classified.resource_id, "arn:fn");
        assert_eq!(classified.reason, "No invocations for 30 days");
    }

    #[tokio::test]
    async fn test_active_function_not_classified() {
        let metrics = FixtureMetrics::new().with_values("arn:fn", vec![1.0]);
        let classified = classify_function(&metrics, "arn:fn", &TimeWindow::trailing_week(), 30)
            .await
            .unwrap();
        assert!(classified.is_none());
    }
}
