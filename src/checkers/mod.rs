//! Unused-resource detection.
//!
//! Every paid resource kind implements `ResourceChecker`: list the resources
//! of that kind, classify each as used or unused (structurally or via a
//! CloudWatch utilization signal), and report whatever was gathered even when
//! an upstream call failed mid-way. `run_checkers` walks the fixed catalogue
//! and merges the results.

mod bedrock;
mod dynamodb;
mod ec2;
mod elb;
mod lambda;
mod rds;
mod s3;
mod secrets;

pub use bedrock::{BedrockKnowledgeBaseChecker, BedrockModelChecker};
pub use dynamodb::DynamoDbTableChecker;
pub use ec2::{EbsVolumeChecker, Ec2InstanceChecker, ElasticIpChecker};
pub use elb::LoadBalancerChecker;
pub use lambda::LambdaFunctionChecker;
pub use rds::RdsInstanceChecker;
pub use s3::S3BucketChecker;
pub use secrets::SecretsChecker;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aws::metrics::MetricsSource;
use crate::aws::AwsClients;
use crate::error::{DevcostError, Result};
use crate::models::{TimeWindow, UnusedResource};

/// What one checker produced. The error is advisory: partial results are kept
/// and the aggregator decides whether any failure matters.
#[derive(Default)]
pub struct CheckOutcome {
    pub resources: Vec<UnusedResource>,
    pub error: Option<DevcostError>,
}

impl CheckOutcome {
    pub fn ok(resources: Vec<UnusedResource>) -> Self {
        Self {
            resources,
            error: None,
        }
    }

    pub fn partial(resources: Vec<UnusedResource>, error: DevcostError) -> Self {
        Self {
            resources,
            error: Some(error),
        }
    }
}

#[async_trait]
pub trait ResourceChecker: Send + Sync {
    /// Checker name for logging (e.g. "ec2-instances").
    fn name(&self) -> &'static str;

    /// Enumerate this kind and classify each resource. Never returns a hard
    /// error; failures land in the outcome so other checkers still run.
    async fn check(&self, window: &TimeWindow, unused_for_days: i64) -> CheckOutcome;
}

/// The fixed checker catalogue, in the order results are merged.
pub fn default_checkers(
    clients: &AwsClients,
    metrics: Arc<dyn MetricsSource>,
) -> Vec<Arc<dyn ResourceChecker>> {
    vec![
        Arc::new(Ec2InstanceChecker::new(clients.ec2.clone(), metrics.clone())),
        Arc::new(EbsVolumeChecker::new(clients.ec2.clone())),
        Arc::new(ElasticIpChecker::new(clients.ec2.clone())),
        Arc::new(RdsInstanceChecker::new(clients.rds.clone(), metrics.clone())),
        Arc::new(BedrockModelChecker::new(clients.bedrock.clone(), metrics.clone())),
        Arc::new(BedrockKnowledgeBaseChecker::new(
            clients.bedrock_agent.clone(),
            metrics.clone(),
        )),
        Arc::new(LambdaFunctionChecker::new(clients.lambda.clone(), metrics.clone())),
        Arc::new(DynamoDbTableChecker::new(clients.dynamodb.clone(), metrics.clone())),
        Arc::new(SecretsChecker::new(clients.secrets.clone())),
        Arc::new(S3BucketChecker::new(clients.s3.clone(), metrics)),
        Arc::new(LoadBalancerChecker::new(clients.elb.clone())),
    ]
}

/// Run every checker in order and merge the results.
///
/// At-least-partial-success policy: individual checker failures are logged
/// and skipped over, but if nothing at all was gathered and at least one
/// checker failed, there is no partial data worth returning and the whole
/// request fails.
pub async fn run_checkers(
    checkers: &[Arc<dyn ResourceChecker>],
    window: &TimeWindow,
    unused_for_days: i64,
) -> Result<Vec<UnusedResource>> {
    let mut all_resources = Vec::new();
    let mut errors = Vec::new();

    for checker in checkers {
        let outcome = checker.check(window, unused_for_days).await;
        all_resources.extend(outcome.resources);
        if let Some(error) = outcome.error {
            warn!("checker {} failed: {}", checker.name(), error);
            errors.push(error);
        }
    }

    if all_resources.is_empty() && !errors.is_empty() {
        // Propagate an auth failure so the handler can fall back to mock data.
        if let Some(idx) = errors.iter().position(|e| e.is_auth_failure()) {
            return Err(errors.swap_remove(idx));
        }
        return Err(DevcostError::Aws(format!(
            "failed to list unused resources: {} errors occurred",
            errors.len()
        )));
    }

    info!("returning {} unused paid resources", all_resources.len());
    Ok(all_resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticChecker {
        name: &'static str,
        outcome_resources: Vec<UnusedResource>,
        fail: bool,
        auth_fail: bool,
    }

    #[async_trait]
    impl ResourceChecker for StaticChecker {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn check(&self, _window: &TimeWindow, _days: i64) -> CheckOutcome {
            let error = if self.auth_fail {
                Some(DevcostError::aws(
                    "listing",
                    "UnrecognizedClientException: bad token",
                ))
            } else if self.fail {
                Some(DevcostError::Aws("listing failed".to_string()))
            } else {
                None
            };
            CheckOutcome {
                resources: self.outcome_resources.clone(),
                error,
            }
        }
    }

    fn resource(id: &str) -> UnusedResource {
        UnusedResource {
            resource_type: "ebs:volume".to_string(),
            resource_id: id.to_string(),
            reason: "Unattached".to_string(),
        }
    }

    fn boxed(c: StaticChecker) -> Arc<dyn ResourceChecker> {
        Arc::new(c)
    }

    #[tokio::test]
    async fn test_merge_preserves_checker_order() {
        let checkers = vec![
            boxed(StaticChecker {
                name: "a",
                outcome_resources: vec![resource("vol-1")],
                fail: false,
                auth_fail: false,
            }),
            boxed(StaticChecker {
                name: "b",
                outcome_resources: vec![resource("vol-2"), resource("vol-3")],
                fail: false,
                auth_fail: false,
            }),
        ];
        let merged = run_checkers(&checkers, &TimeWindow::trailing_week(), 90)
            .await
            .unwrap();
        let ids: Vec<_> = merged.iter().map(|r| r.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["vol-1", "vol-2", "vol-3"]);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_gathered_results() {
        let checkers = vec![
            boxed(StaticChecker {
                name: "a",
                outcome_resources: vec![resource("vol-1")],
                fail: false,
                auth_fail: false,
            }),
            boxed(StaticChecker {
                name: "b",
                outcome_resources: vec![],
                fail: true,
                auth_fail: false,
            }),
        ];
        let merged = run_checkers(&checkers, &TimeWindow::trailing_week(), 90)
            .await
            .unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_results_with_errors_fails() {
        let checkers = vec![boxed(StaticChecker {
            name: "a",
            outcome_resources: vec![],
            fail: true,
            auth_fail: false,
        })];
        let err = run_checkers(&checkers, &TimeWindow::trailing_week(), 90)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to list unused resources"));
    }

    #[tokio::test]
    async fn test_empty_results_with_no_errors_succeeds() {
        let checkers = vec![boxed(StaticChecker {
            name: "a",
            outcome_resources: vec![],
            fail: false,
            auth_fail: false,
        })];
        let merged = run_checkers(&checkers, &TimeWindow::trailing_week(), 90)
            .await
            .unwrap();
        assert!(merged.is_empty());
    }

    #[tokio::test]
    async fn test_auth_failure_surfaces_typed_error() {
        let checkers = vec![boxed(StaticChecker {
            name: "a",
            outcome_resources: vec![],
            fail: false,
            auth_fail: true,
        })];
        let err = run_checkers(&checkers, &TimeWindow::trailing_week(), 90)
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());
    }

    #[tokio::test]
    async fn test_partial_results_survive_checker_partial_error() {
        let checkers = vec![boxed(StaticChecker {
            name: "a",
            outcome_resources: vec![resource("vol-9")],
            fail: true,
            auth_fail: false,
        })];
        let merged = run_checkers(&checkers, &TimeWindow::trailing_week(), 90)
            .await
            .unwrap();
        assert_eq!(merged[0].resource_id, "vol-9");
    }
}
