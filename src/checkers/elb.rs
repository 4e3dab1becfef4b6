//! Load balancer checker: ALBs/NLBs whose target groups have no registered
//! targets at all.

use async_trait::async_trait;
use aws_sdk_elasticloadbalancingv2::error::DisplayErrorContext;
use tracing::info;

use super::{CheckOutcome, ResourceChecker};
use crate::error::{DevcostError, Result};
use crate::models::{TimeWindow, UnusedResource};

pub struct LoadBalancerChecker {
    client: aws_sdk_elasticloadbalancingv2::Client,
}

impl LoadBalancerChecker {
    pub fn new(client: aws_sdk_elasticloadbalancingv2::Client) -> Self {
        Self { client }
    }

    /// True when no target group of this load balancer reports any target
    /// health descriptions.
    async fn has_no_targets(&self, lb_arn: &str) -> Result<bool> {
        let target_groups = self
            .client
            .describe_target_groups()
            .load_balancer_arn(lb_arn)
            .send()
            .await
            .map_err(|e| {
                DevcostError::aws(
                    &format!("failed to describe target groups for {lb_arn}"),
                    DisplayErrorContext(&e),
                )
            })?;

        for tg in target_groups.target_groups() {
            let Some(tg_arn) = tg.target_group_arn() else {
                continue;
            };
            let health = self
                .client
                .describe_target_health()
                .target_group_arn(tg_arn)
                .send()
                .await
                .map_err(|e| {
                    DevcostError::aws(
                        &format!("failed to describe target health for {tg_arn}"),
                        DisplayErrorContext(&e),
                    )
                })?;
            if !health.target_health_descriptions().is_empty() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl ResourceChecker for LoadBalancerChecker {
    fn name(&self) -> &'static str {
        "load-balancers"
    }

    async fn check(&self, _window: &TimeWindow, _unused_for_days: i64) -> CheckOutcome {
        let response = match self.client.describe_load_balancers().send().await {
            Ok(r) => r,
            Err(e) => {
                return CheckOutcome::partial(
                    Vec::new(),
                    DevcostError::aws(
                        "failed to describe load balancers",
                        DisplayErrorContext(&e),
                    ),
                );
            }
        };

        let mut unused = Vec::new();
        for lb in response.load_balancers() {
            let Some(lb_arn) = lb.load_balancer_arn() else {
                continue;
            };
            match self.has_no_targets(lb_arn).await {
                Ok(true) => {
                    info!("found unused load balancer: {lb_arn}");
                    unused.push(UnusedResource {
                        resource_type: "elasticloadbalancing:loadbalancer".to_string(),
                        resource_id: lb_arn.to_string(),
                        reason: "No registered targets".to_string(),
                    });
                }
                Ok(false) => {}
                Err(e) => {
                    return CheckOutcome::partial(unused, e);
                }
            }
        }
        CheckOutcome::ok(unused)
    }
}
