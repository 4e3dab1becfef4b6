//! EC2 checkers: idle instances, unattached EBS volumes, unassociated
//! Elastic IPs.

use async_trait::async_trait;
use aws_sdk_ec2::error::DisplayErrorContext;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{CheckOutcome, ResourceChecker};
use crate::aws::metrics::{MetricQuery, MetricsSource, Stat, HOURLY_PERIOD};
use crate::error::{DevcostError, Result};
use crate::models::{TimeWindow, UnusedResource};

/// An instance counts as idle only when every hourly average is below this.
const CPU_IDLE_THRESHOLD: f64 = 20.0;
/// Fewer data points than this is insufficient evidence of idleness.
const MIN_CPU_SAMPLES: usize = 3;

/// Idle decision over hourly CPU averages. Empty or sparse series are
/// conservatively treated as not idle.
pub(crate) fn cpu_points_idle(values: &[f64], threshold: f64) -> bool {
    values.len() >= MIN_CPU_SAMPLES && values.iter().all(|v| *v < threshold)
}

pub struct Ec2InstanceChecker {
    client: aws_sdk_ec2::Client,
    metrics: Arc<dyn MetricsSource>,
}

impl Ec2InstanceChecker {
    pub fn new(client: aws_sdk_ec2::Client, metrics: Arc<dyn MetricsSource>) -> Self {
        Self { client, metrics }
    }
}

/// Only running instances can be idle; everything else is skipped.
pub(crate) fn instance_is_running(state_name: Option<&str>) -> bool {
    state_name == Some("running")
}

/// Classify one instance. Non-running instances never enter the idle-CPU
/// path; their metrics are not even fetched.
pub(crate) async fn classify_instance(
    metrics: &dyn MetricsSource,
    state_name: Option<&str>,
    instance_id: &str,
    window: &TimeWindow,
) -> Result<Option<UnusedResource>> {
    if !instance_is_running(state_name) {
        return Ok(None);
    }
    if is_instance_idle(metrics, instance_id, window).await? {
        return Ok(Some(UnusedResource {
            resource_type: "ec2:instance".to_string(),
            resource_id: instance_id.to_string(),
            reason: "CPU utilization <20% for 7 days".to_string(),
        }));
    }
    Ok(None)
}

/// Whether an instance's CPU stayed under 20% across the window.
pub(crate) async fn is_instance_idle(
    metrics: &dyn MetricsSource,
    instance_id: &str,
    window: &TimeWindow,
) -> Result<bool> {
    let query = MetricQuery {
        id: "cpu",
        namespace: "AWS/EC2",
        metric_name: "CPUUtilization",
        dimensions: vec![("InstanceId", instance_id.to_string())],
        stat: Stat::Average,
        period: HOURLY_PERIOD,
    };
    let series = metrics.fetch(&[query], window).await?;
    let values = series.first().map(|s| s.values.as_slice()).unwrap_or(&[]);
    if values.is_empty() {
        debug!("no CPU metrics for instance {instance_id}");
        return Ok(false);
    }
    if values.len() < MIN_CPU_SAMPLES {
        debug!(
            "insufficient CPU metrics ({} points) for instance {instance_id}",
            values.len()
        );
        return Ok(false);
    }
    Ok(cpu_points_idle(values, CPU_IDLE_THRESHOLD))
}

#[async_trait]
impl ResourceChecker for Ec2InstanceChecker {
    fn name(&self) -> &'static str {
        "ec2-instances"
    }

    async fn check(&self, window: &TimeWindow, _unused_for_days: i64) -> CheckOutcome {
        let response = match self.client.describe_instances().send().await {
            Ok(r) => r,
            Err(e) => {
                return CheckOutcome::partial(
                    Vec::new(),
                    DevcostError::aws(
                        "failed to describe EC2 instances",
                        DisplayErrorContext(&e),
                    ),
                );
            }
        };

        let mut unused = Vec::new();
        for reservation in response.reservations() {
            for instance in reservation.instances() {
                let Some(instance_id) = instance.instance_id() else {
                    continue;
                };
                let state_name = instance
                    .state()
                    .and_then(|s| s.name())
                    .map(|n| n.as_str());
                match classify_instance(&*self.metrics, state_name, instance_id, window).await {
                    Ok(Some(resource)) => {
                        info!("found unused EC2 instance: {instance_id}");
                        unused.push(resource);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("failed to check idle status for instance {instance_id}: {e}");
                    }
                }
            }
        }
        CheckOutcome::ok(unused)
    }
}

pub struct EbsVolumeChecker {
    client: aws_sdk_ec2::Client,
}

impl EbsVolumeChecker {
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceChecker for EbsVolumeChecker {
    fn name(&self) -> &'static str {
        "ebs-volumes"
    }

    async fn check(&self, _window: &TimeWindow, _unused_for_days: i64) -> CheckOutcome {
        let response = match self.client.describe_volumes().send().await {
            Ok(r) => r,
            Err(e) => {
                return CheckOutcome::partial(
                    Vec::new(),
                    DevcostError::aws("failed to describe EBS volumes", DisplayErrorContext(&e)),
                );
            }
        };

        let mut unused = Vec::new();
        for volume in response.volumes() {
            if volume.attachments().is_empty() {
                let volume_id = volume.volume_id().unwrap_or_default();
                info!("found unused EBS volume: {volume_id}");
                unused.push(UnusedResource {
                    resource_type: "ebs:volume".to_string(),
                    resource_id: volume_id.to_string(),
                    reason: "Unattached".to_string(),
                });
            }
        }
        CheckOutcome::ok(unused)
    }
}

pub struct ElasticIpChecker {
    client: aws_sdk_ec2::Client,
}

impl ElasticIpChecker {
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceChecker for ElasticIpChecker {
    fn name(&self) -> &'static str {
        "elastic-ips"
    }

    async fn check(&self, _window: &TimeWindow, _unused_for_days: i64) -> CheckOutcome {
        let response = match self.client.describe_addresses().send().await {
            Ok(r) => r,
            Err(e) => {
                return CheckOutcome::partial(
                    Vec::new(),
                    DevcostError::aws("failed to describe Elastic IPs", DisplayErrorContext(&e)),
                );
            }
        };

        let mut unused = Vec::new();
        for address in response.addresses() {
            if address.association_id().is_none() {
                let allocation_id = address.allocation_id().unwrap_or_default();
                info!("found unused Elastic IP: {allocation_id}");
                unused.push(UnusedResource {
                    resource_type: "ec2:elastic-ip".to_string(),
                    resource_id: allocation_id.to_string(),
                    reason: "Not associated with any resource".to_string(),
                });
            }
        }
        CheckOutcome::ok(unused)
    }
}
