//! Cost Explorer aggregations.
//!
//! `tag_costs` answers "what did each value of this tag cost, per service";
//! `project_costs` is the simpler per-`project`-tag rollup. Both query
//! UnblendedCost at daily granularity and sum over the window.

use aws_sdk_costexplorer::error::DisplayErrorContext;
use aws_sdk_costexplorer::types::{
    DateInterval, Granularity, GroupDefinition, GroupDefinitionType,
};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::aws::iam::{CreatorResolver, CREATED_BY_TAG};
use crate::aws::AwsClients;
use crate::error::{DevcostError, Result};
use crate::models::{ProjectCost, ResourceCost, TagCost, TimeWindow};

const UNBLENDED_COST: &str = "UnblendedCost";

/// One `(tag value, service, amount)` cell parsed out of a Cost Explorer
/// response. Aggregation operates on these rows so it can be tested against
/// fixtures.
#[derive(Debug, Clone)]
pub struct CostRow {
    pub tag_value: String,
    pub service: String,
    pub amount: f64,
}

/// Costs grouped by `tag_key` value with a nested per-service breakdown.
///
/// Fails with `TagNotActive` when the key is not registered as a cost
/// allocation tag. For the `aws:createdBy` key, each tag value is resolved to
/// a principal display name, once per distinct value.
pub async fn tag_costs(
    clients: &AwsClients,
    resolver: &dyn CreatorResolver,
    tag_key: &str,
    window: &TimeWindow,
) -> Result<Vec<TagCost>> {
    ensure_tag_active(clients, tag_key).await?;

    let response = clients
        .cost_explorer
        .get_cost_and_usage()
        .time_period(
            DateInterval::builder()
                .start(window.start_date())
                .end(window.end_date())
                .build()
                .map_err(|e| DevcostError::Aws(format!("invalid date interval: {e}")))?,
        )
        .granularity(Granularity::Daily)
        .metrics(UNBLENDED_COST)
        .group_by(
            GroupDefinition::builder()
                .r#type(GroupDefinitionType::Tag)
                .key(tag_key)
                .build(),
        )
        .group_by(
            GroupDefinition::builder()
                .r#type(GroupDefinitionType::Dimension)
                .key("SERVICE")
                .build(),
        )
        .send()
        .await
        .map_err(|e| {
            DevcostError::aws(
                &format!("failed to fetch costs for tag '{tag_key}'"),
                DisplayErrorContext(&e),
            )
        })?;

    let mut rows = Vec::new();
    for result in response.results_by_time() {
        for group in result.groups() {
            let keys = group.keys();
            let (Some(tag_value), Some(service)) = (keys.first(), keys.get(1)) else {
                continue;
            };
            let Some(amount_str) = group
                .metrics()
                .and_then(|m| m.get(UNBLENDED_COST))
                .and_then(|m| m.amount())
            else {
                continue;
            };
            match amount_str.parse::<f64>() {
                Ok(amount) => rows.push(CostRow {
                    tag_value: tag_value.clone(),
                    service: service.clone(),
                    amount,
                }),
                Err(e) => {
                    warn!("failed to parse cost for tag {tag_key}={tag_value}, service {service}: {e}");
                }
            }
        }
    }

    let mut costs = aggregate_tag_costs(tag_key, &rows);

    if tag_key == CREATED_BY_TAG {
        for cost in &mut costs {
            cost.creator_name = Some(resolver.resolve(&cost.tag_value).await);
        }
    }

    if costs.is_empty() {
        debug!(
            "no costs found for tag {tag_key} from {} to {}",
            window.start_date(),
            window.end_date()
        );
    }
    Ok(costs)
}

/// Verify the tag key is registered as a cost allocation tag upstream.
async fn ensure_tag_active(clients: &AwsClients, tag_key: &str) -> Result<()> {
    let response = clients
        .cost_explorer
        .list_cost_allocation_tags()
        .send()
        .await
        .map_err(|e| {
            DevcostError::aws(
                &format!("failed to validate tag '{tag_key}'"),
                DisplayErrorContext(&e),
            )
        })?;

    let active = response
        .cost_allocation_tags()
        .iter()
        .any(|t| t.tag_key() == tag_key);
    if active {
        Ok(())
    } else {
        Err(DevcostError::TagNotActive {
            tag_key: tag_key.to_string(),
        })
    }
}

/// Fold cost rows into one `TagCost` per cleaned tag value.
///
/// Cost Explorer encodes tag-grouped keys as `"tagKey$value"`; the prefix is
/// stripped, and rows whose cleaned value is empty (untagged spend) are
/// dropped. Output order is unspecified.
pub fn aggregate_tag_costs(tag_key: &str, rows: &[CostRow]) -> Vec<TagCost> {
    let prefix = format!("{tag_key}$");

    struct Bucket {
        total: f64,
        by_service: HashMap<String, f64>,
    }
    let mut buckets: HashMap<String, Bucket> = HashMap::new();

    for row in rows {
        let cleaned = row
            .tag_value
            .strip_prefix(&prefix)
            .unwrap_or(&row.tag_value);
        if cleaned.is_empty() {
            debug!("skipping untagged spend for tag {tag_key}, service {}", row.service);
            continue;
        }
        let bucket = buckets.entry(cleaned.to_string()).or_insert(Bucket {
            total: 0.0,
            by_service: HashMap::new(),
        });
        bucket.total += row.amount;
        *bucket.by_service.entry(row.service.clone()).or_insert(0.0) += row.amount;
    }

    buckets
        .into_iter()
        .map(|(tag_value, bucket)| TagCost {
            tag_key: tag_key.to_string(),
            tag_value,
            cost: bucket.total,
            currency: "USD".to_string(),
            resources: bucket
                .by_service
                .into_iter()
                .map(|(service, cost)| ResourceCost {
                    resource_type: service,
                    resource_id: String::new(),
                    cost,
                })
                .collect(),
            creator_name: None,
        })
        .collect()
}

/// Costs grouped by the `project` tag over the window. Amount strings and
/// currency units are passed through from Cost Explorer verbatim.
pub async fn project_costs(clients: &AwsClients, window: &TimeWindow) -> Result<Vec<ProjectCost>> {
    let response = clients
        .cost_explorer
        .get_cost_and_usage()
        .time_period(
            DateInterval::builder()
                .start(window.start_date())
                .end(window.end_date())
                .build()
                .map_err(|e| DevcostError::Aws(format!("invalid date interval: {e}")))?,
        )
        .granularity(Granularity::Daily)
        .metrics(UNBLENDED_COST)
        .group_by(
            GroupDefinition::builder()
                .r#type(GroupDefinitionType::Tag)
                .key("project")
                .build(),
        )
        .send()
        .await
        .map_err(|e| {
            DevcostError::aws("failed to fetch project costs", DisplayErrorContext(&e))
        })?;

    let mut costs = Vec::new();
    for result in response.results_by_time() {
        for group in result.groups() {
            let Some(project) = group.keys().first() else {
                continue;
            };
            let Some(metric) = group.metrics().and_then(|m| m.get(UNBLENDED_COST)) else {
                continue;
            };
            costs.push(ProjectCost {
                project: project.clone(),
                cost: metric.amount().unwrap_or_default().to_string(),
                currency: metric.unit().unwrap_or("USD").to_string(),
            });
        }
    }
    Ok(costs)
}
