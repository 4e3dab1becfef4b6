//! DynamoDB checker: tables with no consumed read or write capacity.

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use std::sync::Arc;
use tracing::{info, warn};

use super::{CheckOutcome, ResourceChecker};
use crate::aws::metrics::{has_activity, MetricQuery, MetricsSource, Stat, HOURLY_PERIOD};
use crate::error::{DevcostError, Result};
use crate::models::{TimeWindow, UnusedResource};

pub struct DynamoDbTableChecker {
    client: aws_sdk_dynamodb::Client,
    metrics: Arc<dyn MetricsSource>,
}

impl DynamoDbTableChecker {
    pub fn new(client: aws_sdk_dynamodb::Client, metrics: Arc<dyn MetricsSource>) -> Self {
        Self { client, metrics }
    }
}

pub(crate) async fn is_table_unused(
    metrics: &dyn MetricsSource,
    table_name: &str,
    window: &TimeWindow,
) -> Result<bool> {
    let queries = [
        MetricQuery {
            id: "reads",
            namespace: "AWS/DynamoDB",
            metric_name: "ConsumedReadCapacityUnits",
            dimensions: vec![("TableName", table_name.to_string())],
            stat: Stat::Sum,
            period: HOURLY_PERIOD,
        },
        MetricQuery {
            id: "writes",
            namespace: "AWS/DynamoDB",
            metric_name: "ConsumedWriteCapacityUnits",
            dimensions: vec![("TableName", table_name.to_string())],
            stat: Stat::Sum,
            period: HOURLY_PERIOD,
        },
    ];
    let series = metrics.fetch(&queries, window).await?;
    Ok(!has_activity(&series))
}

#[async_trait]
impl ResourceChecker for DynamoDbTableChecker {
    fn name(&self) -> &'static str {
        "dynamodb-tables"
    }

    async fn check(&self, window: &TimeWindow, unused_for_days: i64) -> CheckOutcome {
        let response = match self.client.list_tables().send().await {
            Ok(r) => r,
            Err(e) => {
                return CheckOutcome::partial(
                    Vec::new(),
                    DevcostError::aws("failed to list DynamoDB tables", DisplayErrorContext(&e)),
                );
            }
        };

        let mut unused = Vec::new();
        for table_name in response.table_names() {
            match is_table_unused(&*self.metrics, table_name, window).await {
                Ok(true) => {
                    info!("found unused DynamoDB table: {table_name}");
                    unused.push(UnusedResource {
                        resource_type: "dynamodb:table".to_string(),
                        resource_id: table_name.clone(),
                        reason: format!("No reads or writes for {unused_for_days} days"),
                    });
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("failed to check usage for DynamoDB table {table_name}: {e}");
                }
            }
        }
        CheckOutcome::ok(unused)
    }
}
