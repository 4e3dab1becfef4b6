//! Bedrock checkers: custom models with no inference calls and knowledge
//! bases with no queries. Only custom (fine-tuned) models are checked since
//! those are the paid inventory.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::{CheckOutcome, ResourceChecker};
use crate::aws::metrics::{has_activity, MetricQuery, MetricsSource, Stat, HOURLY_PERIOD};
use crate::error::{DevcostError, Result};
use crate::models::{TimeWindow, UnusedResource};

pub struct BedrockModelChecker {
    client: aws_sdk_bedrock::Client,
    metrics: Arc<dyn MetricsSource>,
}

impl BedrockModelChecker {
    pub fn new(client: aws_sdk_bedrock::Client, metrics: Arc<dyn MetricsSource>) -> Self {
        Self { client, metrics }
    }
}

pub(crate) async fn is_model_unused(
    metrics: &dyn MetricsSource,
    model_arn: &str,
    window: &TimeWindow,
) -> Result<bool> {
    let query = MetricQuery {
        id: "invocations",
        namespace: "AWS/Bedrock",
        metric_name: "Invocations",
        dimensions: vec![("ModelId", model_arn.to_string())],
        stat: Stat::Sum,
        period: HOURLY_PERIOD,
    };
    let series = metrics.fetch(&[query], window).await?;
    Ok(!has_activity(&series))
}

#[async_trait]
impl ResourceChecker for BedrockModelChecker {
    fn name(&self) -> &'static str {
        "bedrock-models"
    }

    async fn check(&self, window: &TimeWindow, unused_for_days: i64) -> CheckOutcome {
        let response = match self.client.list_custom_models().send().await {
            Ok(r) => r,
            Err(e) => {
                return CheckOutcome::partial(
                    Vec::new(),
                    DevcostError::aws(
                        "failed to list Bedrock custom models",
                        aws_sdk_bedrock::error::DisplayErrorContext(&e),
                    ),
                );
            }
        };

        let mut unused = Vec::new();
        for model in response.model_summaries() {
            let model_arn = model.model_arn();
            match is_model_unused(&*self.metrics, model_arn, window).await {
                Ok(true) => {
                    info!("found unused Bedrock custom model: {model_arn}");
                    unused.push(UnusedResource {
                        resource_type: "bedrock:custom-model".to_string(),
                        resource_id: model_arn.to_string(),
                        reason: format!("No inference calls for {unused_for_days} days"),
                    });
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("failed to check usage for Bedrock model {model_arn}: {e}");
                }
            }
        }
        CheckOutcome::ok(unused)
    }
}

pub struct BedrockKnowledgeBaseChecker {
    client: aws_sdk_bedrockagent::Client,
    metrics: Arc<dyn MetricsSource>,
}

impl BedrockKnowledgeBaseChecker {
    pub fn new(client: aws_sdk_bedrockagent::Client, metrics: Arc<dyn MetricsSource>) -> Self {
        Self { client, metrics }
    }
}

pub(crate) async fn is_knowledge_base_unused(
    metrics: &dyn MetricsSource,
    kb_id: &str,
    window: &TimeWindow,
) -> Result<bool> {
    let query = MetricQuery {
        id: "queries",
        namespace: "AWS/Bedrock",
        metric_name: "KnowledgeBaseQueries",
        dimensions: vec![("KnowledgeBaseId", kb_id.to_string())],
        stat: Stat::Sum,
        period: HOURLY_PERIOD,
    };
    let series = metrics.fetch(&[query], window).await?;
    Ok(!has_activity(&series))
}

#[async_trait]
impl ResourceChecker for BedrockKnowledgeBaseChecker {
    fn name(&self) -> &'static str {
        "bedrock-knowledge-bases"
    }

    async fn check(&self, window: &TimeWindow, unused_for_days: i64) -> CheckOutcome {
        let response = match self.client.list_knowledge_bases().send().await {
            Ok(r) => r,
            Err(e) => {
                return CheckOutcome::partial(
                    Vec::new(),
                    DevcostError::aws(
                        "failed to list Bedrock knowledge bases",
                        aws_sdk_bedrockagent::error::DisplayErrorContext(&e),
                    ),
                );
            }
        };

        let mut unused = Vec::new();
        for kb in response.knowledge_base_summaries() {
            let kb_id = kb.knowledge_base_id();
            match is_knowledge_base_unused(&*self.metrics, kb_id, window).await {
                Ok(true) => {
                    info!("found unused Bedrock knowledge base: {kb_id}");
                    unused.push(UnusedResource {
                        resource_type: "bedrock:knowledge-base".to_string(),
                        resource_id: kb_id.to_string(),
                        reason: format!("No queries for {unused_for_days} days"),
                    });
                }
                Ok(false) => {}
                Err(e) => {
                    warn!("failed to check usage for Bedrock KB {kb_id}: {e}");
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
    async fn test_model_with_no_invocations_is_unused() {
        let metrics = FixtureMetrics::new().with_values("arn:model", vec![0.0, 0.0]);
        assert!(is_model_unused(&metrics, "arn:model", &TimeWindow::trailing_week())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_knowledge_base_with_queries_is_used() {
        let metrics = FixtureMetrics::new().with_values("kb-1", vec![3.0]);
        assert!(
            !is_knowledge_base_unused(&metrics, "kb-1", &TimeWindow::trailing_week())
                .await
                .unwrap()
        );
    }
}
