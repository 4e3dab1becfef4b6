//! CloudWatch metric queries.
//!
//! Checkers never talk to CloudWatch directly; they go through the
//! `MetricsSource` trait so classification logic can be exercised against
//! fixture data in tests. The real implementation wraps `GetMetricData`.

use async_trait::async_trait;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{Dimension, Metric, MetricDataQuery, MetricStat};

use crate::error::{DevcostError, Result};
use crate::models::TimeWindow;

/// One-hour buckets, the granularity every utilization check uses.
pub const HOURLY_PERIOD: i32 = 3600;
/// Daily buckets, used for the S3 request-count check.
pub const DAILY_PERIOD: i32 = 86400;

/// How a metric's data points are combined per bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Average,
    Sum,
}

impl Stat {
    fn as_str(&self) -> &'static str {
        match self {
            Stat::Average => "Average",
            Stat::Sum => "Sum",
        }
    }
}

/// A single metric to fetch over a window.
#[derive(Debug, Clone)]
pub struct MetricQuery {
    /// Query id, also used to label the series in results.
    pub id: &'static str,
    pub namespace: &'static str,
    pub metric_name: &'static str,
    pub dimensions: Vec<(&'static str, String)>,
    pub stat: Stat,
    pub period: i32,
}

/// One returned time series (timestamps are not needed by any check).
#[derive(Debug, Clone)]
pub struct MetricSeries {
    pub id: String,
    pub values: Vec<f64>,
}

#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch every requested series over the window. Series order follows
    /// query order; a query with no data yields an empty `values`.
    async fn fetch(&self, queries: &[MetricQuery], window: &TimeWindow)
        -> Result<Vec<MetricSeries>>;
}

/// True when any series carries a data point above zero. Zero-activity checks
/// (invocations, queries, requests, capacity units) classify a resource as
/// unused exactly when this is false: no data at all and all-zero series both
/// mean no usage signal.
pub fn has_activity(series: &[MetricSeries]) -> bool {
    series.iter().any(|s| s.values.iter().any(|v| *v > 0.0))
}

/// The real CloudWatch-backed source.
pub struct CloudWatchMetrics {
    client: aws_sdk_cloudwatch::Client,
}

impl CloudWatchMetrics {
    pub fn new(client: aws_sdk_cloudwatch::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MetricsSource for CloudWatchMetrics {
    async fn fetch(
        &self,
        queries: &[MetricQuery],
        window: &TimeWindow,
    ) -> Result<Vec<MetricSeries>> {
        let mut request = self
            .client
            .get_metric_data()
            .start_time(DateTime::from_secs(window.start.timestamp()))
            .end_time(DateTime::from_secs(window.end.timestamp()));

        for query in queries {
            let mut metric = Metric::builder()
                .namespace(query.namespace)
                .metric_name(query.metric_name);
            for (name, value) in &query.dimensions {
                metric = metric.dimensions(Dimension::builder().name(*name).value(value).build());
            }
            request = request.metric_data_queries(
                MetricDataQuery::builder()
                    .id(query.id)
                    .metric_stat(
                        MetricStat::builder()
                            .metric(metric.build())
                            .period(query.period)
                            .stat(query.stat.as_str())
                            .build(),
                    )
                    .build(),
            );
        }

        let response = request.send().await.map_err(|e| {
            DevcostError::aws("failed to fetch CloudWatch metrics", DisplayErrorContext(&e))
        })?;

        let series = response
            .metric_data_results()
            .iter()
            .map(|r| MetricSeries {
                id: r.id().unwrap_or_default().to_string(),
                values: r.values().to_vec(),
            })
            .collect();
        Ok(series)
    }
}


#[cfg(test)]
pub mod testing {
    //! Fixture metrics source for checker tests.

    use super::*;
    use std::collections::HashMap;

    /// Returns canned series keyed by the first dimension value of each query,
    /// mimicking per-resource CloudWatch responses.
    pub struct FixtureMetrics {
        by_dimension: HashMap<String, Vec<MetricSeries>>,
    }

    impl FixtureMetrics {
        pub fn new() -> Self {
            Self {
                by_dimension: HashMap::new(),
            }
        }

        pub fn with_series(
            mut self,
            dimension_value: &str,
            series: Vec<MetricSeries>,
        ) -> Self {
            self.by_dimension
                .insert(dimension_value.to_string(), series);
            self
        }

        pub fn with_values(self, dimension_value: &str, values: Vec<f64>) -> Self {
            let series = vec![MetricSeries {
                id: "fixture".to_string(),
                values,
            }];
            self.with_series(dimension_value, series)
        }
    }

    #[async_trait]
    impl MetricsSource for FixtureMetrics {
        async fn fetch(
            &self,
            queries: &[MetricQuery],
            _window: &TimeWindow,
        ) -> Result<Vec<MetricSeries>> {
            let key = queries
                .first()
                .and_then(|q| q.dimensions.first())
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            Ok(self.by_dimension.get(&key).cloned().unwrap_or_default())
        }
    }

    /// A source whose every fetch fails, for partial-failure tests.
    pub struct FailingMetrics;

    #[async_trait]
    impl MetricsSource for FailingMetrics {
        async fn fetch(
            &self,
            _queries: &[MetricQuery],
            _window: &TimeWindow,
        ) -> Result<Vec<MetricSeries>> {
            Err(DevcostError::Aws("metrics unavailable".to_string()))
        }
    }
}
