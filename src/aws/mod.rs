//! AWS query layer.
//!
//! One client per service, constructed once from the resolved `SdkConfig` and
//! injected into whatever needs it. Submodules:
//! - `metrics`: CloudWatch metric queries behind the `MetricsSource` trait
//! - `cost`: Cost Explorer aggregations (by tag, by project)
//! - `iam`: IAM username listing and created-by principal resolution
//! - `tagging`: Resource Groups Tagging lookup and ARN classification

pub mod cost;
pub mod iam;
pub mod metrics;
pub mod tagging;

use aws_config::SdkConfig;

/// All upstream service clients, built once per process.
#[derive(Clone)]
pub struct AwsClients {
    pub ec2: aws_sdk_ec2::Client,
    pub rds: aws_sdk_rds::Client,
    pub lambda: aws_sdk_lambda::Client,
    pub dynamodb: aws_sdk_dynamodb::Client,
    pub bedrock: aws_sdk_bedrock::Client,
    pub bedrock_agent: aws_sdk_bedrockagent::Client,
    pub secrets: aws_sdk_secretsmanager::Client,
    pub s3: aws_sdk_s3::Client,
    pub elb: aws_sdk_elasticloadbalancingv2::Client,
    pub cloudwatch: aws_sdk_cloudwatch::Client,
    pub cost_explorer: aws_sdk_costexplorer::Client,
    pub iam: aws_sdk_iam::Client,
    pub tagging: aws_sdk_resourcegroupstagging::Client,
}

impl AwsClients {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            ec2: aws_sdk_ec2::Client::new(config),
            rds: aws_sdk_rds::Client::new(config),
            lambda: aws_sdk_lambda::Client::new(config),
            dynamodb: aws_sdk_dynamodb::Client::new(config),
            bedrock: aws_sdk_bedrock::Client::new(config),
            bedrock_agent: aws_sdk_bedrockagent::Client::new(config),
            secrets: aws_sdk_secretsmanager::Client::new(config),
            s3: aws_sdk_s3::Client::new(config),
            elb: aws_sdk_elasticloadbalancingv2::Client::new(config),
            cloudwatch: aws_sdk_cloudwatch::Client::new(config),
            cost_explorer: aws_sdk_costexplorer::Client::new(config),
            iam: aws_sdk_iam::Client::new(config),
            tagging: aws_sdk_resourcegroupstagging::Client::new(config),
        }
    }
}
