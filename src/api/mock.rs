//! Canned demo payloads.
//!
//! When upstream credentials are rejected, handlers return these fixed
//! payloads with a warning instead of an error, so the API stays browsable
//! without a billing account behind it.

use std::collections::HashMap;

use crate::models::{ProjectCost, Resource, ResourceCost, TagCost, UnusedResource};

pub const MOCK_WARNING: &str = "Using mock data due to invalid AWS credentials";

pub fn project_costs() -> Vec<ProjectCost> {
    vec![
        ProjectCost {
            project: "dev-cluster".to_string(),
            cost: "100.50".to_string(),
            currency: "USD".to_string(),
        },
        ProjectCost {
            project: "prod-cluster".to_string(),
            cost: "200.75".to_string(),
            currency: "USD".to_string(),
        },
    ]
}

pub fn users() -> Vec<String> {
    vec!["mock-user1".to_string(), "mock-user2".to_string()]
}

pub fn resources() -> Vec<Resource> {
    let tags: HashMap<String, String> =
        [("project".to_string(), "dev-cluster".to_string())].into();
    vec![
        Resource {
            resource_arn: "arn:aws:ec2:us-east-1:123456789012:instance/i-mock123".to_string(),
            resource_type: "ec2:instance".to_string(),
            tags: tags.clone(),
        },
        Resource {
            resource_arn: "arn:aws:s3:::mock-bucket".to_string(),
            resource_type: "s3:bucket".to_string(),
            tags,
        },
    ]
}

pub fn tag_costs(tag_key: &str) -> Vec<TagCost> {
    vec![TagCost {
        tag_key: tag_key.to_string(),
        tag_value: "dev-cluster".to_string(),
        cost: 100.50,
        currency: "USD".to_string(),
        resources: vec![
            ResourceCost {
                resource_type: "ec2:instance".to_string(),
                resource_id: "i-mock123".to_string(),
                cost: 50.25,
            },
            ResourceCost {
                resource_type: "rds:instance".to_string(),
                resource_id: "db-mock789".to_string(),
                cost: 50.25,
            },
        ],
        creator_name: None,
    }]
}

pub fn unused_resources() -> Vec<UnusedResource> {
    let entries = [
        ("ec2:instance", "i-mock123", "CPU utilization <20% for 7 days"),
        ("ebs:volume", "vol-mock456", "Unattached"),
        ("rds:instance", "db-mock789", "Stopped"),
        ("ec2:elastic-ip", "eipalloc-mock012", "Not associated with any resource"),
        ("bedrock:knowledge-base", "kb-mock345", "No queries for 90 days"),
        (
            "lambda:function",
            "arn:aws:lambda:us-east-1:123456789012:function:mock-function",
            "No invocations for 90 days",
        ),
        ("dynamodb:table", "mock-table", "No reads or writes for 90 days"),
        (
            "elasticloadbalancing:loadbalancer",
            "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/app/mock-lb/...",
            "No registered targets",
        ),
    ];
    entries
        .iter()
        .map(|(resource_type, resource_id, reason)| UnusedResource {
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            reason: reason.to_string(),
        })
        .collect()
}
