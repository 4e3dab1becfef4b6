//! Resource lookup by tag via the Resource Groups Tagging API.

use aws_sdk_resourcegroupstagging::error::DisplayErrorContext;
use aws_sdk_resourcegroupstagging::types::TagFilter;
use std::collections::HashMap;
use tracing::debug;

use crate::aws::AwsClients;
use crate::error::{DevcostError, Result};
use crate::models::Resource;

/// Fetch every resource carrying `tag_key=tag_value`, following pagination
/// tokens until exhausted.
pub async fn resources_by_tag(
    clients: &AwsClients,
    tag_key: &str,
    tag_value: &str,
) -> Result<Vec<Resource>> {
    let filter = TagFilter::builder().key(tag_key).values(tag_value).build();

    let mut resources = Vec::new();
    let mut pagination_token: Option<String> = None;

    loop {
        let mut request = clients.tagging.get_resources().tag_filters(filter.clone());
        if let Some(token) = &pagination_token {
            request = request.pagination_token(token);
        }
        let response = request.send().await.map_err(|e| {
            DevcostError::aws(
                &format!("failed to get resources by tag {tag_key}={tag_value}"),
                DisplayErrorContext(&e),
            )
        })?;

        for mapping in response.resource_tag_mapping_list() {
            let arn = mapping.resource_arn().unwrap_or_default().to_string();
            let tags: HashMap<String, String> = mapping
                .tags()
                .iter()
                .map(|t| (t.key().to_string(), t.value().to_string()))
                .collect();
            debug!(%arn, "found resource with tag {}={}", tag_key, tag_value);
            resources.push(Resource {
                resource_type: resource_type_from_arn(&arn),
                resource_arn: arn,
                tags,
            });
        }

        pagination_token = response
            .pagination_token()
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        if pagination_token.is_none() {
            break;
        }
    }

    Ok(resources)
}

/// Derive a `service:kind` label from an ARN.
///
/// ARNs are `arn:partition:service:region:account:resource[...]`; the label
/// comes from the service segment and the first `/`-delimited token of the
/// resource segment, which keeps any further colons (RDS and Lambda encode
/// the kind as `db:...` / `function:...`). Malformed ARNs (<6 colon
/// segments) label as `unknown`.
pub fn resource_type_from_arn(arn: &str) -> String {
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    if parts.len() < 6 {
        return "unknown".to_string();
    }
    let service = parts[2];
    let resource = parts[5];
    match (service, resource) {
        ("ec2", r) if r.starts_with("instance/") => "ec2:instance".to_string(),
        ("ec2", r) if r.starts_with("volume/") => "ebs:volume".to_string(),
        ("ec2", r) if r.starts_with("eipalloc/") => "ec2:elastic-ip".to_string(),
        ("rds", r) if r.starts_with("db:") => "rds:instance".to_string(),
        ("lambda", r) if r.starts_with("function:") => "lambda:function".to_string(),
        ("dynamodb", r) if r.starts_with("table/") => "dynamodb:table".to_string(),
        ("elasticloadbalancing", r) if r.starts_with("loadbalancer/") => {
            "elasticloadbalancing:loadbalancer".to_string()
        }
        (service, resource) => {
            let kind = resource.split('/').next().unwrap_or(resource);
            format!("{service}:{kind}")
        }
    }
}
