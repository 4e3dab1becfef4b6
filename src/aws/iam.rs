//! IAM lookups: account usernames and `aws:createdBy` principal resolution.

use async_trait::async_trait;
use aws_sdk_iam::error::DisplayErrorContext;
use tracing::warn;

use crate::error::{DevcostError, Result};

/// The system tag whose values encode the creating principal.
pub const CREATED_BY_TAG: &str = "aws:createdBy";

/// All IAM usernames in the account, following marker pagination.
pub async fn list_usernames(client: &aws_sdk_iam::Client) -> Result<Vec<String>> {
    let mut usernames = Vec::new();
    let mut marker: Option<String> = None;

    loop {
        let mut request = client.list_users();
        if let Some(m) = &marker {
            request = request.marker(m);
        }
        let response = request.send().await.map_err(|e| {
            DevcostError::aws("failed to list IAM users", DisplayErrorContext(&e))
        })?;

        for user in response.users() {
            usernames.push(user.user_name().to_string());
        }

        if !response.is_truncated() {
            break;
        }
        marker = response.marker().map(str::to_string);
        if marker.is_none() {
            break;
        }
    }

    Ok(usernames)
}

/// Resolves an `aws:createdBy` tag value to a human-readable principal name.
/// Abstracted behind a trait so the tag-cost aggregation can be tested with a
/// canned resolver.
#[async_trait]
pub trait CreatorResolver: Send + Sync {
    /// Returns the display name for a raw tag value. Never fails: unknown
    /// formats and lookup errors fall back to the raw value.
    async fn resolve(&self, tag_value: &str) -> String;
}

/// `type:principalID` split of a created-by tag value.
fn split_principal(tag_value: &str) -> Option<(&str, &str)> {
    let mut parts = tag_value.splitn(3, ':');
    match (parts.next(), parts.next()) {
        (Some(kind), Some(id)) if !id.is_empty() => Some((kind, id)),
        _ => None,
    }
}

/// IAM-backed resolver.
pub struct IamCreatorResolver {
    client: aws_sdk_iam::Client,
}

impl IamCreatorResolver {
    pub fn new(client: aws_sdk_iam::Client) -> Self {
        Self { client }
    }

    async fn user_name_by_id(&self, user_id: &str) -> Result<Option<String>> {
        let response = self.client.list_users().send().await.map_err(|e| {
            DevcostError::aws("failed to list IAM users", DisplayErrorContext(&e))
        })?;
        Ok(response
            .users()
            .iter()
            .find(|u| u.user_id() == user_id)
            .map(|u| u.user_name().to_string()))
    }

    async fn role_name_by_id(&self, role_id: &str) -> Result<Option<String>> {
        let response = self.client.list_roles().send().await.map_err(|e| {
            DevcostError::aws("failed to list IAM roles", DisplayErrorContext(&e))
        })?;
        Ok(response
            .roles()
            .iter()
            .find(|r| r.role_id() == role_id)
            .map(|r| r.role_name().to_string()))
    }
}

#[async_trait]
impl CreatorResolver for IamCreatorResolver {
    async fn resolve(&self, tag_value: &str) -> String {
        let Some((kind, id)) = split_principal(tag_value) else {
            return tag_value.to_string();
        };
        let looked_up = match kind {
            "IAMUser" => self.user_name_by_id(id).await,
            "AssumedRole" => self.role_name_by_id(id).await,
            "Root" => return "Root Account".to_string(),
            _ => return tag_value.to_string(),
        };
        match looked_up {
            Ok(Some(name)) => name,
            Ok(None) => tag_value.to_string(),
            Err(e) => {
                warn!("failed to resolve creator for {tag_value}: {e}");
                tag_value.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_principal() {
        assert_eq!(
            split_principal("IAMUser:AIDACKCEVSQ6C2EXAMPLE"),
            Some(("IAMUser", "AIDACKCEVSQ6C2EXAMPLE"))
        );
        assert_eq!(split_principal("Root:123456789012"), Some(("Root", "123456789012")));
        assert_eq!(split_principal("no-colon-here"), None);
        assert_eq!(split_principal("trailing:"), None);
    }

    #[test]
    fn test_split_principal_keeps_extra_segments_intact() {
        // Session names can contain further colons; only the first two matter.
        assert_eq!(
            split_principal("AssumedRole:AROAEXAMPLE:session"),
            Some(("AssumedRole", "AROAEXAMPLE"))
        );
    }
}
