//! Secrets Manager checker: secrets not accessed within the threshold.
//!
//! This is the one checker driven by the `unusedForDays` threshold alone
//! rather than the query window: Secrets Manager records a last-accessed date
//! directly, so no metrics query is needed.

use async_trait::async_trait;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use chrono::Utc;
use tracing::{debug, info};

use super::{CheckOutcome, ResourceChecker};
use crate::error::DevcostError;
use crate::models::{TimeWindow, UnusedResource};

/// Whether a last-access timestamp (seconds since epoch, `None` when the
/// secret was never read) is older than the threshold.
pub(crate) fn last_access_exceeds(
    last_accessed_secs: Option<i64>,
    now_secs: i64,
    unused_for_days: i64,
) -> bool {
    match last_accessed_secs {
        None => true,
        Some(accessed) => (now_secs - accessed) > unused_for_days * 86_400,
    }
}

pub struct SecretsChecker {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsChecker {
    pub fn new(client: aws_sdk_secretsmanager::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceChecker for SecretsChecker {
    fn name(&self) -> &'static str {
        "secrets"
    }

    async fn check(&self, _window: &TimeWindow, unused_for_days: i64) -> CheckOutcome {
        let mut unused = Vec::new();
        let mut next_token: Option<String> = None;
        let now_secs = Utc::now().timestamp();

        loop {
            let mut request = self.client.list_secrets();
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }
            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    return CheckOutcome::partial(
                        unused,
                        DevcostError::aws("failed to list secrets", DisplayErrorContext(&e)),
                    );
                }
            };

            for secret in response.secret_list() {
                let arn = secret.arn().unwrap_or_default();
                if secret.deleted_date().is_some() {
                    debug!("skipping deleted secret {arn}");
                    continue;
                }
                let last_accessed = secret.last_accessed_date().map(|d| d.secs());
                if last_access_exceeds(last_accessed, now_secs, unused_for_days) {
                    info!("found unused secret: {arn}");
                    unused.push(UnusedResource {
                        resource_type: "secretsmanager:secret".to_string(),
                        resource_id: arn.to_string(),
                        reason: format!("Not accessed in {unused_for_days} days"),
                    });
                }
            }

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        CheckOutcome::ok(unused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 86_400;

    #[test]
    fn test_never_accessed_is_unused() {
        assert!(last_access_exceeds(None, 1_000_000, 90));
    }

    #[test]
    fn test_recent_access_is_used() {
        let now = 200 * DAY;
        assert!(!last_access_exceeds(Some(now - 10 * DAY), now, 90));
    }

    #[test]
    fn test_stale_access_is_unused() {
        let now = 200 * DAY;
        assert!(last_access_exceeds(Some(now - 91 * DAY), now, 90));
    }

    #[test]
    fn test_threshold_boundary_is_used() {
        // Exactly at the threshold does not exceed it.
        let now = 200 * DAY;
        assert!(!last_access_exceeds(Some(now - 90 * DAY), now, 90));
    }
}
