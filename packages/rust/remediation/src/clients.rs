//! Cloud-facing operations the evaluator depends on.

use serde::Serialize;

use coursekit_shared::Result;

/// The four S3 public-access-block flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublicAccessBlock {
    pub block_public_acls: bool,
    pub ignore_public_acls: bool,
    pub block_public_policy: bool,
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlock {
    /// Every flag set.
    pub const FULLY_BLOCKED: Self = Self {
        block_public_acls: true,
        ignore_public_acls: true,
        block_public_policy: true,
        restrict_public_buckets: true,
    };

    pub fn is_fully_blocked(&self) -> bool {
        *self == Self::FULLY_BLOCKED
    }
}

/// Workflow status written back to a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    Resolved,
    Notified,
}

/// A status + note update for one finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingUpdate {
    pub finding_id: String,
    pub product_arn: String,
    pub status: WorkflowStatus,
    pub note: String,
    pub updated_by: String,
}

/// Read/write access to a bucket's public-access-block configuration.
#[async_trait::async_trait]
pub trait BucketAccess: Send + Sync {
    /// Current configuration; `None` when the bucket has none at all.
    async fn get_public_access_block(&self, bucket: &str) -> Result<Option<PublicAccessBlock>>;

    async fn put_public_access_block(&self, bucket: &str, config: PublicAccessBlock) -> Result<()>;
}

/// Workflow updates on the originating finding.
#[async_trait::async_trait]
pub trait FindingTracker: Send + Sync {
    async fn update_finding(&self, update: &FindingUpdate) -> Result<()>;
}

/// Outbound notification channel.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, topic: &str, subject: &str, message: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_blocked_requires_all_four() {
        assert!(PublicAccessBlock::FULLY_BLOCKED.is_fully_blocked());
        let partial = PublicAccessBlock {
            block_public_acls: false,
            ..PublicAccessBlock::FULLY_BLOCKED
        };
        assert!(!partial.is_fully_blocked());
        assert!(!PublicAccessBlock::default().is_fully_blocked());
    }

    #[test]
    fn workflow_status_wire_names() {
        assert_eq!(serde_json::to_string(&WorkflowStatus::Resolved).expect("ser"), "\"RESOLVED\"");
        assert_eq!(serde_json::to_string(&WorkflowStatus::Notified).expect("ser"), "\"NOTIFIED\"");
    }
}
