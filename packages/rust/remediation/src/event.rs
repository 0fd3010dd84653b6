//! Security Hub finding events as delivered by EventBridge.

use serde::{Deserialize, Serialize};

/// The only resource type the handler acts on.
pub const S3_BUCKET_RESOURCE_TYPE: &str = "AwsS3Bucket";

/// EventBridge envelope: `{ "detail": { "findings": [...] } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityHubEvent {
    #[serde(default)]
    pub detail: EventDetail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDetail {
    #[serde(default)]
    pub findings: Vec<Finding>,
}

/// One finding record (ASFF subset).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Finding {
    #[serde(default = "unknown_id")]
    pub id: String,
    #[serde(default)]
    pub product_arn: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

fn unknown_id() -> String {
    "unknown".into()
}

/// A resource referenced by a finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "Type", default)]
    pub resource_type: String,
    /// Colon-delimited locator, e.g. `arn:aws:s3:::my-bucket`.
    #[serde(rename = "Id", default)]
    pub id: String,
}

impl Finding {
    /// Name of the first S3 bucket resource, if any.
    ///
    /// Only the first matching resource is considered even when a finding
    /// lists several buckets.
    pub fn bucket_name(&self) -> Option<String> {
        self.resources
            .iter()
            .find(|r| r.resource_type == S3_BUCKET_RESOURCE_TYPE)
            .map(|r| bucket_from_arn(&r.id))
            .filter(|name| !name.is_empty())
    }
}

/// The segment after `:::` (or the whole string when there is none).
pub fn bucket_from_arn(arn: &str) -> String {
    arn.rsplit(":::").next().unwrap_or(arn).to_string()
}
