//! AWS SDK implementations of the remediation clients.

use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::types::PublicAccessBlockConfiguration;
use aws_sdk_securityhub::types::{
    AwsSecurityFindingIdentifier, NoteUpdate, WorkflowStatus as HubWorkflowStatus, WorkflowUpdate,
};
use tracing::debug;

use coursekit_shared::{CourseKitError, Result};

use crate::clients::{BucketAccess, FindingTracker, FindingUpdate, Notifier, PublicAccessBlock, WorkflowStatus};

/// Error code S3 returns when a bucket has no public-access-block configuration.
const NO_CONFIGURATION_CODE: &str = "NoSuchPublicAccessBlockConfiguration";

/// The three service clients, built from the ambient AWS configuration.
#[derive(Debug, Clone)]
pub struct AwsClients {
    pub s3: aws_sdk_s3::Client,
    pub security_hub: aws_sdk_securityhub::Client,
    pub sns: aws_sdk_sns::Client,
}

impl AwsClients {
    /// Load region and credentials the standard way (env, profile, instance role).
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            s3: aws_sdk_s3::Client::new(&config),
            security_hub: aws_sdk_securityhub::Client::new(&config),
            sns: aws_sdk_sns::Client::new(&config),
        }
    }
}

fn sdk_error(op: &str, err: impl std::error::Error) -> CourseKitError {
    CourseKitError::Remediation(format!("{op}: {}", DisplayErrorContext(err)))
}

// ---------------------------------------------------------------------------
// S3
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl BucketAccess for AwsClients {
    async fn get_public_access_block(&self, bucket: &str) -> Result<Option<PublicAccessBlock>> {
        let resp = match self.s3.get_public_access_block().bucket(bucket).send().await {
            Ok(resp) => resp,
            Err(err) => {
                let code = err.as_service_error().and_then(|e| e.code());
                if code == Some(NO_CONFIGURATION_CODE) {
                    debug!(bucket, "no public access block configuration");
                    return Ok(None);
                }
                return Err(sdk_error("GetPublicAccessBlock", err));
            }
        };

        Ok(resp
            .public_access_block_configuration()
            .map(|c| PublicAccessBlock {
                block_public_acls: c.block_public_acls().unwrap_or(false),
                ignore_public_acls: c.ignore_public_acls().unwrap_or(false),
                block_public_policy: c.block_public_policy().unwrap_or(false),
                restrict_public_buckets: c.restrict_public_buckets().unwrap_or(false),
            }))
    }

    async fn put_public_access_block(&self, bucket: &str, config: PublicAccessBlock) -> Result<()> {
        let configuration = PublicAccessBlockConfiguration::builder()
            .block_public_acls(config.block_public_acls)
            .ignore_public_acls(config.ignore_public_acls)
            .block_public_policy(config.block_public_policy)
            .restrict_public_buckets(config.restrict_public_buckets)
            .build();

        self.s3
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(configuration)
            .send()
            .await
            .map_err(|e| sdk_error("PutPublicAccessBlock", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Security Hub
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl FindingTracker for AwsClients {
    async fn update_finding(&self, update: &FindingUpdate) -> Result<()> {
        let identifier = AwsSecurityFindingIdentifier::builder()
            .id(&update.finding_id)
            .product_arn(&update.product_arn)
            .build();

        let status = match update.status {
            WorkflowStatus::Resolved => HubWorkflowStatus::Resolved,
            WorkflowStatus::Notified => HubWorkflowStatus::Notified,
        };

        let note = NoteUpdate::builder()
            .text(&update.note)
            .updated_by(&update.updated_by)
            .build();

        self.security_hub
            .batch_update_findings()
            .finding_identifiers(identifier)
            .workflow(WorkflowUpdate::builder().status(status).build())
            .note(note)
            .send()
            .await
            .map_err(|e| sdk_error("BatchUpdateFindings", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SNS
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl Notifier for AwsClients {
    async fn notify(&self, topic: &str, subject: &str, message: &str) -> Result<()> {
        self.sns
            .publish()
            .topic_arn(topic)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| sdk_error("Publish", e))?;
        Ok(())
    }
}
