//! Per-finding remediation: block public access, update the finding, notify.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, instrument, warn};

use coursekit_shared::{Result, SideEffect};

use crate::clients::{BucketAccess, FindingTracker, FindingUpdate, Notifier, PublicAccessBlock, WorkflowStatus};
use crate::event::{Finding, SecurityHubEvent};

/// SNS subject line for remediation notices.
pub const NOTIFICATION_SUBJECT: &str = "SOAR Auto-Remediation: S3 bucket made private";

const NEXT_STEPS: &str = "Review who made the bucket public and why. \
     Search CloudTrail for PutBucketPublicAccessBlock events on this bucket.";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Primary outcome for one finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemediationStatus {
    /// No S3 bucket among the finding's resources.
    Skipped { reason: String },
    /// Reading or writing the bucket configuration failed.
    Error { bucket: String, error: String },
    /// Public access was blocked by this run.
    Remediated { bucket: String },
    /// All four flags were already set; nothing was changed.
    AlreadyCompliant { bucket: String },
}

/// Serialized per-finding entry of the handler response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemediationResult {
    pub finding_id: String,
    #[serde(flatten)]
    pub status: RemediationStatus,
}

/// Outcomes of the best-effort follow-ups for one finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SideEffects {
    pub finding_update: SideEffect,
    pub notification: SideEffect,
}

impl Default for SideEffects {
    fn default() -> Self {
        Self {
            finding_update: SideEffect::Skipped,
            notification: SideEffect::Skipped,
        }
    }
}

/// Everything that happened for one finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindingReport {
    pub result: RemediationResult,
    pub side_effects: SideEffects,
}

/// Value returned to the invoking platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Remediator
// ---------------------------------------------------------------------------

/// Settings for the remediation handler.
#[derive(Debug, Clone)]
pub struct RemediatorConfig {
    /// Notification topic; `None` disables notifications.
    pub topic_arn: Option<String>,
    /// Author recorded on finding notes.
    pub updated_by: String,
}

/// Processes findings against the cloud-facing clients.
pub struct Remediator<'a> {
    buckets: &'a dyn BucketAccess,
    findings: &'a dyn FindingTracker,
    notifier: &'a dyn Notifier,
    config: RemediatorConfig,
}

impl<'a> Remediator<'a> {
    pub fn new(
        buckets: &'a dyn BucketAccess,
        findings: &'a dyn FindingTracker,
        notifier: &'a dyn Notifier,
        config: RemediatorConfig,
    ) -> Self {
        Self {
            buckets,
            findings,
            notifier,
            config,
        }
    }

    /// Process every finding in `event`, in order.
    #[instrument(skip_all, fields(findings = event.detail.findings.len()))]
    pub async fn handle_event(&self, event: &SecurityHubEvent) -> (HandlerResponse, Vec<FindingReport>) {
        let findings = &event.detail.findings;
        if findings.is_empty() {
            warn!("no findings in event, nothing to process");
            return (
                HandlerResponse {
                    status_code: 200,
                    body: "No findings".into(),
                },
                Vec::new(),
            );
        }

        let mut reports = Vec::with_capacity(findings.len());
        for finding in findings {
            reports.push(self.process_finding(finding).await);
        }

        let results: Vec<&RemediationResult> = reports.iter().map(|r| &r.result).collect();
        let body = serde_json::to_string(&results).unwrap_or_else(|_| "[]".into());

        (
            HandlerResponse {
                status_code: 200,
                body,
            },
            reports,
        )
    }

    /// `received → skipped | error | remediated | already_compliant`.
    #[instrument(skip_all, fields(finding_id = %finding.id))]
    pub async fn process_finding(&self, finding: &Finding) -> FindingReport {
        info!("processing finding");

        let Some(bucket) = finding.bucket_name() else {
            warn!("no S3 bucket found in finding resources");
            return FindingReport {
                result: RemediationResult {
                    finding_id: finding.id.clone(),
                    status: RemediationStatus::Skipped {
                        reason: "no S3 resource".into(),
                    },
                },
                side_effects: SideEffects::default(),
            };
        };

        let remediated = match self.ensure_blocked(&bucket).await {
            Ok(remediated) => remediated,
            Err(e) => {
                error!(bucket = %bucket, error = %e, "failed to remediate bucket");
                return FindingReport {
                    result: RemediationResult {
                        finding_id: finding.id.clone(),
                        status: RemediationStatus::Error {
                            bucket,
                            error: e.to_string(),
                        },
                    },
                    side_effects: SideEffects::default(),
                };
            }
        };

        let finding_update = self.update_finding(finding, &bucket, remediated).await;
        let notification = if remediated {
            self.notify(finding, &bucket).await
        } else {
            SideEffect::Skipped
        };

        let status = if remediated {
            RemediationStatus::Remediated { bucket }
        } else {
            RemediationStatus::AlreadyCompliant { bucket }
        };

        FindingReport {
            result: RemediationResult {
                finding_id: finding.id.clone(),
                status,
            },
            side_effects: SideEffects {
                finding_update,
                notification,
            },
        }
    }

    /// Block public access unless it already is. Returns whether a write happened.
    async fn ensure_blocked(&self, bucket: &str) -> Result<bool> {
        let current = self.buckets.get_public_access_block(bucket).await?;

        if current.is_some_and(|c| c.is_fully_blocked()) {
            info!(bucket, "bucket already private, nothing to do");
            return Ok(false);
        }

        self.buckets
            .put_public_access_block(bucket, PublicAccessBlock::FULLY_BLOCKED)
            .await?;
        info!(bucket, "block public access enabled");
        Ok(true)
    }

    async fn update_finding(&self, finding: &Finding, bucket: &str, remediated: bool) -> SideEffect {
        let update = FindingUpdate {
            finding_id: finding.id.clone(),
            product_arn: finding.product_arn.clone(),
            status: if remediated {
                WorkflowStatus::Resolved
            } else {
                WorkflowStatus::Notified
            },
            note: finding_note(bucket, remediated, &Utc::now().to_rfc3339()),
            updated_by: self.config.updated_by.clone(),
        };

        match self.findings.update_finding(&update).await {
            Ok(()) => {
                info!(status = ?update.status, "finding updated");
                SideEffect::Succeeded
            }
            Err(e) => {
                warn!(error = %e, "could not update finding");
                SideEffect::Failed(e.to_string())
            }
        }
    }

    async fn notify(&self, finding: &Finding, bucket: &str) -> SideEffect {
        let Some(topic) = self.config.topic_arn.as_deref() else {
            return SideEffect::Skipped;
        };

        let message = notification_message(bucket, &finding.id, &Utc::now().to_rfc3339());
        match self.notifier.notify(topic, NOTIFICATION_SUBJECT, &message).await {
            Ok(()) => {
                info!(topic, "notification sent");
                SideEffect::Succeeded
            }
            Err(e) => {
                warn!(topic, error = %e, "could not send notification");
                SideEffect::Failed(e.to_string())
            }
        }
    }
}

/// Note attached to the finding.
pub fn finding_note(bucket: &str, remediated: bool, timestamp: &str) -> String {
    let action = if remediated { "enabled on" } else { "already set on" };
    format!("Auto-remediated by SOAR Lambda at {timestamp}. Block public access {action} {bucket}.")
}

/// Pretty-printed JSON body of the remediation notice.
pub fn notification_message(bucket: &str, finding_id: &str, timestamp: &str) -> String {
    let message = json!({
        "subject": "SOAR Auto-Remediation: S3 Bucket Made Private",
        "bucket": bucket,
        "finding_id": finding_id,
        "action": "Block public access enabled automatically",
        "timestamp": timestamp,
        "next_steps": NEXT_STEPS,
    });
    serde_json::to_string_pretty(&message).unwrap_or_else(|_| message.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use coursekit_shared::CourseKitError;

    use super::*;
    use crate::event::{EventDetail, Resource};

    #[derive(Default)]
    struct FakeS3 {
        current: Option<PublicAccessBlock>,
        fail_get: bool,
        fail_put: bool,
        puts: Mutex<Vec<(String, PublicAccessBlock)>>,
    }

    #[async_trait::async_trait]
    impl BucketAccess for FakeS3 {
        async fn get_public_access_block(&self, _bucket: &str) -> Result<Option<PublicAccessBlock>> {
            if self.fail_get {
                return Err(CourseKitError::Remediation("AccessDenied".into()));
            }
            Ok(self.current)
        }

        async fn put_public_access_block(&self, bucket: &str, config: PublicAccessBlock) -> Result<()> {
            if self.fail_put {
                return Err(CourseKitError::Remediation("AccessDenied".into()));
            }
            self.puts.lock().expect("lock").push((bucket.to_string(), config));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeHub {
        fail: bool,
        updates: Mutex<Vec<FindingUpdate>>,
    }

    #[async_trait::async_trait]
    impl FindingTracker for FakeHub {
        async fn update_finding(&self, update: &FindingUpdate) -> Result<()> {
            if self.fail {
                return Err(CourseKitError::Remediation("throttled".into()));
            }
            self.updates.lock().expect("lock").push(update.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeSns {
        fail: bool,
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait::async_trait]
    impl Notifier for FakeSns {
        async fn notify(&self, topic: &str, _subject: &str, message: &str) -> Result<()> {
            if self.fail {
                return Err(CourseKitError::Remediation("topic not found".into()));
            }
            self.sent.lock().expect("lock").push((topic.to_string(), message.to_string()));
            Ok(())
        }
    }

    fn config(topic: Option<&str>) -> RemediatorConfig {
        RemediatorConfig {
            topic_arn: topic.map(str::to_string),
            updated_by: "SOARRemediationLambda".into(),
        }
    }

    fn bucket_finding(id: &str, bucket: &str) -> Finding {
        Finding {
            id: id.into(),
            product_arn: "arn:aws:securityhub:us-east-1::product/aws/securityhub".into(),
            resources: vec![Resource {
                resource_type: "AwsS3Bucket".into(),
                id: format!("arn:aws:s3:::{bucket}"),
            }],
        }
    }

    fn event(findings: Vec<Finding>) -> SecurityHubEvent {
        SecurityHubEvent {
            detail: EventDetail { findings },
        }
    }

    #[tokio::test]
    async fn compliant_bucket_is_left_alone() {
        let s3 = FakeS3 {
            current: Some(PublicAccessBlock::FULLY_BLOCKED),
            ..Default::default()
        };
        let hub = FakeHub::default();
        let sns = FakeSns::default();
        let remediator = Remediator::new(&s3, &hub, &sns, config(Some("arn:topic")));

        let report = remediator.process_finding(&bucket_finding("f1", "my-bucket")).await;

        assert_eq!(
            report.result.status,
            RemediationStatus::AlreadyCompliant {
                bucket: "my-bucket".into()
            }
        );
        assert!(s3.puts.lock().expect("lock").is_empty());
        assert_eq!(report.side_effects.notification, SideEffect::Skipped);

        let updates = hub.updates.lock().expect("lock");
        assert_eq!(updates[0].status, WorkflowStatus::Notified);
        assert!(updates[0].note.contains("already set on my-bucket"));

        let json = serde_json::to_value(&report.result).expect("ser");
        assert_eq!(json, json!({ "finding_id": "f1", "bucket": "my-bucket", "status": "already_compliant" }));
    }

    #[tokio::test]
    async fn partial_configuration_is_remediated() {
        let s3 = FakeS3 {
            current: Some(PublicAccessBlock {
                block_public_acls: false,
                ..PublicAccessBlock::FULLY_BLOCKED
            }),
            ..Default::default()
        };
        let hub = FakeHub::default();
        let sns = FakeSns::default();
        let remediator = Remediator::new(&s3, &hub, &sns, config(Some("arn:topic")));

        let report = remediator.process_finding(&bucket_finding("f1", "my-bucket")).await;

        assert_eq!(
            report.result.status,
            RemediationStatus::Remediated {
                bucket: "my-bucket".into()
            }
        );
        let puts = s3.puts.lock().expect("lock");
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0], ("my-bucket".to_string(), PublicAccessBlock::FULLY_BLOCKED));

        assert_eq!(hub.updates.lock().expect("lock")[0].status, WorkflowStatus::Resolved);

        let sent = sns.sent.lock().expect("lock");
        assert_eq!(sent[0].0, "arn:topic");
        let body: serde_json::Value = serde_json::from_str(&sent[0].1).expect("json message");
        assert_eq!(body["bucket"], "my-bucket");
        assert_eq!(body["finding_id"], "f1");
    }

    #[tokio::test]
    async fn missing_configuration_is_remediated() {
        let s3 = FakeS3::default();
        let hub = FakeHub::default();
        let sns = FakeSns::default();
        let remediator = Remediator::new(&s3, &hub, &sns, config(None));

        let report = remediator.process_finding(&bucket_finding("f1", "b")).await;
        assert!(matches!(report.result.status, RemediationStatus::Remediated { .. }));
        assert_eq!(report.side_effects.notification, SideEffect::Skipped);
        assert!(sns.sent.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn side_effect_failures_do_not_change_result() {
        let s3 = FakeS3::default();
        let hub = FakeHub {
            fail: true,
            ..Default::default()
        };
        let sns = FakeSns {
            fail: true,
            ..Default::default()
        };
        let remediator = Remediator::new(&s3, &hub, &sns, config(Some("arn:topic")));

        let report = remediator.process_finding(&bucket_finding("f1", "b")).await;
        assert!(matches!(report.result.status, RemediationStatus::Remediated { .. }));
        assert!(report.side_effects.finding_update.is_failed());
        assert!(report.side_effects.notification.is_failed());
    }

    #[tokio::test]
    async fn mutation_error_is_isolated_to_its_finding() {
        let s3 = FakeS3 {
            fail_put: true,
            ..Default::default()
        };
        let hub = FakeHub::default();
        let sns = FakeSns::default();
        let remediator = Remediator::new(&s3, &hub, &sns, config(Some("arn:topic")));

        let no_bucket = Finding {
            id: "f0".into(),
            product_arn: String::new(),
            resources: vec![],
        };
        let (response, reports) = remediator
            .handle_event(&event(vec![bucket_finding("f1", "a"), no_bucket, bucket_finding("f2", "b")]))
            .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(reports.len(), 3);
        assert!(matches!(reports[0].result.status, RemediationStatus::Error { .. }));
        assert!(matches!(reports[1].result.status, RemediationStatus::Skipped { .. }));
        assert_eq!(reports[2].result.finding_id, "f2");
        assert!(hub.updates.lock().expect("lock").is_empty());

        let body: serde_json::Value = serde_json::from_str(&response.body).expect("body json");
        assert_eq!(body[0]["status"], "error");
        assert_eq!(body[0]["bucket"], "a");
        assert_eq!(body[1], json!({ "finding_id": "f0", "status": "skipped", "reason": "no S3 resource" }));
    }

    #[tokio::test]
    async fn read_error_is_an_error_result() {
        let s3 = FakeS3 {
            fail_get: true,
            ..Default::default()
        };
        let hub = FakeHub::default();
        let sns = FakeSns::default();
        let remediator = Remediator::new(&s3, &hub, &sns, config(None));

        let report = remediator.process_finding(&bucket_finding("f1", "b")).await;
        assert_eq!(
            report.result.status,
            RemediationStatus::Error {
                bucket: "b".into(),
                error: "remediation error: AccessDenied".into()
            }
        );
    }

    #[tokio::test]
    async fn empty_event_succeeds_with_no_results() {
        let s3 = FakeS3::default();
        let hub = FakeHub::default();
        let sns = FakeSns::default();
        let remediator = Remediator::new(&s3, &hub, &sns, config(None));

        let (response, reports) = remediator.handle_event(&SecurityHubEvent::default()).await;
        assert_eq!(response.status_code, 200);
        assert!(reports.is_empty());
        assert_eq!(response.body, "No findings");
    }

    #[test]
    fn note_wording_reflects_action() {
        let ts = "2026-01-01T00:00:00+00:00";
        assert_eq!(
            finding_note("b", true, ts),
            "Auto-remediated by SOAR Lambda at 2026-01-01T00:00:00+00:00. Block public access enabled on b."
        );
        assert!(finding_note("b", false, ts).contains("already set on b"));
    }
}
