//! Automatic remediation of publicly accessible S3 buckets.
//!
//! A Security Hub finding event arrives, each finding naming an S3 bucket
//! gets its public-access-block configuration forced fully on, the finding
//! is marked resolved (or notified when nothing had to change) and, when it
//! was actually remediated, a notice goes out on SNS.
//!
//! The evaluator only talks to the traits in [`clients`]; [`aws`] provides
//! the SDK-backed implementations.

pub mod aws;
pub mod clients;
pub mod evaluator;
pub mod event;

pub use aws::AwsClients;
pub use clients::{BucketAccess, FindingTracker, FindingUpdate, Notifier, PublicAccessBlock, WorkflowStatus};
pub use evaluator::{
    FindingReport, HandlerResponse, NOTIFICATION_SUBJECT, RemediationResult, RemediationStatus, Remediator,
    RemediatorConfig, SideEffects, finding_note, notification_message,
};
pub use event::{Finding, Resource, SecurityHubEvent, bucket_from_arn};
