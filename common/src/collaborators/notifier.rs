use crate::errors::RetryableError;
use crate::models::JobRecord;
use async_trait::async_trait;

/// Approval Notifier collaborator: posts a structured message to the
/// external chat channel and returns the message timestamp used to later
/// update the same message from the Approval Callback Handler.
#[async_trait]
pub trait ApprovalNotifier: Send + Sync {
    async fn notify(&self, job: &JobRecord) -> Result<String, RetryableError>;

    /// Update a previously posted message, e.g. to a status-confirmation
    /// rendering after approve/reject.
    async fn update_message(&self, message_ts: &str, status_text: &str) -> Result<(), RetryableError>;
}

/// Synthetic notifier for `mock=true` runs: returns a deterministic
/// timestamp derived from the job id so tests can assert on it.
pub struct MockApprovalNotifier;

#[async_trait]
impl ApprovalNotifier for MockApprovalNotifier {
    async fn notify(&self, job: &JobRecord) -> Result<String, RetryableError> {
        Ok(format!("mock-ts-{}", job.job_id))
    }

    async fn update_message(&self, _message_ts: &str, _status_text: &str) -> Result<(), RetryableError> {
        Ok(())
    }
}
