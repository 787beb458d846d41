// Error handling framework

use thiserror::Error;

/// Configuration errors: abort the run before any stage starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    MissingSetting(String),

    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: String, reason: String },

    #[error("unknown source adapter: {0}")]
    UnknownSource(String),

    #[error("configuration load failed: {0}")]
    LoadFailed(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

/// Transient vs. permanent classification surfaced by a collaborator call.
///
/// The Retry Executor retries `Transient`, aborts immediately on `Permanent`.
#[derive(Error, Debug, Clone)]
pub enum RetryableError {
    #[error("transient error: {0}")]
    Transient(String),

    #[error("permanent error: {0}")]
    Permanent(String),
}

impl RetryableError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RetryableError::Transient(_))
    }

    pub fn message(&self) -> &str {
        match self {
            RetryableError::Transient(msg) | RetryableError::Permanent(msg) => msg,
        }
    }
}

/// Per-record stage errors: caught by the stage driver, appended to the
/// record's failure log, never propagated past the driver.
#[derive(Error, Debug, Clone)]
pub enum StageError {
    #[error("{stage} failed for {job_id}: {reason}")]
    CollaboratorFailed {
        stage: String,
        job_id: String,
        reason: String,
    },

    #[error("{stage} produced malformed output for {job_id}: {reason}")]
    MalformedOutput {
        stage: String,
        job_id: String,
        reason: String,
    },
}

impl StageError {
    pub fn into_log_entry(self) -> String {
        self.to_string()
    }
}

/// Validation errors raised at the webhook boundary: rejected, no state change.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("stale webhook timestamp")]
    StaleTimestamp,

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("sheet store error: {0}")]
    SheetStore(String),
}

/// Whole-run aborts that the orchestrator's caller (CLI / scheduler) sees.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("sheet store error: {0}")]
    SheetStore(String),

    #[error("source adapter error: {0}")]
    Source(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_error_classification() {
        assert!(RetryableError::Transient("timeout".into()).is_retryable());
        assert!(!RetryableError::Permanent("bad request".into()).is_retryable());
    }

    #[test]
    fn stage_error_renders_as_log_entry() {
        let err = StageError::CollaboratorFailed {
            stage: "scoring".into(),
            job_id: "~abc1".into(),
            reason: "timeout".into(),
        };
        assert!(err.into_log_entry().contains("scoring failed for ~abc1"));
    }
}
