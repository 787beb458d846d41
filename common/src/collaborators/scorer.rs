use crate::errors::RetryableError;
use crate::models::JobRecord;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ScoreResult {
    pub fit_score: u8,
    pub fit_reasoning: String,
}

/// AI-scoring collaborator: `score(job) -> (fit_score, reasoning)`. Invoked
/// under the Retry Executor and the worker semaphore.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(&self, job: &JobRecord) -> Result<ScoreResult, RetryableError>;
}

/// Synthetic scorer for `mock=true` runs and the crate's own test suite.
/// Always reports a high, fail-open-compatible score.
pub struct MockScorer {
    pub fixed_score: u8,
}

impl MockScorer {
    pub fn new(fixed_score: u8) -> Self {
        Self { fixed_score }
    }
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new(85)
    }
}

#[async_trait]
impl Scorer for MockScorer {
    async fn score(&self, _job: &JobRecord) -> Result<ScoreResult, RetryableError> {
        Ok(ScoreResult {
            fit_score: self.fixed_score,
            fit_reasoning: "mock scorer: synthetic fixed score".to_string(),
        })
    }
}
