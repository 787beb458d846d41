use crate::errors::RetryableError;
use crate::models::{ContactConfidence, JobRecord};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct BoostResult {
    pub boost_decision: bool,
    pub boost_reasoning: String,
    pub confidence: ContactConfidence,
}

/// Boost-decision collaborator: whether to spend extra attention/credits on
/// the application, a property of client quality rather than of fit.
/// Pricing itself is derived locally (`JobRecord::derive_pricing`), not by
/// this collaborator.
#[async_trait]
pub trait BoostDecider: Send + Sync {
    async fn decide(&self, job: &JobRecord) -> Result<BoostResult, RetryableError>;
}

/// Synthetic boost decider for `mock=true` runs: boosts whenever the client
/// has a verified payment method, mirroring a plausible real heuristic.
pub struct MockBoostDecider;

#[async_trait]
impl BoostDecider for MockBoostDecider {
    async fn decide(&self, job: &JobRecord) -> Result<BoostResult, RetryableError> {
        let boost_decision = job.client.payment_verified.unwrap_or(false);
        Ok(BoostResult {
            boost_decision,
            boost_reasoning: "mock boost decider: based on payment verification".to_string(),
            confidence: ContactConfidence::Medium,
        })
    }
}
