use crate::errors::RetryableError;
use crate::gate::DocCreationGate;
use crate::models::JobRecord;
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct DeliverableBundle {
    pub proposal_doc_url: Option<String>,
    pub proposal_text: Option<String>,
    pub pdf_url: Option<String>,
    pub video_url: Option<String>,
}

/// Deliverable-generation collaborator: produces a proposal doc, PDF, and
/// optionally a video. The document-creation step must be called under the
/// Serialization Gate, so the trait takes the gate explicitly rather than
/// hiding it behind implementation-internal state.
#[async_trait]
pub trait DeliverableGenerator: Send + Sync {
    async fn generate(
        &self,
        job: &JobRecord,
        gate: &DocCreationGate,
    ) -> Result<DeliverableBundle, RetryableError>;
}

/// Synthetic deliverable generator for `mock=true` runs. Still acquires the
/// gate around its "doc creation" so concurrency tests exercise the same
/// invariant a real implementation would.
pub struct MockDeliverableGenerator;

#[async_trait]
impl DeliverableGenerator for MockDeliverableGenerator {
    async fn generate(
        &self,
        job: &JobRecord,
        gate: &DocCreationGate,
    ) -> Result<DeliverableBundle, RetryableError> {
        let _permit = gate.acquire().await;
        Ok(DeliverableBundle {
            proposal_doc_url: Some(format!("https://mock.example/docs/{}", job.job_id)),
            proposal_text: Some(format!("Mock proposal for {}", job.title)),
            pdf_url: Some(format!("https://mock.example/pdf/{}", job.job_id)),
            video_url: None,
        })
    }
}
