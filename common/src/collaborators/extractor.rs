use crate::errors::RetryableError;
use crate::models::{Attachment, BudgetInfo, ClientInfo};
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct ExtractedJob {
    pub title: Option<String>,
    pub description: Option<String>,
    pub skills: Vec<String>,
    pub budget: BudgetInfo,
    pub client: ClientInfo,
    pub attachments: Vec<Attachment>,
}

/// Deep extraction collaborator: `extract(url) -> {title, description,
/// budget, client, attachments, ...}`. I/O-heavy; owns no retry policy of
/// its own — the stage driver wraps the call in the Retry Executor.
#[async_trait]
pub trait DeepExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedJob, RetryableError>;
}

/// Synthetic extractor producing the same kind of values a real browser
/// session would, for `mock=true` runs.
pub struct MockDeepExtractor;

#[async_trait]
impl DeepExtractor for MockDeepExtractor {
    async fn extract(&self, _url: &str) -> Result<ExtractedJob, RetryableError> {
        Ok(ExtractedJob {
            title: Some("Mock extracted title".to_string()),
            description: Some("Mock extracted description".to_string()),
            skills: vec!["rust".to_string(), "automation".to_string()],
            budget: BudgetInfo {
                budget_type: Some(crate::models::BudgetType::Fixed),
                budget_min: Some(1000.0),
                budget_max: Some(2000.0),
            },
            client: ClientInfo {
                country: Some("US".to_string()),
                total_spent: Some(15_000.0),
                hires: Some(12),
                payment_verified: Some(true),
            },
            attachments: Vec::new(),
        })
    }
}
