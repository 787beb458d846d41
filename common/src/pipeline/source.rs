use crate::errors::OrchestratorError;
use crate::models::Source;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

/// Raw job dict shape yielded by a source, before mapping onto a
/// `JobRecord`. `job_id` may be absent for `apify` and is derived from the
/// URL.
#[derive(Debug, Clone)]
pub struct RawJob {
    pub job_id: Option<String>,
    pub url: String,
    pub title: String,
    pub description: String,
}

/// Ingestion capability. Concrete implementations dispatch at startup based
/// on configuration (spec §9's "Source adapters → interface with variants"
/// redesign flag).
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_kind(&self) -> Source;
    async fn ingest(&self, limit: Option<usize>) -> Result<Vec<RawJob>, OrchestratorError>;
}

fn url_token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"~([a-f0-9]+)").unwrap())
}

/// Derive a job id of the form `~<hex>` from a listing URL when the source
/// doesn't supply one directly.
pub fn derive_job_id_from_url(url: &str) -> Option<String> {
    url_token_pattern()
        .captures(url)
        .map(|caps| format!("~{}", &caps[1]))
}

/// Apify-backed source: returns `{id|uid|job_id, url, title, description}`;
/// a missing `job_id` is derived from the URL.
pub struct ApifySource {
    jobs: Vec<RawJob>,
}

impl ApifySource {
    pub fn new(jobs: Vec<RawJob>) -> Self {
        Self { jobs }
    }
}

#[async_trait]
impl SourceAdapter for ApifySource {
    fn source_kind(&self) -> Source {
        Source::Apify
    }

    async fn ingest(&self, limit: Option<usize>) -> Result<Vec<RawJob>, OrchestratorError> {
        Ok(take_limit(self.jobs.clone(), limit))
    }
}

/// Gmail-backed source: `job_id` is always present in the raw payload.
pub struct GmailSource {
    jobs: Vec<RawJob>,
}

impl GmailSource {
    pub fn new(jobs: Vec<RawJob>) -> Self {
        Self { jobs }
    }
}

#[async_trait]
impl SourceAdapter for GmailSource {
    fn source_kind(&self) -> Source {
        Source::Gmail
    }

    async fn ingest(&self, limit: Option<usize>) -> Result<Vec<RawJob>, OrchestratorError> {
        Ok(take_limit(self.jobs.clone(), limit))
    }
}

/// Caller-provided list, used for manual invocations and tests.
pub struct ManualSource {
    jobs: Vec<RawJob>,
}

impl ManualSource {
    pub fn new(jobs: Vec<RawJob>) -> Self {
        Self { jobs }
    }
}

#[async_trait]
impl SourceAdapter for ManualSource {
    fn source_kind(&self) -> Source {
        Source::Manual
    }

    async fn ingest(&self, limit: Option<usize>) -> Result<Vec<RawJob>, OrchestratorError> {
        Ok(take_limit(self.jobs.clone(), limit))
    }
}

fn take_limit(mut jobs: Vec<RawJob>, limit: Option<usize>) -> Vec<RawJob> {
    if let Some(limit) = limit {
        jobs.truncate(limit);
    }
    jobs
}
