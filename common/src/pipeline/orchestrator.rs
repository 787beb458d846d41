use super::source::{RawJob, SourceAdapter};
use super::stages;
use crate::collaborators::{ApprovalNotifier, BoostDecider, DeepExtractor, DeliverableGenerator, Scorer};
use crate::dedup::DedupStore;
use crate::errors::OrchestratorError;
use crate::gate::DocCreationGate;
use crate::models::{JobRecord, JobStatus, PipelineResult};
use crate::retry::RetryConfig;
use crate::sheet::SheetStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

/// The pluggable external collaborators behind the five stage drivers.
#[derive(Clone)]
pub struct Collaborators {
    pub scorer: Arc<dyn Scorer>,
    pub extractor: Arc<dyn DeepExtractor>,
    pub deliverable: Arc<dyn DeliverableGenerator>,
    pub boost: Arc<dyn BoostDecider>,
    pub notifier: Arc<dyn ApprovalNotifier>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub limit: Option<usize>,
    pub min_score: u8,
    pub worker_count: usize,
    pub mock: bool,
}

/// Drives one run end to end: ingest, dedup, score & prefilter, extract,
/// generate, decide boost, notify. A barrier separates each stage — all
/// survivors finish stage N before stage N+1 begins.
pub struct Orchestrator {
    source: Arc<dyn SourceAdapter>,
    dedup: Arc<dyn DedupStore>,
    sheet: Arc<dyn SheetStore>,
    collaborators: Collaborators,
    gate: DocCreationGate,
    retry_config: RetryConfig,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn SourceAdapter>,
        dedup: Arc<dyn DedupStore>,
        sheet: Arc<dyn SheetStore>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            source,
            dedup,
            sheet,
            collaborators,
            gate: DocCreationGate::new(),
            retry_config: RetryConfig::default(),
        }
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    #[instrument(skip(self, config), fields(source = %self.source.source_kind(), worker_count = config.worker_count))]
    pub async fn run(&self, config: PipelineConfig) -> Result<PipelineResult, OrchestratorError> {
        let started_at = Utc::now();
        let mut result = PipelineResult::new(started_at);

        // 1. Ingest
        let raw_jobs = self.source.ingest(config.limit).await?;
        result.ingested = raw_jobs.len();
        let records = self.map_raw_jobs(raw_jobs);

        // 2. Deduplicate
        let mut survivors = Vec::with_capacity(records.len());
        for record in records {
            if self.dedup.contains(&record.job_id).await {
                continue;
            }
            self.dedup.add(&record.job_id).await;
            survivors.push(record);
        }
        result.after_dedup = survivors.len();

        // 3. Score & Prefilter
        for record in &mut survivors {
            record.advance_status(JobStatus::Scoring);
        }
        self.sheet_persist_batch(&survivors).await?;
        let (advance, filtered) = stages::score_and_prefilter(
            survivors,
            config.worker_count,
            config.min_score,
            self.collaborators.scorer.clone(),
            self.retry_config,
        )
        .await;
        result.after_prefilter = advance.len();
        result.filtered_out = filtered.len();
        self.sheet_persist_batch(&filtered).await?;

        // 4. Deep extraction
        self.sheet_persist_batch(&advance).await?;
        let extracted = stages::extract(
            advance,
            config.worker_count,
            self.collaborators.extractor.clone(),
            self.retry_config,
        )
        .await;
        self.sheet_persist_batch(&extracted).await?;

        // 5. Deliverable generation
        let generated = stages::generate_deliverables(
            extracted,
            config.worker_count,
            self.collaborators.deliverable.clone(),
            self.gate.clone(),
            self.retry_config,
        )
        .await;
        self.sheet_persist_batch(&generated).await?;

        // 6. Boost decision
        let boosted = stages::decide_boost(
            generated,
            config.worker_count,
            self.collaborators.boost.clone(),
            self.retry_config,
        )
        .await;
        self.sheet_persist_batch(&boosted).await?;

        // 7. Approval notification
        let notified = stages::notify_approval(
            boosted,
            config.worker_count,
            self.collaborators.notifier.clone(),
            self.retry_config,
        )
        .await;
        self.sheet_persist_batch(&notified).await?;

        result.processed = notified.len();
        result.sent_to_approval = notified
            .iter()
            .filter(|r| r.status == JobStatus::PendingApproval)
            .count();

        let mut all_records = filtered;
        all_records.extend(notified);
        result.errors = all_records
            .iter()
            .flat_map(|r| r.failure_log.iter().cloned())
            .collect();
        result.records = all_records;
        result.finish(Utc::now());

        info!(
            ingested = result.ingested,
            processed = result.processed,
            sent_to_approval = result.sent_to_approval,
            "pipeline run complete"
        );
        Ok(result)
    }

    fn map_raw_jobs(&self, raw_jobs: Vec<RawJob>) -> Vec<JobRecord> {
        raw_jobs
            .into_iter()
            .filter_map(|raw| {
                let job_id = raw
                    .job_id
                    .clone()
                    .or_else(|| super::source::derive_job_id_from_url(&raw.url))?;
                Some(JobRecord::new(
                    job_id,
                    raw.url,
                    self.source.source_kind(),
                    raw.title,
                    raw.description,
                ))
            })
            .collect()
    }

    async fn sheet_persist_batch(&self, records: &[JobRecord]) -> Result<(), OrchestratorError> {
        if records.is_empty() {
            return Ok(());
        }
        self.sheet
            .update_many(records)
            .await
            .map_err(|e| OrchestratorError::SheetStore(e.to_string()))
    }
}
