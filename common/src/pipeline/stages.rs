// Stage drivers: thin adapters that call one external collaborator per
// record, write results back onto the Job Record, and catch failures onto
// the record's failure log rather than raising.

use crate::collaborators::{ApprovalNotifier, BoostDecider, DeepExtractor, DeliverableGenerator, Scorer};
use crate::errors::RetryableError;
use crate::gate::DocCreationGate;
use crate::models::{Attachment, JobRecord, JobStatus, ATTACHMENT_CONTENT_LIMIT};
use crate::retry::{self, RetryConfig};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

/// Run `driver` over every record with at most `worker_count` in flight at
/// once, per spec §5's per-stage counting semaphore. Stages are not
/// pipelined with each other: this function is itself the barrier — it
/// returns only once every record has finished this stage.
async fn run_bounded<F, Fut>(records: Vec<JobRecord>, worker_count: usize, driver: F) -> Vec<JobRecord>
where
    F: Fn(JobRecord) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = JobRecord> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(worker_count.max(1)));
    let driver = Arc::new(driver);

    let tasks = records.into_iter().map(|record| {
        let semaphore = semaphore.clone();
        let driver = driver.clone();
        tokio::spawn(async move {
            let _permit = semaphore.acquire().await.expect("stage semaphore is never closed");
            (*driver)(record).await
        })
    });

    futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|res| res.expect("stage worker task panicked"))
        .collect()
}

#[instrument(skip_all, fields(count = records.len(), min_score))]
pub async fn score_and_prefilter(
    records: Vec<JobRecord>,
    worker_count: usize,
    min_score: u8,
    scorer: Arc<dyn Scorer>,
    retry_config: RetryConfig,
) -> (Vec<JobRecord>, Vec<JobRecord>) {
    let scored = run_bounded(records, worker_count, move |mut record| {
        let scorer = scorer.clone();
        let retry_config = retry_config;
        async move {
            if record.status != JobStatus::Scoring {
                record.advance_status(JobStatus::Scoring);
            }
            let result = retry::execute(&retry_config, || {
                let scorer = scorer.clone();
                let record = &record;
                async move { scorer.score(record).await }
            })
            .await;

            match result {
                Ok(score) => {
                    record.fit_score = Some(score.fit_score);
                    record.fit_reasoning = Some(score.fit_reasoning);
                }
                Err(err) => {
                    record.push_failure(format!("scoring failed: {}", err.message()));
                }
            }
            record
        }
    })
    .await;

    // fit_score = ⊥ advances (fail-open); otherwise apply the threshold.
    let (advance, filtered): (Vec<JobRecord>, Vec<JobRecord>) = scored.into_iter().partition(|r| {
        r.fit_score.map(|s| s >= min_score).unwrap_or(true)
    });

    let mut filtered = filtered;
    for record in &mut filtered {
        record.advance_status(JobStatus::FilteredOut);
    }
    let mut advance = advance;
    for record in &mut advance {
        if record.status == JobStatus::Scoring {
            record.advance_status(JobStatus::Extracting);
        }
    }

    info!(advanced = advance.len(), filtered_out = filtered.len(), "prefilter complete");
    (advance, filtered)
}

#[instrument(skip_all, fields(count = records.len()))]
pub async fn extract(
    records: Vec<JobRecord>,
    worker_count: usize,
    extractor: Arc<dyn DeepExtractor>,
    retry_config: RetryConfig,
) -> Vec<JobRecord> {
    run_bounded(records, worker_count, move |mut record| {
        let extractor = extractor.clone();
        let retry_config = retry_config;
        async move {
            if record.status != JobStatus::Extracting {
                record.advance_status(JobStatus::Extracting);
            }
            let url = record.url.clone();
            let result = retry::execute(&retry_config, || {
                let extractor = extractor.clone();
                let url = url.clone();
                async move { extractor.extract(&url).await }
            })
            .await;

            match result {
                Ok(extracted) => apply_extraction(&mut record, extracted),
                Err(err) => record.push_failure(format!("extraction failed: {}", err.message())),
            }
            record.advance_status(JobStatus::Generating);
            record
        }
    })
    .await
}

fn apply_extraction(record: &mut JobRecord, extracted: crate::collaborators::ExtractedJob) {
    if let Some(title) = extracted.title {
        record.title = title;
    }
    if let Some(description) = extracted.description {
        record.description = description;
    }
    record.skills = extracted.skills;
    record.budget = extracted.budget;
    record.client = extracted.client;
    record.attachments = extracted.attachments;
    record.attachment_content = Some(concat_attachment_text(&record.attachments));

    let discovery = crate::contact::discover_contact_name(&record.description);
    record.contact_name = discovery.contact_name;
    record.contact_confidence = Some(discovery.contact_confidence);
}

fn concat_attachment_text(attachments: &[Attachment]) -> String {
    let joined = attachments
        .iter()
        .filter_map(|a| a.extracted_text.as_deref())
        .collect::<Vec<_>>()
        .join("\n");
    crate::models::truncate_chars(&joined, ATTACHMENT_CONTENT_LIMIT)
}

#[instrument(skip_all, fields(count = records.len()))]
pub async fn generate_deliverables(
    records: Vec<JobRecord>,
    worker_count: usize,
    generator: Arc<dyn DeliverableGenerator>,
    gate: DocCreationGate,
    retry_config: RetryConfig,
) -> Vec<JobRecord> {
    run_bounded(records, worker_count, move |mut record| {
        let generator = generator.clone();
        let gate = gate.clone();
        let retry_config = retry_config;
        async move {
            let result = retry::execute(&retry_config, || {
                let generator = generator.clone();
                let gate = gate.clone();
                let record = &record;
                async move { generator.generate(record, &gate).await }
            })
            .await;

            match result {
                Ok(bundle) => {
                    record.proposal_doc_url = bundle.proposal_doc_url;
                    record.proposal_text = bundle.proposal_text;
                    record.pdf_url = bundle.pdf_url;
                    record.video_url = bundle.video_url;
                }
                Err(err) => record.push_failure(format!("deliverable generation failed: {}", err.message())),
            }
            record.advance_status(JobStatus::BoostDeciding);
            record
        }
    })
    .await
}

#[instrument(skip_all, fields(count = records.len()))]
pub async fn decide_boost(
    records: Vec<JobRecord>,
    worker_count: usize,
    decider: Arc<dyn BoostDecider>,
    retry_config: RetryConfig,
) -> Vec<JobRecord> {
    run_bounded(records, worker_count, move |mut record| {
        let decider = decider.clone();
        let retry_config = retry_config;
        async move {
            let result = retry::execute(&retry_config, || {
                let decider = decider.clone();
                let record = &record;
                async move { decider.decide(record).await }
            })
            .await;

            match result {
                Ok(boost) => {
                    record.boost_decision = Some(boost.boost_decision);
                    record.boost_reasoning = Some(boost.boost_reasoning);
                }
                Err(err) => record.push_failure(format!("boost decision failed: {}", err.message())),
            }
            record.derive_pricing();
            record.advance_status(JobStatus::PendingApproval);
            record
        }
    })
    .await
}

#[instrument(skip_all, fields(count = records.len()))]
pub async fn notify_approval(
    records: Vec<JobRecord>,
    worker_count: usize,
    notifier: Arc<dyn ApprovalNotifier>,
    retry_config: RetryConfig,
) -> Vec<JobRecord> {
    run_bounded(records, worker_count, move |mut record| {
        let notifier = notifier.clone();
        let retry_config = retry_config;
        async move {
            let result: Result<String, RetryableError> = retry::execute(&retry_config, || {
                let notifier = notifier.clone();
                let record = &record;
                async move { notifier.notify(record).await }
            })
            .await;

            match result {
                Ok(ts) => record.slack_message_ts = Some(ts),
                Err(err) => {
                    warn!(job_id = %record.job_id, "approval notification failed");
                    record.push_failure(format!("approval notification failed: {}", err.message()));
                }
            }
            record
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockBoostDecider, MockDeepExtractor, MockDeliverableGenerator, MockApprovalNotifier, MockScorer};
    use crate::models::Source;

    fn record(id: &str, score: u8) -> JobRecord {
        let mut r = JobRecord::new(
            id.to_string(),
            format!("https://example.com/{id}"),
            Source::Manual,
            "title".into(),
            "A great project.\n\nThanks, Jordan".into(),
        );
        r.advance_status(JobStatus::Scoring);
        let _ = score;
        r
    }

    #[tokio::test]
    async fn prefilter_splits_on_min_score() {
        let records = vec![{
            let mut r = record("~a", 0);
            r.status = JobStatus::New;
            r
        }];
        let scorer: Arc<dyn Scorer> = Arc::new(MockScorer::new(85));
        let (advance, filtered) =
            score_and_prefilter(records, 2, 70, scorer, RetryConfig::default()).await;
        assert_eq!(advance.len(), 1);
        assert_eq!(filtered.len(), 0);
        assert_eq!(advance[0].status, JobStatus::Extracting);
    }

    #[tokio::test]
    async fn prefilter_culls_below_threshold() {
        let records = vec![{
            let mut r = record("~a", 0);
            r.status = JobStatus::New;
            r
        }];
        let scorer: Arc<dyn Scorer> = Arc::new(MockScorer::new(55));
        let (advance, filtered) =
            score_and_prefilter(records, 2, 70, scorer, RetryConfig::default()).await;
        assert_eq!(advance.len(), 0);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].status, JobStatus::FilteredOut);
    }

    #[tokio::test]
    async fn extraction_populates_contact_and_advances_status() {
        let records = vec![record("~a", 0)];
        let extractor: Arc<dyn DeepExtractor> = Arc::new(MockDeepExtractor);
        let results = extract(records, 2, extractor, RetryConfig::default()).await;
        assert_eq!(results[0].status, JobStatus::Generating);
        assert_eq!(results[0].contact_name, Some("Jordan".to_string()));
    }

    #[tokio::test]
    async fn full_chain_reaches_pending_approval() {
        let mut records = vec![record("~a", 0)];
        records[0].advance_status(JobStatus::Extracting);

        let extractor: Arc<dyn DeepExtractor> = Arc::new(MockDeepExtractor);
        let records = extract(records, 2, extractor, RetryConfig::default()).await;

        let generator: Arc<dyn DeliverableGenerator> = Arc::new(MockDeliverableGenerator);
        let gate = DocCreationGate::new();
        let records = generate_deliverables(records, 2, generator, gate, RetryConfig::default()).await;

        let decider: Arc<dyn BoostDecider> = Arc::new(MockBoostDecider);
        let records = decide_boost(records, 2, decider, RetryConfig::default()).await;

        let notifier: Arc<dyn ApprovalNotifier> = Arc::new(MockApprovalNotifier);
        let records = notify_approval(records, 2, notifier, RetryConfig::default()).await;

        assert_eq!(records[0].status, JobStatus::PendingApproval);
        assert!(records[0].proposal_doc_url.is_some());
        assert!(records[0].slack_message_ts.is_some());
        assert_eq!(records[0].pricing_proposed, Some(1500.0));
    }
}
