// Worker binary entry point: a thin CLI over the Pipeline Orchestrator.
// Wiring only — argparse and collaborator construction, not orchestration
// logic (spec §1's Non-goals exclude CLI design from this crate's depth).

use anyhow::{Context, Result};
use clap::Parser;
use common::bootstrap;
use common::collaborators::{
    MockApprovalNotifier, MockBoostDecider, MockDeepExtractor, MockDeliverableGenerator, MockScorer,
};
use common::config::Settings;
use common::dedup::{DedupStore, FileDedupStore, InMemoryDedupStore};
use common::pipeline::{
    ApifySource, Collaborators, GmailSource, ManualSource, Orchestrator, PipelineConfig, RawJob,
    SourceAdapter,
};
use common::sheet::{InMemorySheetStore, SheetClient, SheetStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Run one pass of the freelance-job application pipeline: ingest, dedup,
/// score & prefilter, extract, generate, decide boost, notify. The process
/// is restarted externally (scheduler, webhook-triggered arrival, or this
/// CLI invoked by hand) — this binary drives exactly one run then exits.
#[derive(Parser, Debug)]
#[command(name = "worker", about = "Freelance job application pipeline worker")]
struct Args {
    /// Source adapter to ingest from.
    #[arg(long, value_enum, default_value = "manual")]
    source: SourceKind,

    /// JSON file of raw jobs (`[{job_id, url, title, description}, ...]`),
    /// used by all three source kinds since the real Apify/Gmail API
    /// clients are excluded from this crate's scope.
    #[arg(long)]
    jobs_file: Option<PathBuf>,

    /// Cap on the number of jobs ingested this run.
    #[arg(long)]
    limit: Option<usize>,

    /// Prefilter threshold; overrides config when set.
    #[arg(long)]
    min_score: Option<u8>,

    /// Per-stage worker count; overrides config when set.
    #[arg(long)]
    worker_count: Option<usize>,

    /// Disable external side effects: in-memory Sheet/Dedup stores and
    /// synthetic collaborator results, per spec §4.7's `mock` parameter.
    #[arg(long)]
    mock: bool,

    /// Directory to load config/default.toml and config/local.toml from.
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,

    /// Dedup store file path (ignored when `--mock` is set).
    #[arg(long, default_value = "dedup_store.txt")]
    dedup_path: PathBuf,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum SourceKind {
    Apify,
    Gmail,
    Manual,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let settings = Settings::load_from_path(&args.config_dir).unwrap_or_else(|err| {
        eprintln!("config load failed ({err}), falling back to defaults");
        Settings::default()
    });
    bootstrap::init_json_tracing(&settings.observability.log_level);

    info!(source = ?args.source, mock = args.mock, "starting pipeline run");

    let jobs = load_jobs(args.jobs_file.as_deref()).context("loading jobs file")?;
    let source: Arc<dyn SourceAdapter> = match args.source {
        SourceKind::Apify => Arc::new(ApifySource::new(jobs)),
        SourceKind::Gmail => Arc::new(GmailSource::new(jobs)),
        SourceKind::Manual => Arc::new(ManualSource::new(jobs)),
    };

    let dedup: Arc<dyn DedupStore> = if args.mock {
        Arc::new(InMemoryDedupStore::default())
    } else {
        Arc::new(
            FileDedupStore::load(args.dedup_path.clone())
                .await
                .context("loading dedup store")?,
        )
    };

    let sheet: Arc<dyn SheetStore> = if args.mock {
        Arc::new(InMemorySheetStore::new())
    } else {
        Arc::new(SheetClient::new(
            reqwest::Client::new(),
            settings.sheet.base_url.clone(),
            settings.sheet.sheet_id.clone(),
            settings.sheet.api_key.clone(),
        ))
    };

    // The Scorer/Extractor/Deliverable/Boost/Notifier collaborators are
    // pluggable black boxes out of this crate's scope (spec §1); this
    // binary wires their synthetic doubles so the orchestration engine is
    // runnable end to end without external credentials.
    let collaborators = Collaborators {
        scorer: Arc::new(MockScorer::default()),
        extractor: Arc::new(MockDeepExtractor),
        deliverable: Arc::new(MockDeliverableGenerator),
        boost: Arc::new(MockBoostDecider),
        notifier: Arc::new(MockApprovalNotifier),
    };

    let orchestrator = Orchestrator::new(source, dedup, sheet, collaborators);
    let config = PipelineConfig {
        limit: args.limit,
        min_score: args.min_score.unwrap_or(settings.pipeline.min_score),
        worker_count: args.worker_count.unwrap_or(settings.pipeline.worker_count),
        mock: args.mock,
    };

    match orchestrator.run(config).await {
        Ok(result) => {
            info!(
                ingested = result.ingested,
                after_dedup = result.after_dedup,
                after_prefilter = result.after_prefilter,
                filtered_out = result.filtered_out,
                processed = result.processed,
                sent_to_approval = result.sent_to_approval,
                with_errors = result.with_errors,
                "pipeline run finished"
            );
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "pipeline run aborted");
            Err(err.into())
        }
    }
}

fn load_jobs(path: Option<&std::path::Path>) -> Result<Vec<RawJob>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading jobs file {}", path.display()))?;
    let raw: Vec<RawJobFile> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing jobs file {}", path.display()))?;
    Ok(raw.into_iter().map(RawJobFile::into_raw_job).collect())
}

/// On-disk shape of a single entry in `--jobs-file`, mirroring the raw
/// `{id|uid|job_id, url, title, description}` dict spec §6 describes.
#[derive(serde::Deserialize)]
struct RawJobFile {
    #[serde(alias = "id", alias = "uid")]
    job_id: Option<String>,
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

impl RawJobFile {
    fn into_raw_job(self) -> RawJob {
        RawJob {
            job_id: self.job_id,
            url: self.url,
            title: self.title,
            description: self.description,
        }
    }
}
