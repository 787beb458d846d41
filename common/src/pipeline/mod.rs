// Pipeline Orchestrator: sequences the seven stages, shards stage-parallel
// work across W workers, writes status to the Sheet Store between stages,
// aggregates run statistics.

pub mod orchestrator;
pub mod source;
mod stages;

pub use orchestrator::{Collaborators, Orchestrator, PipelineConfig};
pub use source::{derive_job_id_from_url, ApifySource, GmailSource, ManualSource, RawJob, SourceAdapter};
