// Stage driver collaborator contracts: the pluggable black boxes behind
// each of the seven pipeline stages, plus their `mock=true` doubles.

mod boost;
mod deliverable;
mod extractor;
mod notifier;
mod scorer;

pub use boost::{BoostDecider, BoostResult, MockBoostDecider};
pub use deliverable::{DeliverableBundle, DeliverableGenerator, MockDeliverableGenerator};
pub use extractor::{DeepExtractor, ExtractedJob, MockDeepExtractor};
pub use notifier::{ApprovalNotifier, MockApprovalNotifier};
pub use scorer::{MockScorer, ScoreResult, Scorer};
