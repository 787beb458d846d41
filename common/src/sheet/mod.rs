// Sheet Store: durable per-job row keyed by job_id, batched read/write,
// column-name-addressed updates against an external tabular store.

mod client;
mod in_memory;

pub use client::SheetClient;
pub use in_memory::InMemorySheetStore;

use crate::errors::StageError;
use crate::models::{JobRecord, SheetRow};
use async_trait::async_trait;

#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Idempotent upsert of a single record.
    async fn update_one(&self, record: &JobRecord) -> Result<(), StageError>;

    /// Batched upsert. Must issue O(1) external requests regardless of
    /// `|records|`: one header read, one existing-row read, one batched
    /// update, one batched append.
    async fn update_many(&self, records: &[JobRecord]) -> Result<(), StageError>;

    async fn get_by_id(&self, job_id: &str) -> Result<Option<SheetRow>, StageError>;
}
