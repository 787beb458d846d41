use super::SheetStore;
use crate::errors::StageError;
use crate::models::{JobRecord, SheetRow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory Sheet Store used by the pipeline's own test suite and by
/// `mock=true` runs. Counts external-call-equivalents the same way the
/// HTTP client would (one header read, one bulk row read, one batched
/// update, one batched append) so the O(1)-calls property is testable
/// without a live server.
pub struct InMemorySheetStore {
    rows: Mutex<HashMap<String, SheetRow>>,
    pub api_calls: AtomicUsize,
}

impl InMemorySheetStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            api_calls: AtomicUsize::new(0),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().expect("sheet store mutex poisoned").len()
    }

    pub fn api_call_count(&self) -> usize {
        self.api_calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemorySheetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SheetStore for InMemorySheetStore {
    async fn update_one(&self, record: &JobRecord) -> Result<(), StageError> {
        self.update_many(std::slice::from_ref(record)).await
    }

    async fn update_many(&self, records: &[JobRecord]) -> Result<(), StageError> {
        if records.is_empty() {
            return Ok(());
        }
        // header read + bulk row read
        self.api_calls.fetch_add(2, Ordering::SeqCst);

        let mut rows = self.rows.lock().expect("sheet store mutex poisoned");
        let (mut updated, mut inserted) = (0, 0);
        for record in records {
            if rows.insert(record.job_id.clone(), record.to_sheet_row()).is_some() {
                updated += 1;
            } else {
                inserted += 1;
            }
        }
        drop(rows);

        if updated > 0 {
            self.api_calls.fetch_add(1, Ordering::SeqCst);
        }
        if inserted > 0 {
            self.api_calls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn get_by_id(&self, job_id: &str) -> Result<Option<SheetRow>, StageError> {
        Ok(self
            .rows
            .lock()
            .expect("sheet store mutex poisoned")
            .get(job_id)
            .cloned())
    }
}
