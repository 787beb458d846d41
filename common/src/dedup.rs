// Dedup Store: process-local set of already-seen job ids, persisted across
// invocations as a newline-delimited file.

use async_trait::async_trait;
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::fs;
use tracing::{debug, info, instrument};

#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn contains(&self, job_id: &str) -> bool;
    async fn add(&self, job_id: &str);
}

/// File-backed dedup store. The full set is loaded into memory once at
/// construction; every `add` appends one line to the file and updates the
/// in-memory set under a mutex, so `contains` is always observed before
/// `add` for the same id within one process.
pub struct FileDedupStore {
    path: PathBuf,
    seen: Mutex<HashSet<String>>,
}

impl FileDedupStore {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn load(path: PathBuf) -> std::io::Result<Self> {
        let seen = match fs::read_to_string(&path).await {
            Ok(contents) => contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(err) => return Err(err),
        };
        info!(count = seen.len(), "loaded dedup store");
        Ok(Self {
            path,
            seen: Mutex::new(seen),
        })
    }
}

#[async_trait]
impl DedupStore for FileDedupStore {
    async fn contains(&self, job_id: &str) -> bool {
        self.seen.lock().expect("dedup store mutex poisoned").contains(job_id)
    }

    #[instrument(skip(self))]
    async fn add(&self, job_id: &str) {
        let is_new = {
            let mut seen = self.seen.lock().expect("dedup store mutex poisoned");
            seen.insert(job_id.to_string())
        };
        if !is_new {
            return;
        }
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
        {
            let _ = writeln!(file, "{job_id}");
        }
        debug!(job_id, "added to dedup store");
    }
}

/// In-memory dedup store for tests and `mock=true` runs.
#[derive(Default)]
pub struct InMemoryDedupStore {
    seen: Mutex<HashSet<String>>,
}

#[async_trait]
impl DedupStore for InMemoryDedupStore {
    async fn contains(&self, job_id: &str) -> bool {
        self.seen.lock().expect("dedup store mutex poisoned").contains(job_id)
    }

    async fn add(&self, job_id: &str) {
        self.seen
            .lock()
            .expect("dedup store mutex poisoned")
            .insert(job_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn contains_observed_before_add() {
        let store = InMemoryDedupStore::default();
        assert!(!store.contains("~abc1").await);
        store.add("~abc1").await;
        assert!(store.contains("~abc1").await);
    }

    #[tokio::test]
    async fn file_store_persists_across_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dedup.txt");

        {
            let store = FileDedupStore::load(path.clone()).await.unwrap();
            store.add("~dup1").await;
        }

        let reloaded = FileDedupStore::load(path).await.unwrap();
        assert!(reloaded.contains("~dup1").await);
    }

    #[tokio::test]
    async fn file_store_starts_empty_when_file_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let store = FileDedupStore::load(path).await.unwrap();
        assert!(!store.contains("~anything").await);
    }
}
