// Serialization Gate: a process-global binary semaphore around the
// Deliverable Generator's document-creation call.

use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Wraps a `tokio::sync::Semaphore` of size 1. Acquired inside the retry
/// loop so retries of the doc-creation call remain serialized; held only
/// around that one call, never across other stages or other locks.
#[derive(Clone)]
pub struct DocCreationGate {
    semaphore: Arc<Semaphore>,
}

impl DocCreationGate {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore
            .acquire()
            .await
            .expect("doc creation gate semaphore is never closed")
    }
}

impl Default for DocCreationGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn at_most_one_caller_inside_gated_region() {
        let gate = DocCreationGate::new();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let gate = gate.clone();
            let in_flight = in_flight.clone();
            let max_observed = max_observed.clone();
            handles.push(tokio::spawn(async move {
                let _permit = gate.acquire().await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_observed.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_observed.load(Ordering::SeqCst), 1);
    }
}
