use std::sync::Arc;

use common::collaborators::ApprovalNotifier;
use common::config::Settings;
use common::sheet::SheetStore;
use tokio::sync::mpsc;

/// Event emitted on `approve`, the boundary to the excluded submission
/// subsystem (spec §6: "an internal callback function or event").
#[derive(Debug, Clone)]
pub struct SubmissionTrigger {
    pub job_id: String,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sheet: Arc<dyn SheetStore>,
    pub notifier: Arc<dyn ApprovalNotifier>,
    pub config: Arc<Settings>,
    pub submission_tx: mpsc::Sender<SubmissionTrigger>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sheet", &"<Arc<dyn SheetStore>>")
            .field("notifier", &"<Arc<dyn ApprovalNotifier>>")
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    pub fn new(
        sheet: Arc<dyn SheetStore>,
        notifier: Arc<dyn ApprovalNotifier>,
        config: Settings,
        submission_tx: mpsc::Sender<SubmissionTrigger>,
    ) -> Self {
        Self {
            sheet,
            notifier,
            config: Arc::new(config),
            submission_tx,
        }
    }
}
