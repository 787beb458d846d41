// Approval Callback dispatch: the domain logic behind the out-of-band
// webhook described in spec §4.8, kept separate from the HTTP wiring so it
// can be exercised without an axum test server.

use crate::collaborators::ApprovalNotifier;
use crate::errors::WebhookError;
use crate::models::{JobRecord, JobStatus};
use crate::sheet::SheetStore;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument};

/// Verified payload delivered by the approval channel when a reviewer
/// clicks a button on the message posted in stage 7.
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalPayload {
    pub action: String,
    pub job_id: String,
    pub user: String,
    pub channel: String,
    pub message_ts: String,
    #[serde(default)]
    pub edited_text: Option<String>,
}

/// Result the handler returns to its caller; action failures are surfaced
/// here rather than raised, per spec §4.8.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApprovalOutcome {
    Approved,
    Rejected,
    Edited,
    /// `edit` action received with no `edited_text`: the caller should open
    /// a modal/edit UI and resubmit, mirroring the original Slack approval
    /// flow's handling of an edit click with no accompanying submission.
    NeedsEditText,
}

#[instrument(skip(sheet, notifier), fields(job_id = %payload.job_id, action = %payload.action))]
pub async fn apply_approval_action(
    payload: &ApprovalPayload,
    sheet: &dyn SheetStore,
    notifier: &dyn ApprovalNotifier,
) -> Result<ApprovalOutcome, WebhookError> {
    let row = sheet
        .get_by_id(&payload.job_id)
        .await
        .map_err(|e| WebhookError::SheetStore(e.to_string()))?
        .ok_or_else(|| WebhookError::JobNotFound(payload.job_id.clone()))?;
    let mut record = JobRecord::from_sheet_row(&row).map_err(WebhookError::MalformedPayload)?;

    match payload.action.as_str() {
        "approve" => {
            record.advance_status(JobStatus::Approved);
            record.approved_at = Some(Utc::now());
            record.slack_message_ts = Some(payload.message_ts.clone());
            sheet
                .update_one(&record)
                .await
                .map_err(|e| WebhookError::SheetStore(e.to_string()))?;
            let _ = notifier
                .update_message(&payload.message_ts, "Approved")
                .await;
            info!(user = %payload.user, "job approved");
            Ok(ApprovalOutcome::Approved)
        }
        "reject" => {
            record.advance_status(JobStatus::Rejected);
            record.slack_message_ts = Some(payload.message_ts.clone());
            sheet
                .update_one(&record)
                .await
                .map_err(|e| WebhookError::SheetStore(e.to_string()))?;
            let _ = notifier
                .update_message(&payload.message_ts, "Rejected")
                .await;
            info!(user = %payload.user, "job rejected");
            Ok(ApprovalOutcome::Rejected)
        }
        "edit" => match &payload.edited_text {
            Some(edited_text) => {
                record.proposal_text = Some(edited_text.clone());
                sheet
                    .update_one(&record)
                    .await
                    .map_err(|e| WebhookError::SheetStore(e.to_string()))?;
                info!(user = %payload.user, "proposal text edited");
                Ok(ApprovalOutcome::Edited)
            }
            None => Ok(ApprovalOutcome::NeedsEditText),
        },
        other => Err(WebhookError::UnknownAction(other.to_string())),
    }
}
