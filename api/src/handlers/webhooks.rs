use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use common::approval::{apply_approval_action, ApprovalOutcome, ApprovalPayload};
use common::webhook::verify_signature;

use crate::handlers::ErrorResponse;
use crate::state::{AppState, SubmissionTrigger};

/// Approval Callback Handler: `POST /webhooks/approval`. Verifies the
/// channel's HMAC signature and a 5-minute replay window, then dispatches
/// approve/reject/edit against the Sheet Store.
#[tracing::instrument(skip(state, headers, body))]
pub async fn handle_approval(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApprovalOutcome>, ErrorResponse> {
    let timestamp = header_value(&headers, "X-Signature-Timestamp")
        .ok_or_else(|| ErrorResponse::new("unauthorized", "missing X-Signature-Timestamp header"))?;
    let signature = header_value(&headers, "X-Signature")
        .ok_or_else(|| ErrorResponse::new("unauthorized", "missing X-Signature header"))?;

    verify_signature(&state.config.approval.signing_secret, timestamp, &body, signature)
        .map_err(|e| ErrorResponse::new("unauthorized", e.to_string()))?;

    let payload: ApprovalPayload = serde_json::from_slice(&body)
        .map_err(|e| ErrorResponse::new("bad_request", format!("malformed approval payload: {e}")))?;

    let outcome = apply_approval_action(&payload, state.sheet.as_ref(), state.notifier.as_ref())
        .await
        .map_err(|e| {
            tracing::warn!(job_id = %payload.job_id, error = %e, "approval action rejected");
            ErrorResponse::from(e)
        })?;

    if outcome == ApprovalOutcome::Approved {
        let _ = state
            .submission_tx
            .send(SubmissionTrigger {
                job_id: payload.job_id.clone(),
            })
            .await;
    }

    Ok(Json(outcome))
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
