// Integration tests for the Approval Callback Handler route, driven through
// the router in-process (no bound socket) per spec §4.8 and §8 scenario 4.

use api::routes::create_router;
use api::state::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::collaborators::MockApprovalNotifier;
use common::config::Settings;
use common::models::{JobRecord, JobStatus, Source};
use common::sheet::{InMemorySheetStore, SheetStore};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt;

const SECRET: &str = "test-signing-secret";

fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let basestring = format!("v0:{timestamp}:{}", std::str::from_utf8(body).unwrap());
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(basestring.as_bytes());
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}

async fn test_state(sheet: Arc<dyn SheetStore>) -> AppState {
    let mut settings = Settings::default();
    settings.approval.signing_secret = SECRET.to_string();
    let notifier = Arc::new(MockApprovalNotifier);
    let (tx, _rx) = mpsc::channel(8);
    AppState::new(sheet, notifier, settings, tx)
}

async fn seeded_sheet(job_id: &str) -> Arc<dyn SheetStore> {
    let sheet: Arc<dyn SheetStore> = Arc::new(InMemorySheetStore::new());
    let mut record = JobRecord::new(
        job_id.to_string(),
        format!("https://example.com/{job_id}"),
        Source::Manual,
        "title".into(),
        "description".into(),
    );
    record.status = JobStatus::PendingApproval;
    sheet.update_one(&record).await.unwrap();
    sheet
}

fn signed_request(body: &serde_json::Value, secret: &str) -> Request<Body> {
    let raw = serde_json::to_vec(body).unwrap();
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = sign(secret, &timestamp, &raw);

    Request::builder()
        .method("POST")
        .uri("/webhooks/approval")
        .header("content-type", "application/json")
        .header("X-Signature-Timestamp", timestamp)
        .header("X-Signature", signature)
        .body(Body::from(raw))
        .unwrap()
}

#[tokio::test]
async fn valid_approve_request_returns_200_and_advances_job() {
    let sheet = seeded_sheet("~approve1").await;
    let state = test_state(sheet.clone()).await;
    let app = create_router(state);

    let payload = json!({
        "action": "approve",
        "job_id": "~approve1",
        "user": "reviewer@example.com",
        "channel": "C0123",
        "message_ts": "1700000000.000100",
    });
    let response = app.oneshot(signed_request(&payload, SECRET)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let row = sheet.get_by_id("~approve1").await.unwrap().unwrap();
    let record = JobRecord::from_sheet_row(&row).unwrap();
    assert_eq!(record.status, JobStatus::Approved);
}

#[tokio::test]
async fn wrong_signature_is_rejected_with_401() {
    let sheet = seeded_sheet("~bad1").await;
    let state = test_state(sheet).await;
    let app = create_router(state);

    let payload = json!({
        "action": "approve",
        "job_id": "~bad1",
        "user": "reviewer@example.com",
        "channel": "C0123",
        "message_ts": "1700000000.000100",
    });
    let response = app.oneshot(signed_request(&payload, "not-the-secret")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_signature_headers_are_rejected_with_401() {
    let sheet = seeded_sheet("~missinghdr").await;
    let state = test_state(sheet).await;
    let app = create_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/approval")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"action":"approve"}"#))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_action_is_rejected_with_400() {
    let sheet = seeded_sheet("~unknown1").await;
    let state = test_state(sheet).await;
    let app = create_router(state);

    let payload = json!({
        "action": "snooze",
        "job_id": "~unknown1",
        "user": "reviewer@example.com",
        "channel": "C0123",
        "message_ts": "1700000000.000100",
    });
    let response = app.oneshot(signed_request(&payload, SECRET)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_job_id_is_rejected_with_404() {
    let sheet: Arc<dyn SheetStore> = Arc::new(InMemorySheetStore::new());
    let state = test_state(sheet).await;
    let app = create_router(state);

    let payload = json!({
        "action": "approve",
        "job_id": "~ghost",
        "user": "reviewer@example.com",
        "channel": "C0123",
        "message_ts": "1700000000.000100",
    });
    let response = app.oneshot(signed_request(&payload, SECRET)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_check_returns_200() {
    let sheet: Arc<dyn SheetStore> = Arc::new(InMemorySheetStore::new());
    let state = test_state(sheet).await;
    let app = create_router(state);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
