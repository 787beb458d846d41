// API binary entry point: hosts the Approval Callback Handler (spec §4.8)
// as a small axum HTTP server.

use anyhow::Result;
use common::bootstrap;
use common::collaborators::MockApprovalNotifier;
use common::config::Settings;
use common::sheet::{InMemorySheetStore, SheetClient, SheetStore};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use api::routes;
use api::state::{AppState, SubmissionTrigger};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load().unwrap_or_else(|err| {
        eprintln!("config load failed ({err}), falling back to defaults");
        Settings::default()
    });
    bootstrap::init_human_tracing(&settings.observability.log_level);

    info!(
        channel_id = %settings.approval.channel_id,
        sheet_id = %settings.sheet.sheet_id,
        "starting approval callback API"
    );

    let sheet: Arc<dyn SheetStore> = if settings.sheet.base_url.starts_with("http://localhost") {
        Arc::new(InMemorySheetStore::new())
    } else {
        Arc::new(SheetClient::new(
            reqwest::Client::new(),
            settings.sheet.base_url.clone(),
            settings.sheet.sheet_id.clone(),
            settings.sheet.api_key.clone(),
        ))
    };

    // The Approval Notifier's real chat-API client is a pluggable
    // collaborator out of this crate's scope (spec §1); this binary wires
    // its synthetic double so the webhook handler is runnable end to end.
    let notifier: Arc<dyn common::collaborators::ApprovalNotifier> = Arc::new(MockApprovalNotifier);

    // Submission trigger channel: the boundary to the excluded submission
    // subsystem (spec §6). Nothing downstream consumes this in-process, so
    // the API logs each trigger itself rather than dropping it silently.
    let (submission_tx, mut submission_rx) = mpsc::channel::<SubmissionTrigger>(128);
    tokio::spawn(async move {
        while let Some(trigger) = submission_rx.recv().await {
            info!(job_id = %trigger.job_id, "submission trigger emitted");
        }
    });

    let state = AppState::new(sheet, notifier, settings.clone(), submission_tx);
    let app = routes::create_router(state);

    let addr: std::net::SocketAddr = "0.0.0.0:8080".parse()?;
    info!(%addr, "listening for approval webhooks");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("received Ctrl+C, shutting down"),
        _ = terminate => warn!("received SIGTERM, shutting down"),
    }
}
