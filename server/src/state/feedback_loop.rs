use anyhow::Context;

use crate::{
    db_core::prelude::*,
    error::AppResult,
    model::{email_categorization::EmailCategorizationCtrl, incoming_email::IncomingEmailCtrl},
    prompt,
    server_config::cfg,
    HttpClient,
};

/// Counts from one pass over the pending-feedback backlog.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FeedbackScanSummary {
    pub scanned: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// One batch pass: pick up reviewer-flagged categorizations that have not
/// been used as feedback yet, ask the model for a corrective suggestion
/// per item, and persist it. Items fail independently; an error on one
/// categorization is logged and the scan moves on. Failed items are not
/// retried within the same run.
pub async fn run_feedback_scan(
    http_client: &HttpClient,
    conn: &DatabaseConnection,
) -> AppResult<FeedbackScanSummary> {
    let pending = EmailCategorizationCtrl::find_pending_feedback(conn, cfg.feedback.batch_size).await?;
    let mut summary = FeedbackScanSummary {
        scanned: pending.len(),
        ..Default::default()
    };

    for categorization in pending {
        match process_categorization(http_client, conn, &categorization).await {
            Ok(true) => summary.sent += 1,
            Ok(false) => summary.skipped += 1,
            Err(e) => {
                tracing::error!(
                    "Feedback pass failed for categorization {}: {:?}",
                    categorization.id,
                    e
                );
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Returns false when the linked incoming email no longer exists; that
/// item is skipped silently and stays eligible for the next scan.
async fn process_categorization(
    http_client: &HttpClient,
    conn: &DatabaseConnection,
    categorization: &email_categorization::Model,
) -> AppResult<bool> {
    let Some(email) =
        IncomingEmailCtrl::get_by_id(conn, categorization.incoming_email_id).await?
    else {
        tracing::debug!(
            "Skipping categorization {}: incoming email {} is gone",
            categorization.id,
            categorization.incoming_email_id
        );
        return Ok(false);
    };

    let suggestion =
        prompt::feedback::send_feedback_prompt(http_client, &email, categorization).await?;
    let payload =
        serde_json::to_value(&suggestion).context("Failed to serialize feedback suggestion")?;

    EmailCategorizationCtrl::store_suggestion(conn, categorization.id, payload).await?;

    Ok(true)
}
