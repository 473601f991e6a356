use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    auth::ServiceCaller,
    email::ingest::{ingest_inbound_email, InboundNotification},
    error::AppJsonResult,
    ServerState,
};

/// Notification posted by the upstream email-receiving service after it
/// stores a raw message in the inbound bucket. `timestamp` is accepted
/// for compatibility and not used.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestEmailRequest {
    pub message_id: String,
    pub timestamp: Option<String>,
    pub source: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestEmailResponse {
    pub success: bool,
}

pub async fn handler_ingest_email(
    _caller: ServiceCaller,
    State(state): State<ServerState>,
    Json(payload): Json<IngestEmailRequest>,
) -> AppJsonResult<IngestEmailResponse> {
    let notification = InboundNotification {
        message_id: payload.message_id,
        source: payload.source,
        subject: payload.subject,
    };

    ingest_inbound_email(&state.s3_client, &state.conn, &notification).await?;

    Ok(Json(IngestEmailResponse { success: true }))
}
