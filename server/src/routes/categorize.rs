use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    db_core::prelude::*,
    error::AppJsonResult,
    model::{
        customer::CustomerCtrl, email_categorization::EmailCategorizationCtrl,
        incoming_email::IncomingEmailCtrl,
    },
    prompt::categorize::send_categorization_prompt,
    ServerState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizeEmailRequest {
    pub subject: String,
    pub content: String,
    pub from_address: String,
    pub to_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizeEmailData {
    pub customer: customer::Model,
    pub email: incoming_email::Model,
    pub categorization: email_categorization::Model,
}

#[derive(Debug, Serialize)]
pub struct CategorizeEmailResponse {
    pub success: bool,
    pub data: CategorizeEmailData,
}

pub async fn handler_categorize_email(
    State(state): State<ServerState>,
    Json(payload): Json<CategorizeEmailRequest>,
) -> AppJsonResult<CategorizeEmailResponse> {
    // Classification runs first; a schema-invalid reply writes nothing.
    let answer =
        send_categorization_prompt(&state.http_client, &payload.subject, &payload.content).await?;

    let customer = CustomerCtrl::find_or_create(&state.conn, &payload.from_address).await?;
    let email = IncomingEmailCtrl::insert(
        &state.conn,
        &payload.from_address,
        &payload.to_address,
        &payload.subject,
        &payload.content,
        Utc::now().into(),
    )
    .await?;
    let categorization = EmailCategorizationCtrl::insert(
        &state.conn,
        email.id,
        answer.category,
        answer.language,
        answer.confidence,
    )
    .await?;

    Ok(Json(CategorizeEmailResponse {
        success: true,
        data: CategorizeEmailData {
            customer,
            email,
            categorization,
        },
    }))
}
