use axum::{extract::State, Json};
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};

use crate::{
    db_core::prelude::*,
    error::{AppError, AppJsonResult},
    model::email_categorization::EmailCategorizationCtrl,
    ServerState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailFeedbackRequest {
    pub categorization_id: i32,
    pub is_category_correct: bool,
    pub is_language_correct: bool,
    pub correct_category: Option<String>,
    pub correct_language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmailFeedbackResponse {
    pub success: bool,
    pub data: email_categorization::Model,
}

/// Records a human reviewer's verdict on one categorization. Corrections
/// must name values from the fixed taxonomies.
pub async fn handler_record_feedback(
    State(state): State<ServerState>,
    Json(payload): Json<EmailFeedbackRequest>,
) -> AppJsonResult<EmailFeedbackResponse> {
    let corrected_category = payload
        .correct_category
        .map(|value| {
            Category::try_from_value(&value)
                .map_err(|_| AppError::BadRequest(format!("Unknown category: {}", value)))
        })
        .transpose()?;
    let corrected_language = payload
        .correct_language
        .map(|value| {
            EmailLanguage::try_from_value(&value)
                .map_err(|_| AppError::BadRequest(format!("Unknown language: {}", value)))
        })
        .transpose()?;

    let updated = EmailCategorizationCtrl::record_human_feedback(
        &state.conn,
        payload.categorization_id,
        payload.is_category_correct,
        payload.is_language_correct,
        corrected_category,
        corrected_language,
    )
    .await?;

    Ok(Json(EmailFeedbackResponse {
        success: true,
        data: updated,
    }))
}
