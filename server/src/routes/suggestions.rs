use axum::{
    extract::{Query, State},
    Json,
};
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};

use crate::{
    db_core::prelude::*,
    error::{AppError, AppJsonResult},
    model::email_categorization::{EmailCategorizationCtrl, SuggestionFilter},
    ServerState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsQuery {
    pub categorization_id: Option<i32>,
    #[serde(rename = "hasLLMSuggestion")]
    pub has_llm_suggestion: Option<bool>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub success: bool,
    pub data: Vec<email_categorization::Model>,
}

/// Read endpoint for reviewers: categorizations with (or without) an
/// advisory model suggestion, filterable by taxonomy values.
pub async fn handler_list_suggestions(
    State(state): State<ServerState>,
    Query(query): Query<SuggestionsQuery>,
) -> AppJsonResult<SuggestionsResponse> {
    let category = query
        .category
        .map(|value| {
            Category::try_from_value(&value)
                .map_err(|_| AppError::BadRequest(format!("Unknown category: {}", value)))
        })
        .transpose()?;
    let language = query
        .language
        .map(|value| {
            EmailLanguage::try_from_value(&value)
                .map_err(|_| AppError::BadRequest(format!("Unknown language: {}", value)))
        })
        .transpose()?;

    let filter = SuggestionFilter {
        categorization_id: query.categorization_id,
        has_llm_suggestion: query.has_llm_suggestion,
        category,
        language,
        limit: query.limit,
    };

    let rows = EmailCategorizationCtrl::find_suggestions(&state.conn, &filter).await?;

    Ok(Json(SuggestionsResponse {
        success: true,
        data: rows,
    }))
}
