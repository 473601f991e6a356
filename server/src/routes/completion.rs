use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppJsonResult},
    prompt::completion::send_raw_prompt,
    ServerState,
};

#[derive(Debug, Deserialize)]
pub struct RawPromptRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct RawPromptResponse {
    pub success: bool,
    pub data: String,
    pub complete: bool,
}

/// Raw completion passthrough kept for the frontend's ad-hoc prompt box.
pub async fn handler_raw_prompt(
    State(state): State<ServerState>,
    Json(payload): Json<RawPromptRequest>,
) -> AppJsonResult<RawPromptResponse> {
    if payload.prompt.trim().is_empty() {
        return Err(AppError::BadRequest("prompt must not be empty".to_string()));
    }

    let data = send_raw_prompt(&state.http_client, &payload.prompt).await?;

    Ok(Json(RawPromptResponse {
        success: true,
        data,
        complete: true,
    }))
}
