use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    auth::jwt::Claims, db_core::prelude::*, error::AppJsonResult, model::agent::AgentCtrl,
    ServerState,
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub data: agent::Model,
}

/// Sign-in endpoint for the CRM frontend. The first sign-in of a new
/// authenticated user lazily creates their agent row.
pub async fn handler_login(
    claims: Claims,
    State(state): State<ServerState>,
) -> AppJsonResult<LoginResponse> {
    let agent =
        AgentCtrl::ensure_for_sign_in(&state.conn, &claims.email, claims.name.as_deref()).await?;

    Ok(Json(LoginResponse {
        success: true,
        data: agent,
    }))
}
