use axum::{
    extract::{Path, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;

use super::services;
use crate::{auth::AuthUser, error::AppResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/request-account-deletion", post(request_account_deletion))
        .route("/confirm-account-deletion/:token", get(confirm_account_deletion))
}

#[instrument(skip(state))]
pub async fn request_account_deletion(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Value>> {
    services::request_deletion(&state, &user).await?;
    Ok(Json(json!({ "success": true })))
}

#[instrument(skip_all)]
pub async fn confirm_account_deletion(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Html<&'static str>> {
    services::confirm_deletion(&state, &token).await?;
    Ok(Html(
        "<h2>Account deleted</h2>\
         <p>Your account and all related data have been permanently removed.</p>",
    ))
}
