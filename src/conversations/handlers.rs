use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    ConversationListResponse, ConversationPatch, ConversationResponse,
    ConversationSummaryListResponse, CreateConversationRequest, StaffCreateConversationRequest,
};
use super::services;
use crate::{
    auth::{AdminUser, AuthUser},
    error::AppResult,
    state::AppState,
};

pub fn client_routes() -> Router<AppState> {
    Router::new().route(
        "/conversations",
        get(list_conversations).post(create_conversation),
    )
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/conversations",
            get(admin_list_conversations).post(admin_create_conversation),
        )
        .route("/admin/conversations/team-chat", get(team_chat))
        .route("/admin/conversations/:id", patch(admin_update_conversation))
}

#[instrument(skip(state, body))]
pub async fn create_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    body: Option<Json<CreateConversationRequest>>,
) -> AppResult<(StatusCode, Json<ConversationResponse>)> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let conversation =
        services::create_for_client(&state, &user, body.admin_id, body.certificate_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ConversationResponse {
            success: true,
            conversation,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_conversations(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ConversationListResponse>> {
    let conversations = services::list_for_owner(&state, &user).await?;
    Ok(Json(ConversationListResponse {
        success: true,
        conversations,
    }))
}

#[instrument(skip(state, body))]
pub async fn admin_create_conversation(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(body): Json<StaffCreateConversationRequest>,
) -> AppResult<(StatusCode, Json<ConversationResponse>)> {
    let conversation = services::create_for_staff(&state, &admin, body.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ConversationResponse {
            success: true,
            conversation,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn admin_list_conversations(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ConversationSummaryListResponse>> {
    let conversations = services::list_all(&state).await?;
    Ok(Json(ConversationSummaryListResponse {
        success: true,
        conversations,
    }))
}

#[instrument(skip(state, body))]
pub async fn admin_update_conversation(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<ConversationPatch>,
) -> AppResult<Json<ConversationResponse>> {
    let conversation =
        services::patch(&state, &admin, id, body.admin_id, body.conversation_status).await?;
    Ok(Json(ConversationResponse {
        success: true,
        conversation,
    }))
}

#[instrument(skip(state))]
pub async fn team_chat(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<ConversationResponse>> {
    let conversation = services::team_chat(&state).await?;
    Ok(Json(ConversationResponse {
        success: true,
        conversation,
    }))
}
