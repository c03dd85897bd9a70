use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{MessageListResponse, MessageResponse, PostMessageRequest};
use super::services::{self, NewMessage};
use crate::{auth::AuthUser, error::AppResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/conversations/:id/messages",
        get(list_messages).post(post_message),
    )
}

#[instrument(skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageListResponse>> {
    let messages = services::list(&state, &user, id).await?;
    Ok(Json(MessageListResponse {
        success: true,
        messages,
    }))
}

#[instrument(skip(state, body))]
pub async fn post_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<PostMessageRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let message = services::post_message(
        &state,
        &user,
        NewMessage {
            conversation_id: id,
            sender_id: body.sender_id,
            sender_role: body.sender_role,
            content: body.content.unwrap_or_default(),
        },
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use crate::test_support::{app, client_token, json_body};

    fn post(token: &str, body: &'static str) -> Request<Body> {
        Request::post("/api/conversations/9/messages")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn whitespace_message_is_validation_error() {
        let res = app().oneshot(post(&client_token(1), r#"{"content": "  "}"#)).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"], "Message content required");
    }

    #[tokio::test]
    async fn client_cannot_post_as_admin() {
        let res = app()
            .oneshot(post(&client_token(1), r#"{"content": "hi", "senderRole": "admin"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn reading_messages_requires_auth() {
        let res = app()
            .oneshot(
                Request::get("/api/conversations/9/messages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
