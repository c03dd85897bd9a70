use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;

use super::dto::{CreateNotificationRequest, MarkReadRequest, NotificationListResponse, NotificationResponse};
use super::services::{self, NewNotification};
use crate::{
    auth::{AdminUser, AuthUser},
    error::AppResult,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(my_notifications))
        .route("/notifications/:id", patch(mark_read))
        .route(
            "/admin/notifications",
            get(admin_notifications).post(create_notification),
        )
}

#[instrument(skip(state, body))]
pub async fn create_notification(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(body): Json<CreateNotificationRequest>,
) -> AppResult<(StatusCode, Json<NotificationResponse>)> {
    let (notification, _mail) = services::create(
        &state,
        &admin,
        NewNotification {
            user_id: body.user_id,
            certificate_id: body.certificate_id,
            message: body.message,
            request_new_document: body.request_new_document,
        },
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(NotificationResponse {
            success: true,
            notification,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn my_notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<NotificationListResponse>> {
    let (notifications, unread_count) = services::list_for(&state, user.id).await?;
    Ok(Json(NotificationListResponse {
        success: true,
        notifications,
        unread_count,
    }))
}

#[instrument(skip(state))]
pub async fn admin_notifications(
    State(state): State<AppState>,
    admin: AdminUser,
) -> AppResult<Json<NotificationListResponse>> {
    let (notifications, unread_count) = services::list_for(&state, admin.0.id).await?;
    Ok(Json(NotificationListResponse {
        success: true,
        notifications,
        unread_count,
    }))
}

#[instrument(skip(state, body))]
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<MarkReadRequest>,
) -> AppResult<Json<NotificationResponse>> {
    let notification = services::set_read(&state, &user, id, body.is_read).await?;
    Ok(Json(NotificationResponse {
        success: true,
        notification,
    }))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use crate::test_support::{admin_token, app, client_token, json_body};

    #[tokio::test]
    async fn only_staff_create_notifications() {
        let res = app()
            .oneshot(
                Request::post("/api/admin/notifications")
                    .header("authorization", format!("Bearer {}", client_token(1)))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"user_id": 1, "message": "hi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let res = app()
            .oneshot(
                Request::post("/api/admin/notifications")
                    .header("authorization", format!("Bearer {}", admin_token(100)))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"user_id": 1, "message": " "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"], "Missing user_id or message");
    }

    #[tokio::test]
    async fn mark_read_needs_the_flag() {
        let res = app()
            .oneshot(
                Request::patch("/api/notifications/3")
                    .header("authorization", format!("Bearer {}", client_token(1)))
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"], "Invalid is_read flag");
    }
}
