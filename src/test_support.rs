use axum::{body::Body, http::Response, Router};
use sqlx::PgPool;

use crate::certificates::CertificateStatus;
use crate::conversations::ConversationStatus;
use crate::{app::build_app, auth::jwt::JwtKeys, auth::AuthUser, auth::Role, state::AppState};

pub fn state() -> AppState {
    AppState::fake()
}

pub fn app() -> Router {
    build_app(state())
}

fn keys() -> JwtKeys {
    JwtKeys::from_config(&state().config.jwt)
}

pub fn client_token(user_id: i64) -> String {
    keys().sign(user_id, &format!("ACM{:06}", user_id), Role::Client)
}

pub fn admin_token(user_id: i64) -> String {
    keys().sign(user_id, &format!("ADM{:04}", user_id), Role::Admin)
}

pub async fn json_body(res: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn client(id: i64) -> AuthUser {
    AuthUser {
        id,
        code: format!("ACM{:06}", id),
        role: Role::Client,
    }
}

pub fn admin(id: i64) -> AuthUser {
    AuthUser {
        id,
        code: format!("ADM{:04}", id),
        role: Role::Admin,
    }
}

pub async fn seed_user(db: &PgPool, code: &str, role: Role) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (user_code, role, contact_email) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(code)
    .bind(role)
    .bind(format!("{}@example.com", code.to_ascii_lowercase()))
    .fetch_one(db)
    .await
    .expect("seed user");
    id
}

pub async fn seed_certificate(db: &PgPool, user_id: i64, status: Option<CertificateStatus>) -> i64 {
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO certificates (user_id, status) VALUES ($1, $2) RETURNING id")
            .bind(user_id)
            .bind(status)
            .fetch_one(db)
            .await
            .expect("seed certificate");
    id
}

pub async fn seed_conversation(
    db: &PgPool,
    client_id: Option<i64>,
    status: ConversationStatus,
) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO conversations (client_id, conversation_status) VALUES ($1, $2) RETURNING id",
    )
    .bind(client_id)
    .bind(status)
    .fetch_one(db)
    .await
    .expect("seed conversation");
    id
}
