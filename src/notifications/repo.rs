use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::Notification;

const COLUMNS: &str = "id, user_id, certificate_id, message, is_read, request_new_document, created_at";

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    certificate_id: Option<i64>,
    message: &str,
    request_new_document: bool,
) -> sqlx::Result<Notification> {
    sqlx::query_as::<_, Notification>(&format!(
        r#"
        INSERT INTO notifications (user_id, certificate_id, message, request_new_document)
        VALUES ($1, $2, $3, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(certificate_id)
    .bind(message)
    .bind(request_new_document)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<Notification>> {
    sqlx::query_as::<_, Notification>(&format!("SELECT {COLUMNS} FROM notifications WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_for_user(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {COLUMNS} FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn set_read(db: &PgPool, id: i64, is_read: bool) -> sqlx::Result<Option<Notification>> {
    sqlx::query_as::<_, Notification>(&format!(
        "UPDATE notifications SET is_read = $2 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(is_read)
    .fetch_optional(db)
    .await
}
