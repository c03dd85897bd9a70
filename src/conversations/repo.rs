use sqlx::PgPool;

use super::repo_types::{Conversation, ConversationStatus, ConversationSummary};

const COLUMNS: &str =
    "id, client_id, admin_id, certificate_id, conversation_status, created_at, updated_at";

pub async fn insert_for_client(
    db: &PgPool,
    client_id: i64,
    admin_id: Option<i64>,
    certificate_id: Option<i64>,
) -> sqlx::Result<Conversation> {
    sqlx::query_as::<_, Conversation>(&format!(
        r#"
        INSERT INTO conversations (client_id, admin_id, certificate_id, conversation_status)
        VALUES ($1, $2, $3, 'pending')
        RETURNING {COLUMNS}
        "#
    ))
    .bind(client_id)
    .bind(admin_id)
    .bind(certificate_id)
    .fetch_one(db)
    .await
}

/// Staff-opened thread; status is left to the column default.
pub async fn insert_for_staff(db: &PgPool, client_id: i64, admin_id: i64) -> sqlx::Result<Conversation> {
    sqlx::query_as::<_, Conversation>(&format!(
        "INSERT INTO conversations (client_id, admin_id) VALUES ($1, $2) RETURNING {COLUMNS}"
    ))
    .bind(client_id)
    .bind(admin_id)
    .fetch_one(db)
    .await
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<Conversation>> {
    sqlx::query_as::<_, Conversation>(&format!("SELECT {COLUMNS} FROM conversations WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_for_client(db: &PgPool, client_id: i64) -> sqlx::Result<Vec<Conversation>> {
    sqlx::query_as::<_, Conversation>(&format!(
        "SELECT {COLUMNS} FROM conversations WHERE client_id = $1 ORDER BY updated_at DESC, id DESC"
    ))
    .bind(client_id)
    .fetch_all(db)
    .await
}

pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<ConversationSummary>> {
    sqlx::query_as::<_, ConversationSummary>(
        r#"
        SELECT conv.id, conv.client_id, conv.admin_id, conv.certificate_id,
               conv.conversation_status, conv.created_at, conv.updated_at,
               u.user_code AS client_code, c.certificate_name
          FROM conversations conv
          LEFT JOIN users u        ON u.id = conv.client_id
          LEFT JOIN certificates c ON c.id = conv.certificate_id
         ORDER BY conv.updated_at DESC, conv.id DESC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn patch(
    db: &PgPool,
    id: i64,
    admin_id: Option<Option<i64>>,
    status: Option<ConversationStatus>,
) -> sqlx::Result<Option<Conversation>> {
    sqlx::query_as::<_, Conversation>(&format!(
        r#"
        UPDATE conversations
           SET admin_id            = CASE WHEN $2 THEN $3 ELSE admin_id END,
               conversation_status = COALESCE($4, conversation_status),
               updated_at          = NOW()
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(admin_id.is_some())
    .bind(admin_id.flatten())
    .bind(status)
    .fetch_optional(db)
    .await
}

/// Deterministic pick even if the uniqueness index were ever missing.
pub async fn team_chat(db: &PgPool) -> sqlx::Result<Option<Conversation>> {
    sqlx::query_as::<_, Conversation>(&format!(
        r#"
        SELECT {COLUMNS} FROM conversations
         WHERE conversation_status = 'team-chat'
         ORDER BY updated_at DESC, id DESC
         LIMIT 1
        "#
    ))
    .fetch_optional(db)
    .await
}
