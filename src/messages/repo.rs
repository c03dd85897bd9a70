use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;

use super::repo_types::{LockedConversation, Message, MessageView};
use crate::auth::Role;
use crate::conversations::ConversationStatus;

pub async fn lock_conversation_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> sqlx::Result<Option<LockedConversation>> {
    sqlx::query_as::<_, LockedConversation>(
        r#"
        SELECT conv.id, conv.client_id, conv.conversation_status, u.user_code AS client_code
          FROM conversations conv
          LEFT JOIN users u ON u.id = conv.client_id
         WHERE conv.id = $1
           FOR UPDATE OF conv
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
}

/// Timestamped at insert time, not transaction start, so rows written under
/// the conversation lock sort in commit order.
pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    conversation_id: i64,
    sender_id: i64,
    sender_role: Role,
    content: &str,
) -> sqlx::Result<Message> {
    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (conversation_id, sender_id, sender_role, content, created_at)
        VALUES ($1, $2, $3, $4, clock_timestamp())
        RETURNING id, conversation_id, sender_id, sender_role, content, created_at
        "#,
    )
    .bind(conversation_id)
    .bind(sender_id)
    .bind(sender_role)
    .bind(content)
    .fetch_one(&mut **tx)
    .await
}

/// Recency never drops below the timestamp of the message that caused it.
pub async fn bump_recency_tx(
    tx: &mut Transaction<'_, Postgres>,
    conversation_id: i64,
    at_least: OffsetDateTime,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE conversations SET updated_at = GREATEST(clock_timestamp(), $2) WHERE id = $1")
        .bind(conversation_id)
        .bind(at_least)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn set_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    conversation_id: i64,
    status: ConversationStatus,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE conversations SET conversation_status = $2 WHERE id = $1")
        .bind(conversation_id)
        .bind(status)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn list_for_conversation(db: &PgPool, conversation_id: i64) -> sqlx::Result<Vec<MessageView>> {
    sqlx::query_as::<_, MessageView>(
        r#"
        SELECT m.id, m.conversation_id, m.sender_id, m.sender_role, m.content, m.created_at,
               u.user_code AS client_code
          FROM messages m
          JOIN conversations conv ON conv.id = m.conversation_id
          LEFT JOIN users u       ON u.id = conv.client_id
         WHERE m.conversation_id = $1
         ORDER BY m.created_at ASC, m.id ASC
        "#,
    )
    .bind(conversation_id)
    .fetch_all(db)
    .await
}
