use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;

use super::repo_types::{Contact, DeletedAccount};
use crate::auth::Role;

pub async fn exists_with_role(db: &PgPool, id: i64, role: Role) -> sqlx::Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 AND role = $2")
        .bind(id)
        .bind(role)
        .fetch_optional(db)
        .await?;
    Ok(row.is_some())
}

pub async fn find_contact(db: &PgPool, id: i64) -> sqlx::Result<Option<Contact>> {
    sqlx::query_as::<_, Contact>("SELECT contact_email, first_name FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn set_delete_token(
    db: &PgPool,
    id: i64,
    token: &str,
    expires: OffsetDateTime,
) -> sqlx::Result<bool> {
    let res = sqlx::query(
        "UPDATE users SET delete_token = $2, delete_token_expires = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(token)
    .bind(expires)
    .execute(db)
    .await?;
    Ok(res.rows_affected() == 1)
}

/// Locks the user holding an unexpired delete token.
pub async fn lock_by_delete_token_tx(
    tx: &mut Transaction<'_, Postgres>,
    token: &str,
) -> sqlx::Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT id FROM users
         WHERE delete_token = $1
           AND delete_token_expires > NOW()
         LIMIT 1
           FOR UPDATE
        "#,
    )
    .bind(token)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(row.map(|(id,)| id))
}

/// Removes every row owned by or hanging off `user_id`, dependants first.
pub async fn delete_cascade_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
) -> sqlx::Result<DeletedAccount> {
    sqlx::query(
        r#"
        DELETE FROM messages
         WHERE sender_id = $1
            OR conversation_id IN (
                SELECT id FROM conversations
                 WHERE client_id = $1
                    OR certificate_id IN (SELECT id FROM certificates WHERE user_id = $1)
            )
        "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM conversations
         WHERE client_id = $1
            OR certificate_id IN (SELECT id FROM certificates WHERE user_id = $1)
        "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    let document_paths: Vec<(String,)> = sqlx::query_as(
        r#"
        DELETE FROM documents
         WHERE user_id = $1
            OR certificate_id IN (SELECT id FROM certificates WHERE user_id = $1)
        RETURNING file_path
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM notifications
         WHERE user_id = $1
            OR certificate_id IN (SELECT id FROM certificates WHERE user_id = $1)
        "#,
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    let certificate_ids: Vec<(i64,)> =
        sqlx::query_as("DELETE FROM certificates WHERE user_id = $1 RETURNING id")
            .bind(user_id)
            .fetch_all(&mut **tx)
            .await?;

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    Ok(DeletedAccount {
        user_id,
        document_paths: document_paths.into_iter().map(|(p,)| p).collect(),
        certificate_ids: certificate_ids.into_iter().map(|(id,)| id).collect(),
    })
}
