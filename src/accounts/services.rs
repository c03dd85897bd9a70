use rand::{rngs::OsRng, RngCore};
use time::{Duration, OffsetDateTime};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::repo;
use super::repo_types::DeletedAccount;
use crate::auth::AuthUser;
use crate::effects::spawn_best_effort;
use crate::error::{AppError, AppResult};
use crate::mailer::Mail;
use crate::state::AppState;
use crate::storage::certificate_pdf_key;

pub const DELETE_TOKEN_TTL: Duration = Duration::hours(24);

/// 32 random bytes, hex encoded.
pub fn new_delete_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn confirmation_link(server_url: &str, token: &str) -> String {
    format!(
        "{}/api/confirm-account-deletion/{}",
        server_url.trim_end_matches('/'),
        token
    )
}

#[instrument(skip(state), fields(user_id = user.id))]
pub async fn request_deletion(state: &AppState, user: &AuthUser) -> AppResult<Option<JoinHandle<()>>> {
    let token = new_delete_token();
    let expires = OffsetDateTime::now_utc() + DELETE_TOKEN_TTL;
    if !repo::set_delete_token(&state.db, user.id, &token, expires).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!("account deletion requested");

    let contact = repo::find_contact(&state.db, user.id).await?;
    let Some(to) = contact.as_ref().and_then(|c| c.contact_email.clone()) else {
        warn!("no contact email; deletion link not sent");
        return Ok(None);
    };
    let first_name = contact.and_then(|c| c.first_name).unwrap_or_default();
    let link = confirmation_link(&state.config.server_url, &token);

    let mailer = state.mailer.clone();
    Ok(Some(spawn_best_effort("account_deletion_mail", async move {
        mailer
            .send(Mail {
                to,
                subject: "Confirm your account deletion".into(),
                text: format!(
                    "Hi {first_name},\n\nYou asked us to delete your CertiSphere account.\n\
                     Click the link below to confirm (valid for 24 h):\n\n{link}\n\n\
                     If you didn't request this, simply ignore the e-mail."
                ),
            })
            .await
    })))
}

/// All-or-nothing: any failing step rolls the whole deletion back.
#[instrument(skip_all)]
pub async fn confirm_deletion(state: &AppState, token: &str) -> AppResult<DeletedAccount> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::validation("Invalid or expired link"));
    }

    let mut tx = state.db.begin().await?;
    let Some(user_id) = repo::lock_by_delete_token_tx(&mut tx, token).await? else {
        return Err(AppError::validation("Invalid or expired link"));
    };
    let deleted = repo::delete_cascade_tx(&mut tx, user_id).await?;
    tx.commit().await?;

    info!(
        user_id,
        documents = deleted.document_paths.len(),
        certificates = deleted.certificate_ids.len(),
        "account deleted"
    );
    purge_objects(state, &deleted);
    Ok(deleted)
}

/// Best-effort removal of stored objects once the rows are gone.
fn purge_objects(state: &AppState, deleted: &DeletedAccount) -> JoinHandle<()> {
    let storage = state.storage.clone();
    let user_id = deleted.user_id;
    let mut keys = deleted.document_paths.clone();
    keys.extend(deleted.certificate_ids.iter().map(|id| certificate_pdf_key(*id)));
    spawn_best_effort("purge_account_objects", async move {
        let mut failed = 0usize;
        for key in &keys {
            if let Err(e) = storage.delete_object(key).await {
                warn!(user_id, key = %key, error = %e, "object delete failed");
                failed += 1;
            }
        }
        if failed > 0 {
            anyhow::bail!("{} of {} objects left behind", failed, keys.len());
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_tokens_are_64_hex_chars_and_unique() {
        let a = new_delete_token();
        let b = new_delete_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hex::decode(&a).unwrap().len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn link_points_at_the_api() {
        assert_eq!(
            confirmation_link("https://api.example.com/", "abc"),
            "https://api.example.com/api/confirm-account-deletion/abc"
        );
    }

    #[tokio::test]
    async fn blank_token_is_rejected_without_touching_the_database() {
        let state = AppState::fake();
        let err = confirm_deletion(&state, "   ").await.unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    mod persisted {
        use sqlx::PgPool;

        use super::super::*;
        use crate::auth::Role;
        use crate::certificates::CertificateStatus;
        use crate::conversations::ConversationStatus;
        use crate::test_support::{client, seed_certificate, seed_conversation, seed_user};

        async fn count(pool: &PgPool, sql: &str, user_id: i64) -> i64 {
            let (n,): (i64,) = sqlx::query_as(sql).bind(user_id).fetch_one(pool).await.unwrap();
            n
        }

        async fn footprint(pool: &PgPool, user_id: i64) -> [i64; 6] {
            [
                count(pool, "SELECT COUNT(*) FROM users WHERE id = $1", user_id).await,
                count(pool, "SELECT COUNT(*) FROM certificates WHERE user_id = $1", user_id).await,
                count(pool, "SELECT COUNT(*) FROM documents WHERE user_id = $1", user_id).await,
                count(pool, "SELECT COUNT(*) FROM notifications WHERE user_id = $1", user_id).await,
                count(pool, "SELECT COUNT(*) FROM conversations WHERE client_id = $1", user_id).await,
                count(pool, "SELECT COUNT(*) FROM messages WHERE sender_id = $1", user_id).await,
            ]
        }

        /// A client with one of everything; returns the confirmation token.
        async fn seed_account(state: &AppState, pool: &PgPool, code: &str) -> (i64, String) {
            let user = seed_user(pool, code, Role::Client).await;
            let cert = seed_certificate(pool, user, Some(CertificateStatus::Submitted)).await;
            sqlx::query(
                "INSERT INTO documents (certificate_id, user_id, file_name, file_path) \
                 VALUES ($1, $2, 'plan.pdf', 'documents/plan.pdf')",
            )
            .bind(cert)
            .bind(user)
            .execute(pool)
            .await
            .unwrap();
            sqlx::query("INSERT INTO notifications (user_id, certificate_id, message) VALUES ($1, $2, 'hi')")
                .bind(user)
                .bind(cert)
                .execute(pool)
                .await
                .unwrap();
            let conv = seed_conversation(pool, Some(user), ConversationStatus::Pending).await;
            sqlx::query("INSERT INTO messages (conversation_id, sender_id, sender_role, content) VALUES ($1, $2, 'client', 'hello')")
                .bind(conv)
                .bind(user)
                .execute(pool)
                .await
                .unwrap();

            if let Some(mail) = request_deletion(state, &client(user)).await.unwrap() {
                mail.await.unwrap();
            }
            let (token,): (String,) = sqlx::query_as("SELECT delete_token FROM users WHERE id = $1")
                .bind(user)
                .fetch_one(pool)
                .await
                .unwrap();
            (user, token)
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn confirmed_deletion_removes_every_row(pool: PgPool) {
            let state = AppState::with_pool(pool.clone());
            let (user, token) = seed_account(&state, &pool, "ACM000030").await;
            assert_eq!(footprint(&pool, user).await, [1, 1, 1, 1, 1, 1]);

            let deleted = confirm_deletion(&state, &token).await.unwrap();
            assert_eq!(deleted.document_paths, vec!["documents/plan.pdf".to_string()]);
            assert_eq!(deleted.certificate_ids.len(), 1);
            assert_eq!(footprint(&pool, user).await, [0; 6]);

            let err = confirm_deletion(&state, &token).await.unwrap_err();
            assert_eq!(err.kind(), "validation");
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn failed_deletion_leaves_every_row(pool: PgPool) {
            let state = AppState::with_pool(pool.clone());
            let (user, token) = seed_account(&state, &pool, "ACM000031").await;

            // A reference the cascade does not know about makes the last delete fail.
            sqlx::query("CREATE TABLE user_pins (user_id BIGINT NOT NULL REFERENCES users (id))")
                .execute(&pool)
                .await
                .unwrap();
            sqlx::query("INSERT INTO user_pins (user_id) VALUES ($1)")
                .bind(user)
                .execute(&pool)
                .await
                .unwrap();

            assert!(confirm_deletion(&state, &token).await.is_err());
            assert_eq!(footprint(&pool, user).await, [1, 1, 1, 1, 1, 1]);
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn expired_link_is_rejected(pool: PgPool) {
            let state = AppState::with_pool(pool.clone());
            let (user, token) = seed_account(&state, &pool, "ACM000032").await;
            sqlx::query("UPDATE users SET delete_token_expires = NOW() - INTERVAL '1 minute' WHERE id = $1")
                .bind(user)
                .execute(&pool)
                .await
                .unwrap();

            let err = confirm_deletion(&state, &token).await.unwrap_err();
            assert_eq!(err.kind(), "validation");
            assert_eq!(footprint(&pool, user).await, [1, 1, 1, 1, 1, 1]);
        }
    }
}
