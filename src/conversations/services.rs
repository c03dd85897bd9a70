use tracing::{info, instrument, warn};

use super::repo;
use super::repo_types::{Conversation, ConversationStatus, ConversationSummary};
use crate::accounts;
use crate::auth::{AdminUser, AuthUser, Role};
use crate::certificates;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Staff may act on any conversation; a client only on its own.
pub fn can_access(user: &AuthUser, client_id: Option<i64>) -> bool {
    user.is_admin() || client_id == Some(user.id)
}

/// Loads a conversation the caller is allowed to read or write.
pub async fn accessible(state: &AppState, user: &AuthUser, id: i64) -> AppResult<Conversation> {
    let conv = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation not found"))?;
    if !can_access(user, conv.client_id) {
        warn!(user_id = user.id, conversation_id = id, "conversation access denied");
        return Err(AppError::forbidden("Not a participant of this conversation"));
    }
    Ok(conv)
}

fn require_client(user: &AuthUser) -> AppResult<()> {
    if user.role != Role::Client {
        return Err(AppError::forbidden("Only clients can use this route"));
    }
    Ok(())
}

#[instrument(skip(state), fields(user_id = user.id))]
pub async fn create_for_client(
    state: &AppState,
    user: &AuthUser,
    admin_id: Option<i64>,
    certificate_id: Option<i64>,
) -> AppResult<Conversation> {
    require_client(user)?;

    if let Some(cert_id) = certificate_id {
        let owned = certificates::repo::find_owned(&state.db, cert_id, user.id).await?;
        if owned.is_none() {
            return Err(AppError::validation("Invalid certificateId"));
        }
    }

    let conv = repo::insert_for_client(&state.db, user.id, admin_id, certificate_id).await?;
    info!(conversation_id = conv.id, "conversation opened by client");
    Ok(conv)
}

#[instrument(skip(state), fields(admin_id = admin.0.id))]
pub async fn create_for_staff(state: &AppState, admin: &AdminUser, client_id: Option<i64>) -> AppResult<Conversation> {
    let client_id = client_id.ok_or_else(|| AppError::validation("Missing user_id"))?;
    if !accounts::repo::exists_with_role(&state.db, client_id, Role::Client).await? {
        return Err(AppError::not_found("Client not found"));
    }

    let conv = repo::insert_for_staff(&state.db, client_id, admin.0.id).await?;
    info!(conversation_id = conv.id, client_id, "conversation opened by staff");
    Ok(conv)
}

pub async fn list_for_owner(state: &AppState, user: &AuthUser) -> AppResult<Vec<Conversation>> {
    require_client(user)?;
    Ok(repo::list_for_client(&state.db, user.id).await?)
}

pub async fn list_all(state: &AppState) -> AppResult<Vec<ConversationSummary>> {
    Ok(repo::list_all(&state.db).await?)
}

#[instrument(skip(state), fields(admin_id = admin.0.id))]
pub async fn patch(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
    admin_id: Option<Option<i64>>,
    status: Option<ConversationStatus>,
) -> AppResult<Conversation> {
    if admin_id.is_none() && status.is_none() {
        return Err(AppError::validation("No fields to update"));
    }
    let conv = repo::patch(&state.db, id, admin_id, status)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation not found"))?;
    info!(conversation_id = conv.id, status = ?conv.conversation_status, "conversation updated by staff");
    Ok(conv)
}

pub async fn team_chat(state: &AppState) -> AppResult<Conversation> {
    repo::team_chat(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("No team-chat conversation found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: Role) -> AuthUser {
        AuthUser {
            id,
            code: "X".into(),
            role,
        }
    }

    #[test]
    fn owner_and_staff_can_access() {
        assert!(can_access(&user(7, Role::Client), Some(7)));
        assert!(can_access(&user(1, Role::Admin), Some(7)));
        assert!(can_access(&user(1, Role::Admin), None));
    }

    #[test]
    fn other_clients_cannot_access() {
        assert!(!can_access(&user(8, Role::Client), Some(7)));
        assert!(!can_access(&user(8, Role::Client), None));
    }

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&ConversationStatus::TeamChat).unwrap(),
            "\"team-chat\""
        );
        let parsed: ConversationStatus = serde_json::from_str("\"answered\"").unwrap();
        assert_eq!(parsed, ConversationStatus::Answered);
    }
}
