//! The one write path for chat messages. Both the HTTP handler and the
//! realtime socket call [`post_message`].

use tracing::{debug, info, instrument, warn};

use super::repo;
use super::repo_types::MessageView;
use crate::auth::{AuthUser, Role};
use crate::conversations::services::{accessible, can_access};
use crate::conversations::ConversationStatus;
use crate::error::{AppError, AppResult};
use crate::realtime::events::ServerEvent;
use crate::state::AppState;

/// Status a conversation takes after a message from `sender`.
/// Team-chat never moves; otherwise the latest sender decides.
pub fn next_status(current: ConversationStatus, sender: Role) -> Option<ConversationStatus> {
    match (current, sender) {
        (ConversationStatus::TeamChat, _) => None,
        (_, Role::Admin) => Some(ConversationStatus::Answered),
        (_, Role::Client) => Some(ConversationStatus::Pending),
    }
}

/// Inbound message, as received from either entry point.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: i64,
    /// Sender identity claimed by the caller; must match the token if present.
    pub sender_id: Option<i64>,
    pub sender_role: Option<Role>,
    pub content: String,
}

fn check_claims(user: &AuthUser, msg: &NewMessage) -> AppResult<()> {
    if msg.content.trim().is_empty() {
        return Err(AppError::validation("Message content required"));
    }
    if msg.sender_id.is_some_and(|id| id != user.id) {
        return Err(AppError::forbidden("senderId does not match the authenticated user"));
    }
    if msg.sender_role.is_some_and(|role| role != user.role) {
        return Err(AppError::forbidden("senderRole does not match the authenticated user"));
    }
    Ok(())
}

#[instrument(skip(state, msg), fields(user_id = user.id, user_code = %user.code, conversation_id = msg.conversation_id))]
pub async fn post_message(state: &AppState, user: &AuthUser, msg: NewMessage) -> AppResult<MessageView> {
    check_claims(user, &msg)?;

    let mut tx = state.db.begin().await?;
    let conv = repo::lock_conversation_tx(&mut tx, msg.conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation not found"))?;
    if !can_access(user, conv.client_id) {
        warn!("message rejected for non-participant");
        return Err(AppError::forbidden("Not a participant of this conversation"));
    }

    let message = repo::insert_tx(&mut tx, conv.id, user.id, user.role, &msg.content).await?;
    repo::bump_recency_tx(&mut tx, conv.id, message.created_at).await?;
    let status = next_status(conv.conversation_status, user.role);
    if let Some(status) = status {
        repo::set_status_tx(&mut tx, conv.id, status).await?;
    }
    tx.commit().await?;

    info!(message_id = message.id, ?status, "message posted");

    let view = MessageView {
        message,
        client_code: conv.client_code,
    };
    let delivered = state
        .hub
        .broadcast(view.message.conversation_id, ServerEvent::MessageReceived(view.clone()))
        .await;
    debug!(delivered, "message fanned out");
    Ok(view)
}

pub async fn list(state: &AppState, user: &AuthUser, conversation_id: i64) -> AppResult<Vec<MessageView>> {
    accessible(state, user, conversation_id).await?;
    Ok(repo::list_for_conversation(&state.db, conversation_id).await?)
}
