use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::Role;
use crate::conversations::ConversationStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub sender_role: Role,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A message as shown to participants, with the owning client's code.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MessageView {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub message: Message,
    pub client_code: Option<String>,
}

/// Conversation row held under lock while a message is appended.
#[derive(Debug, Clone, FromRow)]
pub struct LockedConversation {
    pub id: i64,
    pub client_id: Option<i64>,
    pub conversation_status: ConversationStatus,
    pub client_code: Option<String>,
}
