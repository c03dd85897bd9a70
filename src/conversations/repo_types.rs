use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "conversation_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ConversationStatus {
    Pending,
    Answered,
    TeamChat,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Conversation {
    pub id: i64,
    /// `None` only for the team-chat conversation.
    pub client_id: Option<i64>,
    pub admin_id: Option<i64>,
    pub certificate_id: Option<i64>,
    pub conversation_status: ConversationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Staff listing row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ConversationSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub conversation: Conversation,
    pub client_code: Option<String>,
    pub certificate_name: Option<String>,
}
