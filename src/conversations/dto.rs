use serde::{Deserialize, Serialize};

use super::repo_types::{Conversation, ConversationStatus, ConversationSummary};
use crate::serde_ext::double_option;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub admin_id: Option<i64>,
    pub certificate_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StaffCreateConversationRequest {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub admin_id: Option<Option<i64>>,
    pub conversation_status: Option<ConversationStatus>,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub success: bool,
    pub conversation: Conversation,
}

#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub success: bool,
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Serialize)]
pub struct ConversationSummaryListResponse {
    pub success: bool,
    pub conversations: Vec<ConversationSummary>,
}
