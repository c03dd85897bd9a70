use serde::{Deserialize, Serialize};

use super::repo_types::MessageView;
use crate::auth::Role;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub content: Option<String>,
    pub sender_id: Option<i64>,
    pub sender_role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: MessageView,
}

#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub success: bool,
    pub messages: Vec<MessageView>,
}
