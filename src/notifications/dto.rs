use serde::{Deserialize, Serialize};

use super::repo_types::Notification;

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub user_id: Option<i64>,
    pub certificate_id: Option<i64>,
    pub message: Option<String>,
    #[serde(default)]
    pub request_new_document: bool,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub is_read: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub success: bool,
    pub notification: Notification,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListResponse {
    pub success: bool,
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}
