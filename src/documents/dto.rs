use serde::{Deserialize, Serialize};

use super::repo_types::{ClientDocument, Document};

#[derive(Debug, Deserialize)]
pub struct ReviewDocumentRequest {
    pub is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: &'static str,
    pub certificate_id: i64,
    pub documents: Vec<Document>,
}

#[derive(Debug, Serialize)]
pub struct NotificationUploadResponse {
    pub success: bool,
    pub message: &'static str,
    pub document: Document,
}

#[derive(Debug, Serialize)]
pub struct ClientDocumentListResponse {
    pub success: bool,
    pub documents: Vec<ClientDocument>,
}

#[derive(Debug, Serialize)]
pub struct StaffDocument {
    #[serde(flatten)]
    pub document: Document,
    pub download_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StaffDocumentListResponse {
    pub success: bool,
    pub documents: Vec<StaffDocument>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub success: bool,
    pub document: Document,
}
