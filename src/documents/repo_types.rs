use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::certificates::CertificateStatus;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub certificate_id: i64,
    pub user_id: i64,
    pub file_name: String,
    pub file_path: String,
    /// Set by staff only; `None` until reviewed.
    pub is_correct: Option<bool>,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
}

/// A client's own document with the certificate it belongs to.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClientDocument {
    pub document_id: i64,
    pub certificate_id: i64,
    pub file_name: String,
    pub file_path: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    pub certificate_name: Option<String>,
    pub certificate_status: Option<CertificateStatus>,
    pub price: Option<i64>,
    pub paid: bool,
}
