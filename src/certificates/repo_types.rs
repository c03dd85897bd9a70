use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "certificate_status")]
pub enum CertificateStatus {
    #[sqlx(rename = "Pending Payment")]
    #[serde(rename = "Pending Payment")]
    PendingPayment,
    #[sqlx(rename = "Submitted")]
    Submitted,
    #[sqlx(rename = "Additional Documents Required")]
    #[serde(rename = "Additional Documents Required")]
    AdditionalDocumentsRequired,
    #[sqlx(rename = "Completed")]
    Completed,
}

/// Certificate record in the database. `status` is NULL until a type is chosen.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Certificate {
    pub id: i64,
    pub user_id: i64,
    pub status: Option<CertificateStatus>,
    pub certificate_type: Option<String>,
    pub certificate_name: Option<String>,
    pub iso_standards: Option<Vec<String>>,
    pub price: Option<i64>,               // minor currency units
    pub paid: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub paid_at: Option<OffsetDateTime>,
    pub certificate_reference: Option<String>,
    pub assigned_admin_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Row returned by the staff update: the new state plus the status it replaced.
#[derive(Debug, Clone, FromRow)]
pub struct CertificateTransition {
    #[sqlx(flatten)]
    pub certificate: Certificate,
    pub previous_status: Option<CertificateStatus>,
}

/// Certificate joined with its owner, for staff views and rendering.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CertificateWithClient {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub certificate: Certificate,
    pub client_code: String,
    pub business_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub contact_email: Option<String>,
}
