use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::certificates::{Certificate, CertificateStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub certificate_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentSearch {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PendingCertificate {
    pub id: i64,
    pub status: Option<CertificateStatus>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub certificate_type: Option<String>,
    pub certificate_name: Option<String>,
    pub price: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PendingListResponse {
    pub success: bool,
    pub certificates: Vec<PendingCertificate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayResponse {
    pub success: bool,
    pub client_secret: String,
    pub amount: i64,
}

#[derive(Debug, Serialize)]
pub struct Payment {
    pub certificate_id: i64,
    pub certificate_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    pub amount_eur: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub paid_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub success: bool,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Serialize)]
pub struct MarkPaidResponse {
    pub success: bool,
    pub certificate: Certificate,
}
