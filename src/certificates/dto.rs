use serde::{Deserialize, Serialize};

use super::catalogue::{CertificateType, TypeSelector};
use super::repo_types::{Certificate, CertificateStatus, CertificateWithClient};
use crate::serde_ext::double_option;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateCertificateRequest {
    pub certificate_id: Option<i64>,
    pub certificate_type: Option<TypeSelector>,
    pub certificate_name: Option<String>,
    pub iso_standards: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct StaffCertificatePatch {
    pub status: Option<CertificateStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_admin_id: Option<Option<i64>>,
    /// Staff price override in minor units. Stored prices win over the type prefix.
    pub price: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CertificateResponse {
    pub success: bool,
    pub certificate: Certificate,
}

#[derive(Debug, Serialize)]
pub struct StaffCertificateResponse {
    pub success: bool,
    pub certificate: CertificateWithClient,
}

#[derive(Debug, Serialize)]
pub struct CertificateListResponse {
    pub success: bool,
    pub certificates: Vec<Certificate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalogue {
    pub certificate_types: &'static [CertificateType],
    pub iso_standards: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct CatalogueResponse {
    pub success: bool,
    pub data: Catalogue,
}
