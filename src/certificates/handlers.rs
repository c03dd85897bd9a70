use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::catalogue::{CERTIFICATE_TYPES, ISO_STANDARDS};
use super::dto::{
    Catalogue, CatalogueResponse, CertificateListResponse, CertificateResponse,
    GenerateCertificateRequest, StaffCertificatePatch, StaffCertificateResponse,
};
use super::{repo, services};
use crate::{
    auth::{AdminUser, AuthUser},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/certificate-types", get(certificate_types))
        .route("/generate-certificate", post(generate_certificate))
        .route("/my-certificates", get(my_certificates))
        .route("/certificates/:id", get(get_certificate))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route(
        "/admin/certificates/:id",
        get(admin_get_certificate).patch(admin_update_certificate),
    )
}

#[instrument(skip_all)]
pub async fn certificate_types(_user: AuthUser) -> Json<CatalogueResponse> {
    Json(CatalogueResponse {
        success: true,
        data: Catalogue {
            certificate_types: CERTIFICATE_TYPES,
            iso_standards: ISO_STANDARDS,
        },
    })
}

#[instrument(skip(state, body))]
pub async fn generate_certificate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<GenerateCertificateRequest>,
) -> AppResult<Json<CertificateResponse>> {
    let certificate = services::assign_type(
        &state,
        &user,
        services::TypeAssignment {
            certificate_id: body.certificate_id,
            certificate_type: body.certificate_type,
            certificate_name: body.certificate_name,
            iso_standards: body.iso_standards,
        },
    )
    .await?;
    Ok(Json(CertificateResponse {
        success: true,
        certificate,
    }))
}

#[instrument(skip(state))]
pub async fn my_certificates(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<CertificateListResponse>> {
    let certificates = repo::list_by_owner(&state.db, user.id).await?;
    Ok(Json(CertificateListResponse {
        success: true,
        certificates,
    }))
}

#[instrument(skip(state))]
pub async fn get_certificate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<CertificateResponse>> {
    let certificate = repo::find_owned(&state.db, id, user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Certificate not found"))?;
    Ok(Json(CertificateResponse {
        success: true,
        certificate,
    }))
}

#[instrument(skip(state))]
pub async fn admin_get_certificate(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<StaffCertificateResponse>> {
    let certificate = repo::find_with_client(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Certificate not found"))?;
    Ok(Json(StaffCertificateResponse {
        success: true,
        certificate,
    }))
}

#[instrument(skip(state, body))]
pub async fn admin_update_certificate(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<StaffCertificatePatch>,
) -> AppResult<Json<CertificateResponse>> {
    // The render task, if any, runs detached; its outcome never reaches the response.
    let (certificate, _render) =
        services::staff_update(
        &state,
        &admin,
        id,
        services::StaffPatch {
            status: body.status,
            assigned_admin_id: body.assigned_admin_id,
            price: body.price,
        },
    )
    .await?;
    Ok(Json(CertificateResponse {
        success: true,
        certificate,
    }))
}
