use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    MarkPaidResponse, PayRequest, PayResponse, PaymentListResponse, PaymentSearch,
    PendingListResponse,
};
use super::services;
use crate::{
    auth::{AdminUser, AuthUser},
    certificates,
    error::AppResult,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/my-pending-certificates", get(my_pending_certificates))
        .route("/pay-certificate", post(pay_certificate))
        .route("/certificates/:id/mark-paid", patch(mark_paid))
        .route("/my-payments", get(my_payments))
        .route("/admin/payments", get(admin_payments))
}

#[instrument(skip(state))]
pub async fn my_pending_certificates(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<PendingListResponse>> {
    let certificates = services::pending(&state, &user).await?;
    Ok(Json(PendingListResponse {
        success: true,
        certificates,
    }))
}

#[instrument(skip(state, body))]
pub async fn pay_certificate(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<PayRequest>,
) -> AppResult<Json<PayResponse>> {
    let (client_secret, amount) = services::start_payment(&state, &user, body.certificate_id).await?;
    Ok(Json(PayResponse {
        success: true,
        client_secret,
        amount,
    }))
}

#[instrument(skip(state))]
pub async fn mark_paid(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MarkPaidResponse>> {
    let certificate = certificates::services::confirm_payment(&state, &user, id).await?;
    Ok(Json(MarkPaidResponse {
        success: true,
        certificate,
    }))
}

#[instrument(skip(state))]
pub async fn my_payments(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<PaymentListResponse>> {
    let payments = services::my_payments(&state, &user).await?;
    Ok(Json(PaymentListResponse {
        success: true,
        payments,
    }))
}

#[instrument(skip(state))]
pub async fn admin_payments(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(q): Query<PaymentSearch>,
) -> AppResult<Json<PaymentListResponse>> {
    let payments = services::all_payments(&state, q.search.as_deref()).await?;
    Ok(Json(PaymentListResponse {
        success: true,
        payments,
    }))
}
