use tracing::{info, instrument, warn};

use super::dto::{Payment, PendingCertificate};
use super::repo;
use super::repo_types::PaymentRow;
use crate::auth::AuthUser;
use crate::certificates::catalogue::{derived_price, to_major_units};
use crate::certificates::services::guard_failure;
use crate::certificates::{self, Certificate, CertificateStatus};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Stored price, or one derived from the type for rows priced before the catalogue.
pub fn effective_price(cert: &Certificate) -> Option<i64> {
    cert.price
        .or_else(|| derived_price(cert.certificate_type.as_deref()))
}

/// `%term%`, lowercased, with `LIKE` wildcards in the term escaped.
pub fn search_pattern(term: Option<&str>) -> Option<String> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{}%", escaped))
}

fn to_payment(row: PaymentRow, staff_view: bool) -> Payment {
    let cents = row
        .price
        .or_else(|| derived_price(row.certificate_type.as_deref()));
    Payment {
        certificate_id: row.certificate_id,
        certificate_reference: row.certificate_reference,
        certificate_name: (!staff_view).then_some(row.certificate_name).flatten(),
        client_code: staff_view.then_some(row.client_code),
        business_name: staff_view.then_some(row.business_name).flatten(),
        amount_eur: to_major_units(cents),
        paid_at: row.paid_at,
    }
}

pub async fn pending(state: &AppState, user: &AuthUser) -> AppResult<Vec<PendingCertificate>> {
    let certs =
        certificates::repo::list_by_owner_in_status(&state.db, user.id, CertificateStatus::PendingPayment)
            .await?;
    Ok(certs
        .into_iter()
        .map(|c| PendingCertificate {
            price: effective_price(&c),
            id: c.id,
            status: c.status,
            created_at: c.created_at,
            certificate_type: c.certificate_type,
            certificate_name: c.certificate_name,
        })
        .collect())
}

/// Opens a payment with the provider for a certificate awaiting payment.
/// Returns the provider's client handle and the amount in minor units.
#[instrument(skip(state), fields(user_id = user.id))]
pub async fn start_payment(state: &AppState, user: &AuthUser, certificate_id: Option<i64>) -> AppResult<(String, i64)> {
    let id = certificate_id.ok_or_else(|| AppError::validation("Missing certificateId"))?;
    let cert = certificates::repo::find(&state.db, id).await?;
    let cert = match cert {
        Some(c) if c.user_id == user.id && c.status == Some(CertificateStatus::PendingPayment) => c,
        other => {
            return Err(guard_failure(
                other.as_ref(),
                user.id,
                "Certificate not in pending payment state",
            ))
        }
    };
    let amount = effective_price(&cert)
        .filter(|p| *p > 0)
        .ok_or_else(|| AppError::validation("Cannot determine price for this certificate"))?;

    let handle = state
        .payments
        .create_intent(amount, &format!("Payment for Certificate #{}", id), id)
        .await
        .map_err(|e| {
            warn!(certificate_id = id, error = %e, "payment provider rejected intent");
            AppError::Internal(e)
        })?;
    info!(certificate_id = id, amount, "payment intent created");
    Ok((handle.client_secret, amount))
}

pub async fn my_payments(state: &AppState, user: &AuthUser) -> AppResult<Vec<Payment>> {
    let rows = repo::list_for_user(&state.db, user.id).await?;
    Ok(rows.into_iter().map(|r| to_payment(r, false)).collect())
}

pub async fn all_payments(state: &AppState, search: Option<&str>) -> AppResult<Vec<Payment>> {
    let pattern = search_pattern(search);
    let rows = repo::list_all(&state.db, pattern.as_deref()).await?;
    Ok(rows.into_iter().map(|r| to_payment(r, true)).collect())
}
