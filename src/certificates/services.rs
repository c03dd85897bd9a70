//! Certificate lifecycle: `(unset)` -> `Pending Payment` -> `Submitted`
//! <-> `Additional Documents Required` -> `Completed`.

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::catalogue::{resolve_price, resolve_type, TypeSelector};
use super::repo;
use super::repo_types::{Certificate, CertificateStatus};
use crate::auth::{AdminUser, AuthUser};
use crate::effects::spawn_best_effort;
use crate::error::{AppError, AppResult};
use crate::render::RenderInput;
use crate::state::AppState;

pub const REFERENCE_PREFIX: &str = "CS#";

/// Human-facing reference, assigned once at payment confirmation.
pub fn certificate_reference(created_year: i32, id: i64) -> String {
    format!("{}{}00{}", REFERENCE_PREFIX, created_year, id)
}

/// A render is due exactly when a certificate moves into `Completed`.
pub fn render_due(previous: Option<CertificateStatus>, current: Option<CertificateStatus>) -> bool {
    current == Some(CertificateStatus::Completed) && previous != Some(CertificateStatus::Completed)
}

/// Explains why a guarded update on `id` matched nothing.
pub(crate) fn guard_failure(
    row: Option<&Certificate>,
    user_id: i64,
    expected: &str,
) -> AppError {
    match row {
        None => AppError::not_found("Certificate not found"),
        Some(c) if c.user_id != user_id => AppError::forbidden("Certificate not found or not yours"),
        Some(_) => AppError::conflict(expected.to_string()),
    }
}

pub struct TypeAssignment {
    pub certificate_id: Option<i64>,
    pub certificate_type: Option<TypeSelector>,
    pub certificate_name: Option<String>,
    pub iso_standards: Option<Vec<String>>,
}

/// Type name and price for a client's selection. Clients never set prices.
pub fn priced_type(selector: Option<&TypeSelector>) -> (Option<String>, Option<i64>) {
    let (type_name, catalogue_price) = resolve_type(selector);
    let price = resolve_price(catalogue_price, type_name.as_deref());
    (type_name, price)
}

#[instrument(skip(state, req), fields(user_id = user.id))]
pub async fn assign_type(state: &AppState, user: &AuthUser, req: TypeAssignment) -> AppResult<Certificate> {
    let id = req
        .certificate_id
        .ok_or_else(|| AppError::validation("Missing certificateId"))?;

    let (type_name, price) = priced_type(req.certificate_type.as_ref());
    let name = req.certificate_name.filter(|n| !n.trim().is_empty());

    let updated = repo::assign_type(
        &state.db,
        id,
        user.id,
        type_name.as_deref(),
        name.as_deref(),
        req.iso_standards,
        price,
    )
    .await?;

    match updated {
        Some(cert) => {
            info!(certificate_id = cert.id, ?price, "certificate priced, awaiting payment");
            Ok(cert)
        }
        None => {
            let current = repo::find(&state.db, id).await?;
            Err(guard_failure(
                current.as_ref(),
                user.id,
                "Certificate price is locked once payment is confirmed",
            ))
        }
    }
}

#[instrument(skip(state), fields(user_id = user.id))]
pub async fn confirm_payment(state: &AppState, user: &AuthUser, id: i64) -> AppResult<Certificate> {
    let mut tx = state.db.begin().await?;

    let Some(paid) = repo::mark_paid_tx(&mut tx, id, user.id).await? else {
        tx.rollback().await?;
        let current = repo::find(&state.db, id).await?;
        warn!(certificate_id = id, "payment confirmation rejected");
        return Err(guard_failure(
            current.as_ref(),
            user.id,
            "Certificate not in pending payment state",
        ));
    };

    let reference = certificate_reference(paid.created_at.year(), paid.id);
    let cert = repo::set_reference_once_tx(&mut tx, paid.id, &reference).await?;
    tx.commit().await?;

    info!(
        certificate_id = cert.id,
        reference = cert.certificate_reference.as_deref().unwrap_or_default(),
        "certificate paid and submitted"
    );
    Ok(cert)
}

#[derive(Debug, Default)]
pub struct StaffPatch {
    pub status: Option<CertificateStatus>,
    pub assigned_admin_id: Option<Option<i64>>,
    pub price: Option<i64>,
}

#[instrument(skip(state), fields(admin_id = admin.0.id))]
pub async fn staff_update(
    state: &AppState,
    admin: &AdminUser,
    id: i64,
    patch: StaffPatch,
) -> AppResult<(Certificate, Option<JoinHandle<()>>)> {
    if patch.status.is_none() && patch.assigned_admin_id.is_none() && patch.price.is_none() {
        return Err(AppError::validation("No fields to update"));
    }
    if matches!(patch.price, Some(p) if p < 0) {
        return Err(AppError::validation("price must not be negative"));
    }

    let transition = repo::staff_update(&state.db, id, patch.status, patch.assigned_admin_id, patch.price)
        .await?
        .ok_or_else(|| AppError::not_found("Certificate not found"))?;

    let cert = transition.certificate;
    info!(
        certificate_id = cert.id,
        previous = ?transition.previous_status,
        status = ?cert.status,
        "certificate updated by staff"
    );

    let render = render_due(transition.previous_status, cert.status)
        .then(|| trigger_render(state, cert.id));
    Ok((cert, render))
}

/// Best-effort generation of the certificate artifact.
fn trigger_render(state: &AppState, certificate_id: i64) -> JoinHandle<()> {
    let db = state.db.clone();
    let renderer = state.renderer.clone();
    spawn_best_effort("render_certificate", async move {
        let row = repo::find_with_client(&db, certificate_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("certificate {} vanished before render", certificate_id))?;
        renderer
            .render(RenderInput {
                certificate_id,
                business_name: row.business_name,
                certificate_name: row.certificate.certificate_name,
                certificate_type: row.certificate.certificate_type,
                certificate_reference: row.certificate.certificate_reference,
                issued_on: OffsetDateTime::now_utc().date(),
            })
            .await?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn cert(user_id: i64) -> Certificate {
        Certificate {
            id: 5,
            user_id,
            status: Some(CertificateStatus::Submitted),
            certificate_type: None,
            certificate_name: None,
            iso_standards: None,
            price: Some(15000),
            paid: true,
            paid_at: None,
            certificate_reference: Some("CS#2024005".into()),
            assigned_admin_id: None,
            created_at: datetime!(2024-06-01 10:00 UTC),
        }
    }

    #[test]
    fn reference_uses_creation_year_and_id() {
        assert_eq!(certificate_reference(2024, 5), "CS#2024005");
        assert_eq!(certificate_reference(2025, 1234), "CS#2025001234");
    }

    #[test]
    fn render_fires_only_on_transition_into_completed() {
        use CertificateStatus::*;
        assert!(render_due(Some(Submitted), Some(Completed)));
        assert!(render_due(None, Some(Completed)));
        assert!(render_due(Some(AdditionalDocumentsRequired), Some(Completed)));
        assert!(!render_due(Some(Completed), Some(Completed)));
        assert!(!render_due(Some(PendingPayment), Some(Submitted)));
        assert!(!render_due(Some(Completed), Some(Submitted)));
    }

    #[test]
    fn guard_failure_distinguishes_missing_foreign_and_stale() {
        assert!(matches!(guard_failure(None, 1, "x"), AppError::NotFound(_)));
        assert!(matches!(guard_failure(Some(&cert(2)), 1, "x"), AppError::Forbidden(_)));
        match guard_failure(Some(&cert(1)), 1, "Certificate not in pending payment state") {
            AppError::Conflict(msg) => assert_eq!(msg, "Certificate not in pending payment state"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn statuses_serialize_with_display_names() {
        let json = serde_json::to_string(&CertificateStatus::AdditionalDocumentsRequired).unwrap();
        assert_eq!(json, "\"Additional Documents Required\"");
        let parsed: CertificateStatus = serde_json::from_str("\"Pending Payment\"").unwrap();
        assert_eq!(parsed, CertificateStatus::PendingPayment);
        let parsed: CertificateStatus = serde_json::from_str("\"Completed\"").unwrap();
        assert_eq!(parsed, CertificateStatus::Completed);
    }

    #[test]
    fn client_supplied_price_is_ignored() {
        let body: crate::certificates::dto::GenerateCertificateRequest =
            serde_json::from_str(r#"{"certificateId":1,"certificateType":1,"price":1}"#).unwrap();
        let (type_name, price) = priced_type(body.certificate_type.as_ref());
        assert_eq!(type_name.as_deref(), Some("Structural Engineering Certificate"));
        assert_eq!(price, Some(15000));
    }

    mod persisted {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        use async_trait::async_trait;
        use sqlx::PgPool;

        use super::super::*;
        use crate::auth::Role;
        use crate::render::CertificateRenderer;
        use crate::test_support::{admin, client, seed_certificate, seed_user};

        struct CountingRenderer(Arc<AtomicUsize>);

        #[async_trait]
        impl CertificateRenderer for CountingRenderer {
            async fn render(&self, input: RenderInput) -> anyhow::Result<String> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(crate::storage::certificate_pdf_key(input.certificate_id))
            }
        }

        fn structural(certificate_id: i64) -> TypeAssignment {
            TypeAssignment {
                certificate_id: Some(certificate_id),
                certificate_type: Some(TypeSelector::Id(1)),
                certificate_name: Some("Warehouse frame".into()),
                iso_standards: Some(vec!["ISO 9001".into()]),
            }
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn type_selection_stores_catalogue_price(pool: PgPool) {
            let state = AppState::with_pool(pool.clone());
            let owner = seed_user(&pool, "ACM000001", Role::Client).await;
            let id = seed_certificate(&pool, owner, None).await;

            let cert = assign_type(&state, &client(owner), structural(id)).await.unwrap();
            assert_eq!(cert.price, Some(15000));
            assert_eq!(cert.status, Some(CertificateStatus::PendingPayment));
            assert!(!cert.paid);
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn second_payment_confirmation_changes_nothing(pool: PgPool) {
            let state = AppState::with_pool(pool.clone());
            let owner = seed_user(&pool, "ACM000002", Role::Client).await;
            let id = seed_certificate(&pool, owner, None).await;
            assign_type(&state, &client(owner), structural(id)).await.unwrap();

            let paid = confirm_payment(&state, &client(owner), id).await.unwrap();
            assert_eq!(paid.status, Some(CertificateStatus::Submitted));
            assert!(paid.paid);
            let expected = certificate_reference(paid.created_at.year(), id);
            assert_eq!(paid.certificate_reference.as_deref(), Some(expected.as_str()));

            let err = confirm_payment(&state, &client(owner), id).await.unwrap_err();
            assert_eq!(err.kind(), "conflict");

            let after = repo::find(&pool, id).await.unwrap().unwrap();
            assert_eq!(after.status, Some(CertificateStatus::Submitted));
            assert!(after.paid);
            assert_eq!(after.paid_at, paid.paid_at);
            assert_eq!(after.certificate_reference, paid.certificate_reference);
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn confirming_a_certificate_that_is_not_pending_is_rejected(pool: PgPool) {
            let state = AppState::with_pool(pool.clone());
            let owner = seed_user(&pool, "ACM000003", Role::Client).await;
            let id = seed_certificate(&pool, owner, Some(CertificateStatus::Completed)).await;

            let err = confirm_payment(&state, &client(owner), id).await.unwrap_err();
            assert_eq!(err.kind(), "conflict");
            let after = repo::find(&pool, id).await.unwrap().unwrap();
            assert_eq!(after.status, Some(CertificateStatus::Completed));
            assert!(!after.paid);
            assert_eq!(after.certificate_reference, None);
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn price_is_locked_after_payment(pool: PgPool) {
            let state = AppState::with_pool(pool.clone());
            let owner = seed_user(&pool, "ACM000004", Role::Client).await;
            let id = seed_certificate(&pool, owner, None).await;
            assign_type(&state, &client(owner), structural(id)).await.unwrap();
            confirm_payment(&state, &client(owner), id).await.unwrap();

            let mut cheaper = structural(id);
            cheaper.certificate_type = Some(TypeSelector::Id(3));
            let err = assign_type(&state, &client(owner), cheaper).await.unwrap_err();
            assert_eq!(err.kind(), "conflict");
            assert_eq!(repo::find(&pool, id).await.unwrap().unwrap().price, Some(15000));
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn full_lifecycle_renders_exactly_once(pool: PgPool) {
            let mut state = AppState::with_pool(pool.clone());
            let renders = Arc::new(AtomicUsize::new(0));
            state.renderer = Arc::new(CountingRenderer(renders.clone()));

            let owner = seed_user(&pool, "ACM000005", Role::Client).await;
            let staff = seed_user(&pool, "ADM0001", Role::Admin).await;
            let id = seed_certificate(&pool, owner, None).await;

            let priced = assign_type(&state, &client(owner), structural(id)).await.unwrap();
            assert_eq!(priced.price, Some(15000));
            assert_eq!(priced.status, Some(CertificateStatus::PendingPayment));
            confirm_payment(&state, &client(owner), id).await.unwrap();

            let complete = || StaffPatch {
                status: Some(CertificateStatus::Completed),
                ..StaffPatch::default()
            };
            let (done, render) = staff_update(&state, &AdminUser(admin(staff)), id, complete())
                .await
                .unwrap();
            assert_eq!(done.status, Some(CertificateStatus::Completed));
            render.expect("render on entering Completed").await.unwrap();

            let (_, again) = staff_update(&state, &AdminUser(admin(staff)), id, complete())
                .await
                .unwrap();
            assert!(again.is_none());
            assert_eq!(renders.load(Ordering::SeqCst), 1);
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn staff_price_override_is_stored(pool: PgPool) {
            let state = AppState::with_pool(pool.clone());
            let owner = seed_user(&pool, "ACM000006", Role::Client).await;
            let staff = seed_user(&pool, "ADM0002", Role::Admin).await;
            let id = seed_certificate(&pool, owner, None).await;
            assign_type(&state, &client(owner), structural(id)).await.unwrap();

            let patch = StaffPatch {
                price: Some(12000),
                ..StaffPatch::default()
            };
            let (cert, render) = staff_update(&state, &AdminUser(admin(staff)), id, patch)
                .await
                .unwrap();
            assert_eq!(cert.price, Some(12000));
            assert_eq!(cert.status, Some(CertificateStatus::PendingPayment));
            assert!(render.is_none());

            let negative = StaffPatch {
                price: Some(-1),
                ..StaffPatch::default()
            };
            let err = staff_update(&state, &AdminUser(admin(staff)), id, negative)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "validation");
        }
    }
}
