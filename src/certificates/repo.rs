use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::{Certificate, CertificateStatus, CertificateTransition, CertificateWithClient};

const COLUMNS: &str = "id, user_id, status, certificate_type, certificate_name, iso_standards, \
                       price, paid, paid_at, certificate_reference, assigned_admin_id, created_at";

/// Draws the next certificate id so objects can be stored under it before
/// the row exists. Unused ids leave gaps.
pub async fn reserve_id(db: &PgPool) -> sqlx::Result<i64> {
    let (id,): (i64,) =
        sqlx::query_as("SELECT nextval(pg_get_serial_sequence('certificates', 'id'))")
            .fetch_one(db)
            .await?;
    Ok(id)
}

/// Bare certificate created on first document upload; no status yet.
pub async fn insert_bare_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    user_id: i64,
) -> sqlx::Result<Certificate> {
    sqlx::query_as::<_, Certificate>(&format!(
        "INSERT INTO certificates (id, user_id) VALUES ($1, $2) RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find(db: &PgPool, id: i64) -> sqlx::Result<Option<Certificate>> {
    sqlx::query_as::<_, Certificate>(&format!("SELECT {COLUMNS} FROM certificates WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_owned(db: &PgPool, id: i64, user_id: i64) -> sqlx::Result<Option<Certificate>> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn list_by_owner(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<Certificate>> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn list_by_owner_in_status(
    db: &PgPool,
    user_id: i64,
    status: CertificateStatus,
) -> sqlx::Result<Vec<Certificate>> {
    sqlx::query_as::<_, Certificate>(&format!(
        "SELECT {COLUMNS} FROM certificates \
         WHERE user_id = $1 AND status = $2 \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .bind(status)
    .fetch_all(db)
    .await
}

pub async fn find_with_client(db: &PgPool, id: i64) -> sqlx::Result<Option<CertificateWithClient>> {
    sqlx::query_as::<_, CertificateWithClient>(
        r#"
        SELECT c.id, c.user_id, c.status, c.certificate_type, c.certificate_name,
               c.iso_standards, c.price, c.paid, c.paid_at, c.certificate_reference,
               c.assigned_admin_id, c.created_at,
               u.user_code AS client_code, u.business_name, u.first_name,
               u.last_name, u.contact_email
          FROM certificates c
          JOIN users u ON u.id = c.user_id
         WHERE c.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

/// Type/price assignment. Only applies while the certificate is owned by
/// `user_id` and no payment has been confirmed; `None` otherwise.
pub async fn assign_type(
    db: &PgPool,
    id: i64,
    user_id: i64,
    certificate_type: Option<&str>,
    certificate_name: Option<&str>,
    iso_standards: Option<Vec<String>>,
    price: Option<i64>,
) -> sqlx::Result<Option<Certificate>> {
    sqlx::query_as::<_, Certificate>(&format!(
        r#"
        UPDATE certificates
           SET status           = 'Pending Payment',
               certificate_type = $3,
               certificate_name = $4,
               iso_standards    = $5,
               price            = $6,
               paid             = false
         WHERE id = $1
           AND user_id = $2
           AND (status IS NULL OR status = 'Pending Payment')
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(certificate_type)
    .bind(certificate_name)
    .bind(iso_standards)
    .bind(price)
    .fetch_optional(db)
    .await
}

/// Conditional `Pending Payment` -> `Submitted`. Returns the row only when the
/// guard matched, so a second confirmation finds nothing.
pub async fn mark_paid_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    user_id: i64,
) -> sqlx::Result<Option<Certificate>> {
    sqlx::query_as::<_, Certificate>(&format!(
        r#"
        UPDATE certificates
           SET status  = 'Submitted',
               paid    = true,
               paid_at = NOW()
         WHERE id = $1
           AND user_id = $2
           AND status = 'Pending Payment'
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Writes the reference unless one already exists.
pub async fn set_reference_once_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    reference: &str,
) -> sqlx::Result<Certificate> {
    sqlx::query_as::<_, Certificate>(&format!(
        r#"
        UPDATE certificates
           SET certificate_reference = COALESCE(certificate_reference, $2)
         WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(reference)
    .fetch_one(&mut **tx)
    .await
}

/// Staff edit. The previous status is read under a row lock in the same
/// statement so the caller can detect a transition into a new status.
pub async fn staff_update(
    db: &PgPool,
    id: i64,
    status: Option<CertificateStatus>,
    assigned_admin_id: Option<Option<i64>>,
    price: Option<i64>,
) -> sqlx::Result<Option<CertificateTransition>> {
    sqlx::query_as::<_, CertificateTransition>(
        r#"
        WITH prev AS (
            SELECT id, status FROM certificates WHERE id = $1 FOR UPDATE
        )
        UPDATE certificates c
           SET status            = COALESCE($2, c.status),
               assigned_admin_id = CASE WHEN $3 THEN $4 ELSE c.assigned_admin_id END,
               price             = COALESCE($5, c.price)
          FROM prev
         WHERE c.id = prev.id
        RETURNING c.id, c.user_id, c.status, c.certificate_type, c.certificate_name,
                  c.iso_standards, c.price, c.paid, c.paid_at, c.certificate_reference,
                  c.assigned_admin_id, c.created_at, prev.status AS previous_status
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(assigned_admin_id.is_some())
    .bind(assigned_admin_id.flatten())
    .bind(price)
    .fetch_optional(db)
    .await
}

/// Unconditional status write used by notifications that request a new document.
pub async fn force_status_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    status: CertificateStatus,
) -> sqlx::Result<bool> {
    let res = sqlx::query("UPDATE certificates SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut **tx)
        .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn assigned_admin(db: &PgPool, id: i64) -> sqlx::Result<Option<i64>> {
    let row: Option<(Option<i64>,)> =
        sqlx::query_as("SELECT assigned_admin_id FROM certificates WHERE id = $1")
            .bind(id)
            .fetch_optional(db)
            .await?;
    Ok(row.and_then(|(admin,)| admin))
}
