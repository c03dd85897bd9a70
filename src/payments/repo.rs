use sqlx::PgPool;

use super::repo_types::PaymentRow;

const SELECT: &str = r#"
    SELECT c.id AS certificate_id, c.certificate_reference, c.certificate_name,
           c.certificate_type, c.price,
           COALESCE(c.paid_at, c.created_at) AS paid_at,
           u.user_code AS client_code, u.business_name
      FROM certificates c
      JOIN users u ON u.id = c.user_id
"#;

/// Only paid certificates count as payments.
pub async fn list_for_user(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<PaymentRow>> {
    sqlx::query_as::<_, PaymentRow>(&format!(
        "{SELECT} WHERE c.user_id = $1 AND c.paid ORDER BY paid_at DESC, c.id DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// `pattern` is a lowercase `LIKE` pattern matched against the reference,
/// client code and business name.
pub async fn list_all(db: &PgPool, pattern: Option<&str>) -> sqlx::Result<Vec<PaymentRow>> {
    sqlx::query_as::<_, PaymentRow>(&format!(
        r#"
        {SELECT}
         WHERE c.paid
           AND ($1::TEXT IS NULL
                OR LOWER(c.certificate_reference) LIKE $1
                OR LOWER(u.user_code)             LIKE $1
                OR LOWER(u.business_name)         LIKE $1)
         ORDER BY paid_at DESC, c.id DESC
        "#
    ))
    .bind(pattern)
    .fetch_all(db)
    .await
}
