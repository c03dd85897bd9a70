use sqlx::FromRow;
use time::OffsetDateTime;

/// A certificate past the payment step, as listed in payment histories.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub certificate_id: i64,
    pub certificate_reference: Option<String>,
    pub certificate_name: Option<String>,
    pub certificate_type: Option<String>,
    pub price: Option<i64>,
    pub paid_at: OffsetDateTime,
    pub client_code: String,
    pub business_name: Option<String>,
}
