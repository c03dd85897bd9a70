use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Contact {
    pub contact_email: Option<String>,
    pub first_name: Option<String>,
}

/// Storage objects orphaned by a committed account deletion.
#[derive(Debug, Default)]
pub struct DeletedAccount {
    pub user_id: i64,
    pub document_paths: Vec<String>,
    pub certificate_ids: Vec<i64>,
}
