use sqlx::{PgPool, Postgres, Transaction};

use super::repo_types::{ClientDocument, Document};

const COLUMNS: &str = "id, certificate_id, user_id, file_name, file_path, is_correct, uploaded_at";

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    certificate_id: i64,
    user_id: i64,
    file_name: &str,
    file_path: &str,
) -> sqlx::Result<Document> {
    sqlx::query_as::<_, Document>(&format!(
        r#"
        INSERT INTO documents (certificate_id, user_id, file_name, file_path)
        VALUES ($1, $2, $3, $4)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(certificate_id)
    .bind(user_id)
    .bind(file_name)
    .bind(file_path)
    .fetch_one(&mut **tx)
    .await
}

pub async fn list_for_user(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<ClientDocument>> {
    sqlx::query_as::<_, ClientDocument>(
        r#"
        SELECT d.id AS document_id, d.certificate_id, d.file_name, d.file_path, d.uploaded_at,
               c.certificate_name, c.status AS certificate_status, c.price, c.paid
          FROM documents d
          JOIN certificates c ON c.id = d.certificate_id
         WHERE d.user_id = $1
         ORDER BY d.uploaded_at DESC, d.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn list_for_certificate(db: &PgPool, certificate_id: i64) -> sqlx::Result<Vec<Document>> {
    sqlx::query_as::<_, Document>(&format!(
        "SELECT {COLUMNS} FROM documents WHERE certificate_id = $1 ORDER BY uploaded_at DESC, id DESC"
    ))
    .bind(certificate_id)
    .fetch_all(db)
    .await
}

pub async fn set_correct(db: &PgPool, id: i64, is_correct: bool) -> sqlx::Result<Option<Document>> {
    sqlx::query_as::<_, Document>(&format!(
        "UPDATE documents SET is_correct = $2 WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(is_correct)
    .fetch_optional(db)
    .await
}
