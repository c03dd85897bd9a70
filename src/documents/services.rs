use anyhow::Context;
use bytes::Bytes;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::repo;
use super::repo_types::{ClientDocument, Document};
use crate::auth::{AdminUser, AuthUser};
use crate::certificates;
use crate::effects::spawn_best_effort;
use crate::error::{AppError, AppResult};
use crate::notifications;
use crate::state::AppState;
use crate::storage::document_key;

pub const MAX_FILES_PER_UPLOAD: usize = 5;
pub const DOWNLOAD_URL_TTL_SECS: u64 = 15 * 60;

pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

pub fn check_batch(files: &[UploadedFile]) -> AppResult<()> {
    if files.is_empty() {
        return Err(AppError::validation("No file provided"));
    }
    if files.len() > MAX_FILES_PER_UPLOAD {
        return Err(AppError::validation(format!(
            "At most {} documents per upload",
            MAX_FILES_PER_UPLOAD
        )));
    }
    Ok(())
}

/// Stores one object per file. On failure the objects already written are
/// removed in the background.
async fn store_all(
    state: &AppState,
    user_id: i64,
    certificate_id: i64,
    files: Vec<UploadedFile>,
) -> anyhow::Result<Vec<(String, String)>> {
    let mut stored: Vec<(String, String)> = Vec::with_capacity(files.len());
    for f in files {
        let key = document_key(user_id, certificate_id, Uuid::new_v4(), &f.file_name);
        if let Err(e) = state
            .storage
            .put_object(&key, f.body, &f.content_type)
            .await
            .with_context(|| format!("put_object {}", key))
        {
            discard_objects(state, stored.into_iter().map(|(_, k)| k).collect());
            return Err(e);
        }
        stored.push((f.file_name, key));
    }
    Ok(stored)
}

fn discard_objects(state: &AppState, keys: Vec<String>) {
    if keys.is_empty() {
        return;
    }
    let storage = state.storage.clone();
    spawn_best_effort("discard_uploaded_objects", async move {
        for key in keys {
            storage.delete_object(&key).await?;
        }
        Ok(())
    });
}

/// First upload: creates the bare certificate and one document per file.
/// Objects are stored before the transaction opens.
#[instrument(skip(state, files), fields(user_id = user.id, files = files.len()))]
pub async fn upload_initial(
    state: &AppState,
    user: &AuthUser,
    files: Vec<UploadedFile>,
) -> AppResult<(i64, Vec<Document>)> {
    check_batch(&files)?;

    let certificate_id = certificates::repo::reserve_id(&state.db).await?;
    let stored = store_all(state, user.id, certificate_id, files).await?;
    let keys: Vec<String> = stored.iter().map(|(_, k)| k.clone()).collect();

    let result: AppResult<Vec<Document>> = async {
        let mut tx = state.db.begin().await?;
        certificates::repo::insert_bare_tx(&mut tx, certificate_id, user.id).await?;
        let mut documents = Vec::with_capacity(stored.len());
        for (file_name, key) in &stored {
            documents.push(repo::insert_tx(&mut tx, certificate_id, user.id, file_name, key).await?);
        }
        tx.commit().await?;
        Ok::<_, AppError>(documents)
    }
    .await;

    match result {
        Ok(documents) => {
            info!(certificate_id, documents = documents.len(), "documents uploaded");
            Ok((certificate_id, documents))
        }
        Err(e) => {
            warn!(certificate_id, "initial upload rolled back");
            discard_objects(state, keys);
            Err(e)
        }
    }
}

/// Upload answering a notification that requested a new document. The
/// certificate's assigned admin, if any, is told about it.
#[instrument(skip(state, file), fields(user_id = user.id))]
pub async fn upload_for_notification(
    state: &AppState,
    user: &AuthUser,
    notification_id: i64,
    file: Option<UploadedFile>,
) -> AppResult<Document> {
    let notification = notifications::repo::find(&state.db, notification_id)
        .await?
        .filter(|n| n.user_id == user.id)
        .ok_or_else(|| AppError::not_found("Notification not found or not yours"))?;
    let certificate_id = notification
        .certificate_id
        .ok_or_else(|| AppError::validation("Notification has no certificate"))?;
    if !notification.request_new_document {
        return Err(AppError::validation("Notification did not request a new document"));
    }
    let file = file.ok_or_else(|| AppError::validation("No file provided"))?;

    let stored = store_all(state, user.id, certificate_id, vec![file]).await?;
    let keys: Vec<String> = stored.iter().map(|(_, k)| k.clone()).collect();
    let (file_name, key) = &stored[0];

    let result: AppResult<Document> = async {
        let mut tx = state.db.begin().await?;
        let document = repo::insert_tx(&mut tx, certificate_id, user.id, file_name, key).await?;
        if let Some(admin_id) = certificates::repo::assigned_admin(&state.db, certificate_id).await? {
            let message = format!("User uploaded a new document for certificate #{}", certificate_id);
            notifications::repo::insert_tx(&mut tx, admin_id, Some(certificate_id), &message, false).await?;
            info!(admin_id, certificate_id, "assigned admin notified of new document");
        }
        tx.commit().await?;
        Ok::<_, AppError>(document)
    }
    .await;

    if result.is_err() {
        warn!(certificate_id, "document upload rolled back");
        discard_objects(state, keys);
    }
    result
}

pub async fn list_mine(state: &AppState, user: &AuthUser) -> AppResult<Vec<ClientDocument>> {
    Ok(repo::list_for_user(&state.db, user.id).await?)
}

/// Documents of a certificate with short-lived download links.
pub async fn list_for_certificate(state: &AppState, certificate_id: i64) -> AppResult<Vec<(Document, Option<String>)>> {
    let documents = repo::list_for_certificate(&state.db, certificate_id).await?;
    let mut out = Vec::with_capacity(documents.len());
    for doc in documents {
        let url = match state.storage.presign_get(&doc.file_path, DOWNLOAD_URL_TTL_SECS).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(document_id = doc.id, error = %e, "presign failed");
                None
            }
        };
        out.push((doc, url));
    }
    Ok(out)
}

#[instrument(skip(state), fields(admin_id = admin.0.id))]
pub async fn set_correct(state: &AppState, admin: &AdminUser, id: i64, is_correct: Option<bool>) -> AppResult<Document> {
    let is_correct =
        is_correct.ok_or_else(|| AppError::validation("Missing or invalid is_correct boolean"))?;
    let doc = repo::set_correct(&state.db, id, is_correct)
        .await?
        .ok_or_else(|| AppError::not_found("Document not found"))?;
    info!(document_id = doc.id, is_correct, "document reviewed");
    Ok(doc)
}
