use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    ClientDocumentListResponse, DocumentResponse, NotificationUploadResponse, ReviewDocumentRequest,
    StaffDocument, StaffDocumentListResponse, UploadResponse,
};
use super::services::{self, UploadedFile, MAX_FILES_PER_UPLOAD};
use crate::{
    auth::{AdminUser, AuthUser},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload-documents", post(upload_documents))
        .route(
            "/notifications/:id/upload-document",
            post(upload_for_notification),
        )
        .route("/my-documents", get(my_documents))
        .route("/admin/certificates/:id/documents", get(certificate_documents))
        .route("/admin/documents/:id", patch(review_document))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// Collects every file sent under `field` (or `field[]`). Stops reading once
/// more than `limit` files have been seen.
async fn read_files(mp: &mut Multipart, field: &str, limit: usize) -> AppResult<Vec<UploadedFile>> {
    let array_field = format!("{field}[]");
    let mut files = Vec::new();
    while let Some(part) = mp
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Malformed multipart body: {e}")))?
    {
        let name = part.name().unwrap_or_default();
        if name != field && name != array_field {
            continue;
        }
        let file_name = part.file_name().unwrap_or("document").to_string();
        let content_type = part
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = part
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Malformed multipart body: {e}")))?;
        files.push(UploadedFile {
            file_name,
            content_type,
            body,
        });
        if files.len() > limit {
            break;
        }
    }
    Ok(files)
}

#[instrument(skip(state, mp))]
pub async fn upload_documents(
    State(state): State<AppState>,
    user: AuthUser,
    mut mp: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let files = read_files(&mut mp, "documents", MAX_FILES_PER_UPLOAD).await?;
    let (certificate_id, documents) = services::upload_initial(&state, &user, files).await?;
    Ok(Json(UploadResponse {
        success: true,
        message: "Documents uploaded successfully",
        certificate_id,
        documents,
    }))
}

#[instrument(skip(state, mp))]
pub async fn upload_for_notification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    mut mp: Multipart,
) -> AppResult<Json<NotificationUploadResponse>> {
    let file = read_files(&mut mp, "document", 1).await?.into_iter().next();
    let document = services::upload_for_notification(&state, &user, id, file).await?;
    Ok(Json(NotificationUploadResponse {
        success: true,
        message: "Document uploaded and admin notified.",
        document,
    }))
}

#[instrument(skip(state))]
pub async fn my_documents(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ClientDocumentListResponse>> {
    let documents = services::list_mine(&state, &user).await?;
    Ok(Json(ClientDocumentListResponse {
        success: true,
        documents,
    }))
}

#[instrument(skip(state))]
pub async fn certificate_documents(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> AppResult<Json<StaffDocumentListResponse>> {
    let documents = services::list_for_certificate(&state, id)
        .await?
        .into_iter()
        .map(|(document, download_url)| StaffDocument {
            document,
            download_url,
        })
        .collect();
    Ok(Json(StaffDocumentListResponse {
        success: true,
        documents,
    }))
}

#[instrument(skip(state, body))]
pub async fn review_document(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<ReviewDocumentRequest>,
) -> AppResult<Json<DocumentResponse>> {
    let document = services::set_correct(&state, &admin, id, body.is_correct).await?;
    Ok(Json(DocumentResponse {
        success: true,
        document,
    }))
}
