use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::repo;
use super::repo_types::Notification;
use crate::accounts;
use crate::auth::{AdminUser, AuthUser};
use crate::certificates::{self, CertificateStatus};
use crate::effects::spawn_best_effort;
use crate::error::{AppError, AppResult};
use crate::mailer::Mail;
use crate::state::AppState;

pub struct NewNotification {
    pub user_id: Option<i64>,
    pub certificate_id: Option<i64>,
    pub message: Option<String>,
    pub request_new_document: bool,
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}

/// Creates the notification and, when a new document is requested, forces the
/// certificate into `Additional Documents Required` in the same transaction.
#[instrument(skip(state, req), fields(admin_id = admin.0.id))]
pub async fn create(
    state: &AppState,
    admin: &AdminUser,
    req: NewNotification,
) -> AppResult<(Notification, JoinHandle<()>)> {
    let message = req.message.filter(|m| !m.trim().is_empty());
    let (Some(user_id), Some(message)) = (req.user_id, message) else {
        return Err(AppError::validation("Missing user_id or message"));
    };

    if let Some(cert_id) = req.certificate_id {
        let cert = certificates::repo::find(&state.db, cert_id)
            .await?
            .ok_or_else(|| AppError::not_found("Certificate not found"))?;
        if cert.user_id != user_id {
            return Err(AppError::validation("certificate_id does not belong to user_id"));
        }
    }

    let mut tx = state.db.begin().await?;
    let notification =
        repo::insert_tx(&mut tx, user_id, req.certificate_id, &message, req.request_new_document).await?;
    if let (true, Some(cert_id)) = (req.request_new_document, req.certificate_id) {
        if !certificates::repo::force_status_tx(&mut tx, cert_id, CertificateStatus::AdditionalDocumentsRequired)
            .await?
        {
            return Err(AppError::not_found("Certificate not found"));
        }
        info!(certificate_id = cert_id, status = "Additional Documents Required", "certificate status forced");
    }
    tx.commit().await?;

    info!(notification_id = notification.id, user_id, "notification created");
    let mail = notify_by_mail(state, user_id, message);
    Ok((notification, mail))
}

fn notify_by_mail(state: &AppState, user_id: i64, message: String) -> JoinHandle<()> {
    let db = state.db.clone();
    let mailer = state.mailer.clone();
    spawn_best_effort("notification_mail", async move {
        let Some(contact) = accounts::repo::find_contact(&db, user_id).await? else {
            return Ok(());
        };
        let Some(to) = contact.contact_email else {
            warn!(user_id, "recipient has no contact email");
            return Ok(());
        };
        mailer
            .send(Mail {
                to,
                subject: "New Notification from CertiSphere".into(),
                text: format!(
                    "Hello {},\n\n{}\n\nPlease log in to view details.\n\n- CertiSphere Team",
                    contact.first_name.unwrap_or_default(),
                    message
                ),
            })
            .await
    })
}

pub async fn list_for(state: &AppState, user_id: i64) -> AppResult<(Vec<Notification>, usize)> {
    let notifications = repo::list_for_user(&state.db, user_id).await?;
    let unread = unread_count(&notifications);
    Ok((notifications, unread))
}

#[instrument(skip(state), fields(user_id = user.id))]
pub async fn set_read(state: &AppState, user: &AuthUser, id: i64, is_read: Option<bool>) -> AppResult<Notification> {
    let is_read = is_read.ok_or_else(|| AppError::validation("Invalid is_read flag"))?;
    let current = repo::find(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Notification not found"))?;
    if current.user_id != user.id && !user.is_admin() {
        return Err(AppError::forbidden("Not allowed"));
    }
    repo::set_read(&state.db, id, is_read)
        .await?
        .ok_or_else(|| AppError::not_found("Notification not found"))
}
