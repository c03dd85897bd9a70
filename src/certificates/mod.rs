pub mod catalogue;
mod dto;
mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo_types::{Certificate, CertificateStatus};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::client_routes())
        .merge(handlers::admin_routes())
}
