//! Admin list views. Each listing reads the remote database first and serves
//! the local fallback file when the database is unreachable.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::auth::secret_matches;
use crate::errors::AppError;
use crate::models::application::Application;
use crate::models::newsletter::NewsletterSignup;
use crate::models::subscription::Subscription;
use crate::models::whatsapp::WhatsAppSignup;
use crate::models::RecordKind;
use crate::state::AppState;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSource {
    Database,
    Local,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub source: ListSource,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    fn new(source: ListSource, data: Vec<T>) -> Self {
        Self {
            success: true,
            source,
            count: data.len(),
            data,
        }
    }
}

/// Checks `Authorization: Bearer <ADMIN_TOKEN>` when a token is configured.
pub fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Ok(());
    };
    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    if secret_matches(provided, expected) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Remote listing with a local-file fallback. Local rows are reversed so both
/// sources are newest first.
async fn list_with_fallback<T>(
    state: &AppState,
    kind: RecordKind,
    remote: Result<Vec<T>, StoreError>,
) -> Result<Json<ListResponse<T>>, AppError>
where
    T: DeserializeOwned + Send + 'static,
{
    match remote {
        Ok(rows) => Ok(Json(ListResponse::new(ListSource::Database, rows))),
        Err(e) => {
            warn!(%kind, "Remote listing failed, serving local fallback file: {e}");
            let mut rows: Vec<T> = state.local.list(kind).await?;
            rows.reverse();
            Ok(Json(ListResponse::new(ListSource::Local, rows)))
        }
    }
}

/// GET /api/admin/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListResponse<Application>>, AppError> {
    authorize(&state, &headers)?;
    let remote = state.remote.list_applications().await;
    list_with_fallback(&state, RecordKind::Application, remote).await
}

/// GET /api/admin/whatsapp
pub async fn handle_list_whatsapp(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListResponse<WhatsAppSignup>>, AppError> {
    authorize(&state, &headers)?;
    let remote = state.remote.list_whatsapp().await;
    list_with_fallback(&state, RecordKind::WhatsApp, remote).await
}

/// GET /api/admin/newsletter
pub async fn handle_list_newsletter(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListResponse<NewsletterSignup>>, AppError> {
    authorize(&state, &headers)?;
    let remote = state.remote.list_newsletter().await;
    list_with_fallback(&state, RecordKind::Newsletter, remote).await
}

/// GET /api/admin/subscriptions
/// Payment records have no local copy, so a database failure is a 500.
pub async fn handle_list_subscriptions(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListResponse<Subscription>>, AppError> {
    authorize(&state, &headers)?;
    let rows = state.remote.list_subscriptions().await?;
    Ok(Json(ListResponse::new(ListSource::Database, rows)))
}
