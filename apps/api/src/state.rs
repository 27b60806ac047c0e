use std::sync::Arc;

use crate::config::Config;
use crate::fallback::LocalJsonStore;
use crate::newsletter_sync::NewsletterSync;
use crate::store::RemoteStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Primary store. `PgStore` in production.
    pub remote: Arc<dyn RemoteStore>,
    /// Local JSON files written when the remote insert fails.
    pub local: LocalJsonStore,
    pub newsletter_sync: NewsletterSync,
    pub config: Config,
}
