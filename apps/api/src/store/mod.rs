//! Remote store — the hosted PostgreSQL database that is the primary home of
//! every record.
//!
//! `AppState` holds an `Arc<dyn RemoteStore>`; production wires `PgStore`,
//! tests wire `MemoryStore`.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::Application;
use crate::models::newsletter::NewsletterSignup;
use crate::models::subscription::{PaymentStatus, Subscription};
use crate::models::whatsapp::WhatsAppSignup;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    Duplicate,

    #[error("record not found")]
    NotFound,

    /// A conditional update found the row in a different state than expected.
    #[error("record was modified concurrently")]
    StaleStatus,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// How the payment webhook identifies the subscription it refers to.
#[derive(Debug, Clone, Copy)]
pub enum SubscriptionLookup<'a> {
    Id(Uuid),
    GatewayTransaction(&'a str),
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn insert_application(&self, record: &Application) -> Result<(), StoreError>;
    async fn insert_whatsapp(&self, record: &WhatsAppSignup) -> Result<(), StoreError>;
    /// Fails with `StoreError::Duplicate` when the email is already subscribed.
    async fn insert_newsletter(&self, record: &NewsletterSignup) -> Result<(), StoreError>;
    async fn mark_newsletter_synced(&self, id: Uuid) -> Result<(), StoreError>;

    /// Listings are newest first.
    async fn list_applications(&self) -> Result<Vec<Application>, StoreError>;
    async fn list_whatsapp(&self) -> Result<Vec<WhatsAppSignup>, StoreError>;
    async fn list_newsletter(&self) -> Result<Vec<NewsletterSignup>, StoreError>;

    async fn create_subscription(&self, record: &Subscription) -> Result<(), StoreError>;
    async fn find_subscription(
        &self,
        lookup: SubscriptionLookup<'_>,
    ) -> Result<Option<Subscription>, StoreError>;
    /// Moves the payment status from `expected` to `status`, and sets the
    /// gateway transaction id when one is given. Fails with
    /// `StoreError::StaleStatus` when the row is no longer in `expected`.
    async fn update_subscription_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        status: PaymentStatus,
        gateway_transaction_id: Option<&str>,
    ) -> Result<Subscription, StoreError>;
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, StoreError>;
}
