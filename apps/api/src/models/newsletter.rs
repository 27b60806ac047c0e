use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsletterRequest {
    pub email: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NewsletterSignup {
    pub id: Uuid,
    pub email: String,
    pub source: Option<String>,
    /// Set once the address has been pushed to the external mailing-list provider.
    pub synced_to_provider: bool,
    pub subscribed_at: DateTime<Utc>,
}
