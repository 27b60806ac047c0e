use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{RemoteStore, StoreError, SubscriptionLookup};
use crate::models::application::Application;
use crate::models::newsletter::NewsletterSignup;
use crate::models::subscription::{PaymentStatus, Subscription};
use crate::models::whatsapp::WhatsAppSignup;

/// In-memory remote store. `set_failing(true)` makes every call return
/// `StoreError::Unavailable`, simulating a database outage.
#[derive(Default)]
pub struct MemoryStore {
    pub applications: Mutex<Vec<Application>>,
    pub whatsapp: Mutex<Vec<WhatsAppSignup>>,
    pub newsletter: Mutex<Vec<NewsletterSignup>>,
    pub subscriptions: Mutex<Vec<Subscription>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

fn newest_first<T: Clone>(rows: &[T]) -> Vec<T> {
    rows.iter().rev().cloned().collect()
}

#[async_trait]
impl RemoteStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert_application(&self, record: &Application) -> Result<(), StoreError> {
        self.check()?;
        self.applications.lock().await.push(record.clone());
        Ok(())
    }

    async fn insert_whatsapp(&self, record: &WhatsAppSignup) -> Result<(), StoreError> {
        self.check()?;
        self.whatsapp.lock().await.push(record.clone());
        Ok(())
    }

    async fn insert_newsletter(&self, record: &NewsletterSignup) -> Result<(), StoreError> {
        self.check()?;
        let mut rows = self.newsletter.lock().await;
        if rows.iter().any(|r| r.email == record.email) {
            return Err(StoreError::Duplicate);
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn mark_newsletter_synced(&self, id: Uuid) -> Result<(), StoreError> {
        self.check()?;
        let mut rows = self.newsletter.lock().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        row.synced_to_provider = true;
        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        self.check()?;
        Ok(newest_first(&self.applications.lock().await))
    }

    async fn list_whatsapp(&self) -> Result<Vec<WhatsAppSignup>, StoreError> {
        self.check()?;
        Ok(newest_first(&self.whatsapp.lock().await))
    }

    async fn list_newsletter(&self) -> Result<Vec<NewsletterSignup>, StoreError> {
        self.check()?;
        Ok(newest_first(&self.newsletter.lock().await))
    }

    async fn create_subscription(&self, record: &Subscription) -> Result<(), StoreError> {
        self.check()?;
        self.subscriptions.lock().await.push(record.clone());
        Ok(())
    }

    async fn find_subscription(
        &self,
        lookup: SubscriptionLookup<'_>,
    ) -> Result<Option<Subscription>, StoreError> {
        self.check()?;
        let rows = self.subscriptions.lock().await;
        let found = match lookup {
            SubscriptionLookup::Id(id) => rows.iter().find(|s| s.id == id),
            SubscriptionLookup::GatewayTransaction(txn) => rows
                .iter()
                .rev()
                .find(|s| s.gateway_transaction_id.as_deref() == Some(txn)),
        };
        Ok(found.cloned())
    }

    async fn update_subscription_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        status: PaymentStatus,
        gateway_transaction_id: Option<&str>,
    ) -> Result<Subscription, StoreError> {
        self.check()?;
        let mut rows = self.subscriptions.lock().await;
        let row = rows
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::NotFound)?;
        if row.payment_status != expected.as_str() {
            return Err(StoreError::StaleStatus);
        }
        row.payment_status = status.as_str().to_string();
        if let Some(txn) = gateway_transaction_id {
            row.gateway_transaction_id = Some(txn.to_string());
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        self.check()?;
        Ok(newest_first(&self.subscriptions.lock().await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: PaymentStatus) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            user_id: "user_1".to_string(),
            email: "a@x.io".to_string(),
            tier: "pro".to_string(),
            billing_cycle: "monthly".to_string(),
            amount: 49_900,
            currency: "AED".to_string(),
            payment_status: status.as_str().to_string(),
            gateway_transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn status_update_is_refused_when_current_status_is_stale() {
        let store = MemoryStore::default();
        let sub = subscription(PaymentStatus::Paid);
        store.create_subscription(&sub).await.unwrap();

        store
            .update_subscription_status(sub.id, PaymentStatus::Paid, PaymentStatus::Refunded, None)
            .await
            .unwrap();

        // A second webhook that also read `paid` must not overwrite `refunded`.
        let err = store
            .update_subscription_status(sub.id, PaymentStatus::Paid, PaymentStatus::Cancelled, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::StaleStatus));

        let current = store
            .find_subscription(SubscriptionLookup::Id(sub.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.payment_status, "refunded");
    }

    #[tokio::test]
    async fn status_update_for_unknown_id_is_not_found() {
        let store = MemoryStore::default();
        let err = store
            .update_subscription_status(
                Uuid::new_v4(),
                PaymentStatus::Pending,
                PaymentStatus::Paid,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
