use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{RemoteStore, StoreError, SubscriptionLookup};
use crate::models::application::Application;
use crate::models::newsletter::NewsletterSignup;
use crate::models::subscription::{PaymentStatus, Subscription};
use crate::models::whatsapp::WhatsAppSignup;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Duplicate
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl RemoteStore for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn insert_application(&self, record: &Application) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO applications
                (id, full_name, company_name, email, phone, pitch, proof_of_work_url,
                 commitment_amount, commitment_agreed, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.id)
        .bind(&record.full_name)
        .bind(&record.company_name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.pitch)
        .bind(&record.proof_of_work_url)
        .bind(&record.commitment_amount)
        .bind(record.commitment_agreed)
        .bind(&record.status)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;
        Ok(())
    }

    async fn insert_whatsapp(&self, record: &WhatsAppSignup) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO whatsapp_signups (id, first_name, phone_number, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(record.id)
        .bind(&record.first_name)
        .bind(&record.phone_number)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;
        Ok(())
    }

    async fn insert_newsletter(&self, record: &NewsletterSignup) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO newsletter_signups (id, email, source, synced_to_provider, subscribed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.source)
        .bind(record.synced_to_provider)
        .bind(record.subscribed_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;
        Ok(())
    }

    async fn mark_newsletter_synced(&self, id: Uuid) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE newsletter_signups SET synced_to_provider = TRUE WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_applications(&self) -> Result<Vec<Application>, StoreError> {
        let rows: Vec<Application> = sqlx::query_as("SELECT * FROM applications ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_whatsapp(&self) -> Result<Vec<WhatsAppSignup>, StoreError> {
        let rows: Vec<WhatsAppSignup> = sqlx::query_as("SELECT * FROM whatsapp_signups ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_newsletter(&self) -> Result<Vec<NewsletterSignup>, StoreError> {
        let rows: Vec<NewsletterSignup> = sqlx::query_as("SELECT * FROM newsletter_signups ORDER BY subscribed_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn create_subscription(&self, record: &Subscription) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions
                (id, user_id, email, tier, billing_cycle, amount, currency,
                 payment_status, gateway_transaction_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(&record.email)
        .bind(&record.tier)
        .bind(&record.billing_cycle)
        .bind(record.amount)
        .bind(&record.currency)
        .bind(&record.payment_status)
        .bind(&record.gateway_transaction_id)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;
        Ok(())
    }

    async fn find_subscription(
        &self,
        lookup: SubscriptionLookup<'_>,
    ) -> Result<Option<Subscription>, StoreError> {
        let row: Option<Subscription> = match lookup {
            SubscriptionLookup::Id(id) => {
                sqlx::query_as("SELECT * FROM subscriptions WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            SubscriptionLookup::GatewayTransaction(txn) => {
                sqlx::query_as(
                    "SELECT * FROM subscriptions WHERE gateway_transaction_id = $1 ORDER BY created_at DESC LIMIT 1",
                )
                .bind(txn)
                .fetch_optional(&self.pool)
                .await?
            }
        };
        Ok(row)
    }

    async fn update_subscription_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        status: PaymentStatus,
        gateway_transaction_id: Option<&str>,
    ) -> Result<Subscription, StoreError> {
        let row: Option<Subscription> = sqlx::query_as(
            r#"
            UPDATE subscriptions
            SET payment_status = $1,
                gateway_transaction_id = COALESCE($2, gateway_transaction_id),
                updated_at = $3
            WHERE id = $4 AND payment_status = $5
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(gateway_transaction_id)
        .bind(Utc::now())
        .bind(id)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row);
        }
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM subscriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Err(match exists {
            Some(_) => StoreError::StaleStatus,
            None => StoreError::NotFound,
        })
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        let rows: Vec<Subscription> = sqlx::query_as("SELECT * FROM subscriptions ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
