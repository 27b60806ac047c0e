//! Paid membership subscriptions and the payment-gateway webhook that moves
//! them between payment states.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::secret_matches;
use crate::errors::AppError;
use crate::models::subscription::{CreateSubscriptionRequest, PaymentStatus, Subscription};
use crate::state::AppState;
use crate::store::SubscriptionLookup;
use crate::submissions::validation::{non_blank, normalize_email, require_fields};

pub const TIERS: &[&str] = &["community", "pro", "founder"];
pub const BILLING_CYCLES: &[&str] = &["monthly", "yearly"];
const DEFAULT_CURRENCY: &str = "AED";
const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub success: bool,
    pub subscription: Subscription,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub transaction_id: Option<String>,
    pub subscription_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

/// Maps a gateway event name to the status it moves a subscription into.
pub fn status_for_event(event: &str) -> Option<PaymentStatus> {
    match event {
        "payment.succeeded" => Some(PaymentStatus::Paid),
        "payment.failed" => Some(PaymentStatus::Failed),
        "payment.refunded" => Some(PaymentStatus::Refunded),
        "subscription.cancelled" => Some(PaymentStatus::Cancelled),
        _ => None,
    }
}

fn stored_status(raw: &str) -> Result<PaymentStatus, AppError> {
    PaymentStatus::parse(raw)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown payment status '{raw}'")))
}

/// Decides what the webhook should do to a subscription currently in `current`.
/// `Ok(None)` means the event repeats the current status (a gateway retry).
pub fn plan_transition(
    current: PaymentStatus,
    next: PaymentStatus,
) -> Result<Option<PaymentStatus>, AppError> {
    if current == next {
        return Ok(None);
    }
    if current.can_transition_to(next) {
        Ok(Some(next))
    } else {
        Err(AppError::Conflict(format!(
            "Cannot move subscription from {current} to {next}"
        )))
    }
}

pub fn build_subscription(req: &CreateSubscriptionRequest) -> Result<Subscription, AppError> {
    require_fields(&[
        ("userId", req.user_id.as_deref()),
        ("email", req.email.as_deref()),
        ("tier", req.tier.as_deref()),
        ("billingCycle", req.billing_cycle.as_deref()),
    ])?;

    let tier = non_blank(req.tier.as_deref()).unwrap_or_default().to_lowercase();
    if !TIERS.contains(&tier.as_str()) {
        return Err(AppError::Validation(format!(
            "Unknown tier '{tier}', expected one of: {}",
            TIERS.join(", ")
        )));
    }
    let billing_cycle = non_blank(req.billing_cycle.as_deref())
        .unwrap_or_default()
        .to_lowercase();
    if !BILLING_CYCLES.contains(&billing_cycle.as_str()) {
        return Err(AppError::Validation(format!(
            "Unknown billing cycle '{billing_cycle}', expected monthly or yearly"
        )));
    }
    let amount = match req.amount {
        Some(amount) if amount > 0 => amount,
        _ => {
            return Err(AppError::Validation(
                "Amount must be a positive number of minor units".to_string(),
            ))
        }
    };

    let now = Utc::now();
    Ok(Subscription {
        id: Uuid::new_v4(),
        user_id: non_blank(req.user_id.as_deref()).unwrap_or_default().to_string(),
        email: normalize_email(req.email.as_deref().unwrap_or_default())?,
        tier,
        billing_cycle,
        amount,
        currency: non_blank(req.currency.as_deref())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_uppercase(),
        payment_status: PaymentStatus::Pending.as_str().to_string(),
        gateway_transaction_id: None,
        created_at: now,
        updated_at: now,
    })
}

/// POST /api/subscriptions
pub async fn handle_create_subscription(
    State(state): State<AppState>,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), AppError> {
    let Json(req) = payload?;
    let subscription = build_subscription(&req)?;

    state.remote.create_subscription(&subscription).await?;
    info!(
        subscription_id = %subscription.id,
        tier = %subscription.tier,
        "Subscription created"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse {
            success: true,
            subscription,
        }),
    ))
}

fn verify_webhook_secret(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(expected) = state.config.payment_webhook_secret.as_deref() else {
        return Ok(());
    };
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if secret_matches(provided, expected) {
        Ok(())
    } else {
        warn!("Rejected payment webhook with missing or wrong secret");
        Err(AppError::Unauthorized)
    }
}

/// POST /api/webhooks/payment
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<WebhookEvent>, JsonRejection>,
) -> Result<Json<WebhookResponse>, AppError> {
    verify_webhook_secret(&state, &headers)?;
    let Json(event) = payload?;

    let Some(next) = status_for_event(&event.event) else {
        info!(event = %event.event, "Ignoring unhandled payment event");
        return Ok(Json(WebhookResponse {
            success: true,
            ignored: true,
            payment_status: None,
        }));
    };

    let txn = non_blank(event.transaction_id.as_deref());
    let lookup = match (event.subscription_id, txn) {
        (Some(id), _) => SubscriptionLookup::Id(id),
        (None, Some(txn)) => SubscriptionLookup::GatewayTransaction(txn),
        (None, None) => {
            return Err(AppError::Validation(
                "Webhook must carry subscription_id or transaction_id".to_string(),
            ))
        }
    };

    let subscription = state
        .remote
        .find_subscription(lookup)
        .await?
        .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;

    // The update only applies while the row is still in `current`, so two
    // webhooks racing on the same subscription cannot both win.
    let current = stored_status(&subscription.payment_status)?;
    let status = match plan_transition(current, next)? {
        None => subscription.payment_status.clone(),
        Some(next) => {
            let updated = state
                .remote
                .update_subscription_status(subscription.id, current, next, txn)
                .await?;
            info!(
                subscription_id = %updated.id,
                from = %subscription.payment_status,
                to = %updated.payment_status,
                "Subscription payment status changed"
            );
            updated.payment_status
        }
    };

    Ok(Json(WebhookResponse {
        success: true,
        ignored: false,
        payment_status: PaymentStatus::parse(&status),
    }))
}
