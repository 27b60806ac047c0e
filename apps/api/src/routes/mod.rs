pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::admin;
use crate::payments;
use crate::state::AppState;
use crate::submissions::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Form submissions
        .route("/api/applications", post(handlers::handle_submit_application))
        .route("/api/whatsapp", post(handlers::handle_whatsapp_signup))
        .route("/api/newsletter", post(handlers::handle_newsletter_signup))
        // Payments
        .route("/api/subscriptions", post(payments::handle_create_subscription))
        .route("/api/webhooks/payment", post(payments::handle_payment_webhook))
        // Admin list views
        .route("/api/admin/applications", get(admin::handle_list_applications))
        .route("/api/admin/whatsapp", get(admin::handle_list_whatsapp))
        .route("/api/admin/newsletter", get(admin::handle_list_newsletter))
        .route(
            "/api/admin/subscriptions",
            get(admin::handle_list_subscriptions),
        )
        .with_state(state)
}
