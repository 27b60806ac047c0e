use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{Application, ApplicationRequest, DEFAULT_COMMITMENT_AMOUNT};
use crate::models::newsletter::{NewsletterRequest, NewsletterSignup};
use crate::models::whatsapp::{WhatsAppRequest, WhatsAppSignup};
use crate::models::RecordKind;
use crate::state::AppState;
use crate::store::StoreError;
use crate::submissions::dual_write::{persist, persist_with, respond, SubmissionResponse};
use crate::submissions::validation::{
    non_blank, normalize_email, normalize_optional_url, normalize_phone, require_fields,
};

type SubmissionResult = Result<(StatusCode, Json<SubmissionResponse>), AppError>;

fn into_json(
    (status, body): (StatusCode, SubmissionResponse),
) -> (StatusCode, Json<SubmissionResponse>) {
    (status, Json(body))
}

/// Builds an application record from a validated request.
pub fn build_application(req: &ApplicationRequest) -> Result<Application, AppError> {
    require_fields(&[
        ("fullName", req.full_name.as_deref()),
        ("companyName", req.company_name.as_deref()),
        ("email", req.email.as_deref()),
        ("phone", req.phone.as_deref()),
        ("pitch", req.pitch.as_deref()),
    ])?;
    if !req.commitment_agreed {
        return Err(AppError::Validation(
            "You must agree to the commitment to apply".to_string(),
        ));
    }

    let text = |v: &Option<String>| non_blank(v.as_deref()).unwrap_or_default().to_string();
    let now = Utc::now();

    Ok(Application {
        id: Uuid::new_v4(),
        full_name: text(&req.full_name),
        company_name: text(&req.company_name),
        email: normalize_email(req.email.as_deref().unwrap_or_default())?,
        phone: normalize_phone(req.phone.as_deref().unwrap_or_default())?,
        pitch: text(&req.pitch),
        proof_of_work_url: normalize_optional_url(req.proof_of_work_url.as_deref())?,
        commitment_amount: non_blank(req.commitment_amount.as_deref())
            .unwrap_or(DEFAULT_COMMITMENT_AMOUNT)
            .to_string(),
        commitment_agreed: true,
        status: "pending".to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub fn build_whatsapp(req: &WhatsAppRequest) -> Result<WhatsAppSignup, AppError> {
    require_fields(&[
        ("firstName", req.first_name.as_deref()),
        ("phoneNumber", req.phone_number.as_deref()),
    ])?;

    Ok(WhatsAppSignup {
        id: Uuid::new_v4(),
        first_name: non_blank(req.first_name.as_deref())
            .unwrap_or_default()
            .to_string(),
        phone_number: normalize_phone(req.phone_number.as_deref().unwrap_or_default())?,
        created_at: Utc::now(),
    })
}

pub fn build_newsletter(req: &NewsletterRequest) -> Result<NewsletterSignup, AppError> {
    require_fields(&[("email", req.email.as_deref())])?;

    Ok(NewsletterSignup {
        id: Uuid::new_v4(),
        email: normalize_email(req.email.as_deref().unwrap_or_default())?,
        source: non_blank(req.source.as_deref()).map(str::to_string),
        synced_to_provider: false,
        subscribed_at: Utc::now(),
    })
}

/// POST /api/applications
pub async fn handle_submit_application(
    State(state): State<AppState>,
    payload: Result<Json<ApplicationRequest>, JsonRejection>,
) -> SubmissionResult {
    let Json(req) = payload?;
    let record = build_application(&req)?;

    let outcome = persist(
        RecordKind::Application,
        &record,
        state.remote.insert_application(&record),
        &state.local,
    )
    .await?;

    respond(
        outcome,
        record.id,
        "Application submitted successfully",
        "Application received and saved locally; it will be synced shortly",
    )
    .map(into_json)
}

/// POST /api/whatsapp
pub async fn handle_whatsapp_signup(
    State(state): State<AppState>,
    payload: Result<Json<WhatsAppRequest>, JsonRejection>,
) -> SubmissionResult {
    let Json(req) = payload?;
    let record = build_whatsapp(&req)?;

    let outcome = persist(
        RecordKind::WhatsApp,
        &record,
        state.remote.insert_whatsapp(&record),
        &state.local,
    )
    .await?;

    respond(
        outcome,
        record.id,
        "You're on the list! We'll add you to the WhatsApp community soon",
        "Signup received and saved locally; it will be synced shortly",
    )
    .map(into_json)
}

/// POST /api/newsletter
///
/// Duplicate emails are 409 whether the duplicate is found by the database's
/// unique constraint or, during an outage, in the local fallback file.
pub async fn handle_newsletter_signup(
    State(state): State<AppState>,
    payload: Result<Json<NewsletterRequest>, JsonRejection>,
) -> SubmissionResult {
    let Json(req) = payload?;
    let record = build_newsletter(&req)?;

    let outcome = match persist_with(
        RecordKind::Newsletter,
        state.remote.insert_newsletter(&record),
        state
            .local
            .append_unique_email(RecordKind::Newsletter, &record.email, &record),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(StoreError::Duplicate) => {
            return Err(AppError::Conflict(
                "This email is already subscribed".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    if outcome.is_synced() && state.newsletter_sync.is_enabled() {
        spawn_provider_sync(&state, &record);
    }

    respond(
        outcome,
        record.id,
        "Successfully subscribed to the newsletter",
        "Subscription received and saved locally; it will be synced shortly",
    )
    .map(into_json)
}

/// Pushes a stored subscriber to the newsletter provider in the background and
/// sets `synced_to_provider` once the provider accepts it.
fn spawn_provider_sync(state: &AppState, record: &NewsletterSignup) {
    let remote = state.remote.clone();
    let sync = state.newsletter_sync.clone();
    let id = record.id;
    let email = record.email.clone();
    let source = record.source.clone();

    tokio::spawn(async move {
        match sync.push(&email, source.as_deref()).await {
            Ok(true) => {
                if let Err(e) = remote.mark_newsletter_synced(id).await {
                    warn!("Subscriber pushed to provider but sync flag not saved: {e}");
                }
            }
            Ok(false) => {}
            Err(e) => warn!("Newsletter provider sync failed: {e}"),
        }
    });
}
