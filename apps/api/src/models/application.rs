use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_COMMITMENT_AMOUNT: &str = "AED 500";

/// Membership application as submitted by the apply form.
/// Every field is optional at the wire level so missing fields surface as 400s.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub pitch: Option<String>,
    pub proof_of_work_url: Option<String>,
    pub commitment_amount: Option<String>,
    #[serde(default)]
    pub commitment_agreed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub full_name: String,
    pub company_name: String,
    pub email: String,
    pub phone: String,
    pub pitch: String,
    pub proof_of_work_url: Option<String>,
    pub commitment_amount: String,
    pub commitment_agreed: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
