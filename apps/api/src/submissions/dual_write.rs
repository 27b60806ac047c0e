//! Dual-write: remote insert first, local JSON append on failure.
//!
//! | remote | local | outcome     | status |
//! |--------|-------|-------------|--------|
//! | ok     | -     | `Synced`    | 200    |
//! | err    | ok    | `LocalOnly` | 202    |
//! | err    | err   | `Failed`    | 500    |
//!
//! A duplicate rejected by the remote store is a client error, not an outage,
//! so it is returned as `Err` and never reaches the fallback file.

use std::future::Future;

use axum::http::StatusCode;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::fallback::{FallbackError, LocalJsonStore};
use crate::models::RecordKind;
use crate::store::StoreError;

#[derive(Debug)]
pub enum WriteOutcome {
    Synced,
    LocalOnly,
    Failed { remote: String, local: String },
}

impl WriteOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            WriteOutcome::Synced => StatusCode::OK,
            WriteOutcome::LocalOnly => StatusCode::ACCEPTED,
            WriteOutcome::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self, WriteOutcome::Synced)
    }
}

/// Body returned by every submission endpoint on 200/202.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
    pub synced: bool,
    pub fallback: bool,
}

/// Runs the remote insert and, if it fails, appends `record` to the kind's
/// local file.
pub async fn persist<T, Fut>(
    kind: RecordKind,
    record: &T,
    remote_insert: Fut,
    local: &LocalJsonStore,
) -> Result<WriteOutcome, StoreError>
where
    T: Serialize,
    Fut: Future<Output = Result<(), StoreError>>,
{
    persist_with(kind, remote_insert, local.append(kind, record)).await
}

/// Like [`persist`] with a caller-supplied fallback write. The fallback future
/// is only polled when the remote insert fails; a
/// `FallbackError::DuplicateEmail` from it is reported as a duplicate.
pub async fn persist_with<RFut, LFut>(
    kind: RecordKind,
    remote_insert: RFut,
    local_append: LFut,
) -> Result<WriteOutcome, StoreError>
where
    RFut: Future<Output = Result<(), StoreError>>,
    LFut: Future<Output = Result<(), FallbackError>>,
{
    let remote_err = match remote_insert.await {
        Ok(()) => {
            info!(%kind, "Record stored in remote database");
            return Ok(WriteOutcome::Synced);
        }
        Err(StoreError::Duplicate) => return Err(StoreError::Duplicate),
        Err(e) => e,
    };

    warn!(%kind, error = %remote_err, "Remote insert failed; writing to local fallback");

    match local_append.await {
        Ok(()) => Ok(WriteOutcome::LocalOnly),
        Err(FallbackError::DuplicateEmail { .. }) => Err(StoreError::Duplicate),
        Err(local_err) => {
            error!(
                %kind,
                remote = %remote_err,
                local = %local_err,
                "Remote and local writes both failed"
            );
            Ok(WriteOutcome::Failed {
                remote: remote_err.to_string(),
                local: local_err.to_string(),
            })
        }
    }
}

/// Turns an outcome into the endpoint response. `synced_message` and
/// `local_message` are user-facing copy for the 200 and 202 cases.
pub fn respond(
    outcome: WriteOutcome,
    id: Uuid,
    synced_message: &str,
    local_message: &str,
) -> Result<(StatusCode, SubmissionResponse), AppError> {
    let status = outcome.status();
    let message = match &outcome {
        WriteOutcome::Synced => synced_message,
        WriteOutcome::LocalOnly => local_message,
        WriteOutcome::Failed { remote, local } => {
            return Err(AppError::PersistFailed(format!(
                "remote: {remote}; local: {local}"
            )))
        }
    };

    Ok((
        status,
        SubmissionResponse {
            success: true,
            message: message.to_string(),
            id,
            synced: outcome.is_synced(),
            fallback: !outcome.is_synced(),
        },
    ))
}
