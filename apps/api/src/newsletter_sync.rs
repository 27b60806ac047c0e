/// Newsletter provider client: pushes confirmed subscribers to the external
/// mailing-list service once they are stored in the database.
///
/// Disabled when `NEWSLETTER_SYNC_URL` is unset. Pushes run in the background
/// after the response is sent; a failed push leaves `synced_to_provider = false`.
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 250;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error (status {status}): {message}")]
    Provider { status: u16, message: String },
}

#[derive(Debug, Serialize)]
struct SubscriberPayload<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    tags: [&'a str; 1],
}

#[derive(Clone)]
pub struct NewsletterSync {
    client: Client,
    url: Option<String>,
    api_key: Option<String>,
}

impl NewsletterSync {
    pub fn new(url: Option<String>, api_key: Option<String>) -> Result<Self, SyncError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            url,
            api_key,
        })
    }

    #[cfg(test)]
    pub fn disabled() -> Result<Self, SyncError> {
        Self::new(None, None)
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Pushes one subscriber. Returns `Ok(false)` when syncing is disabled.
    /// Retries on 429 and 5xx with exponential backoff.
    pub async fn push(&self, email: &str, source: Option<&str>) -> Result<bool, SyncError> {
        let Some(url) = self.url.as_deref() else {
            return Ok(false);
        };
        let payload = SubscriberPayload {
            email,
            source,
            tags: ["website"],
        };

        let mut last_error: Option<SyncError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(BASE_BACKOFF_MS * (1 << (attempt - 1)));
                warn!(
                    "Newsletter sync attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(url).json(&payload);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(SyncError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if is_retryable(status) {
                let body = response.text().await.unwrap_or_default();
                last_error = Some(SyncError::Provider {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(SyncError::Provider {
                    status: status.as_u16(),
                    message: body,
                });
            }

            debug!("Newsletter subscriber pushed to provider");
            return Ok(true);
        }

        Err(last_error.unwrap_or(SyncError::Provider {
            status: 0,
            message: format!("gave up after {MAX_RETRIES} attempts"),
        }))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
