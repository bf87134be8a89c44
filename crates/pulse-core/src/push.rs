//! Delivery of a rendered payload to the line-protocol backend.

use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::probe::{HttpClient, ProbeError};

/// Backend location, credentials and retry schedule.
#[derive(Clone, PartialEq)]
pub struct PushSettings {
    pub url: Option<String>,
    pub user: Option<String>,
    pub api_key: Option<String>,
    /// Total attempts, including the first.
    pub retries: u32,
    /// Fixed wait between consecutive attempts.
    pub retry_delay: Duration,
    /// Bound on each attempt.
    pub timeout: Duration,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            api_key: None,
            retries: 3,
            retry_delay: Duration::from_secs(10),
            timeout: Duration::from_secs(10),
        }
    }
}

impl std::fmt::Debug for PushSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushSettings")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("retries", &self.retries)
            .field("retry_delay", &self.retry_delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PushSettings {
    /// `(url, user, api_key)` when all three are set and non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        fn present(value: Option<&String>) -> Option<&str> {
            value.map(String::as_str).filter(|v| !v.is_empty())
        }
        Some((
            present(self.url.as_ref())?,
            present(self.user.as_ref())?,
            present(self.api_key.as_ref())?,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyPayload,
    MissingCredentials,
    /// The caller turned delivery off for this run.
    Disabled,
}

/// Result of one delivery. Delivery never fails the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered { attempts: u32 },
    Skipped(SkipReason),
    /// Every attempt failed and the payload was dropped.
    Abandoned { attempts: u32 },
}

impl PushOutcome {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PushError {
    #[error("backend responded with status {0}")]
    Rejected(u16),

    #[error(transparent)]
    Transport(#[from] ProbeError),
}

pub struct MetricsPusher {
    settings: PushSettings,
    client: Arc<HttpClient>,
}

impl MetricsPusher {
    #[must_use]
    pub fn new(settings: PushSettings, client: Arc<HttpClient>) -> Self {
        Self { settings, client }
    }

    #[must_use]
    pub fn settings(&self) -> &PushSettings {
        &self.settings
    }

    /// Delivers `payload`, retrying with a fixed delay.
    ///
    /// Skips silently when the payload is empty or credentials are incomplete.
    /// No delay follows the last attempt.
    pub async fn push(&self, payload: &str) -> PushOutcome {
        if payload.is_empty() {
            return PushOutcome::Skipped(SkipReason::EmptyPayload);
        }
        let Some((url, user, api_key)) = self.settings.credentials() else {
            debug!("push backend not configured, skipping delivery");
            return PushOutcome::Skipped(SkipReason::MissingCredentials);
        };

        let retries = self.settings.retries.max(1);
        for attempt in 1..=retries {
            match self.attempt(url, user, api_key, payload).await {
                Ok(()) => {
                    info!(attempt, bytes = payload.len(), "metrics pushed");
                    return PushOutcome::Delivered { attempts: attempt };
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = retries,
                        error = %e,
                        "metrics push attempt failed"
                    );
                }
            }

            if attempt < retries {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
        }

        warn!(attempts = retries, "all metrics push attempts failed, dropping payload");
        PushOutcome::Abandoned { attempts: retries }
    }

    async fn attempt(
        &self,
        url: &str,
        user: &str,
        api_key: &str,
        payload: &str,
    ) -> Result<(), PushError> {
        let status = self
            .client
            .post_text(url, payload.to_string(), user, api_key, self.settings.timeout)
            .await?;

        match status {
            200 | 204 => Ok(()),
            other => Err(PushError::Rejected(other)),
        }
    }
}
