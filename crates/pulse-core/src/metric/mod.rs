//! A single measurable quantity bound to one provider, one method and one label set.

use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::{
    labels::{LabelKey, MetricLabels, STATUS_FAILED, STATUS_SUCCESS},
    probe::{Probe, ProbeError},
};

/// Default per-operation timeout for probes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default acceptance ceiling for a measured latency.
pub const DEFAULT_MAX_LATENCY: Duration = Duration::from_secs(30);

/// Probe settings shared by every metric instance of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricConfig {
    /// Bound on each network operation (connect, subscribe, listen, request).
    pub timeout: Duration,
    /// Latencies strictly above this are failures.
    pub max_latency: Duration,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT, max_latency: DEFAULT_MAX_LATENCY }
    }
}

impl MetricConfig {
    /// Accepts `latency` when it is at most `max_latency`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::LatencyExceeded`] when the latency is strictly above the ceiling.
    pub fn check_latency(&self, latency: f64) -> Result<f64, ProbeError> {
        if latency > self.max_latency.as_secs_f64() {
            return Err(ProbeError::LatencyExceeded { latency, max: self.max_latency });
        }
        Ok(latency)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum MetricError {
    #[error("metric value is not set")]
    ValueNotSet,
}

/// One metric instance: identity, labels, the probe that measures it, and its
/// latest value.
///
/// `latest_value` is written at most once and only by a successful
/// [`Metric::collect`].
pub struct Metric {
    id: Uuid,
    name: String,
    labels: MetricLabels,
    config: Arc<MetricConfig>,
    probe: Box<dyn Probe>,
    latest_value: Option<f64>,
}

impl std::fmt::Debug for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metric")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("latest_value", &self.latest_value)
            .finish_non_exhaustive()
    }
}

impl Metric {
    /// Creates a metric and stamps the probe's method onto the `api_method` label.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        mut labels: MetricLabels,
        config: Arc<MetricConfig>,
        probe: Box<dyn Probe>,
    ) -> Self {
        labels.update_label(LabelKey::ApiMethod, probe.api_method());
        Self { id: Uuid::new_v4(), name: name.into(), labels, config, probe, latest_value: None }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn labels(&self) -> &MetricLabels {
        &self.labels
    }

    #[must_use]
    pub fn latest_value(&self) -> Option<f64> {
        self.latest_value
    }

    #[must_use]
    pub fn api_method(&self) -> &str {
        self.probe.api_method()
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.labels.get_label(LabelKey::ResponseStatus) == Some(STATUS_FAILED)
    }

    /// Runs the probe once and records the outcome.
    ///
    /// Never fails: probe errors (including an out-of-range latency) mark the
    /// `response_status` label `failed` and are logged with the rendered labels.
    /// A probe that observes nothing new leaves the metric untouched.
    pub async fn collect(&mut self) {
        if self.latest_value.is_some() {
            debug!(metric_id = %self.id, "metric already reported, skipping collect");
            return;
        }

        let outcome = match self.probe.run_once(&self.config).await {
            Ok(Some(latency)) => self.config.check_latency(latency).map(Some),
            other => other,
        };

        match outcome {
            Ok(Some(latency)) => self.update_value(latency),
            Ok(None) => {
                debug!(
                    metric_id = %self.id,
                    api_method = self.probe.api_method(),
                    "probe produced no new sample"
                );
            }
            Err(e) => self.handle_error(&e),
        }
    }

    fn update_value(&mut self, value: f64) {
        self.latest_value = Some(value);
        self.labels.update_label(LabelKey::ResponseStatus, STATUS_SUCCESS);
    }

    fn handle_error(&mut self, err: &ProbeError) {
        self.labels.update_label(LabelKey::ResponseStatus, STATUS_FAILED);
        error!(
            labels = %self.labels.prometheus_labels(),
            error = %err,
            error_kind = err.kind(),
            transient = err.is_transient(),
            "probe failed"
        );
    }

    /// Renders `name,tag=value,... value=<latest>` in line protocol.
    ///
    /// # Errors
    ///
    /// Returns [`MetricError::ValueNotSet`] if no successful collect happened yet.
    pub fn influx_line(&self) -> Result<String, MetricError> {
        let value = self.latest_value.ok_or(MetricError::ValueNotSet)?;
        if self.labels.is_empty() {
            return Ok(format!("{} value={value}", self.name));
        }
        Ok(format!("{},{} value={value}", self.name, self.labels.line_protocol_tags()))
    }
}
