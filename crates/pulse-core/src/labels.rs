//! Metric labels and their Prometheus / line-protocol renderings.

use std::fmt;

/// Fixed set of label keys a metric may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKey {
    /// Region the probe runs from.
    SourceRegion,
    /// Region of the provider being probed.
    TargetRegion,
    Blockchain,
    Provider,
    /// JSON-RPC method (or subscription) exercised by the probe.
    ApiMethod,
    /// `success` or `failed`, set by the collect lifecycle.
    ResponseStatus,
}

impl LabelKey {
    /// Returns the tag name used when rendering.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceRegion => "source_region",
            Self::TargetRegion => "target_region",
            Self::Blockchain => "blockchain",
            Self::Provider => "provider",
            Self::ApiMethod => "api_method",
            Self::ResponseStatus => "response_status",
        }
    }
}

impl fmt::Display for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the `response_status` label after a successful collect.
pub const STATUS_SUCCESS: &str = "success";

/// Value of the `response_status` label after a failed collect.
pub const STATUS_FAILED: &str = "failed";

/// Value used for any label the caller did not supply.
pub const DEFAULT_LABEL_VALUE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLabel {
    pub key: LabelKey,
    pub value: String,
}

/// Ordered collection of labels with at most one entry per key.
///
/// Order is fixed at construction and only grows through [`MetricLabels::add_label`],
/// so rendered output is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricLabels {
    labels: Vec<MetricLabel>,
}

impl MetricLabels {
    /// Builds the standard label set. `api_method` starts as `default` and
    /// `response_status` as `success`; probes overwrite both.
    #[must_use]
    pub fn new(
        source_region: impl Into<String>,
        target_region: impl Into<String>,
        blockchain: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            labels: vec![
                MetricLabel { key: LabelKey::SourceRegion, value: source_region.into() },
                MetricLabel { key: LabelKey::TargetRegion, value: target_region.into() },
                MetricLabel { key: LabelKey::Blockchain, value: blockchain.into() },
                MetricLabel { key: LabelKey::Provider, value: provider.into() },
                MetricLabel {
                    key: LabelKey::ApiMethod,
                    value: DEFAULT_LABEL_VALUE.to_string(),
                },
                MetricLabel {
                    key: LabelKey::ResponseStatus,
                    value: STATUS_SUCCESS.to_string(),
                },
            ],
        }
    }

    /// Replaces the value of an existing label, leaving every other label untouched.
    ///
    /// Returns `false` (and logs a warning) when the key is not present.
    pub fn update_label(&mut self, key: LabelKey, value: impl Into<String>) -> bool {
        if let Some(label) = self.labels.iter_mut().find(|l| l.key == key) {
            label.value = value.into();
            return true;
        }
        tracing::warn!(label = %key, "label not found");
        false
    }

    /// Sets a label, appending it when the key is not present yet.
    pub fn add_label(&mut self, key: LabelKey, value: impl Into<String>) {
        let value = value.into();
        match self.labels.iter_mut().find(|l| l.key == key) {
            Some(label) => label.value = value,
            None => self.labels.push(MetricLabel { key, value }),
        }
    }

    #[must_use]
    pub fn get_label(&self, key: LabelKey) -> Option<&str> {
        self.labels.iter().find(|l| l.key == key).map(|l| l.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricLabel> {
        self.labels.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Renders `key="value"` pairs joined by commas.
    #[must_use]
    pub fn prometheus_labels(&self) -> String {
        self.labels
            .iter()
            .map(|l| {
                let value = l.value.replace('\\', "\\\\").replace('"', "\\\"");
                format!("{}=\"{value}\"", l.key)
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Renders line-protocol tags (`key=value` joined by commas).
    ///
    /// Commas, spaces and equals signs inside values are backslash-escaped.
    #[must_use]
    pub fn line_protocol_tags(&self) -> String {
        self.labels
            .iter()
            .map(|l| format!("{}={}", l.key, escape_tag_value(&l.value)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

pub(crate) fn escape_tag_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
