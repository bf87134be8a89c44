use futures::future::join_all;
use uuid::Uuid;

use crate::{chains::Blockchain, metric::Metric};

/// Owns every metric instance created during one invocation.
///
/// Dropped at the end of the invocation, so nothing carries over between runs.
#[derive(Debug)]
pub struct RunContext {
    run_id: Uuid,
    blockchain: Blockchain,
    metrics: Vec<Metric>,
}

impl RunContext {
    #[must_use]
    pub fn new(blockchain: Blockchain) -> Self {
        Self { run_id: Uuid::new_v4(), blockchain, metrics: Vec::new() }
    }

    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn blockchain(&self) -> Blockchain {
        self.blockchain
    }

    pub fn register(&mut self, metrics: impl IntoIterator<Item = Metric>) {
        self.metrics.extend(metrics);
    }

    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Runs every metric concurrently and returns once all of them finished.
    pub async fn collect_all(&mut self) {
        join_all(self.metrics.iter_mut().map(|m| m.collect())).await;
    }

    /// Line-protocol lines for every metric that holds a value.
    #[must_use]
    pub fn rendered_lines(&self) -> Vec<String> {
        self.metrics.iter().filter_map(|m| m.influx_line().ok()).collect()
    }

    /// All rendered lines joined by `\n`. Empty when nothing was measured.
    #[must_use]
    pub fn payload(&self) -> String {
        self.rendered_lines().join("\n")
    }

    #[must_use]
    pub fn reported_count(&self) -> usize {
        self.metrics.iter().filter(|m| m.latest_value().is_some()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.metrics.iter().filter(|m| m.is_failed()).count()
    }
}
