//! # Pulse Core
//!
//! Latency probes for blockchain RPC providers and the pipeline that pushes the
//! measurements to a line-protocol backend.
//!
//! - **[`probe`]**: HTTP and WebSocket probes. Each performs one measured attempt
//!   against one provider endpoint.
//!
//! - **[`metric`]**: A probe bound to a label set, with the collect lifecycle and
//!   line-protocol rendering.
//!
//! - **[`chains`]**: Supported blockchains and their built-in probe catalogue.
//!
//! - **[`registry`]**: Blockchain → metric kinds mapping and the factory that
//!   instantiates metrics per provider.
//!
//! - **[`pipeline`]**: One invocation: create, collect concurrently, render, push.
//!
//! - **[`push`]**: Delivery to the backend with a fixed-delay retry schedule.
//!
//! - **[`config`]**: Layered application configuration and the endpoints document.
//!
//! ## Invocation Flow
//!
//! ```text
//! EndpointsDocument ──► providers for chain
//!                              │
//!                              ▼
//!                  MetricRegistry::create (per provider)
//!                              │
//!                              ▼
//!                  RunContext ── join_all(collect) ──► probes
//!                              │
//!                              ▼
//!                   payload (one line per value)
//!                              │
//!                              ▼
//!                  MetricsPusher ──► backend (retry, fixed delay)
//! ```

pub mod chains;
pub mod config;
pub mod labels;
pub mod metric;
pub mod pipeline;
pub mod probe;
pub mod push;
pub mod registry;
pub mod types;
