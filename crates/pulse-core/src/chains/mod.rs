//! Supported blockchains and the probe kinds measured on each of them.

pub mod evm;
pub mod solana;
pub mod ton;

use serde_json::Value;
use std::{fmt, str::FromStr, sync::Arc};

use crate::{
    config::ConfigError,
    probe::{ChainSubscription, HttpClient, HttpProbe, Probe, WebSocketProbe},
    registry::{MetricSpec, ProbeContext},
    types::JsonRpcRequest,
};

/// Name under which every built-in latency metric is reported.
pub const METRIC_NAME: &str = "response_latency_seconds";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blockchain {
    Ethereum,
    Base,
    Solana,
    Ton,
}

impl Blockchain {
    pub const ALL: [Blockchain; 4] =
        [Blockchain::Ethereum, Blockchain::Base, Blockchain::Solana, Blockchain::Ton];

    /// Display name, used for the `blockchain` label and provider matching.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ethereum => "Ethereum",
            Self::Base => "Base",
            Self::Solana => "Solana",
            Self::Ton => "Ton",
        }
    }

    /// Case-insensitive comparison against a provider's `blockchain` field.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name.trim())
    }

    /// Metrics registered for this chain by [`crate::registry::MetricRegistry::with_defaults`].
    #[must_use]
    pub fn default_metrics(&self) -> Vec<MetricSpec> {
        match self {
            Self::Ethereum | Self::Base => evm::default_metrics(),
            Self::Solana => solana::default_metrics(),
            Self::Ton => ton::default_metrics(),
        }
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Blockchain {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|chain| chain.matches(s)).ok_or_else(|| {
            ConfigError::UnknownBlockchain {
                name: s.to_string(),
                supported: Self::ALL.iter().map(ToString::to_string).collect(),
            }
        })
    }
}

/// Block subscription flavors for WebSocket probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    /// `eth_subscribe ["newHeads"]`
    EvmNewHeads,
    /// `blockSubscribe`
    SolanaBlocks,
}

impl SubscriptionKind {
    fn strategy(self) -> Box<dyn ChainSubscription> {
        match self {
            Self::EvmNewHeads => Box::new(evm::NewHeadsSubscription),
            Self::SolanaBlocks => Box::new(solana::BlockSubscription),
        }
    }

    #[must_use]
    pub fn api_method(self) -> &'static str {
        match self {
            Self::EvmNewHeads => "eth_subscribe",
            Self::SolanaBlocks => "blockSubscribe",
        }
    }
}

/// A plain JSON-RPC call measured by an HTTP probe.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    pub method: String,
    pub params: Option<Value>,
}

impl RpcCall {
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self { method: method.into(), params }
    }
}

/// What a metric measures. One variant per probe shape.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricKind {
    /// Age of the newest block pushed over a WebSocket subscription.
    WsBlockLatency(SubscriptionKind),
    /// Round trip of an `eth_call` built from the provider's `tx_data`.
    EthCallLatency,
    /// Round trip of a fixed JSON-RPC call.
    HttpCallLatency(RpcCall),
}

impl MetricKind {
    #[must_use]
    pub fn api_method(&self) -> &str {
        match self {
            Self::WsBlockLatency(kind) => kind.api_method(),
            Self::EthCallLatency => "eth_call",
            Self::HttpCallLatency(call) => &call.method,
        }
    }

    /// Builds the probe for one provider.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidProviderData`] when the kind needs provider
    /// data (`eth_call`) that is missing or malformed.
    pub fn build(
        &self,
        context: &ProbeContext,
        http_client: &Arc<HttpClient>,
    ) -> Result<Box<dyn Probe>, ConfigError> {
        let probe: Box<dyn Probe> = match self {
            Self::WsBlockLatency(kind) => {
                Box::new(WebSocketProbe::new(context.websocket_endpoint.clone(), kind.strategy()))
            }
            Self::EthCallLatency => {
                let request =
                    evm::eth_call_request(context.tx_data.as_ref()).map_err(|reason| {
                        ConfigError::InvalidProviderData {
                            provider: context.provider_name().to_string(),
                            reason,
                        }
                    })?;
                Box::new(
                    HttpProbe::new(Arc::clone(http_client), context.http_endpoint.clone(), request)
                        .requiring_result(),
                )
            }
            Self::HttpCallLatency(call) => Box::new(HttpProbe::new(
                Arc::clone(http_client),
                context.http_endpoint.clone(),
                JsonRpcRequest::new(call.method.clone(), call.params.clone()),
            )),
        };
        Ok(probe)
    }
}
