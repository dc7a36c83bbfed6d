use serde::{Deserialize, Serialize};

/// One price observation from one source at one instant. Immutable once
/// recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: i64, // Unix millis
    pub price: f64,
    pub volume: Option<f64>,
    pub liquidity: Option<f64>,
    pub source: String,
}

impl PricePoint {
    pub fn new(timestamp: i64, price: f64, source: impl Into<String>) -> Self {
        Self {
            timestamp,
            price,
            volume: None,
            liquidity: None,
            source: source.into(),
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_liquidity(mut self, liquidity: f64) -> Self {
        self.liquidity = Some(liquidity);
        self
    }
}

/// Identifies one monitored price stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedId {
    pub protocol: String,
    pub symbol: String,
    pub chain: String,
}

impl FeedId {
    pub fn new(
        protocol: impl Into<String>,
        symbol: impl Into<String>,
        chain: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            symbol: symbol.into(),
            chain: chain.into(),
        }
    }

    /// Composite `protocol-symbol-chain` key used for history, cooldown and
    /// ledger bookkeeping.
    pub fn key(&self) -> String {
        format!("{}-{}-{}", self.protocol, self.symbol, self.chain)
    }
}
