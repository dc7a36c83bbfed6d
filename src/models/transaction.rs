use serde::{Deserialize, Serialize};

/// Minimal decoded transaction supplied by the external transaction
/// provider. `input` is raw call data; the engine only ever matches its
/// 4-byte selector prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub timestamp: i64, // Unix millis
    pub from: String,
    pub to: String,
    pub value: f64,
    pub gas_price: f64,
    pub gas_used: u64,
    pub input: String, // "0x"-prefixed call data
    pub logs: Vec<TransactionLog>,
}

/// One emitted log entry, kept opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

impl TransactionRecord {
    pub fn new(
        hash: impl Into<String>,
        timestamp: i64,
        from: impl Into<String>,
        to: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            hash: hash.into(),
            timestamp,
            from: from.into(),
            to: to.into(),
            value,
            gas_price: 0.0,
            gas_used: 0,
            input: "0x".to_string(),
            logs: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_gas(mut self, gas_price: f64, gas_used: u64) -> Self {
        self.gas_price = gas_price;
        self.gas_used = gas_used;
        self
    }
}
