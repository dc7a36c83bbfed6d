// Copyright (c) 2025 Oracle Sentinel
// Flash Loan Detection via Call-Data Selector Fingerprints

use once_cell::sync::Lazy;

use crate::models::{FeedObservation, TransactionRecord};
use crate::risk::{DetectionEvidence, DetectionType, PatternMatch};

/// One known flash-loan entry point, identified by its 4-byte function
/// selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashLoanSignature {
    pub protocol: &'static str,
    pub function: &'static str,
    pub selector: [u8; 4],
}

/// Built-in fingerprints, ranked by how often the entry point shows up in
/// the wild. New fingerprints are data: extend the table, not the logic.
static BUILTIN_SIGNATURES: Lazy<Vec<FlashLoanSignature>> = Lazy::new(|| {
    vec![
        FlashLoanSignature {
            protocol: "aave-v2",
            function: "flashLoan",
            selector: [0xab, 0x9c, 0x4b, 0x5d],
        },
        FlashLoanSignature {
            protocol: "aave-v3",
            function: "flashLoanSimple",
            selector: [0x42, 0xb0, 0xb7, 0x7c],
        },
        FlashLoanSignature {
            protocol: "balancer-v2",
            function: "flashLoan",
            selector: [0x5c, 0x38, 0x44, 0x9e],
        },
        FlashLoanSignature {
            protocol: "dydx-solo",
            function: "operate",
            selector: [0xa6, 0x7a, 0x6a, 0x45],
        },
        FlashLoanSignature {
            protocol: "uniswap-v2",
            function: "swap",
            selector: [0x02, 0x2c, 0x0d, 0x9f],
        },
        FlashLoanSignature {
            protocol: "uniswap-v3",
            function: "flash",
            selector: [0x49, 0x0e, 0x6c, 0xbc],
        },
    ]
});

/// Flags transactions whose call data enters a known flash-loan provider.
pub struct FlashLoanAnalyzer {
    signatures: Vec<FlashLoanSignature>,
    /// Loans above this value are annotated as large in the evidence
    min_flash_loan_value: f64,
}

impl FlashLoanAnalyzer {
    pub fn new(min_flash_loan_value: f64) -> Self {
        Self {
            signatures: BUILTIN_SIGNATURES.clone(),
            min_flash_loan_value,
        }
    }

    /// Append an extra fingerprint to the ranked table.
    pub fn with_signature(mut self, signature: FlashLoanSignature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn analyze(&self, obs: &FeedObservation) -> Option<PatternMatch> {
        let mut evidence = Vec::new();

        for tx in &obs.transactions {
            if let Some(signature) = self.match_signature(tx) {
                evidence.push(
                    DetectionEvidence::new(
                        "flash_loan_call",
                        format!(
                            "{}::{} selector in transaction {}",
                            signature.protocol, signature.function, tx.hash
                        ),
                        tx.timestamp,
                    )
                    .with_data("protocol", signature.protocol)
                    .with_data("function", signature.function)
                    .with_data("tx_hash", &tx.hash)
                    .with_data("sender", &tx.from)
                    .with_data("value", tx.value)
                    .with_data("large_loan", tx.value > self.min_flash_loan_value),
                );
            }
        }

        if evidence.is_empty() {
            return None;
        }

        let confidence = (evidence.len() as f64 * 30.0 + 20.0).min(100.0);

        Some(PatternMatch {
            detection_type: DetectionType::FlashLoanAttack,
            confidence,
            evidence,
        })
    }

    /// First signature whose selector matches the transaction's call-data
    /// prefix. Malformed or too-short call data never matches.
    fn match_signature(&self, tx: &TransactionRecord) -> Option<&FlashLoanSignature> {
        let raw = tx.input.strip_prefix("0x").unwrap_or(&tx.input);
        if raw.len() < 8 {
            return None;
        }
        let selector = hex::decode(&raw[..8]).ok()?;
        self.signatures
            .iter()
            .find(|sig| sig.selector[..] == selector[..])
    }
}
