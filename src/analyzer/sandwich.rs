// Copyright (c) 2025 Oracle Sentinel
// Sandwich Attack Detection using Consecutive-Triple Pattern Matching

use crate::models::FeedObservation;
use crate::risk::{DetectionEvidence, DetectionType, PatternMatch};

/// Detects the front-run / victim / back-run shape in a feed's recent
/// transactions: two large transfers tightly bracketing a smaller one.
pub struct SandwichAnalyzer {
    /// Maximum gap between consecutive legs
    window_ms: i64,
    /// A front-run below this value is ordinary traffic
    max_normal_tx_value: f64,
}

impl SandwichAnalyzer {
    pub fn new(window_ms: i64, max_normal_tx_value: f64) -> Self {
        Self {
            window_ms,
            max_normal_tx_value,
        }
    }

    pub fn analyze(&self, obs: &FeedObservation) -> Option<PatternMatch> {
        if obs.transactions.len() < 3 {
            return None;
        }

        // Evaluate triples in time order regardless of arrival order
        let mut ordered: Vec<_> = obs.transactions.iter().collect();
        ordered.sort_by_key(|tx| tx.timestamp);

        let mut evidence = Vec::new();
        for triple in ordered.windows(3) {
            let (front, target, back) = (triple[0], triple[1], triple[2]);
            let gap_in = target.timestamp - front.timestamp;
            let gap_out = back.timestamp - target.timestamp;

            if gap_in < self.window_ms
                && gap_out < self.window_ms
                && front.value > target.value
                && back.value > target.value
                && front.value > self.max_normal_tx_value
            {
                evidence.push(
                    DetectionEvidence::new(
                        "sandwich_triple",
                        format!(
                            "Transactions {} -> {} -> {} bracket a smaller transfer within {}ms",
                            front.hash,
                            target.hash,
                            back.hash,
                            gap_in + gap_out
                        ),
                        target.timestamp,
                    )
                    .with_data("front_tx", &front.hash)
                    .with_data("victim_tx", &target.hash)
                    .with_data("back_tx", &back.hash)
                    .with_data("front_value", front.value)
                    .with_data("victim_value", target.value)
                    .with_data("back_value", back.value)
                    .with_data("span_ms", gap_in + gap_out),
                );
            }
        }

        if evidence.is_empty() {
            return None;
        }

        let confidence = (70.0 + 10.0 * evidence.len() as f64).min(100.0);

        Some(PatternMatch {
            detection_type: DetectionType::SandwichAttack,
            confidence,
            evidence,
        })
    }
}
