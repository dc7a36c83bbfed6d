// Copyright (c) 2025 Oracle Sentinel
// Deviation severity classification and anomaly scoring

use serde::{Deserialize, Serialize};

use super::trend::{TrendAnalysis, TrendDirection};
use crate::risk::Severity;

/// Ascending fractional cutoffs mapping a deviation to a severity tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeviationThresholds {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for DeviationThresholds {
    fn default() -> Self {
        Self {
            low: 0.005,
            medium: 0.01,
            high: 0.02,
            critical: 0.05,
        }
    }
}

/// Severity tier for a fractional deviation. Tiers are checked strictly
/// top-down: critical, then high, then medium.
pub fn classify_deviation(deviation: f64, thresholds: &DeviationThresholds) -> Severity {
    let magnitude = deviation.abs();
    if magnitude >= thresholds.critical {
        Severity::Critical
    } else if magnitude >= thresholds.high {
        Severity::High
    } else if magnitude >= thresholds.medium {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Blend of outlier density and high-deviation density, clamped to [0, 1].
pub fn anomaly_score(deviations: &[f64], outlier_indices: &[usize], threshold: f64) -> f64 {
    if deviations.is_empty() {
        return 0.0;
    }

    let n = deviations.len() as f64;
    let outlier_ratio = outlier_indices.len() as f64 / n;
    let high_deviation_ratio = deviations.iter().filter(|&&d| d > threshold).count() as f64 / n;

    ((outlier_ratio + high_deviation_ratio) / 2.0).clamp(0.0, 1.0)
}

/// Rule-based operator guidance. Each triggered rule appends one sentence;
/// a quiet feed gets the canned all-clear.
pub fn recommendation(score: f64, trend: &TrendAnalysis, severity: Severity) -> String {
    let mut sentences: Vec<&str> = Vec::new();

    if score >= 0.7 {
        sentences
            .push("Severe anomaly concentration; halt dependent integrations until sources are audited.");
    } else if score >= 0.4 {
        sentences.push(
            "Elevated anomaly rate; increase sampling frequency and cross-check secondary sources.",
        );
    }

    if trend.direction == TrendDirection::Increasing && trend.strength > 0.5 {
        sentences.push("Deviations are trending upward with momentum; tighten alert thresholds.");
    }

    match severity {
        Severity::Critical => sentences
            .push("Critical deviation observed; treat the feed as compromised until verified."),
        Severity::High => sentences
            .push("High deviation observed; require consensus confirmation before acting on this feed."),
        _ => {}
    }

    if sentences.is_empty() {
        "Price deviations are within normal ranges; no action required.".to_string()
    } else {
        sentences.join(" ")
    }
}
