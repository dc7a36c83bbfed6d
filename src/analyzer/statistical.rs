// Copyright (c) 2025 Oracle Sentinel
// Statistical Price Anomaly Detection using Z-Score + Robust Trend Context

use crate::models::FeedObservation;
use crate::risk::{DetectionEvidence, DetectionType, PatternMatch};
use crate::stats::deviation::{
    anomaly_score, classify_deviation, recommendation, DeviationThresholds,
};
use crate::stats::outlier::{detect_outliers, OutlierConfig};
use crate::stats::trend::{robust_trend_analysis, DEFAULT_TREND_THRESHOLD};

/// Detects prices that break away from the feed's own recent behavior.
pub struct StatisticalAnomalyAnalyzer {
    /// Percent deviation from the history mean required to fire
    price_deviation_pct: f64,
    /// Minimum history sample before the mean is trustworthy
    min_history_points: usize,
    outlier_config: OutlierConfig,
    deviation_thresholds: DeviationThresholds,
}

impl StatisticalAnomalyAnalyzer {
    pub fn new(
        price_deviation_pct: f64,
        min_history_points: usize,
        deviation_thresholds: DeviationThresholds,
    ) -> Self {
        Self {
            price_deviation_pct,
            min_history_points,
            outlier_config: OutlierConfig::default(),
            deviation_thresholds,
        }
    }

    pub fn analyze(&self, obs: &FeedObservation) -> Option<PatternMatch> {
        // Step 1: need a history sample to characterize normal behavior
        let prices: Vec<f64> = obs.history.iter().map(|p| p.price).collect();
        if prices.len() < self.min_history_points {
            return None;
        }

        // Step 2: population statistics over the history window
        let n = prices.len() as f64;
        let mean = prices.iter().sum::<f64>() / n;
        let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        // Flat or zero-centered history: nothing to score
        if std_dev == 0.0 || mean == 0.0 {
            return None;
        }

        let z_score = (obs.current_price - mean).abs() / std_dev;
        let deviation_pct = (obs.current_price - mean).abs() / mean.abs() * 100.0;

        // Step 3: deviation threshold
        if deviation_pct <= self.price_deviation_pct {
            return None;
        }

        let confidence = (z_score * 10.0).min(100.0);

        // Step 4: supporting context: history outlier density, trend shape,
        // and the classified severity of the deviation itself
        let deviations: Vec<f64> = prices.iter().map(|p| (p - mean).abs() / mean.abs()).collect();
        let outliers = detect_outliers(&deviations, &self.outlier_config);
        let trend = robust_trend_analysis(&prices, DEFAULT_TREND_THRESHOLD);
        let score = anomaly_score(&deviations, &outliers, self.outlier_config.threshold);
        let tier = classify_deviation(deviation_pct / 100.0, &self.deviation_thresholds);
        let guidance = recommendation(score, &trend, tier);

        let evidence = DetectionEvidence::new(
            "statistical_deviation",
            format!(
                "Price {:.6} deviates {:.2}% from the {}-point mean {:.6}",
                obs.current_price,
                deviation_pct,
                prices.len(),
                mean
            ),
            obs.observed_at_ms,
        )
        .with_data("z_score", z_score)
        .with_data("mean_price", mean)
        .with_data("std_dev", std_dev)
        .with_data("deviation_pct", deviation_pct)
        .with_data("history_outliers", outliers.len())
        .with_data("anomaly_score", score)
        .with_data("deviation_severity", tier.as_str())
        .with_data("trend_direction", trend.direction)
        .with_data("trend_strength", trend.strength)
        .with_data("volatility", trend.volatility)
        .with_data("guidance", guidance);

        Some(PatternMatch {
            detection_type: DetectionType::StatisticalAnomaly,
            confidence,
            evidence: vec![evidence],
        })
    }
}
