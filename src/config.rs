// Copyright (c) 2025 Oracle Sentinel
// Engine configuration: nested defaults with explicit deep merge

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::risk::Severity;
use crate::stats::consensus::ConsensusMethod;
use crate::stats::deviation::DeviationThresholds;

/// Thresholds for the statistical and liquidity detectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticalThresholds {
    /// Percent deviation from the history mean that flags a price
    pub price_deviation_pct: f64,
    pub zscore_threshold: f64,
    /// Percent liquidity fall against the trailing baseline
    pub liquidity_drop_pct: f64,
    pub min_history_points: usize,
}

impl Default for StatisticalThresholds {
    fn default() -> Self {
        Self {
            price_deviation_pct: 5.0,
            zscore_threshold: 3.0,
            liquidity_drop_pct: 20.0,
            min_history_points: 10,
        }
    }
}

/// Value and timing parameters for the transaction-pattern detectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRecognitionConfig {
    /// Transfers above this value are not ordinary traffic
    pub max_normal_tx_value: f64,
    pub min_flash_loan_value: f64,
    /// Maximum gap between sandwich legs
    pub sandwich_window_ms: i64,
}

impl Default for PatternRecognitionConfig {
    fn default() -> Self {
        Self {
            max_normal_tx_value: 100_000.0,
            min_flash_loan_value: 1_000_000.0,
            sandwich_window_ms: 2_000,
        }
    }
}

/// Cross-source validation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiSourceConfig {
    pub consensus_method: ConsensusMethod,
    /// Percent deviation from consensus a single source may show
    pub deviation_tolerance_pct: f64,
}

impl Default for MultiSourceConfig {
    fn default() -> Self {
        Self {
            consensus_method: ConsensusMethod::Median,
            deviation_tolerance_pct: 2.0,
        }
    }
}

/// Alert emission gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    pub min_severity: Severity,
    pub channels: Vec<String>,
    /// Minimum quiet time between two alerts for the same feed
    pub cooldown_ms: i64,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            min_severity: Severity::Low,
            channels: vec!["log".to_string()],
            cooldown_ms: 300_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    pub statistical_thresholds: StatisticalThresholds,
    pub pattern_recognition: PatternRecognitionConfig,
    pub multi_source: MultiSourceConfig,
    pub alerting: AlertingConfig,
    pub deviation_thresholds: DeviationThresholds,
    /// Per-feed history cap; oldest points are evicted first
    pub max_history_points: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            statistical_thresholds: StatisticalThresholds::default(),
            pattern_recognition: PatternRecognitionConfig::default(),
            multi_source: MultiSourceConfig::default(),
            alerting: AlertingConfig::default(),
            deviation_thresholds: DeviationThresholds::default(),
            max_history_points: 1_000,
        }
    }
}

impl DetectorConfig {
    /// Defaults with a partial override folded in.
    pub fn merged(overrides: DetectorConfigOverride) -> Self {
        let mut config = Self::default();
        config.apply(overrides);
        config
    }

    /// Deep merge: every leaf is overridden independently, so a partial
    /// nested override leaves its siblings at their defaults.
    pub fn apply(&mut self, overrides: DetectorConfigOverride) {
        if let Some(s) = overrides.statistical_thresholds {
            if let Some(v) = s.price_deviation_pct {
                self.statistical_thresholds.price_deviation_pct = v;
            }
            if let Some(v) = s.zscore_threshold {
                self.statistical_thresholds.zscore_threshold = v;
            }
            if let Some(v) = s.liquidity_drop_pct {
                self.statistical_thresholds.liquidity_drop_pct = v;
            }
            if let Some(v) = s.min_history_points {
                self.statistical_thresholds.min_history_points = v;
            }
        }
        if let Some(p) = overrides.pattern_recognition {
            if let Some(v) = p.max_normal_tx_value {
                self.pattern_recognition.max_normal_tx_value = v;
            }
            if let Some(v) = p.min_flash_loan_value {
                self.pattern_recognition.min_flash_loan_value = v;
            }
            if let Some(v) = p.sandwich_window_ms {
                self.pattern_recognition.sandwich_window_ms = v;
            }
        }
        if let Some(m) = overrides.multi_source {
            if let Some(v) = m.consensus_method {
                self.multi_source.consensus_method = v;
            }
            if let Some(v) = m.deviation_tolerance_pct {
                self.multi_source.deviation_tolerance_pct = v;
            }
        }
        if let Some(a) = overrides.alerting {
            if let Some(v) = a.min_severity {
                self.alerting.min_severity = v;
            }
            if let Some(v) = a.channels {
                self.alerting.channels = v;
            }
            if let Some(v) = a.cooldown_ms {
                self.alerting.cooldown_ms = v;
            }
        }
        if let Some(d) = overrides.deviation_thresholds {
            if let Some(v) = d.low {
                self.deviation_thresholds.low = v;
            }
            if let Some(v) = d.medium {
                self.deviation_thresholds.medium = v;
            }
            if let Some(v) = d.high {
                self.deviation_thresholds.high = v;
            }
            if let Some(v) = d.critical {
                self.deviation_thresholds.critical = v;
            }
        }
        if let Some(v) = overrides.max_history_points {
            self.max_history_points = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::NonPositive { name, value })
            }
        }

        positive(
            "statistical_thresholds.price_deviation_pct",
            self.statistical_thresholds.price_deviation_pct,
        )?;
        positive(
            "statistical_thresholds.zscore_threshold",
            self.statistical_thresholds.zscore_threshold,
        )?;
        positive(
            "statistical_thresholds.liquidity_drop_pct",
            self.statistical_thresholds.liquidity_drop_pct,
        )?;
        positive(
            "pattern_recognition.max_normal_tx_value",
            self.pattern_recognition.max_normal_tx_value,
        )?;
        positive(
            "pattern_recognition.min_flash_loan_value",
            self.pattern_recognition.min_flash_loan_value,
        )?;
        positive(
            "multi_source.deviation_tolerance_pct",
            self.multi_source.deviation_tolerance_pct,
        )?;

        if self.statistical_thresholds.min_history_points == 0 {
            return Err(ConfigError::ZeroLimit {
                name: "statistical_thresholds.min_history_points",
            });
        }
        if self.max_history_points == 0 {
            return Err(ConfigError::ZeroLimit {
                name: "max_history_points",
            });
        }
        if self.pattern_recognition.sandwich_window_ms <= 0 {
            return Err(ConfigError::ZeroLimit {
                name: "pattern_recognition.sandwich_window_ms",
            });
        }
        if self.alerting.cooldown_ms < 0 {
            return Err(ConfigError::Negative {
                name: "alerting.cooldown_ms",
                value: self.alerting.cooldown_ms,
            });
        }

        let tiers = &self.deviation_thresholds;
        positive("deviation_thresholds.low", tiers.low)?;
        if !(tiers.low < tiers.medium && tiers.medium < tiers.high && tiers.high < tiers.critical)
        {
            return Err(ConfigError::UnorderedDeviationTiers {
                low: tiers.low,
                medium: tiers.medium,
                high: tiers.high,
                critical: tiers.critical,
            });
        }

        Ok(())
    }
}

/// Partial configuration. Absent leaves keep their defaults when merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectorConfigOverride {
    pub statistical_thresholds: Option<StatisticalThresholdsOverride>,
    pub pattern_recognition: Option<PatternRecognitionOverride>,
    pub multi_source: Option<MultiSourceOverride>,
    pub alerting: Option<AlertingOverride>,
    pub deviation_thresholds: Option<DeviationThresholdsOverride>,
    pub max_history_points: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticalThresholdsOverride {
    pub price_deviation_pct: Option<f64>,
    pub zscore_threshold: Option<f64>,
    pub liquidity_drop_pct: Option<f64>,
    pub min_history_points: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternRecognitionOverride {
    pub max_normal_tx_value: Option<f64>,
    pub min_flash_loan_value: Option<f64>,
    pub sandwich_window_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MultiSourceOverride {
    pub consensus_method: Option<ConsensusMethod>,
    pub deviation_tolerance_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertingOverride {
    pub min_severity: Option<Severity>,
    pub channels: Option<Vec<String>>,
    pub cooldown_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviationThresholdsOverride {
    pub low: Option<f64>,
    pub medium: Option<f64>,
    pub high: Option<f64>,
    pub critical: Option<f64>,
}
