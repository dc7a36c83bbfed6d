// Copyright (c) 2025 Oracle Sentinel
// Statistical outlier detection over deviation series

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    Threshold,
    Iqr,
    Zscore,
    /// Union of threshold and IQR hits. Z-score is intentionally not part
    /// of the union; it only runs when selected explicitly.
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierConfig {
    pub method: OutlierMethod,
    pub threshold: f64,
    pub iqr_multiplier: f64,
    pub zscore_threshold: f64,
    pub min_data_points: usize,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            method: OutlierMethod::Both,
            threshold: 0.05,
            iqr_multiplier: 1.5,
            zscore_threshold: 3.0,
            min_data_points: 4,
        }
    }
}

/// Indices whose deviation exceeds the flat threshold.
pub fn detect_by_threshold(deviations: &[f64], threshold: f64) -> Vec<usize> {
    deviations
        .iter()
        .enumerate()
        .filter(|(_, &d)| d > threshold)
        .map(|(i, _)| i)
        .collect()
}

/// IQR fence detection. Needs at least 4 points to form quartiles.
pub fn detect_by_iqr(deviations: &[f64], multiplier: f64) -> Vec<usize> {
    if deviations.len() < 4 {
        return Vec::new();
    }

    let mut sorted = deviations.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = sorted[(sorted.len() as f64 * 0.25).floor() as usize];
    let q3 = sorted[(sorted.len() as f64 * 0.75).floor() as usize];
    let iqr = q3 - q1;
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;

    deviations
        .iter()
        .enumerate()
        .filter(|(_, &d)| d < lower || d > upper)
        .map(|(i, _)| i)
        .collect()
}

/// Z-score detection against the population standard deviation. A flat
/// series has nothing to score.
pub fn detect_by_zscore(deviations: &[f64], zscore_threshold: f64) -> Vec<usize> {
    if deviations.len() < 4 {
        return Vec::new();
    }

    let n = deviations.len() as f64;
    let mean = deviations.iter().sum::<f64>() / n;
    let variance = deviations.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return Vec::new();
    }

    deviations
        .iter()
        .enumerate()
        .filter(|(_, &d)| (d - mean).abs() / std_dev > zscore_threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Dispatch per configured method. Below `min_data_points` the robust
/// methods have no sample to characterize, so only the flat threshold
/// applies (and only for methods that include it).
pub fn detect_outliers(deviations: &[f64], config: &OutlierConfig) -> Vec<usize> {
    if deviations.len() < config.min_data_points {
        return match config.method {
            OutlierMethod::Threshold | OutlierMethod::Both => {
                detect_by_threshold(deviations, config.threshold)
            }
            OutlierMethod::Iqr | OutlierMethod::Zscore => Vec::new(),
        };
    }

    let mut indices = match config.method {
        OutlierMethod::Threshold => detect_by_threshold(deviations, config.threshold),
        OutlierMethod::Iqr => detect_by_iqr(deviations, config.iqr_multiplier),
        OutlierMethod::Zscore => detect_by_zscore(deviations, config.zscore_threshold),
        OutlierMethod::Both => {
            let mut merged = detect_by_threshold(deviations, config.threshold);
            merged.extend(detect_by_iqr(deviations, config.iqr_multiplier));
            merged
        }
    };

    indices.sort_unstable();
    indices.dedup();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_detection() {
        let deviations = [0.01, 0.08, 0.02, 0.12];
        assert_eq!(detect_by_threshold(&deviations, 0.05), vec![1, 3]);
    }

    #[test]
    fn test_iqr_requires_four_points() {
        assert!(detect_by_iqr(&[0.1, 5.0, 0.2], 1.5).is_empty());
        assert!(detect_by_iqr(&[], 1.5).is_empty());
    }

    #[test]
    fn test_zscore_requires_four_points() {
        assert!(detect_by_zscore(&[0.1, 5.0, 0.2], 3.0).is_empty());
    }

    #[test]
    fn test_zscore_constant_series_is_clean() {
        let deviations = [0.02; 10];
        assert!(detect_by_zscore(&deviations, 0.1).is_empty());
        assert!(detect_by_zscore(&deviations, 3.0).is_empty());
    }

    #[test]
    fn test_iqr_flags_extreme_value() {
        let mut deviations = vec![0.01, 0.012, 0.011, 0.013, 0.009, 0.01, 0.012];
        deviations.push(0.5);
        let flagged = detect_by_iqr(&deviations, 1.5);
        assert!(flagged.contains(&7));
    }

    #[test]
    fn test_both_unions_threshold_and_iqr() {
        // index 1 exceeds the flat threshold, index 7 trips the IQR fence
        let deviations = [0.01, 0.06, 0.011, 0.013, 0.009, 0.01, 0.012, 0.5];
        let config = OutlierConfig::default();
        let flagged = detect_outliers(&deviations, &config);
        assert!(flagged.contains(&1));
        assert!(flagged.contains(&7));
        // ascending, no duplicates
        let mut sorted = flagged.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(flagged, sorted);
    }

    #[test]
    fn test_short_series_falls_back_to_threshold() {
        let deviations = [0.01, 0.08];
        let both = OutlierConfig::default();
        assert_eq!(detect_outliers(&deviations, &both), vec![1]);

        let zscore_only = OutlierConfig {
            method: OutlierMethod::Zscore,
            ..OutlierConfig::default()
        };
        assert!(detect_outliers(&deviations, &zscore_only).is_empty());

        let iqr_only = OutlierConfig {
            method: OutlierMethod::Iqr,
            ..OutlierConfig::default()
        };
        assert!(detect_outliers(&deviations, &iqr_only).is_empty());
    }
}
