// Copyright (c) 2025 Oracle Sentinel
// Robust trend estimation: rolling-median smoothing, Theil-Sen slopes,
// log-scale growth rates, MAD volatility

use serde::Serialize;

/// Default relative-change cutoff separating a trend from noise.
pub const DEFAULT_TREND_THRESHOLD: f64 = 0.05;

/// Default smoothing window for `robust_*` entry points.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 3;

/// Scale factor making MAD comparable to a standard deviation under
/// normality.
const MAD_CONSISTENCY: f64 = 1.4826;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Robust trend estimate over a noisy series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    pub strength: f64, // [0, 1]
    pub slope: f64,
    pub volatility: f64,
    pub intercept: f64,
}

/// Rolling-median smoothing. The window is forced odd; windows at the
/// edges are truncated to the array bounds, never wrapped.
pub fn rolling_median_smooth(values: &[f64], window_size: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let window = if window_size % 2 == 0 {
        window_size + 1
    } else {
        window_size
    };
    let half = window / 2;

    let mut smoothed = Vec::with_capacity(values.len());
    for i in 0..values.len() {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(values.len());
        smoothed.push(median(&values[start..end]));
    }
    smoothed
}

/// Theil-Sen estimator: the median of all pairwise slopes, with the
/// intercept as the median residual. Robust to a minority of extreme
/// outliers, unlike ordinary least squares. O(n²) in the series length.
pub fn theil_sen_regression(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    if n < 2 {
        return (0.0, 0.0);
    }

    let mut slopes = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            if x[j] != x[i] {
                slopes.push((y[j] - y[i]) / (x[j] - x[i]));
            }
        }
    }
    if slopes.is_empty() {
        return (0.0, 0.0);
    }

    let slope = median(&slopes);
    let residuals: Vec<f64> = (0..n).map(|i| y[i] - slope * x[i]).collect();
    (slope, median(&residuals))
}

/// Ordinary least squares. A zero or non-finite denominator degrades to a
/// flat line at the mean of `y`.
fn linear_regression(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    if n == 0 {
        return (0.0, 0.0);
    }

    let nf = n as f64;
    let sum_x: f64 = x[..n].iter().sum();
    let sum_y: f64 = y[..n].iter().sum();
    let sum_xy: f64 = x[..n].iter().zip(&y[..n]).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x[..n].iter().map(|a| a * a).sum();

    let denominator = nf * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 || !denominator.is_finite() {
        return (0.0, sum_y / nf);
    }

    let slope = (nf * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / nf;
    (slope, intercept)
}

/// OLS in log space. Non-positive values are floored at ln(1e-10) so the
/// fit survives zeros; the slope is clamped before exponentiation so the
/// growth rate cannot overflow.
pub fn log_scale_regression(x: &[f64], y: &[f64]) -> f64 {
    let log_y: Vec<f64> = y
        .iter()
        .map(|&v| if v > 0.0 { v.ln() } else { (1e-10f64).ln() })
        .collect();
    let (slope, _) = linear_regression(x, &log_y);
    slope.clamp(-700.0, 700.0).exp() - 1.0
}

/// Direction of the smoothed series, judged by Theil-Sen slope relative to
/// the series level.
pub fn robust_trend_direction(values: &[f64], threshold: f64) -> TrendDirection {
    if values.len() < 2 {
        return TrendDirection::Stable;
    }

    let smoothed = rolling_median_smooth(values, DEFAULT_SMOOTHING_WINDOW);
    let x: Vec<f64> = (0..smoothed.len()).map(|i| i as f64).collect();
    let (slope, _) = theil_sen_regression(&x, &smoothed);

    let level = median(&smoothed);
    if level == 0.0 {
        return TrendDirection::Stable;
    }

    let relative_change = slope / level;
    if relative_change > threshold {
        TrendDirection::Increasing
    } else if relative_change < -threshold {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

/// Trend strength in [0, 1], derived from the log-scale growth rate of the
/// smoothed series. Saturates at a 10% per-step growth rate.
pub fn robust_trend_strength(values: &[f64]) -> f64 {
    let smoothed = rolling_median_smooth(values, DEFAULT_SMOOTHING_WINDOW);
    let positive: Vec<(f64, f64)> = smoothed
        .iter()
        .enumerate()
        .filter(|(_, &v)| v > 0.0)
        .map(|(i, &v)| (i as f64, v))
        .collect();
    if positive.len() < 2 {
        return 0.0;
    }

    let x: Vec<f64> = positive.iter().map(|(i, _)| *i).collect();
    let y: Vec<f64> = positive.iter().map(|(_, v)| *v).collect();
    let growth_rate = log_scale_regression(&x, &y);
    (growth_rate.abs() / 0.1).min(1.0)
}

/// MAD volatility of the raw series. Smoothing is deliberately not applied
/// here; volatility should reflect the noise the smoother removes.
pub fn robust_volatility(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = median(values);
    let abs_deviations: Vec<f64> = values.iter().map(|v| (v - m).abs()).collect();
    median(&abs_deviations) * MAD_CONSISTENCY
}

/// Composite robust trend analysis.
pub fn robust_trend_analysis(values: &[f64], threshold: f64) -> TrendAnalysis {
    if values.len() < 2 {
        return TrendAnalysis {
            direction: TrendDirection::Stable,
            strength: 0.0,
            slope: 0.0,
            volatility: 0.0,
            intercept: values.first().copied().unwrap_or(0.0),
        };
    }

    let smoothed = rolling_median_smooth(values, DEFAULT_SMOOTHING_WINDOW);
    let x: Vec<f64> = (0..smoothed.len()).map(|i| i as f64).collect();
    let (slope, intercept) = theil_sen_regression(&x, &smoothed);

    TrendAnalysis {
        direction: robust_trend_direction(values, threshold),
        strength: robust_trend_strength(values),
        volatility: robust_volatility(values),
        slope,
        intercept,
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_median_truncates_edges() {
        let values = [1.0, 100.0, 3.0, 4.0, 5.0];
        let smoothed = rolling_median_smooth(&values, 3);
        assert_eq!(smoothed.len(), 5);
        // first window is [1, 100] -> 50.5; the spike survives only there
        assert_eq!(smoothed[0], 50.5);
        assert_eq!(smoothed[1], 3.0);
        assert_eq!(smoothed[2], 4.0);
        assert_eq!(smoothed[4], 4.5);
    }

    #[test]
    fn test_rolling_median_forces_odd_window() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(
            rolling_median_smooth(&values, 2),
            rolling_median_smooth(&values, 3)
        );
    }

    #[test]
    fn test_theil_sen_degenerate_inputs() {
        assert_eq!(theil_sen_regression(&[], &[]), (0.0, 0.0));
        assert_eq!(theil_sen_regression(&[1.0], &[2.0]), (0.0, 0.0));
        // all x identical: no valid pair
        assert_eq!(
            theil_sen_regression(&[2.0, 2.0, 2.0], &[1.0, 5.0, 9.0]),
            (0.0, 0.0)
        );
    }

    #[test]
    fn test_theil_sen_exact_on_clean_line() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let (slope, intercept) = theil_sen_regression(&x, &y);
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_theil_sen_more_robust_than_ols() {
        let x: Vec<f64> = (0..21).map(|i| i as f64).collect();
        let mut y: Vec<f64> = x.iter().map(|v| 2.0 * v).collect();
        y[18] = 1_000.0; // single extreme outlier

        let (ts_slope, _) = theil_sen_regression(&x, &y);
        let (ols_slope, _) = linear_regression(&x, &y);

        assert!((ts_slope - 2.0).abs() < (ols_slope - 2.0).abs());
        // and the Theil-Sen fit stays close to the true slope
        assert!((ts_slope - 2.0).abs() < 0.5);
    }

    #[test]
    fn test_linear_regression_flat_fallback() {
        // identical x values: zero denominator
        let (slope, intercept) = linear_regression(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]);
        assert_eq!(slope, 0.0);
        assert_eq!(intercept, 2.0);
    }

    #[test]
    fn test_log_scale_regression_growth_rate() {
        // y = e^(0.1 x): growth rate per step should be e^0.1 - 1
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| (0.1 * v).exp()).collect();
        let growth = log_scale_regression(&x, &y);
        assert!((growth - (0.1f64.exp() - 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_log_scale_regression_survives_zeros() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 2.0, 3.0];
        let growth = log_scale_regression(&x, &y);
        assert!(growth.is_finite());
    }

    #[test]
    fn test_trend_direction_classification() {
        let rising: Vec<f64> = (1..20).map(|i| i as f64 * 10.0).collect();
        assert_eq!(
            robust_trend_direction(&rising, DEFAULT_TREND_THRESHOLD),
            TrendDirection::Increasing
        );

        let falling: Vec<f64> = (1..20).rev().map(|i| i as f64 * 10.0).collect();
        assert_eq!(
            robust_trend_direction(&falling, DEFAULT_TREND_THRESHOLD),
            TrendDirection::Decreasing
        );

        let flat = [100.0, 100.2, 99.9, 100.1, 100.0, 99.8];
        assert_eq!(
            robust_trend_direction(&flat, DEFAULT_TREND_THRESHOLD),
            TrendDirection::Stable
        );

        assert_eq!(
            robust_trend_direction(&[5.0], DEFAULT_TREND_THRESHOLD),
            TrendDirection::Stable
        );
    }

    #[test]
    fn test_volatility_of_constant_series_is_zero() {
        assert_eq!(robust_volatility(&[7.0; 12]), 0.0);
        assert_eq!(robust_volatility(&[]), 0.0);
    }

    #[test]
    fn test_volatility_uses_mad_scale() {
        // median 3, absolute deviations [2, 1, 0, 1, 2] -> MAD 1
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((robust_volatility(&values) - 1.4826).abs() < 1e-12);
    }

    #[test]
    fn test_trend_analysis_short_series() {
        let analysis = robust_trend_analysis(&[42.0], DEFAULT_TREND_THRESHOLD);
        assert_eq!(analysis.direction, TrendDirection::Stable);
        assert_eq!(analysis.strength, 0.0);
        assert_eq!(analysis.slope, 0.0);
        assert_eq!(analysis.volatility, 0.0);
        assert_eq!(analysis.intercept, 42.0);

        let empty = robust_trend_analysis(&[], DEFAULT_TREND_THRESHOLD);
        assert_eq!(empty.intercept, 0.0);
    }

    #[test]
    fn test_trend_analysis_composes() {
        let rising: Vec<f64> = (1..30).map(|i| 100.0 * 1.08f64.powi(i)).collect();
        let analysis = robust_trend_analysis(&rising, DEFAULT_TREND_THRESHOLD);
        assert_eq!(analysis.direction, TrendDirection::Increasing);
        assert!(analysis.strength > 0.5);
        assert!(analysis.slope > 0.0);
    }
}
