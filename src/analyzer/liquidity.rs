// Copyright (c) 2025 Oracle Sentinel
// Liquidity Drain Detection from Feed History

use crate::models::FeedObservation;
use crate::risk::{DetectionEvidence, DetectionType, PatternMatch};

/// Number of trailing readings that form the baseline.
const BASELINE_WINDOW: usize = 5;

/// Detects a sharp fall in reported liquidity against the feed's own
/// trailing baseline.
pub struct LiquidityDropAnalyzer {
    /// Percent drop from the baseline required to fire
    liquidity_drop_pct: f64,
}

impl LiquidityDropAnalyzer {
    pub fn new(liquidity_drop_pct: f64) -> Self {
        Self { liquidity_drop_pct }
    }

    pub fn analyze(&self, obs: &FeedObservation) -> Option<PatternMatch> {
        // Points without a liquidity reading carry no signal here
        let readings: Vec<(i64, f64)> = obs
            .history
            .iter()
            .filter_map(|p| p.liquidity.map(|l| (p.timestamp, l)))
            .collect();

        // Need the latest reading plus a full baseline window behind it
        if readings.len() < BASELINE_WINDOW + 1 {
            return None;
        }

        let (latest_ts, latest) = *readings.last()?;
        let baseline_slice = &readings[readings.len() - BASELINE_WINDOW - 1..readings.len() - 1];
        let baseline =
            baseline_slice.iter().map(|(_, l)| l).sum::<f64>() / baseline_slice.len() as f64;

        if baseline <= 0.0 || latest >= baseline {
            return None;
        }

        let drop_pct = (baseline - latest) / baseline * 100.0;
        if drop_pct <= self.liquidity_drop_pct {
            return None;
        }

        let confidence = drop_pct.min(100.0);
        let evidence = DetectionEvidence::new(
            "liquidity_drop",
            format!(
                "Liquidity fell {:.1}% against the trailing {}-point average",
                drop_pct, BASELINE_WINDOW
            ),
            latest_ts,
        )
        .with_data("baseline_liquidity", baseline)
        .with_data("current_liquidity", latest)
        .with_data("drop_pct", drop_pct);

        Some(PatternMatch {
            detection_type: DetectionType::LiquidityDrop,
            confidence,
            evidence: vec![evidence],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedId, PricePoint};

    fn observation(liquidity: &[f64]) -> FeedObservation {
        let history = liquidity
            .iter()
            .enumerate()
            .map(|(i, &l)| {
                PricePoint::new(i as i64 * 1_000, 100.0, "dex").with_liquidity(l)
            })
            .collect();
        FeedObservation {
            feed: FeedId::new("curve", "DAI/USDC", "ethereum"),
            current_price: 100.0,
            history,
            transactions: Vec::new(),
            observed_at_ms: 60_000,
        }
    }

    #[test]
    fn test_sharp_drop_fires() {
        // baseline 1_000_000, latest 400_000 -> 60% drop
        let result = LiquidityDropAnalyzer::new(20.0)
            .analyze(&observation(&[
                1_000_000.0,
                1_000_000.0,
                1_000_000.0,
                1_000_000.0,
                1_000_000.0,
                400_000.0,
            ]))
            .unwrap();

        assert_eq!(result.detection_type, DetectionType::LiquidityDrop);
        assert!((result.confidence - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_mild_drop_stays_quiet() {
        // 10% drop against a 20% threshold
        assert!(LiquidityDropAnalyzer::new(20.0)
            .analyze(&observation(&[
                1_000_000.0,
                1_000_000.0,
                1_000_000.0,
                1_000_000.0,
                1_000_000.0,
                900_000.0,
            ]))
            .is_none());
    }

    #[test]
    fn test_rising_liquidity_stays_quiet() {
        assert!(LiquidityDropAnalyzer::new(20.0)
            .analyze(&observation(&[
                1_000_000.0,
                1_000_000.0,
                1_000_000.0,
                1_000_000.0,
                1_000_000.0,
                1_500_000.0,
            ]))
            .is_none());
    }

    #[test]
    fn test_needs_full_baseline_window() {
        assert!(LiquidityDropAnalyzer::new(20.0)
            .analyze(&observation(&[1_000_000.0, 1_000_000.0, 400_000.0]))
            .is_none());
    }

    #[test]
    fn test_points_without_liquidity_are_skipped() {
        let mut obs = observation(&[
            1_000_000.0,
            1_000_000.0,
            1_000_000.0,
            1_000_000.0,
            1_000_000.0,
            400_000.0,
        ]);
        // interleave points that never reported liquidity
        obs.history.insert(2, PricePoint::new(2_500, 100.0, "dex"));
        obs.history.push(PricePoint::new(7_000, 100.0, "dex"));

        assert!(LiquidityDropAnalyzer::new(20.0).analyze(&obs).is_some());
    }
}
