// Copyright (c) 2025 Oracle Sentinel
// Consensus pricing across independent feed sources

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusMethod {
    Median,
    Mean,
    Weighted,
}

/// Single reference price combined from multiple source prices. Degenerate
/// weights (missing, length mismatch, non-positive sum) fall back to the
/// arithmetic mean.
pub fn consensus_price(prices: &[f64], method: ConsensusMethod, weights: Option<&[f64]>) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    if prices.len() == 1 {
        return prices[0];
    }

    match method {
        ConsensusMethod::Median => median(prices),
        ConsensusMethod::Mean => mean(prices),
        ConsensusMethod::Weighted => match weights {
            Some(w) if w.len() == prices.len() && w.iter().sum::<f64>() > 0.0 => {
                let total: f64 = w.iter().sum();
                prices.iter().zip(w).map(|(p, wt)| p * wt).sum::<f64>() / total
            }
            _ => mean(prices),
        },
    }
}

/// The source deviating most from consensus, with its relative deviation.
#[derive(Debug, Clone, Serialize)]
pub struct SourceDeviation {
    pub source: String,
    pub deviation: f64,
    pub deviation_percent: f64,
}

pub fn max_deviation(source_prices: &[(String, f64)], consensus: f64) -> Option<SourceDeviation> {
    if source_prices.is_empty() || consensus == 0.0 {
        return None;
    }

    source_prices
        .iter()
        .map(|(source, price)| {
            let deviation = (price - consensus).abs();
            SourceDeviation {
                source: source.clone(),
                deviation,
                deviation_percent: deviation / consensus.abs() * 100.0,
            }
        })
        .max_by(|a, b| {
            a.deviation_percent
                .partial_cmp(&b.deviation_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
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
    fn test_median_even_length() {
        assert_eq!(
            consensus_price(&[1.0, 2.0, 3.0, 4.0], ConsensusMethod::Median, None),
            2.5
        );
    }

    #[test]
    fn test_median_odd_length() {
        assert_eq!(
            consensus_price(&[3.0, 1.0, 2.0], ConsensusMethod::Median, None),
            2.0
        );
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(consensus_price(&[], ConsensusMethod::Median, None), 0.0);
        assert_eq!(consensus_price(&[42.0], ConsensusMethod::Weighted, None), 42.0);
    }

    #[test]
    fn test_weighted_average() {
        assert_eq!(
            consensus_price(
                &[10.0, 20.0],
                ConsensusMethod::Weighted,
                Some(&[1.0, 3.0])
            ),
            17.5
        );
    }

    #[test]
    fn test_weighted_falls_back_to_mean() {
        // missing weights
        assert_eq!(
            consensus_price(&[10.0, 20.0], ConsensusMethod::Weighted, None),
            15.0
        );
        // length mismatch
        assert_eq!(
            consensus_price(&[10.0, 20.0], ConsensusMethod::Weighted, Some(&[1.0])),
            15.0
        );
        // zero weight sum
        assert_eq!(
            consensus_price(
                &[10.0, 20.0],
                ConsensusMethod::Weighted,
                Some(&[0.0, 0.0])
            ),
            15.0
        );
    }

    #[test]
    fn test_max_deviation_picks_worst_source() {
        let sources = vec![
            ("chainlink".to_string(), 100.5),
            ("uniswap-twap".to_string(), 112.0),
            ("band".to_string(), 99.0),
        ];
        let worst = max_deviation(&sources, 100.0).unwrap();
        assert_eq!(worst.source, "uniswap-twap");
        assert!((worst.deviation_percent - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_deviation_guards() {
        assert!(max_deviation(&[], 100.0).is_none());
        assert!(max_deviation(&[("a".to_string(), 1.0)], 0.0).is_none());
    }
}
