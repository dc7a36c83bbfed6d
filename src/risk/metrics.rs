use chrono::{TimeZone, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::models::{Detection, DetectionStatus, Severity};

/// One UTC day of detection activity.
#[derive(Debug, Clone, Serialize)]
pub struct DailyTrendPoint {
    pub date: String, // YYYY-MM-DD
    pub count: usize,
    pub max_severity: Severity,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedDetectionCount {
    pub feed: String,
    pub count: usize,
}

/// Aggregate view over a slice of the detection ledger.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionMetrics {
    pub total_detections: usize,
    pub by_severity: HashMap<String, usize>,
    pub by_type: HashMap<String, usize>,
    pub average_confidence: f64,
    pub confirmed_count: usize,
    pub false_positive_count: usize,
    pub daily_trend: Vec<DailyTrendPoint>,
    pub top_feeds: Vec<FeedDetectionCount>,
}

impl DetectionMetrics {
    pub fn aggregate<'a, I>(detections: I) -> Self
    where
        I: IntoIterator<Item = &'a Detection>,
    {
        let mut total = 0usize;
        let mut by_severity: HashMap<String, usize> = HashMap::new();
        let mut by_type: HashMap<String, usize> = HashMap::new();
        let mut confidence_sum = 0.0;
        let mut confirmed = 0usize;
        let mut false_positive = 0usize;
        let mut daily: BTreeMap<String, (usize, Severity)> = BTreeMap::new();
        let mut feed_counts: HashMap<String, usize> = HashMap::new();

        for detection in detections {
            total += 1;
            *by_severity
                .entry(detection.severity.as_str().to_string())
                .or_insert(0) += 1;
            *by_type
                .entry(detection.detection_type.as_str().to_string())
                .or_insert(0) += 1;
            confidence_sum += detection.confidence;

            match detection.status {
                DetectionStatus::Confirmed => confirmed += 1,
                DetectionStatus::FalsePositive => false_positive += 1,
                _ => {}
            }

            if let Some(day) = Utc.timestamp_millis_opt(detection.timestamp).single() {
                let date = day.format("%Y-%m-%d").to_string();
                let entry = daily.entry(date).or_insert((0, detection.severity));
                entry.0 += 1;
                if detection.severity.rank() > entry.1.rank() {
                    entry.1 = detection.severity;
                }
            }

            for feed in &detection.affected_feeds {
                *feed_counts.entry(feed.clone()).or_insert(0) += 1;
            }
        }

        let average_confidence = if total > 0 {
            confidence_sum / total as f64
        } else {
            0.0
        };

        let daily_trend = daily
            .into_iter()
            .map(|(date, (count, max_severity))| DailyTrendPoint {
                date,
                count,
                max_severity,
            })
            .collect();

        let mut top_feeds: Vec<FeedDetectionCount> = feed_counts
            .into_iter()
            .map(|(feed, count)| FeedDetectionCount { feed, count })
            .collect();
        top_feeds.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.feed.cmp(&b.feed)));
        top_feeds.truncate(10);

        Self {
            total_detections: total,
            by_severity,
            by_type,
            average_confidence,
            confirmed_count: confirmed,
            false_positive_count: false_positive,
            daily_trend,
            top_feeds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::models::{DetectionDetails, DetectionType};
    use chrono::Utc;

    fn detection(
        detection_type: DetectionType,
        severity: Severity,
        status: DetectionStatus,
        confidence: f64,
        timestamp: i64,
        feed: &str,
    ) -> Detection {
        let now = Utc::now();
        Detection {
            id: format!("det-{timestamp}"),
            detection_type,
            severity,
            status,
            confidence,
            timestamp,
            affected_feeds: vec![feed.to_string()],
            details: DetectionDetails {
                description: String::new(),
                evidence: Vec::new(),
                price_deviation: 0.0,
                normal_price: 0.0,
                manipulated_price: 0.0,
                duration_ms: 0,
            },
            suspicious_transactions: Vec::new(),
            impact: String::new(),
            recommended_actions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    const DAY_MS: i64 = 86_400_000;

    #[test]
    fn test_empty_aggregation() {
        let metrics = DetectionMetrics::aggregate([]);
        assert_eq!(metrics.total_detections, 0);
        assert_eq!(metrics.average_confidence, 0.0);
        assert!(metrics.daily_trend.is_empty());
        assert!(metrics.top_feeds.is_empty());
    }

    #[test]
    fn test_counts_and_average() {
        let detections = vec![
            detection(
                DetectionType::StatisticalAnomaly,
                Severity::High,
                DetectionStatus::Confirmed,
                80.0,
                DAY_MS,
                "uni-ETH/USDC-ethereum",
            ),
            detection(
                DetectionType::SandwichAttack,
                Severity::Medium,
                DetectionStatus::FalsePositive,
                60.0,
                DAY_MS + 1_000,
                "uni-ETH/USDC-ethereum",
            ),
            detection(
                DetectionType::StatisticalAnomaly,
                Severity::Critical,
                DetectionStatus::Active,
                100.0,
                2 * DAY_MS,
                "sushi-BTC/USDT-ethereum",
            ),
        ];

        let metrics = DetectionMetrics::aggregate(detections.iter());

        assert_eq!(metrics.total_detections, 3);
        assert_eq!(metrics.by_severity["high"], 1);
        assert_eq!(metrics.by_type["statistical_anomaly"], 2);
        assert_eq!(metrics.average_confidence, 80.0);
        assert_eq!(metrics.confirmed_count, 1);
        assert_eq!(metrics.false_positive_count, 1);
    }

    #[test]
    fn test_daily_trend_tracks_max_severity() {
        let detections = vec![
            detection(
                DetectionType::StatisticalAnomaly,
                Severity::Low,
                DetectionStatus::Active,
                20.0,
                DAY_MS,
                "a",
            ),
            detection(
                DetectionType::FlashLoanAttack,
                Severity::Critical,
                DetectionStatus::Active,
                95.0,
                DAY_MS + 60_000,
                "a",
            ),
            detection(
                DetectionType::LiquidityDrop,
                Severity::Medium,
                DetectionStatus::Active,
                55.0,
                2 * DAY_MS,
                "b",
            ),
        ];

        let metrics = DetectionMetrics::aggregate(detections.iter());

        assert_eq!(metrics.daily_trend.len(), 2);
        assert_eq!(metrics.daily_trend[0].date, "1970-01-02");
        assert_eq!(metrics.daily_trend[0].count, 2);
        assert_eq!(metrics.daily_trend[0].max_severity, Severity::Critical);
        assert_eq!(metrics.daily_trend[1].max_severity, Severity::Medium);
    }

    #[test]
    fn test_top_feeds_ranked_and_capped() {
        let mut detections = Vec::new();
        for i in 0..12 {
            let feed = format!("feed-{i}");
            for _ in 0..=i {
                detections.push(detection(
                    DetectionType::StatisticalAnomaly,
                    Severity::Low,
                    DetectionStatus::Active,
                    10.0,
                    DAY_MS,
                    &feed,
                ));
            }
        }

        let metrics = DetectionMetrics::aggregate(detections.iter());

        assert_eq!(metrics.top_feeds.len(), 10);
        assert_eq!(metrics.top_feeds[0].feed, "feed-11");
        assert_eq!(metrics.top_feeds[0].count, 12);
        // feed-0 and feed-1 fall off the bottom
        assert!(metrics.top_feeds.iter().all(|f| f.feed != "feed-0"));
    }
}
