// Copyright (c) 2025 Oracle Sentinel
// Manipulation detection engine: bounded feed history, pattern merge,
// severity/cooldown alert gating, detection ledger

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analyzer::{
    FlashLoanAnalyzer, LiquidityDropAnalyzer, SandwichAnalyzer, StatisticalAnomalyAnalyzer,
};
use crate::config::{DetectorConfig, DetectorConfigOverride};
use crate::error::ConfigError;
use crate::models::{FeedId, FeedObservation, PricePoint, TransactionRecord};
use crate::pipeline::{
    DetectionPipeline, FlashLoanDetector, LiquidityDropDetector, SandwichDetector,
    StatisticalAnomalyDetector,
};
use crate::risk::{
    severity_for_confidence, Detection, DetectionDetails, DetectionEvidence, DetectionMetrics,
    DetectionQuery, DetectionStatus, DetectionType, PatternMatch, Severity, SuspiciousTransaction,
};
use crate::stats::consensus::{consensus_price, max_deviation};

/// One feed's input bundle for `analyze_multiple_feeds`.
#[derive(Debug, Clone)]
pub struct FeedInput {
    pub feed: FeedId,
    pub current_price: f64,
    pub historical: Vec<PricePoint>,
    pub transactions: Vec<TransactionRecord>,
}

/// The orchestrator. Owns all mutable state for the feeds it watches and
/// guarantees at most one emitted detection per feed per cooldown window.
///
/// Construct one per hosting service and inject it; there is deliberately
/// no shared global instance.
pub struct ManipulationDetector {
    config: DetectorConfig,
    pipeline: DetectionPipeline,
    price_history: Mutex<HashMap<String, VecDeque<PricePoint>>>,
    ledger: Mutex<Vec<Detection>>,
    last_alert: Mutex<HashMap<String, i64>>,
    // Serializes concurrent analyze calls for the same feed key so the
    // cooldown check-then-stamp stays atomic; distinct feeds proceed
    // independently.
    feed_guards: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ManipulationDetector {
    /// Fails fast on invalid configuration: a bad threshold is a
    /// deployment mistake, unlike bad feed data which never errors.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let pipeline = DetectionPipeline::new()
            .add_detector(StatisticalAnomalyDetector::new(
                StatisticalAnomalyAnalyzer::new(
                    config.statistical_thresholds.price_deviation_pct,
                    config.statistical_thresholds.min_history_points,
                    config.deviation_thresholds,
                ),
            ))
            .add_detector(FlashLoanDetector::new(FlashLoanAnalyzer::new(
                config.pattern_recognition.min_flash_loan_value,
            )))
            .add_detector(SandwichDetector::new(SandwichAnalyzer::new(
                config.pattern_recognition.sandwich_window_ms,
                config.pattern_recognition.max_normal_tx_value,
            )))
            .add_detector(LiquidityDropDetector::new(LiquidityDropAnalyzer::new(
                config.statistical_thresholds.liquidity_drop_pct,
            )));

        Ok(Self {
            config,
            pipeline,
            price_history: Mutex::new(HashMap::new()),
            ledger: Mutex::new(Vec::new()),
            last_alert: Mutex::new(HashMap::new()),
            feed_guards: Mutex::new(HashMap::new()),
        })
    }

    /// Engine with the default configuration, mainly for tests.
    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default()).expect("default configuration is valid")
    }

    /// Engine from a partial configuration merged over the defaults.
    pub fn from_overrides(overrides: DetectorConfigOverride) -> Result<Self, ConfigError> {
        Self::new(DetectorConfig::merged(overrides))
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyzes one observation cycle for a feed and returns the merged,
    /// gated detection, if any.
    pub async fn analyze_price_feed(
        &self,
        feed: &FeedId,
        current_price: f64,
        historical: &[PricePoint],
        transactions: &[TransactionRecord],
    ) -> Option<Detection> {
        let key = feed.key();
        let guard = self.feed_guard(&key);
        let _feed_lock = guard.lock().await;

        let now_ms = Utc::now().timestamp_millis();

        // Step 1: fold the new observations into bounded history
        let history = self.update_history(&key, historical);

        // Step 2: run every pattern detector against the snapshot
        let obs = FeedObservation {
            feed: feed.clone(),
            current_price,
            history,
            transactions: transactions.to_vec(),
            observed_at_ms: now_ms,
        };
        let matches = self.pipeline.run(&obs).await;
        if matches.is_empty() {
            debug!(feed = %key, "no manipulation pattern matched");
            return None;
        }

        // Step 3: merge all matches into a single detection
        let mut detection = self.merge_matches(&obs, matches, now_ms);
        if let Some(consensus) = self.consensus_evidence(&obs) {
            detection.details.evidence.push(consensus);
        }

        // Step 4: cooldown gate. Even a critical hit stays silent inside
        // the window.
        {
            let last_alert = self.last_alert.lock().unwrap();
            if let Some(&last) = last_alert.get(&key) {
                if now_ms - last < self.config.alerting.cooldown_ms {
                    debug!(feed = %key, "detection suppressed by cooldown");
                    return None;
                }
            }
        }

        // Step 5: severity floor. Suppression here does not stamp the
        // cooldown clock, so a low-grade hit cannot shadow a later
        // critical one.
        if detection.severity.rank() < self.config.alerting.min_severity.rank() {
            debug!(
                feed = %key,
                severity = detection.severity.as_str(),
                "detection below alerting floor"
            );
            return None;
        }

        // Step 6: emit. Ledger append, cooldown stamp, hand to caller.
        self.last_alert.lock().unwrap().insert(key.clone(), now_ms);
        self.ledger.lock().unwrap().push(detection.clone());
        info!(
            feed = %key,
            detection_type = detection.detection_type.as_str(),
            severity = detection.severity.as_str(),
            confidence = detection.confidence,
            "manipulation detection emitted"
        );

        Some(detection)
    }

    /// Analyzes feeds strictly in input order. Sequential on purpose: it
    /// bounds downstream load and keeps the cooldown profile predictable.
    pub async fn analyze_multiple_feeds(&self, feeds: &[FeedInput]) -> Vec<Detection> {
        let mut detections = Vec::new();
        for input in feeds {
            if let Some(detection) = self
                .analyze_price_feed(
                    &input.feed,
                    input.current_price,
                    &input.historical,
                    &input.transactions,
                )
                .await
            {
                detections.push(detection);
            }
        }
        detections
    }

    /// Ledger slice matching the query, newest first.
    pub fn detection_history(&self, query: &DetectionQuery) -> Vec<Detection> {
        let ledger = self.ledger.lock().unwrap();
        let mut results: Vec<Detection> = ledger
            .iter()
            .filter(|d| query.start_time.map_or(true, |start| d.timestamp >= start))
            .filter(|d| query.end_time.map_or(true, |end| d.timestamp <= end))
            .filter(|d| query.severity.map_or(true, |severity| d.severity == severity))
            .cloned()
            .collect();

        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        results
    }

    /// Aggregated metrics over ledger entries inside the time range.
    pub fn metrics(&self, start_ms: i64, end_ms: i64) -> DetectionMetrics {
        let ledger = self.ledger.lock().unwrap();
        DetectionMetrics::aggregate(
            ledger
                .iter()
                .filter(|d| d.timestamp >= start_ms && d.timestamp <= end_ms),
        )
    }

    pub fn history_len(&self, feed: &FeedId) -> usize {
        self.price_history
            .lock()
            .unwrap()
            .get(&feed.key())
            .map_or(0, |h| h.len())
    }

    /// Copy of a feed's bounded history, oldest first.
    pub fn history_snapshot(&self, feed: &FeedId) -> Vec<PricePoint> {
        self.price_history
            .lock()
            .unwrap()
            .get(&feed.key())
            .map_or_else(Vec::new, |h| h.iter().cloned().collect())
    }

    /// Clears all engine state: history, ledger and cooldown bookkeeping.
    /// The explicit replacement for the original deployment's shared-
    /// instance reset; used for test isolation.
    pub fn reset(&self) {
        self.price_history.lock().unwrap().clear();
        self.ledger.lock().unwrap().clear();
        self.last_alert.lock().unwrap().clear();
    }

    fn feed_guard(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut guards = self.feed_guards.lock().unwrap();
        guards
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    fn update_history(&self, key: &str, historical: &[PricePoint]) -> Vec<PricePoint> {
        let mut history_map = self.price_history.lock().unwrap();
        let entry = history_map.entry(key.to_string()).or_default();
        for point in historical {
            if entry.len() >= self.config.max_history_points {
                entry.pop_front();
            }
            entry.push_back(point.clone());
        }
        entry.iter().cloned().collect()
    }

    fn merge_matches(
        &self,
        obs: &FeedObservation,
        matches: Vec<PatternMatch>,
        now_ms: i64,
    ) -> Detection {
        // Primary verdict: highest confidence, earlier detector wins ties
        let mut primary = 0;
        for (i, pattern) in matches.iter().enumerate() {
            if pattern.confidence > matches[primary].confidence {
                primary = i;
            }
        }
        let detection_type = matches[primary].detection_type;
        let confidence = matches[primary].confidence.clamp(0.0, 100.0);
        let severity = severity_for_confidence(confidence);

        let evidence: Vec<DetectionEvidence> =
            matches.into_iter().flat_map(|m| m.evidence).collect();
        let duration_ms = match (
            evidence.iter().map(|e| e.timestamp).min(),
            evidence.iter().map(|e| e.timestamp).max(),
        ) {
            (Some(first), Some(last)) => last - first,
            _ => 0,
        };

        let prices: Vec<f64> = obs.history.iter().map(|p| p.price).collect();
        let normal_price = if prices.is_empty() {
            obs.current_price
        } else {
            prices.iter().sum::<f64>() / prices.len() as f64
        };
        let price_deviation = if normal_price != 0.0 {
            (obs.current_price - normal_price).abs() / normal_price.abs() * 100.0
        } else {
            0.0
        };

        let suspicious_transactions: Vec<SuspiciousTransaction> = obs
            .transactions
            .iter()
            .filter(|tx| tx.value > self.config.pattern_recognition.max_normal_tx_value)
            .map(|tx| SuspiciousTransaction {
                hash: tx.hash.clone(),
                from: tx.from.clone(),
                to: tx.to.clone(),
                value: tx.value,
                timestamp: tx.timestamp,
                relevance_score: (tx.value / 10_000.0).min(100.0),
            })
            .collect();

        let feed_key = obs.feed.key();
        let created_at = Utc::now();

        Detection {
            id: Uuid::new_v4().to_string(),
            detection_type,
            severity,
            status: DetectionStatus::Active,
            confidence,
            timestamp: now_ms,
            affected_feeds: vec![feed_key.clone()],
            details: DetectionDetails {
                description: describe(detection_type, &feed_key, price_deviation),
                evidence,
                price_deviation,
                normal_price,
                manipulated_price: obs.current_price,
                duration_ms,
            },
            suspicious_transactions,
            impact: impact_summary(detection_type, severity, price_deviation),
            recommended_actions: recommended_actions(detection_type, severity),
            created_at,
            updated_at: created_at,
        }
    }

    /// Cross-source sanity check. When the history carries more than one
    /// source, compare each source's newest price against the consensus
    /// and record the worst offender if it exceeds the tolerance. Purely
    /// additive evidence; gating never depends on it.
    fn consensus_evidence(&self, obs: &FeedObservation) -> Option<DetectionEvidence> {
        let mut latest_by_source: HashMap<&str, (i64, f64)> = HashMap::new();
        for point in &obs.history {
            let entry = latest_by_source
                .entry(point.source.as_str())
                .or_insert((point.timestamp, point.price));
            if point.timestamp >= entry.0 {
                *entry = (point.timestamp, point.price);
            }
        }
        if latest_by_source.len() < 2 {
            return None;
        }

        let mut source_prices: Vec<(String, f64)> = latest_by_source
            .into_iter()
            .map(|(source, (_, price))| (source.to_string(), price))
            .collect();
        source_prices.sort_by(|a, b| a.0.cmp(&b.0));

        let prices: Vec<f64> = source_prices.iter().map(|(_, p)| *p).collect();
        let consensus = consensus_price(&prices, self.config.multi_source.consensus_method, None);
        let worst = max_deviation(&source_prices, consensus)?;
        if worst.deviation_percent <= self.config.multi_source.deviation_tolerance_pct {
            return None;
        }

        Some(
            DetectionEvidence::new(
                "consensus_check",
                format!(
                    "Source {} deviates {:.2}% from the {}-source consensus {:.6}",
                    worst.source,
                    worst.deviation_percent,
                    prices.len(),
                    consensus
                ),
                obs.observed_at_ms,
            )
            .with_data("consensus_price", consensus)
            .with_data("deviating_source", &worst.source)
            .with_data("deviation_percent", worst.deviation_percent),
        )
    }
}

fn describe(detection_type: DetectionType, feed_key: &str, deviation_pct: f64) -> String {
    match detection_type {
        DetectionType::StatisticalAnomaly => format!(
            "Price on {} deviates {:.2}% from its recent mean",
            feed_key, deviation_pct
        ),
        DetectionType::FlashLoanAttack => format!(
            "Flash-loan call data observed alongside price movement on {}",
            feed_key
        ),
        DetectionType::SandwichAttack => format!(
            "Transaction ordering on {} matches a sandwich pattern",
            feed_key
        ),
        DetectionType::LiquidityDrop => {
            format!("Liquidity backing {} dropped sharply", feed_key)
        }
    }
}

fn recommended_actions(detection_type: DetectionType, severity: Severity) -> Vec<String> {
    let mut actions = Vec::new();

    if matches!(severity, Severity::Critical | Severity::High) {
        actions.push("Pause the affected price feed until sources are verified".to_string());
    }

    match detection_type {
        DetectionType::StatisticalAnomaly => {
            actions.push("Cross-check the feed against independent price sources".to_string());
        }
        DetectionType::FlashLoanAttack => {
            actions.push(
                "Check lending positions for liquidations executed at the distorted price"
                    .to_string(),
            );
            actions.push("Review the matched transactions against the signature table".to_string());
        }
        DetectionType::SandwichAttack => {
            actions.push(
                "Review mempool protection for transactions routed through this feed's pools"
                    .to_string(),
            );
        }
        DetectionType::LiquidityDrop => {
            actions.push("Verify liquidity-provider positions and pending withdrawals".to_string());
        }
    }

    actions
}

fn impact_summary(
    detection_type: DetectionType,
    severity: Severity,
    deviation_pct: f64,
) -> String {
    match severity {
        Severity::Critical | Severity::High => format!(
            "Consumers of this feed may be pricing against a manipulated value ({:.2}% off the recent mean); downstream liquidations and swaps are at risk",
            deviation_pct
        ),
        Severity::Medium => format!(
            "{} signals warrant monitoring; price impact is currently {:.2}%",
            detection_type.as_str(),
            deviation_pct
        ),
        Severity::Low => "Limited impact expected; pattern recorded for trend analysis".to_string(),
    }
}
