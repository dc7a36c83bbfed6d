use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Numeric priority used for alert-floor comparisons.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Severity is a pure function of merged confidence.
pub fn severity_for_confidence(confidence: f64) -> Severity {
    if confidence >= 90.0 {
        Severity::Critical
    } else if confidence >= 75.0 {
        Severity::High
    } else if confidence >= 50.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionType {
    StatisticalAnomaly,
    FlashLoanAttack,
    SandwichAttack,
    LiquidityDrop,
}

impl DetectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionType::StatisticalAnomaly => "statistical_anomaly",
            DetectionType::FlashLoanAttack => "flash_loan_attack",
            DetectionType::SandwichAttack => "sandwich_attack",
            DetectionType::LiquidityDrop => "liquidity_drop",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStatus {
    Active,
    Investigating,
    Confirmed,
    FalsePositive,
    Resolved,
}

/// One atomic piece of supporting data attached to a detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionEvidence {
    pub evidence_type: String,
    pub description: String,
    pub data: HashMap<String, serde_json::Value>,
    pub timestamp: i64,
}

impl DetectionEvidence {
    pub fn new(
        evidence_type: impl Into<String>,
        description: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            evidence_type: evidence_type.into(),
            description: description.into(),
            data: HashMap::new(),
            timestamp,
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.data.insert(key.into(), json_value);
        }
        self
    }
}

/// One pattern analyzer's raw verdict, before merging.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub detection_type: DetectionType,
    pub confidence: f64,
    pub evidence: Vec<DetectionEvidence>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionDetails {
    pub description: String,
    pub evidence: Vec<DetectionEvidence>,
    /// Percent deviation of the manipulated price from the normal price.
    pub price_deviation: f64,
    pub normal_price: f64,
    pub manipulated_price: f64,
    pub duration_ms: i64,
}

/// Transaction flagged as relevant to a detection, scored by size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousTransaction {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: f64,
    pub timestamp: i64,
    pub relevance_score: f64,
}

/// The engine's sole output artifact. Append-only once emitted: the engine
/// never mutates or deletes a detection after it enters the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub id: String,
    pub detection_type: DetectionType,
    pub severity: Severity,
    pub status: DetectionStatus,
    pub confidence: f64, // clamped to [0, 100]
    pub timestamp: i64,
    pub affected_feeds: Vec<String>,
    pub details: DetectionDetails,
    pub suspicious_transactions: Vec<SuspiciousTransaction>,
    pub impact: String,
    pub recommended_actions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ledger query for `detection_history`.
#[derive(Debug, Clone, Default)]
pub struct DetectionQuery {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub severity: Option<Severity>,
    pub limit: Option<usize>,
}
