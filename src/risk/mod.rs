mod metrics;
mod models;

pub use metrics::{DailyTrendPoint, DetectionMetrics, FeedDetectionCount};
pub use models::{
    severity_for_confidence, Detection, DetectionDetails, DetectionEvidence, DetectionQuery,
    DetectionStatus, DetectionType, PatternMatch, Severity, SuspiciousTransaction,
};
