use thiserror::Error;

/// Construction-time configuration failures. These fail fast: an invalid
/// threshold is a deployment mistake, not a data condition. Data-quality
/// problems never reach this type; detectors abstain instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must be greater than zero")]
    ZeroLimit { name: &'static str },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: i64 },

    #[error(
        "deviation tiers must ascend: low {low} < medium {medium} < high {high} < critical {critical}"
    )]
    UnorderedDeviationTiers {
        low: f64,
        medium: f64,
        high: f64,
        critical: f64,
    },
}
