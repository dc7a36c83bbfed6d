use async_trait::async_trait;

use crate::analyzer::StatisticalAnomalyAnalyzer;
use crate::models::FeedObservation;
use crate::pipeline::PatternDetector;
use crate::risk::PatternMatch;

pub struct StatisticalAnomalyDetector {
    analyzer: StatisticalAnomalyAnalyzer,
}

impl StatisticalAnomalyDetector {
    pub fn new(analyzer: StatisticalAnomalyAnalyzer) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl PatternDetector for StatisticalAnomalyDetector {
    fn name(&self) -> &'static str {
        "StatisticalAnomalyDetector"
    }

    async fn detect(&self, obs: &FeedObservation) -> Option<PatternMatch> {
        self.analyzer.analyze(obs)
    }
}
