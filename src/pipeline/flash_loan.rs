use async_trait::async_trait;

use crate::analyzer::FlashLoanAnalyzer;
use crate::models::FeedObservation;
use crate::pipeline::PatternDetector;
use crate::risk::PatternMatch;

pub struct FlashLoanDetector {
    analyzer: FlashLoanAnalyzer,
}

impl FlashLoanDetector {
    pub fn new(analyzer: FlashLoanAnalyzer) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl PatternDetector for FlashLoanDetector {
    fn name(&self) -> &'static str {
        "FlashLoanDetector"
    }

    async fn detect(&self, obs: &FeedObservation) -> Option<PatternMatch> {
        self.analyzer.analyze(obs)
    }
}
