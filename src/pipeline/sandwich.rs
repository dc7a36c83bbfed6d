use async_trait::async_trait;

use crate::analyzer::SandwichAnalyzer;
use crate::models::FeedObservation;
use crate::pipeline::PatternDetector;
use crate::risk::PatternMatch;

pub struct SandwichDetector {
    analyzer: SandwichAnalyzer,
}

impl SandwichDetector {
    pub fn new(analyzer: SandwichAnalyzer) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl PatternDetector for SandwichDetector {
    fn name(&self) -> &'static str {
        "SandwichDetector"
    }

    async fn detect(&self, obs: &FeedObservation) -> Option<PatternMatch> {
        self.analyzer.analyze(obs)
    }
}
