use async_trait::async_trait;

use crate::analyzer::LiquidityDropAnalyzer;
use crate::models::FeedObservation;
use crate::pipeline::PatternDetector;
use crate::risk::PatternMatch;

pub struct LiquidityDropDetector {
    analyzer: LiquidityDropAnalyzer,
}

impl LiquidityDropDetector {
    pub fn new(analyzer: LiquidityDropAnalyzer) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl PatternDetector for LiquidityDropDetector {
    fn name(&self) -> &'static str {
        "LiquidityDropDetector"
    }

    async fn detect(&self, obs: &FeedObservation) -> Option<PatternMatch> {
        self.analyzer.analyze(obs)
    }
}
