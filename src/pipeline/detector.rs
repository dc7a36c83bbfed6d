use async_trait::async_trait;

use crate::models::FeedObservation;
use crate::risk::PatternMatch;

/// One independent manipulation-pattern detector.
#[async_trait]
pub trait PatternDetector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn detect(&self, obs: &FeedObservation) -> Option<PatternMatch>;
}

/// Ordered collection of pattern detectors. Registration order is part of
/// the contract: the merge step breaks confidence ties in favor of the
/// earlier detector.
pub struct DetectionPipeline {
    detectors: Vec<Box<dyn PatternDetector>>,
}

impl DetectionPipeline {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    pub fn add_detector<D: PatternDetector + 'static>(mut self, detector: D) -> Self {
        self.detectors.push(Box::new(detector));
        self
    }

    pub async fn run(&self, obs: &FeedObservation) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for detector in &self.detectors {
            if let Some(pattern) = detector.detect(obs).await {
                matches.push(pattern);
            }
        }

        matches
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl Default for DetectionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeedId;
    use crate::risk::DetectionType;

    struct FixedDetector {
        name: &'static str,
        confidence: Option<f64>,
    }

    #[async_trait]
    impl PatternDetector for FixedDetector {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn detect(&self, _obs: &FeedObservation) -> Option<PatternMatch> {
            self.confidence.map(|confidence| PatternMatch {
                detection_type: DetectionType::StatisticalAnomaly,
                confidence,
                evidence: Vec::new(),
            })
        }
    }

    fn empty_observation() -> FeedObservation {
        FeedObservation {
            feed: FeedId::new("p", "s", "c"),
            current_price: 1.0,
            history: Vec::new(),
            transactions: Vec::new(),
            observed_at_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_run_preserves_registration_order() {
        let pipeline = DetectionPipeline::new()
            .add_detector(FixedDetector {
                name: "first",
                confidence: Some(10.0),
            })
            .add_detector(FixedDetector {
                name: "quiet",
                confidence: None,
            })
            .add_detector(FixedDetector {
                name: "third",
                confidence: Some(30.0),
            });

        let matches = pipeline.run(&empty_observation()).await;
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].confidence, 10.0);
        assert_eq!(matches[1].confidence, 30.0);
    }

    #[tokio::test]
    async fn test_empty_pipeline_matches_nothing() {
        let pipeline = DetectionPipeline::new();
        assert!(pipeline.is_empty());
        assert!(pipeline.run(&empty_observation()).await.is_empty());
    }
}
