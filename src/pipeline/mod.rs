mod detector;
mod flash_loan;
mod liquidity;
mod sandwich;
mod statistical;

pub use detector::{DetectionPipeline, PatternDetector};
pub use flash_loan::FlashLoanDetector;
pub use liquidity::LiquidityDropDetector;
pub use sandwich::SandwichDetector;
pub use statistical::StatisticalAnomalyDetector;
