mod flash_loan;
mod liquidity;
mod sandwich;
mod statistical;

pub use flash_loan::{FlashLoanAnalyzer, FlashLoanSignature};
pub use liquidity::LiquidityDropAnalyzer;
pub use sandwich::SandwichAnalyzer;
pub use statistical::StatisticalAnomalyAnalyzer;
