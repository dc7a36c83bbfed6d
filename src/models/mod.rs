pub mod price;
pub mod transaction;

pub use price::{FeedId, PricePoint};
pub use transaction::{TransactionLog, TransactionRecord};

/// Snapshot of one feed's state handed to the pattern detectors for a
/// single analysis cycle. History is already bounded and in arrival order.
#[derive(Debug, Clone)]
pub struct FeedObservation {
    pub feed: FeedId,
    pub current_price: f64,
    pub history: Vec<PricePoint>,
    pub transactions: Vec<TransactionRecord>,
    pub observed_at_ms: i64,
}
