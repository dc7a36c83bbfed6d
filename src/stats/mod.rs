pub mod consensus;
pub mod deviation;
pub mod outlier;
pub mod trend;
