mod handler;
mod log;

pub use handler::{ActionHandler, ActionPipeline};
pub use log::LogAction;
