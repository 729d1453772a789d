pub mod error;
pub mod logging;

pub use error::{StatsError, StatsErrorResponse, StatsResult};
pub use logging::{init_logging, with_bootstrap_logging};
