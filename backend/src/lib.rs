//! Cluster performance statistics
//!
//! Turns the per-node performance-monitor documents collected from a storage
//! cluster into typed aggregates and renders them as cluster, table, server or
//! table-on-server reports.

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

pub use config::Config;
pub use services::stats::{ParsedStats, StatsParser, StatsRequest};
pub use services::{StatsCollector, StatsService};
pub use utils::{StatsError, StatsResult};
