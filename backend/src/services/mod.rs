pub mod collector;
pub mod stats;
pub mod stats_service;

pub use collector::{NodeStatsSource, SnapshotSource, StatsCollector};
pub use stats_service::StatsService;
