//! Cluster stats core
//!
//! ```text
//!   descriptor ──► StatsRequest ──► filter / peers ──► (collector) ──► raw documents
//!                       │                                                   │
//!                       │                                             StatsParser
//!                       │                                                   ▼
//!                       └── exists / to_result ◄── accumulate ◄──── ParsedStats
//! ```
//!
//! Everything here is synchronous and side-effect free; `ParsedStats` lives
//! for a single report.

pub mod accumulator;
pub mod extract;
pub mod filter;
pub mod models;
pub mod parser;
pub mod request;
pub mod result;

#[cfg(test)]
mod tests;

pub use extract::FieldExtractor;
pub use filter::{CompiledFilter, StatsFilter};
pub use models::{ParsedStats, ServerField, ServerStats, TableField, TableStats};
pub use parser::{DEFAULT_EXTENT_SIZE, StatsParser};
pub use request::StatsRequest;
pub use result::{DELETED_DATABASE_NAME, TIMEOUT_ERROR};
