//! Reductions over a `ParsedStats` snapshot
//!
//! Every call recomputes its sum from the snapshot; nothing is cached.
//! Sums fold from `0.0`: `Iterator::sum` over no items yields `-0.0`.

use crate::models::{ServerId, TableId};
use crate::services::stats::models::{ParsedStats, ServerField, TableField};
use crate::utils::{StatsError, StatsResult};

fn total(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, |acc, value| acc + value)
}

impl ParsedStats {
    /// Sum a node-scoped counter over every node, unresponsive ones included
    pub fn accumulate_servers(&self, field: ServerField) -> f64 {
        total(self.servers.values().map(|server| field.get(server)))
    }

    /// Sum a table-scoped counter over every table of every node
    pub fn accumulate_tables(&self, field: TableField) -> f64 {
        total(
            self.servers
                .values()
                .flat_map(|server| server.tables.values())
                .map(|table| field.get(table)),
        )
    }

    /// Sum a table-scoped counter for one table across all nodes
    pub fn accumulate_table(&self, table_id: &TableId, field: TableField) -> f64 {
        total(
            self.servers
                .values()
                .filter_map(|server| server.tables.get(table_id))
                .map(|table| field.get(table)),
        )
    }

    /// Sum a table-scoped counter over all tables of one node
    ///
    /// The node must be part of the snapshot; callers check existence first.
    pub fn accumulate_server(&self, server_id: &ServerId, field: TableField) -> StatsResult<f64> {
        let server = self.servers.get(server_id).ok_or(StatsError::MissingServer(*server_id))?;
        Ok(total(server.tables.values().map(|table| field.get(table))))
    }
}
