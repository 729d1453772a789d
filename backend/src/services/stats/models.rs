//! Aggregated stats models
//!
//! `ParsedStats` is built once per report and only read afterwards. Counters
//! are `f64` because the monitor documents carry plain JSON numbers.

use crate::models::{ServerId, TableId};
use std::collections::BTreeMap;

// ============================================================================
// Per-node and per-table counters
// ============================================================================

/// Counters reported by one node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerStats {
    /// True iff a document was received for the node
    pub responsive: bool,
    pub queries_per_sec: f64,
    pub queries_total: f64,
    pub client_connections: f64,
    pub clients_active: f64,
    /// Only tables whose storage engine section was present
    pub tables: BTreeMap<TableId, TableStats>,
}

/// Counters reported by one node for one table, summed over its shards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableStats {
    pub read_docs_per_sec: f64,
    pub read_docs_total: f64,
    pub written_docs_per_sec: f64,
    pub written_docs_total: f64,

    pub in_use_bytes: f64,

    pub metadata_bytes: f64,
    pub data_bytes: f64,
    pub garbage_bytes: f64,
    pub preallocated_bytes: f64,

    pub read_bytes_per_sec: f64,
    pub read_bytes_total: f64,
    pub written_bytes_per_sec: f64,
    pub written_bytes_total: f64,
}

/// Root aggregate: one entry per node the caller asked about
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedStats {
    pub servers: BTreeMap<ServerId, ServerStats>,
}

impl ParsedStats {
    pub fn server(&self, server_id: &ServerId) -> Option<&ServerStats> {
        self.servers.get(server_id)
    }

    /// Stats of a node that answered, `None` for unknown or unresponsive nodes
    pub fn responsive_server(&self, server_id: &ServerId) -> Option<&ServerStats> {
        self.server(server_id).filter(|stats| stats.responsive)
    }
}

// ============================================================================
// Field selectors
// ============================================================================

/// Node-scoped counter selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerField {
    QueriesPerSec,
    QueriesTotal,
    ClientConnections,
    ClientsActive,
}

impl ServerField {
    pub fn get(self, stats: &ServerStats) -> f64 {
        match self {
            Self::QueriesPerSec => stats.queries_per_sec,
            Self::QueriesTotal => stats.queries_total,
            Self::ClientConnections => stats.client_connections,
            Self::ClientsActive => stats.clients_active,
        }
    }

    /// Field name in both the monitor document and the report
    pub fn name(self) -> &'static str {
        match self {
            Self::QueriesPerSec => "queries_per_sec",
            Self::QueriesTotal => "queries_total",
            Self::ClientConnections => "client_connections",
            Self::ClientsActive => "clients_active",
        }
    }

    pub(crate) fn get_mut(self, stats: &mut ServerStats) -> &mut f64 {
        match self {
            Self::QueriesPerSec => &mut stats.queries_per_sec,
            Self::QueriesTotal => &mut stats.queries_total,
            Self::ClientConnections => &mut stats.client_connections,
            Self::ClientsActive => &mut stats.clients_active,
        }
    }

    pub const ALL: [ServerField; 4] =
        [Self::QueriesPerSec, Self::QueriesTotal, Self::ClientConnections, Self::ClientsActive];
}

/// Table-scoped counter selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableField {
    ReadDocsPerSec,
    ReadDocsTotal,
    WrittenDocsPerSec,
    WrittenDocsTotal,
    InUseBytes,
    MetadataBytes,
    DataBytes,
    GarbageBytes,
    PreallocatedBytes,
    ReadBytesPerSec,
    ReadBytesTotal,
    WrittenBytesPerSec,
    WrittenBytesTotal,
}

impl TableField {
    pub fn get(self, stats: &TableStats) -> f64 {
        match self {
            Self::ReadDocsPerSec => stats.read_docs_per_sec,
            Self::ReadDocsTotal => stats.read_docs_total,
            Self::WrittenDocsPerSec => stats.written_docs_per_sec,
            Self::WrittenDocsTotal => stats.written_docs_total,
            Self::InUseBytes => stats.in_use_bytes,
            Self::MetadataBytes => stats.metadata_bytes,
            Self::DataBytes => stats.data_bytes,
            Self::GarbageBytes => stats.garbage_bytes,
            Self::PreallocatedBytes => stats.preallocated_bytes,
            Self::ReadBytesPerSec => stats.read_bytes_per_sec,
            Self::ReadBytesTotal => stats.read_bytes_total,
            Self::WrittenBytesPerSec => stats.written_bytes_per_sec,
            Self::WrittenBytesTotal => stats.written_bytes_total,
        }
    }

    /// Field name in the report
    pub fn name(self) -> &'static str {
        match self {
            Self::ReadDocsPerSec => "read_docs_per_sec",
            Self::ReadDocsTotal => "read_docs_total",
            Self::WrittenDocsPerSec => "written_docs_per_sec",
            Self::WrittenDocsTotal => "written_docs_total",
            Self::InUseBytes => "in_use_bytes",
            Self::MetadataBytes => "metadata_bytes",
            Self::DataBytes => "data_bytes",
            Self::GarbageBytes => "garbage_bytes",
            Self::PreallocatedBytes => "preallocated_bytes",
            Self::ReadBytesPerSec => "read_bytes_per_sec",
            Self::ReadBytesTotal => "read_bytes_total",
            Self::WrittenBytesPerSec => "written_bytes_per_sec",
            Self::WrittenBytesTotal => "written_bytes_total",
        }
    }
}
