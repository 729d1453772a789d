//! Stats document parser
//!
//! Walks the per-node monitor documents and folds them into a `ParsedStats`.
//! Document layout per node:
//!
//! ```text
//! {
//!   "query_engine": { "queries_per_sec": .., "queries_total": .., ... },
//!   "<table uuid>": {
//!     "serializers": {
//!       "shard_0": {
//!         "btree-primary": { "keys_read": .., "keys_set": .., ... },
//!         "cache": { "in_use_bytes": .. }
//!       },
//!       "shard_1": { ... },
//!       "serializer": { "serializer_data_extents": .., ... }
//!     }
//!   }
//! }
//! ```

use crate::models::{ServerId, TableId, parse_hyphenated_uuid};
use crate::services::stats::extract::{FieldExtractor, Object};
use crate::services::stats::models::{ParsedStats, ServerField, ServerStats, TableStats};
use crate::utils::StatsResult;
use serde_json::Value;
use std::collections::BTreeMap;

/// Default on-disk extent size of the storage engine (2 MiB)
pub const DEFAULT_EXTENT_SIZE: u64 = 2 * 1024 * 1024;

const QUERY_ENGINE_KEY: &str = "query_engine";
const SERIALIZERS_KEY: &str = "serializers";
const SERIALIZER_KEY: &str = "serializer";
const CACHE_KEY: &str = "cache";
const SHARD_PREFIX: &str = "shard_";
const BTREE_PREFIX: &str = "btree-";

/// Parser for per-node monitor documents
#[derive(Debug, Clone, Copy)]
pub struct StatsParser {
    extent_size: u64,
}

impl Default for StatsParser {
    fn default() -> Self {
        Self { extent_size: DEFAULT_EXTENT_SIZE }
    }
}

impl StatsParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a non-default extent size when converting extent counts to bytes
    pub fn with_extent_size(extent_size: u64) -> Self {
        Self { extent_size }
    }

    pub fn extent_size(&self) -> u64 {
        self.extent_size
    }

    /// Build the aggregate for a set of nodes
    ///
    /// Every key of `documents` gets an entry; a `None` document yields an
    /// unresponsive entry with zeroed counters.
    pub fn parse(&self, documents: &BTreeMap<ServerId, Option<Value>>) -> StatsResult<ParsedStats> {
        let mut servers = BTreeMap::new();
        for (server_id, document) in documents {
            let stats = match document {
                Some(doc) => self.parse_server(server_id, doc)?,
                None => {
                    tracing::debug!("No stats received from server {}", server_id);
                    ServerStats::default()
                },
            };
            servers.insert(*server_id, stats);
        }
        Ok(ParsedStats { servers })
    }

    /// Parse one node's document
    pub fn parse_server(&self, server_id: &ServerId, doc: &Value) -> StatsResult<ServerStats> {
        let root = server_id.to_string();
        let doc = FieldExtractor::object(doc, &root)?;
        let mut stats = ServerStats { responsive: true, ..ServerStats::default() };

        for (key, value) in doc {
            let path = FieldExtractor::child_path(&root, key);
            if key == QUERY_ENGINE_KEY {
                let engine = FieldExtractor::object(value, &path)?;
                Self::add_query_engine_stats(engine, &mut stats, &path)?;
            } else if let Some(uuid) = parse_hyphenated_uuid(key) {
                self.add_table_stats(TableId::from_uuid(uuid), value, &mut stats, &path)?;
            } else {
                tracing::debug!("Ignoring stats field '{}' from server {}", key, server_id);
            }
        }

        Ok(stats)
    }

    fn add_query_engine_stats(engine: &Object, stats: &mut ServerStats, path: &str) -> StatsResult<()> {
        for field in ServerField::ALL {
            FieldExtractor::add(engine, field.name(), field.get_mut(stats), path)?;
        }
        Ok(())
    }

    fn add_table_stats(
        &self,
        table_id: TableId,
        value: &Value,
        stats: &mut ServerStats,
        path: &str,
    ) -> StatsResult<()> {
        let table = FieldExtractor::object(value, path)?;
        let Some(serializers) = FieldExtractor::child_object(table, SERIALIZERS_KEY, path)? else {
            return Ok(());
        };
        let path = FieldExtractor::child_path(path, SERIALIZERS_KEY);
        let table_stats = stats.tables.entry(table_id).or_default();

        Self::add_shard_values(serializers, table_stats, &path)?;

        if let Some(serializer) = FieldExtractor::child_object(serializers, SERIALIZER_KEY, &path)? {
            let path = FieldExtractor::child_path(&path, SERIALIZER_KEY);
            self.add_serializer_values(serializer, table_stats, &path)?;
        }
        Ok(())
    }

    /// Sum the btree and cache counters of every `shard_*` entry
    fn add_shard_values(serializers: &Object, out: &mut TableStats, path: &str) -> StatsResult<()> {
        for (shard_key, shard_value) in serializers {
            if !shard_key.starts_with(SHARD_PREFIX) {
                continue;
            }
            let shard_path = FieldExtractor::child_path(path, shard_key);
            let shard = FieldExtractor::object(shard_value, &shard_path)?;

            for (key, value) in shard {
                if key.starts_with(BTREE_PREFIX) {
                    let btree_path = FieldExtractor::child_path(&shard_path, key);
                    let btree = FieldExtractor::object(value, &btree_path)?;
                    FieldExtractor::add(btree, "keys_read", &mut out.read_docs_per_sec, &btree_path)?;
                    FieldExtractor::add(btree, "keys_set", &mut out.written_docs_per_sec, &btree_path)?;
                    FieldExtractor::add(btree, "total_keys_read", &mut out.read_docs_total, &btree_path)?;
                    FieldExtractor::add(btree, "total_keys_set", &mut out.written_docs_total, &btree_path)?;
                } else if key == CACHE_KEY {
                    let cache_path = FieldExtractor::child_path(&shard_path, key);
                    let cache = FieldExtractor::object(value, &cache_path)?;
                    FieldExtractor::add(cache, "in_use_bytes", &mut out.in_use_bytes, &cache_path)?;
                }
            }
        }
        Ok(())
    }

    /// Disk throughput and space usage of the table's serializer
    fn add_serializer_values(&self, serializer: &Object, out: &mut TableStats, path: &str) -> StatsResult<()> {
        FieldExtractor::add(serializer, "serializer_read_bytes_per_sec", &mut out.read_bytes_per_sec, path)?;
        FieldExtractor::add(serializer, "serializer_read_bytes_total", &mut out.read_bytes_total, path)?;
        FieldExtractor::add(serializer, "serializer_written_bytes_per_sec", &mut out.written_bytes_per_sec, path)?;
        FieldExtractor::add(serializer, "serializer_written_bytes_total", &mut out.written_bytes_total, path)?;

        let extent_size = self.extent_size as f64;
        let data_bytes = FieldExtractor::number(serializer, "serializer_data_extents", path)? * extent_size;
        let metadata_bytes = FieldExtractor::number(serializer, "serializer_lba_extents", path)? * extent_size;
        let garbage_bytes = FieldExtractor::number(serializer, "serializer_old_garbage_block_bytes", path)?;
        let bytes_in_use = FieldExtractor::number(serializer, "serializer_bytes_in_use", path)?;

        // Preallocated space is whatever is in use but not accounted for above.
        out.data_bytes += data_bytes;
        out.metadata_bytes += metadata_bytes;
        out.garbage_bytes += garbage_bytes;
        out.preallocated_bytes += bytes_in_use - (data_bytes + garbage_bytes + metadata_bytes);
        Ok(())
    }
}
