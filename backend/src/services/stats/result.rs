//! Report assembly
//!
//! Rows look like:
//!
//! ```text
//! { "id": ["table_server", T, S], "server": .., "db": .., "table": ..,
//!   "query_engine": { .. }, "storage_engine": { "cache": { .. }, "disk": { .., "space_usage": { .. } } } }
//! ```
//!
//! Server-scoped rows carry `error` instead of the counter blocks when the node
//! did not answer.

use crate::models::{IdentifierFormat, ServerId, TableId, TopologyMetadata};
use crate::services::stats::models::{ParsedStats, ServerField, ServerStats, TableField, TableStats};
use crate::services::stats::request::StatsRequest;
use crate::utils::StatsResult;
use serde_json::{Map, Value};

pub const TIMEOUT_ERROR: &str = "Timed out. Unable to retrieve stats.";
pub const DELETED_DATABASE_NAME: &str = "__deleted_database__";

const CLUSTER_SERVER_FIELDS: [ServerField; 3] =
    [ServerField::QueriesPerSec, ServerField::ClientConnections, ServerField::ClientsActive];
const SERVER_FIELDS: [ServerField; 4] = [
    ServerField::ClientConnections,
    ServerField::ClientsActive,
    ServerField::QueriesPerSec,
    ServerField::QueriesTotal,
];
const DOC_RATE_FIELDS: [TableField; 2] = [TableField::ReadDocsPerSec, TableField::WrittenDocsPerSec];
const DOC_FIELDS: [TableField; 4] = [
    TableField::ReadDocsPerSec,
    TableField::ReadDocsTotal,
    TableField::WrittenDocsPerSec,
    TableField::WrittenDocsTotal,
];
const CACHE_FIELDS: [TableField; 1] = [TableField::InUseBytes];
const DISK_FIELDS: [TableField; 4] = [
    TableField::ReadBytesPerSec,
    TableField::ReadBytesTotal,
    TableField::WrittenBytesPerSec,
    TableField::WrittenBytesTotal,
];
const SPACE_USAGE_FIELDS: [TableField; 4] = [
    TableField::MetadataBytes,
    TableField::DataBytes,
    TableField::GarbageBytes,
    TableField::PreallocatedBytes,
];

type Object = Map<String, Value>;

fn put(object: &mut Object, name: &str, value: impl Into<Value>) {
    object.insert(name.to_string(), value.into());
}

/// Object of `(field name, value)` pairs
fn counters<F: Copy>(fields: &[F], name: impl Fn(F) -> &'static str, value: impl Fn(F) -> f64) -> Object {
    let mut object = Object::new();
    for &field in fields {
        put(&mut object, name(field), value(field));
    }
    object
}

fn table_counters(fields: &[TableField], stats: &TableStats) -> Object {
    counters(fields, TableField::name, |field| field.get(stats))
}

impl StatsRequest {
    /// Assemble the report row
    ///
    /// `Ok(None)` means a named table or server vanished from the topology
    /// since the existence check.
    pub fn to_result(
        &self,
        stats: &ParsedStats,
        metadata: &dyn TopologyMetadata,
        format: IdentifierFormat,
    ) -> StatsResult<Option<Value>> {
        let mut row = Object::new();
        put(&mut row, "id", self.descriptor());

        match *self {
            Self::Cluster => {
                let mut engine = counters(&CLUSTER_SERVER_FIELDS, ServerField::name, |field| {
                    stats.accumulate_servers(field)
                });
                engine.extend(counters(&DOC_RATE_FIELDS, TableField::name, |field| {
                    stats.accumulate_tables(field)
                }));
                put(&mut row, "query_engine", engine);
            },
            Self::Table { table_id } => {
                if !add_table_fields(&table_id, metadata, format, &mut row) {
                    return Ok(None);
                }
                let engine = counters(&DOC_RATE_FIELDS, TableField::name, |field| {
                    stats.accumulate_table(&table_id, field)
                });
                put(&mut row, "query_engine", engine);
            },
            Self::Server { server_id } => {
                if !add_server_fields(&server_id, metadata, format, &mut row) {
                    return Ok(None);
                }
                match stats.responsive_server(&server_id) {
                    None => put(&mut row, "error", TIMEOUT_ERROR),
                    Some(server) => {
                        let engine = server_query_engine(stats, &server_id, server)?;
                        put(&mut row, "query_engine", engine);
                    },
                }
            },
            Self::TableServer { table_id, server_id } => {
                if !add_server_fields(&server_id, metadata, format, &mut row)
                    || !add_table_fields(&table_id, metadata, format, &mut row)
                {
                    return Ok(None);
                }
                match stats.responsive_server(&server_id) {
                    None => put(&mut row, "error", TIMEOUT_ERROR),
                    Some(server) => {
                        let table = server.tables.get(&table_id).cloned().unwrap_or_default();
                        put(&mut row, "query_engine", table_counters(&DOC_FIELDS, &table));
                        put(&mut row, "storage_engine", storage_engine(&table));
                    },
                }
            },
        }

        Ok(Some(Value::Object(row)))
    }
}

fn server_query_engine(stats: &ParsedStats, server_id: &ServerId, server: &ServerStats) -> StatsResult<Object> {
    let mut engine = counters(&SERVER_FIELDS, ServerField::name, |field| field.get(server));
    for field in DOC_FIELDS {
        put(&mut engine, field.name(), stats.accumulate_server(server_id, field)?);
    }
    Ok(engine)
}

fn storage_engine(table: &TableStats) -> Object {
    let mut disk = table_counters(&DISK_FIELDS, table);
    put(&mut disk, "space_usage", table_counters(&SPACE_USAGE_FIELDS, table));

    let mut engine = Object::new();
    put(&mut engine, "cache", table_counters(&CACHE_FIELDS, table));
    put(&mut engine, "disk", disk);
    engine
}

/// Attach `db` and `table`; false when the table is unknown or deleted
fn add_table_fields(
    table_id: &TableId,
    metadata: &dyn TopologyMetadata,
    format: IdentifierFormat,
    row: &mut Object,
) -> bool {
    let Some(table) = metadata.table(table_id) else {
        return false;
    };
    let db_name = metadata
        .database(&table.database)
        .map(|db| db.name.as_str())
        .unwrap_or(DELETED_DATABASE_NAME);

    put(row, "db", format.render(db_name, &table.database));
    put(row, "table", format.render(&table.name, table_id));
    true
}

/// Attach `server`; false when the server is unknown or deleted
fn add_server_fields(
    server_id: &ServerId,
    metadata: &dyn TopologyMetadata,
    format: IdentifierFormat,
    row: &mut Object,
) -> bool {
    let Some(server) = metadata.server(server_id) else {
        return false;
    };
    put(row, "server", format.render(&server.name, server_id));
    true
}
