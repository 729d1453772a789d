//! Stats request kinds
//!
//! A request is described by a token array: `["cluster"]`, `["table", T]`,
//! `["server", S]` or `["table_server", T, S]`. Each kind decides which parts
//! of the node documents to collect, which nodes to ask, and how existence is
//! checked against the topology.

use crate::models::{NameDirectory, PeerAddress, ServerId, TableId, TopologyMetadata, parse_hyphenated_uuid};
use crate::services::stats::filter::{StatsFilter, TABLE_ID_PATTERN};
use serde_json::Value;
use std::fmt;

pub const CLUSTER_REQUEST_TYPE: &str = "cluster";
pub const TABLE_REQUEST_TYPE: &str = "table";
pub const SERVER_REQUEST_TYPE: &str = "server";
pub const TABLE_SERVER_REQUEST_TYPE: &str = "table_server";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatsRequest {
    Cluster,
    Table { table_id: TableId },
    Server { server_id: ServerId },
    TableServer { table_id: TableId, server_id: ServerId },
}

type ParseFn = fn(&Value) -> Option<StatsRequest>;

/// Tried in order by `StatsRequest::parse`
const PARSERS: [ParseFn; 4] = [
    StatsRequest::parse_cluster,
    StatsRequest::parse_table,
    StatsRequest::parse_server,
    StatsRequest::parse_table_server,
];

impl StatsRequest {
    /// Parse a descriptor by trying every request kind in turn
    pub fn parse(descriptor: &Value) -> Option<Self> {
        PARSERS.iter().find_map(|parse| parse(descriptor))
    }

    pub fn parse_cluster(descriptor: &Value) -> Option<Self> {
        Self::tokens(descriptor, CLUSTER_REQUEST_TYPE, 1)?;
        Some(Self::Cluster)
    }

    pub fn parse_table(descriptor: &Value) -> Option<Self> {
        let tokens = Self::tokens(descriptor, TABLE_REQUEST_TYPE, 2)?;
        let table_id = TableId::from_uuid(Self::uuid_token(&tokens[1])?);
        Some(Self::Table { table_id })
    }

    pub fn parse_server(descriptor: &Value) -> Option<Self> {
        let tokens = Self::tokens(descriptor, SERVER_REQUEST_TYPE, 2)?;
        let server_id = ServerId::from_uuid(Self::uuid_token(&tokens[1])?);
        Some(Self::Server { server_id })
    }

    pub fn parse_table_server(descriptor: &Value) -> Option<Self> {
        let tokens = Self::tokens(descriptor, TABLE_SERVER_REQUEST_TYPE, 3)?;
        let table_id = TableId::from_uuid(Self::uuid_token(&tokens[1])?);
        let server_id = ServerId::from_uuid(Self::uuid_token(&tokens[2])?);
        Some(Self::TableServer { table_id, server_id })
    }

    /// Token array with the expected tag and exact length
    fn tokens<'a>(descriptor: &'a Value, tag: &str, len: usize) -> Option<&'a [Value]> {
        let tokens = descriptor.as_array()?;
        if tokens.len() != len || tokens.first()?.as_str()? != tag {
            return None;
        }
        Some(tokens)
    }

    fn uuid_token(token: &Value) -> Option<uuid::Uuid> {
        parse_hyphenated_uuid(token.as_str()?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cluster => CLUSTER_REQUEST_TYPE,
            Self::Table { .. } => TABLE_REQUEST_TYPE,
            Self::Server { .. } => SERVER_REQUEST_TYPE,
            Self::TableServer { .. } => TABLE_SERVER_REQUEST_TYPE,
        }
    }

    /// `[kind, ids...]` with ids as uuid strings; parses back to `self`
    pub fn descriptor(&self) -> Value {
        let mut tokens = vec![Value::from(self.kind())];
        match self {
            Self::Cluster => {},
            Self::Table { table_id } => tokens.push(Value::from(table_id.to_string())),
            Self::Server { server_id } => tokens.push(Value::from(server_id.to_string())),
            Self::TableServer { table_id, server_id } => {
                tokens.push(Value::from(table_id.to_string()));
                tokens.push(Value::from(server_id.to_string()));
            },
        }
        Value::Array(tokens)
    }

    /// Parts of each node's document this request reads
    pub fn filter(&self) -> StatsFilter {
        let any_table = || StatsFilter::shard_counters(TABLE_ID_PATTERN.to_string());
        match self {
            Self::Cluster => StatsFilter::new([
                vec![
                    "query_engine".to_string(),
                    "(queries_per_sec|client_connections|clients_active)".to_string(),
                ],
                any_table(),
            ]),
            Self::Server { .. } => StatsFilter::new([vec!["query_engine".to_string()], any_table()]),
            Self::Table { table_id } => {
                StatsFilter::new([StatsFilter::shard_counters(StatsFilter::table_segment(table_id))])
            },
            Self::TableServer { table_id, .. } => StatsFilter::new([vec![
                StatsFilter::table_segment(table_id),
                "serializers".to_string(),
            ]]),
        }
    }

    /// Nodes to collect from
    ///
    /// Server-scoped requests ask only the node hosting that server, and nobody
    /// when it is not connected.
    pub fn peers(&self, directory: &dyn NameDirectory) -> Vec<(ServerId, PeerAddress)> {
        match self {
            Self::Cluster | Self::Table { .. } => directory.server_peers(),
            Self::Server { server_id } | Self::TableServer { server_id, .. } => directory
                .peer_for_server(server_id)
                .map(|peer| vec![(*server_id, peer)])
                .unwrap_or_default(),
        }
    }

    /// Whether every entity named by the request is live in the topology
    pub fn exists(&self, metadata: &dyn TopologyMetadata) -> bool {
        match self {
            Self::Cluster => true,
            Self::Table { table_id } => metadata.table(table_id).is_some(),
            Self::Server { server_id } => metadata.server(server_id).is_some(),
            Self::TableServer { table_id, server_id } => {
                metadata.server(server_id).is_some() && metadata.table(table_id).is_some()
            },
        }
    }

    /// Every request with a live subject: the cluster, each table, each server,
    /// and each table on each of its replica servers
    pub fn enumerate(metadata: &dyn TopologyMetadata) -> Vec<Self> {
        let tables = metadata.live_tables();
        let servers = metadata.live_servers();

        let mut requests = vec![Self::Cluster];
        requests.extend(tables.iter().map(|&table_id| Self::Table { table_id }));
        requests.extend(servers.iter().map(|&server_id| Self::Server { server_id }));
        for table_id in &tables {
            let Some(table) = metadata.table(table_id) else {
                continue;
            };
            for server_id in &table.replicas {
                if metadata.server(server_id).is_some() {
                    requests.push(Self::TableServer { table_id: *table_id, server_id: *server_id });
                }
            }
        }
        requests
    }
}

impl fmt::Display for StatsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}
