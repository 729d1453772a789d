//! Topology metadata consumed by stats reports
//!
//! Tables, servers and databases are soft-deleted: a deleted entry stays in the
//! maps with `deleted = true` and is treated exactly like an unknown id.

use crate::models::{DatabaseId, ServerId, TableId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How identity fields (`db`, `table`, `server`) are rendered in reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierFormat {
    #[default]
    Name,
    Uuid,
}

impl IdentifierFormat {
    /// Render an entity as its display name or its uuid
    pub fn render(self, name: &str, id: &impl fmt::Display) -> Value {
        match self {
            Self::Name => Value::String(name.to_string()),
            Self::Uuid => Value::String(id.to_string()),
        }
    }
}

impl FromStr for IdentifierFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "uuid" => Ok(Self::Uuid),
            other => Err(format!("unknown identifier format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    pub database: DatabaseId,
    /// Servers hosting a replica of the table
    #[serde(default)]
    pub replicas: Vec<ServerId>,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMetadata {
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Read access to the cluster topology; lookups only return live entries
pub trait TopologyMetadata: Send + Sync {
    fn database(&self, id: &DatabaseId) -> Option<&DatabaseMetadata>;

    fn table(&self, id: &TableId) -> Option<&TableMetadata>;

    fn server(&self, id: &ServerId) -> Option<&ServerMetadata>;

    /// Live tables in id order
    fn live_tables(&self) -> Vec<TableId>;

    /// Live servers in id order
    fn live_servers(&self) -> Vec<ServerId>;
}

/// In-memory topology metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterMetadata {
    pub databases: BTreeMap<DatabaseId, DatabaseMetadata>,
    pub tables: BTreeMap<TableId, TableMetadata>,
    pub servers: BTreeMap<ServerId, ServerMetadata>,
}

impl ClusterMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, id: DatabaseId, name: impl Into<String>) -> Self {
        self.databases.insert(id, DatabaseMetadata { name: name.into(), deleted: false });
        self
    }

    pub fn with_table(mut self, id: TableId, name: impl Into<String>, database: DatabaseId) -> Self {
        self.tables.insert(
            id,
            TableMetadata { name: name.into(), database, replicas: Vec::new(), deleted: false },
        );
        self
    }

    pub fn with_server(mut self, id: ServerId, name: impl Into<String>) -> Self {
        self.servers.insert(id, ServerMetadata { name: name.into(), deleted: false });
        self
    }

    /// Record that `server` hosts a replica of `table`
    pub fn with_replica(mut self, table: TableId, server: ServerId) -> Self {
        if let Some(meta) = self.tables.get_mut(&table)
            && !meta.replicas.contains(&server)
        {
            meta.replicas.push(server);
        }
        self
    }

    pub fn delete_database(&mut self, id: &DatabaseId) {
        if let Some(meta) = self.databases.get_mut(id) {
            meta.deleted = true;
        }
    }

    pub fn delete_table(&mut self, id: &TableId) {
        if let Some(meta) = self.tables.get_mut(id) {
            meta.deleted = true;
        }
    }

    pub fn delete_server(&mut self, id: &ServerId) {
        if let Some(meta) = self.servers.get_mut(id) {
            meta.deleted = true;
        }
    }
}

impl TopologyMetadata for ClusterMetadata {
    fn database(&self, id: &DatabaseId) -> Option<&DatabaseMetadata> {
        self.databases.get(id).filter(|meta| !meta.deleted)
    }

    fn table(&self, id: &TableId) -> Option<&TableMetadata> {
        self.tables.get(id).filter(|meta| !meta.deleted)
    }

    fn server(&self, id: &ServerId) -> Option<&ServerMetadata> {
        self.servers.get(id).filter(|meta| !meta.deleted)
    }

    fn live_tables(&self) -> Vec<TableId> {
        self.tables.iter().filter(|(_, meta)| !meta.deleted).map(|(id, _)| *id).collect()
    }

    fn live_servers(&self) -> Vec<ServerId> {
        self.servers.iter().filter(|(_, meta)| !meta.deleted).map(|(id, _)| *id).collect()
    }
}
