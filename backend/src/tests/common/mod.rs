// Common test utilities and helpers

use crate::models::{
    ClusterMetadata, ClusterSnapshot, DatabaseId, PeerAddress, ServerId, SnapshotServer, TableId,
};
use crate::services::stats::StatsParser;
use crate::services::{SnapshotSource, StatsCollector, StatsService};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

/// Ids of the two-node test cluster
pub struct TestCluster {
    pub db: DatabaseId,
    pub table: TableId,
    pub node_a: ServerId,
    pub node_b: ServerId,
}

impl Default for TestCluster {
    fn default() -> Self {
        Self {
            db: DatabaseId::new_v4(),
            table: TableId::new_v4(),
            node_a: ServerId::new_v4(),
            node_b: ServerId::new_v4(),
        }
    }
}

impl TestCluster {
    /// `test.users` replicated on both nodes
    pub fn metadata(&self) -> ClusterMetadata {
        ClusterMetadata::new()
            .with_database(self.db, "test")
            .with_table(self.table, "users", self.db)
            .with_server(self.node_a, "node_a")
            .with_server(self.node_b, "node_b")
            .with_replica(self.table, self.node_a)
            .with_replica(self.table, self.node_b)
    }

    /// Monitor document of a node serving `users`
    pub fn node_document(&self, queries_per_sec: f64, keys_read: f64) -> Value {
        json!({
            "query_engine": {
                "queries_per_sec": queries_per_sec,
                "queries_total": 1000,
                "client_connections": 2,
                "clients_active": 1
            },
            "eventloop": { "total": 12 },
            self.table.to_string(): {
                "serializers": {
                    "shard_0": {
                        "btree-primary": {
                            "keys_read": keys_read,
                            "keys_set": 1,
                            "total_keys_read": keys_read * 100.0,
                            "total_keys_set": 40
                        },
                        "cache": { "in_use_bytes": 4096 }
                    },
                    "serializer": {
                        "serializer_data_extents": 3,
                        "serializer_lba_extents": 1,
                        "serializer_old_garbage_block_bytes": 512,
                        "serializer_bytes_in_use": 10_000_000
                    }
                }
            }
        })
    }

    /// Snapshot where node_a answered and node_b is connected but silent
    pub fn snapshot(&self) -> ClusterSnapshot {
        ClusterSnapshot {
            metadata: self.metadata(),
            servers: BTreeMap::from([
                (
                    self.node_a,
                    SnapshotServer {
                        peer: Some(PeerAddress::new("10.0.0.1:29015")),
                        stats: Some(self.node_document(5.0, 7.0)),
                    },
                ),
                (
                    self.node_b,
                    SnapshotServer { peer: Some(PeerAddress::new("10.0.0.2:29015")), stats: None },
                ),
            ]),
        }
    }
}

/// Service serving the documents stored in `snapshot`
pub fn create_test_service(snapshot: &ClusterSnapshot) -> StatsService {
    let source = SnapshotSource::new(snapshot.documents());
    let collector = StatsCollector::new(Arc::new(source), Duration::from_secs(1));
    StatsService::new(collector, StatsParser::new(), Default::default())
}

/// In-memory log sink for asserting on emitted events
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
