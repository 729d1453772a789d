//! On-disk capture of a cluster's topology and per-node stats documents

use crate::models::{ClusterMetadata, PeerAddress, ServerId, StaticDirectory};
use crate::utils::StatsResult;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSnapshot {
    pub metadata: ClusterMetadata,
    pub servers: BTreeMap<ServerId, SnapshotServer>,
}

/// One server as seen when the snapshot was taken
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotServer {
    /// Peer the server was connected through; `None` when disconnected
    pub peer: Option<PeerAddress>,
    /// Raw stats document; `None` when the node did not answer
    pub stats: Option<Value>,
}

impl ClusterSnapshot {
    pub fn from_json(text: &str) -> StatsResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
        Ok(snapshot)
    }

    /// Directory of the servers that were connected
    pub fn directory(&self) -> StaticDirectory {
        self.servers
            .iter()
            .filter_map(|(id, server)| server.peer.clone().map(|peer| (*id, peer)))
            .collect()
    }

    /// Stats documents keyed by the peer that reported them
    pub fn documents(&self) -> BTreeMap<PeerAddress, Value> {
        self.servers
            .values()
            .filter_map(|server| match (&server.peer, &server.stats) {
                (Some(peer), Some(stats)) => Some((peer.clone(), stats.clone())),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NameDirectory;

    #[test]
    fn test_snapshot_splits_peers_and_documents() {
        let up = ServerId::new_v4();
        let silent = ServerId::new_v4();
        let gone = ServerId::new_v4();
        let text = serde_json::json!({
            "servers": {
                up.to_string(): { "peer": "10.0.0.1:29015", "stats": { "query_engine": {} } },
                silent.to_string(): { "peer": "10.0.0.2:29015", "stats": null },
                gone.to_string(): {}
            }
        })
        .to_string();

        let snapshot = ClusterSnapshot::from_json(&text).unwrap();
        let directory = snapshot.directory();
        assert_eq!(directory.len(), 2);
        assert!(directory.peer_for_server(&gone).is_none());

        let documents = snapshot.documents();
        assert_eq!(documents.len(), 1);
        assert!(documents.contains_key(&PeerAddress::new("10.0.0.1:29015")));
    }
}
