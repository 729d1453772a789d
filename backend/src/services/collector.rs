//! Raw stats collection
//!
//! Fetches one filtered monitor document per peer, in parallel, each bounded by
//! the configured timeout. The filter is compiled once per collection pass. A node that times out or fails is recorded with no
//! document so the report can flag it instead of failing as a whole.

use crate::models::{PeerAddress, ServerId};
use crate::services::stats::{CompiledFilter, StatsFilter};
use crate::utils::StatsResult;
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Source of one node's monitor document
#[async_trait]
pub trait NodeStatsSource: Send + Sync {
    async fn fetch(
        &self,
        server_id: ServerId,
        peer: &PeerAddress,
        filter: &CompiledFilter,
    ) -> anyhow::Result<Value>;
}

/// Parallel collector over a `NodeStatsSource`
#[derive(Clone)]
pub struct StatsCollector {
    source: Arc<dyn NodeStatsSource>,
    timeout: Duration,
}

impl StatsCollector {
    pub fn new(source: Arc<dyn NodeStatsSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Collect from every peer; the result has one key per requested server
    ///
    /// Fails only when the filter does not compile, before any node is asked.
    pub async fn collect(
        &self,
        filter: &StatsFilter,
        peers: &[(ServerId, PeerAddress)],
    ) -> StatsResult<BTreeMap<ServerId, Option<Value>>> {
        let filter = Arc::new(filter.compile()?);
        let mut tasks = JoinSet::new();

        for (server_id, peer) in peers.iter().cloned() {
            let source = Arc::clone(&self.source);
            let filter = Arc::clone(&filter);
            let timeout = self.timeout;
            tasks.spawn(async move {
                let result = tokio::time::timeout(timeout, source.fetch(server_id, &peer, &filter)).await;
                let document = match result {
                    Ok(Ok(document)) => Some(document),
                    Ok(Err(e)) => {
                        warn!("Failed to fetch stats from server {} ({}): {}", server_id, peer, e);
                        None
                    },
                    Err(_) => {
                        warn!("Timed out after {:?} fetching stats from server {} ({})", timeout, server_id, peer);
                        None
                    },
                };
                (server_id, document)
            });
        }

        let mut documents: BTreeMap<ServerId, Option<Value>> =
            peers.iter().map(|(server_id, _)| (*server_id, None)).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((server_id, document)) => {
                    documents.insert(server_id, document);
                },
                Err(e) => warn!("Stats fetch task failed: {}", e),
            }
        }

        debug!(
            "Collected stats from {}/{} servers",
            documents.values().filter(|doc| doc.is_some()).count(),
            documents.len()
        );
        Ok(documents)
    }
}

/// Source serving stored documents, e.g. from a `ClusterSnapshot`
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    documents: BTreeMap<PeerAddress, Value>,
}

impl SnapshotSource {
    pub fn new(documents: BTreeMap<PeerAddress, Value>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl NodeStatsSource for SnapshotSource {
    async fn fetch(
        &self,
        server_id: ServerId,
        peer: &PeerAddress,
        filter: &CompiledFilter,
    ) -> anyhow::Result<Value> {
        let document = self
            .documents
            .get(peer)
            .ok_or_else(|| anyhow!("no stats recorded for server {} at {}", server_id, peer))?;
        Ok(filter.apply(document))
    }
}
