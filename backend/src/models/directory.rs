use crate::models::{PeerAddress, ServerId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps stable server ids to the peers currently connected for them
pub trait NameDirectory: Send + Sync {
    /// Every server that currently has a live peer
    fn server_peers(&self) -> Vec<(ServerId, PeerAddress)>;

    fn peer_for_server(&self, server_id: &ServerId) -> Option<PeerAddress>;
}

/// Directory backed by a fixed server → peer map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticDirectory {
    peers: BTreeMap<ServerId, PeerAddress>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, server_id: ServerId, peer: PeerAddress) {
        self.peers.insert(server_id, peer);
    }

    pub fn with_peer(mut self, server_id: ServerId, peer: PeerAddress) -> Self {
        self.insert(server_id, peer);
        self
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl FromIterator<(ServerId, PeerAddress)> for StaticDirectory {
    fn from_iter<I: IntoIterator<Item = (ServerId, PeerAddress)>>(iter: I) -> Self {
        Self { peers: iter.into_iter().collect() }
    }
}

impl NameDirectory for StaticDirectory {
    fn server_peers(&self) -> Vec<(ServerId, PeerAddress)> {
        self.peers.iter().map(|(id, peer)| (*id, peer.clone())).collect()
    }

    fn peer_for_server(&self, server_id: &ServerId) -> Option<PeerAddress> {
        self.peers.get(server_id).cloned()
    }
}
