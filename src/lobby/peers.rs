//! 연결 레지스트리

use crate::error::SignalingError;
use crate::state::{Peer, PeerId, PeerSender};
use std::collections::HashMap;

/// 현재 연결된 피어 목록 (peer_id -> Peer)
#[derive(Default)]
pub struct ConnectionRegistry {
    peers: HashMap<PeerId, Peer>,
}

impl ConnectionRegistry {
    /// 새 ID를 발급해 피어 저장
    pub fn insert(&mut self, display_name: String, sender: PeerSender) -> PeerId {
        let mut peer_id = PeerId::random();
        while self.peers.contains_key(&peer_id) {
            peer_id = PeerId::random();
        }
        self.peers
            .insert(peer_id.clone(), Peer::new(peer_id.clone(), display_name, sender));
        peer_id
    }

    pub fn remove(&mut self, peer_id: &PeerId) -> Option<Peer> {
        self.peers.remove(peer_id)
    }

    pub fn get(&self, peer_id: &PeerId) -> Option<&Peer> {
        self.peers.get(peer_id)
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.peers.contains_key(peer_id)
    }

    /// 표시 이름 갱신
    pub fn rename(&mut self, peer_id: &PeerId, name: String) -> Result<(), SignalingError> {
        let peer = self
            .peers
            .get_mut(peer_id)
            .ok_or_else(|| SignalingError::UnknownPeer(peer_id.clone()))?;
        if peer.display_name != name {
            tracing::debug!(peer_id = %peer_id, from = %peer.display_name, to = %name, "Display name updated");
            peer.display_name = name;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }
}
