//! 로비: 연결 레지스트리, 매칭 대기열, 방 레지스트리
//!
//! 세 구조는 `AppState`의 락 하나로 함께 보호된다.
//! 모든 연산은 `&mut Lobby` 위에서 끝나고, 나갈 메시지는 `Outbox`로 돌려준다.

pub mod outbox;
pub mod peers;
pub mod queue;
pub mod rooms;

pub use outbox::Outbox;
pub use peers::ConnectionRegistry;
pub use queue::PairingQueue;
pub use rooms::{Room, RoomRegistry};

use crate::config::LobbyConfig;
use crate::error::SignalingError;
use crate::protocol::{RoomId, ServerFrame, UserType};
use crate::state::{Peer, PeerId, PeerSender};
use serde_json::Value;

pub struct Lobby {
    config: LobbyConfig,
    peers: ConnectionRegistry,
    queue: PairingQueue,
    rooms: RoomRegistry,
}

impl Lobby {
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            peers: ConnectionRegistry::default(),
            queue: PairingQueue::default(),
            rooms: RoomRegistry::default(),
        }
    }

    /// 새 연결 등록: ID 발급, 대기열 추가, `lobby` 전송 후 매칭 시도
    pub fn register(&mut self, display_name: String, sender: PeerSender) -> (PeerId, Outbox) {
        let peer_id = self.peers.insert(display_name, sender);
        self.queue.enqueue(peer_id.clone());

        let mut outbox = Outbox::new();
        if let Some(peer) = self.peers.get(&peer_id) {
            outbox.push(peer, ServerFrame::Lobby);
        }
        self.drain(&mut outbox);

        (peer_id, outbox)
    }

    /// 레지스트리와 대기열에서 피어 제거
    pub fn unregister(&mut self, peer_id: &PeerId) -> Option<Peer> {
        let peer = self.peers.remove(peer_id)?;
        self.queue.remove(peer_id);
        Some(peer)
    }

    #[allow(dead_code)]
    pub fn lookup(&self, peer_id: &PeerId) -> Option<&Peer> {
        self.peers.get(peer_id)
    }

    /// 연결 종료 처리: 제거 → 방 정리 → (설정 시) 남은 피어 재대기 및 매칭
    pub fn disconnect(&mut self, peer_id: &PeerId) -> Outbox {
        let mut outbox = Outbox::new();

        let Some(peer) = self.unregister(peer_id) else {
            return outbox;
        };

        let remaining = self.rooms.teardown_for_peer(
            &self.peers,
            peer_id,
            &self.config.peer_disconnected_message,
            &mut outbox,
        );

        if let Some(other_id) = remaining {
            if self.config.requeue_on_peer_left && self.peers.contains(&other_id) {
                self.queue.enqueue(other_id.clone());
                tracing::info!(peer_id = %other_id, "Peer returned to queue");
                self.drain(&mut outbox);
            }
        }

        tracing::debug!(
            peer_id = %peer_id,
            session_ms = peer.connected_at.elapsed().as_millis() as u64,
            "Peer unregistered"
        );

        outbox
    }

    /// 대기열에서 짝을 지을 수 있는 만큼 방 생성
    pub fn drain(&mut self, outbox: &mut Outbox) -> usize {
        let peers = &self.peers;
        let rooms = &mut self.rooms;
        self.queue.drain(
            |id| peers.contains(id),
            |offerer, answerer| {
                rooms.create_room(peers, offerer, answerer, outbox);
            },
        )
    }

    pub fn relay_offer(
        &mut self,
        sender_id: &PeerId,
        room_id: &RoomId,
        sdp: Value,
        name: Option<String>,
        outbox: &mut Outbox,
    ) -> Result<(), SignalingError> {
        self.rooms
            .relay_offer(&mut self.peers, room_id, sdp, sender_id, name, outbox)
    }

    pub fn relay_answer(
        &mut self,
        sender_id: &PeerId,
        room_id: &RoomId,
        sdp: Value,
        name: Option<String>,
        outbox: &mut Outbox,
    ) -> Result<(), SignalingError> {
        self.rooms
            .relay_answer(&mut self.peers, room_id, sdp, sender_id, name, outbox)
    }

    pub fn relay_candidate(
        &self,
        sender_id: &PeerId,
        room_id: &RoomId,
        candidate: Value,
        user_type: UserType,
        outbox: &mut Outbox,
    ) -> Result<(), SignalingError> {
        self.rooms
            .relay_candidate(&self.peers, room_id, candidate, sender_id, user_type, outbox)
    }

    #[allow(dead_code)]
    pub fn room_of(&self, peer_id: &PeerId) -> Option<&Room> {
        self.rooms.room_of(peer_id).and_then(|id| self.rooms.get(id))
    }

    #[allow(dead_code)]
    pub fn is_queued(&self, peer_id: &PeerId) -> bool {
        self.queue.contains(peer_id)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
