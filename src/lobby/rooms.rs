//! 방 레지스트리
//!
//! 방 하나는 정확히 두 피어를 묶는다. 메시지 순서는 검증하지 않고 라우팅만 한다.

use super::outbox::Outbox;
use super::peers::ConnectionRegistry;
use crate::error::SignalingError;
use crate::protocol::{RoomId, ServerFrame, ServerMessage, UserType};
use crate::state::PeerId;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;

/// 협상에서의 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

/// 중계할 세션 설명 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Description {
    Offer,
    Answer,
}

/// 방 정보
pub struct Room {
    pub id: RoomId,
    pub offerer: PeerId,
    pub answerer: PeerId,
    pub created_at: Instant,
}

impl Room {
    pub fn role_of(&self, peer_id: &PeerId) -> Option<Role> {
        if *peer_id == self.offerer {
            Some(Role::Offerer)
        } else if *peer_id == self.answerer {
            Some(Role::Answerer)
        } else {
            None
        }
    }

    /// 상대 피어 (멤버가 아니면 None)
    pub fn other(&self, peer_id: &PeerId) -> Option<&PeerId> {
        match self.role_of(peer_id)? {
            Role::Offerer => Some(&self.answerer),
            Role::Answerer => Some(&self.offerer),
        }
    }
}

pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    /// 역방향 조회 (peer_id -> room_id)
    by_peer: HashMap<PeerId, RoomId>,
    next_id: u64,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self {
            rooms: HashMap::new(),
            by_peer: HashMap::new(),
            next_id: 1,
        }
    }
}

impl RoomRegistry {
    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn room_of(&self, peer_id: &PeerId) -> Option<&RoomId> {
        self.by_peer.get(peer_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// 방 생성 후 offerer에게 `send-offer`, answerer에게 `wait-for-offer` 전송
    pub fn create_room(
        &mut self,
        peers: &ConnectionRegistry,
        offerer: PeerId,
        answerer: PeerId,
        outbox: &mut Outbox,
    ) -> RoomId {
        debug_assert!(!self.by_peer.contains_key(&offerer));
        debug_assert!(!self.by_peer.contains_key(&answerer));

        let room_id = RoomId::new(self.next_id.to_string());
        self.next_id += 1;

        if let Some(peer) = peers.get(&offerer) {
            outbox.push(
                peer,
                ServerMessage::SendOffer {
                    room_id: room_id.clone(),
                },
            );
        }
        if let Some(peer) = peers.get(&answerer) {
            outbox.push(
                peer,
                ServerMessage::WaitForOffer {
                    room_id: room_id.clone(),
                },
            );
        }

        tracing::info!(
            room_id = %room_id,
            offerer = %offerer,
            answerer = %answerer,
            "Room created"
        );

        self.by_peer.insert(offerer.clone(), room_id.clone());
        self.by_peer.insert(answerer.clone(), room_id.clone());
        self.rooms.insert(
            room_id.clone(),
            Room {
                id: room_id.clone(),
                offerer,
                answerer,
                created_at: Instant::now(),
            },
        );

        room_id
    }

    /// offer / answer 중계. `name`이 있으면 보낸 피어의 표시 이름을 먼저 갱신한다.
    #[allow(clippy::too_many_arguments)]
    fn relay_description(
        &self,
        peers: &mut ConnectionRegistry,
        kind: Description,
        room_id: &RoomId,
        sdp: Value,
        sender_id: &PeerId,
        name: Option<String>,
        outbox: &mut Outbox,
    ) -> Result<(), SignalingError> {
        let target_id = self.counterpart(room_id, sender_id)?;

        if let Some(name) = name {
            peers.rename(sender_id, name)?;
        }
        let name = peers
            .get(sender_id)
            .map(|peer| peer.display_name.clone())
            .ok_or_else(|| SignalingError::UnknownPeer(sender_id.clone()))?;
        let target = peers
            .get(target_id)
            .ok_or_else(|| SignalingError::UnknownPeer(target_id.clone()))?;

        let room_id = room_id.clone();
        let message = match kind {
            Description::Offer => ServerMessage::Offer { sdp, room_id, name },
            Description::Answer => ServerMessage::Answer { sdp, room_id, name },
        };
        outbox.push(target, message);

        tracing::debug!(from = %sender_id, to = %target_id, kind = ?kind, "Relayed description");
        Ok(())
    }

    pub fn relay_offer(
        &self,
        peers: &mut ConnectionRegistry,
        room_id: &RoomId,
        sdp: Value,
        sender_id: &PeerId,
        name: Option<String>,
        outbox: &mut Outbox,
    ) -> Result<(), SignalingError> {
        self.relay_description(peers, Description::Offer, room_id, sdp, sender_id, name, outbox)
    }

    pub fn relay_answer(
        &self,
        peers: &mut ConnectionRegistry,
        room_id: &RoomId,
        sdp: Value,
        sender_id: &PeerId,
        name: Option<String>,
        outbox: &mut Outbox,
    ) -> Result<(), SignalingError> {
        self.relay_description(peers, Description::Answer, room_id, sdp, sender_id, name, outbox)
    }

    /// ICE 후보 중계
    pub fn relay_candidate(
        &self,
        peers: &ConnectionRegistry,
        room_id: &RoomId,
        candidate: Value,
        sender_id: &PeerId,
        user_type: UserType,
        outbox: &mut Outbox,
    ) -> Result<(), SignalingError> {
        let target_id = self.counterpart(room_id, sender_id)?;
        let target = peers
            .get(target_id)
            .ok_or_else(|| SignalingError::UnknownPeer(target_id.clone()))?;

        outbox.push(
            target,
            ServerMessage::AddIceCandidate {
                candidate,
                room_id: room_id.clone(),
                user_type,
            },
        );

        tracing::debug!(from = %sender_id, to = %target_id, user_type = ?user_type, "Relayed ICE candidate");
        Ok(())
    }

    /// 피어가 속한 방 제거.
    ///
    /// 남은 피어에게 `peer-disconnected` 다음 `lobby`를 보내고 그 ID를 반환한다.
    /// 방이 없으면 아무것도 바꾸지 않고 None.
    pub fn teardown_for_peer(
        &mut self,
        peers: &ConnectionRegistry,
        peer_id: &PeerId,
        message: &str,
        outbox: &mut Outbox,
    ) -> Option<PeerId> {
        let room_id = self.by_peer.remove(peer_id)?;
        let Some(room) = self.rooms.remove(&room_id) else {
            tracing::warn!(peer_id = %peer_id, room_id = %room_id, "Reverse index pointed at missing room");
            return None;
        };

        let other_id = room.other(peer_id)?.clone();
        self.by_peer.remove(&other_id);

        if let Some(other) = peers.get(&other_id) {
            outbox.push(
                other,
                ServerMessage::PeerDisconnected {
                    room_id: room_id.clone(),
                    message: message.to_string(),
                },
            );
            outbox.push(other, ServerFrame::Lobby);
        }

        tracing::info!(
            room_id = %room.id,
            peer_id = %peer_id,
            remaining = %other_id,
            age_ms = room.created_at.elapsed().as_millis() as u64,
            "Room removed due to peer disconnection"
        );

        Some(other_id)
    }

    /// 방이 존재하고 보낸 피어가 멤버일 때 상대 피어 ID
    fn counterpart(&self, room_id: &RoomId, sender_id: &PeerId) -> Result<&PeerId, SignalingError> {
        let room = self
            .rooms
            .get(room_id)
            .ok_or_else(|| SignalingError::UnknownRoom(room_id.clone()))?;
        room.other(sender_id).ok_or_else(|| SignalingError::NotInRoom {
            peer_id: sender_id.clone(),
            room_id: room_id.clone(),
        })
    }
}
