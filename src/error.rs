//! 시그널링 에러 타입
//!
//! 어떤 에러도 클라이언트에게 돌려보내지 않는다. 디스패처가 로그만 남기고 버린다.

use crate::protocol::RoomId;
use crate::state::PeerId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignalingError {
    /// JSON 파싱 실패 또는 필수 필드 누락, 알 수 없는 type
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// 존재하지 않는(이미 닫혔거나 위조된) 방
    #[error("Unknown room: {0}")]
    UnknownRoom(RoomId),

    /// 보낸 피어가 해당 방의 멤버가 아님
    #[error("Peer {peer_id} is not a member of room {room_id}")]
    NotInRoom { peer_id: PeerId, room_id: RoomId },

    #[error("Unknown peer: {0}")]
    UnknownPeer(PeerId),

    /// 피어의 송신 채널이 이미 닫힘
    #[error("Channel closed for peer {0}")]
    ChannelClosed(PeerId),
}
