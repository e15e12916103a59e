//! WebRTC 시그널링 디스패처
//!
//! 실패는 모두 조용히 버린다. 보낸 쪽에는 아무 응답도 가지 않는다.

use crate::error::SignalingError;
use crate::lobby::{Lobby, Outbox};
use crate::protocol::ClientMessage;
use crate::state::{AppState, PeerId};

/// 소켓에서 받은 텍스트 프레임 처리
pub async fn handle_client_text(state: &AppState, peer_id: &PeerId, text: &str) {
    // 파싱은 락 밖에서
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            let err = SignalingError::from(e);
            tracing::debug!(peer_id = %peer_id, error = %err, "Dropped client message");
            return;
        }
    };

    let mut lobby = state.lobby.lock().await;
    let mut outbox = Outbox::new();
    match dispatch(&mut lobby, peer_id, msg, &mut outbox) {
        Ok(()) => {
            outbox.flush();
        }
        Err(err) => {
            tracing::debug!(peer_id = %peer_id, error = %err, "Dropped client message");
        }
    }
}

/// 메시지 종류별로 로비 중계 연산 호출
pub fn dispatch(
    lobby: &mut Lobby,
    peer_id: &PeerId,
    msg: ClientMessage,
    outbox: &mut Outbox,
) -> Result<(), SignalingError> {
    match msg {
        ClientMessage::Offer { sdp, room_id, name } => {
            lobby.relay_offer(peer_id, &room_id, sdp, name, outbox)
        }
        ClientMessage::Answer { sdp, room_id, name } => {
            lobby.relay_answer(peer_id, &room_id, sdp, name, outbox)
        }
        ClientMessage::AddIceCandidate {
            candidate,
            room_id,
            user_type,
        } => lobby.relay_candidate(peer_id, &room_id, candidate, user_type, outbox),
    }
}
