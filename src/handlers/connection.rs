//! 연결 핸들러

use crate::state::{AppState, PeerId, PeerSender};
use std::sync::Arc;

/// 새 연결 처리
pub async fn handle_connection(state: Arc<AppState>, sender: PeerSender) -> PeerId {
    let display_name = state.config.lobby.default_display_name.clone();

    // 락을 쥔 채로 flush: 피어가 받는 순서 = 로비 연산 순서
    let peer_id = {
        let mut lobby = state.lobby.lock().await;
        let (peer_id, outbox) = lobby.register(display_name, sender);
        outbox.flush();
        peer_id
    };

    tracing::info!(peer_id = %peer_id, "New connection established");
    peer_id
}

/// 연결 해제 처리
pub async fn handle_disconnect(state: Arc<AppState>, peer_id: &PeerId) {
    let notified = {
        let mut lobby = state.lobby.lock().await;
        lobby.disconnect(peer_id).flush()
    };

    tracing::info!(peer_id = %peer_id, notified = notified, "Connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handlers::handle_client_text;
    use crate::protocol::{RoomId, ServerFrame, ServerMessage};
    use serde_json::json;
    use std::collections::HashSet;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn pairs_two_connections_and_cleans_up_on_close() {
        let state = Arc::new(AppState::new(Config::default()));
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let p1 = handle_connection(state.clone(), tx1).await;
        assert_eq!(rx1.recv().await, Some(ServerFrame::Lobby));

        let p2 = handle_connection(state.clone(), tx2).await;
        assert_eq!(
            rx1.recv().await,
            Some(ServerFrame::from(ServerMessage::SendOffer {
                room_id: RoomId::new("1")
            }))
        );
        assert_eq!(rx2.recv().await, Some(ServerFrame::Lobby));
        assert_eq!(
            rx2.recv().await,
            Some(ServerFrame::from(ServerMessage::WaitForOffer {
                room_id: RoomId::new("1")
            }))
        );

        handle_disconnect(state.clone(), &p1).await;

        match rx2.recv().await {
            Some(ServerFrame::Message(ServerMessage::PeerDisconnected { room_id, .. })) => {
                assert_eq!(room_id, RoomId::new("1"));
            }
            other => panic!("Expected PeerDisconnected, got {:?}", other),
        }
        assert_eq!(rx2.recv().await, Some(ServerFrame::Lobby));

        let lobby = state.lobby.lock().await;
        assert_eq!(lobby.room_count(), 0);
        assert!(lobby.is_queued(&p2));
    }

    #[tokio::test]
    async fn disconnect_survives_closed_partner_channel() {
        let state = Arc::new(AppState::new(Config::default()));
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();

        let p1 = handle_connection(state.clone(), tx1).await;
        let p2 = handle_connection(state.clone(), tx2).await;
        drop(rx2);

        handle_disconnect(state.clone(), &p1).await;
        handle_disconnect(state.clone(), &p2).await;

        let lobby = state.lobby.lock().await;
        assert_eq!(lobby.peer_count(), 0);
        assert_eq!(lobby.queued_count(), 0);
        assert_eq!(lobby.room_count(), 0);
    }

    #[tokio::test]
    async fn new_connection_takes_configured_display_name() {
        let mut config = Config::default();
        config.lobby.default_display_name = "Guest".to_string();
        let state = Arc::new(AppState::new(config));
        let (tx, _rx) = mpsc::unbounded_channel();

        let peer_id = handle_connection(state.clone(), tx).await;

        let lobby = state.lobby.lock().await;
        assert_eq!(lobby.lookup(&peer_id).unwrap().display_name, "Guest");
    }

    fn message_room(msg: &ServerMessage) -> &RoomId {
        match msg {
            ServerMessage::SendOffer { room_id }
            | ServerMessage::WaitForOffer { room_id }
            | ServerMessage::Offer { room_id, .. }
            | ServerMessage::Answer { room_id, .. }
            | ServerMessage::AddIceCandidate { room_id, .. }
            | ServerMessage::PeerDisconnected { room_id, .. } => room_id,
        }
    }

    /// 받은 프레임 기준으로 지금 속한 방
    fn joined_room(frames: &[ServerFrame]) -> Option<RoomId> {
        let mut room = None;
        for frame in frames {
            match frame {
                ServerFrame::Message(ServerMessage::SendOffer { room_id })
                | ServerFrame::Message(ServerMessage::WaitForOffer { room_id }) => {
                    room = Some(room_id.clone());
                }
                ServerFrame::Message(ServerMessage::PeerDisconnected { .. }) | ServerFrame::Lobby => {
                    room = None;
                }
                _ => {}
            }
        }
        room
    }

    /// 방 배정 전에는 중계가 오지 않고, 닫힌 방의 프레임은 다시 오지 않으며,
    /// `peer-disconnected` 바로 뒤에는 `lobby`가 온다.
    fn assert_frame_order(frames: &[ServerFrame]) {
        let mut assigned = HashSet::new();
        let mut closed = HashSet::new();
        for (i, frame) in frames.iter().enumerate() {
            let ServerFrame::Message(msg) = frame else {
                continue;
            };
            let room_id = message_room(msg);
            assert!(!closed.contains(room_id), "frame for closed room: {:?}", frames);
            match msg {
                ServerMessage::SendOffer { .. } | ServerMessage::WaitForOffer { .. } => {
                    assigned.insert(room_id.clone());
                }
                ServerMessage::PeerDisconnected { .. } => {
                    assert_eq!(frames.get(i + 1), Some(&ServerFrame::Lobby), "{:?}", frames);
                    closed.insert(room_id.clone());
                }
                _ => assert!(assigned.contains(room_id), "relay before room: {:?}", frames),
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_connects_relays_and_disconnects_stay_consistent() {
        let state = Arc::new(AppState::new(Config::default()));

        let mut tasks = Vec::new();
        for i in 0..64usize {
            let state = state.clone();
            tasks.push(tokio::spawn(async move {
                let (tx, mut rx) = mpsc::unbounded_channel();
                let peer_id = handle_connection(state.clone(), tx).await;
                let mut seen = Vec::new();

                for _ in 0..3 {
                    tokio::task::yield_now().await;
                    while let Ok(frame) = rx.try_recv() {
                        seen.push(frame);
                    }
                    if let Some(room_id) = joined_room(&seen) {
                        let text = json!({
                            "type": "offer",
                            "payload": {"sdp": "v=0", "roomId": room_id.to_string(), "name": format!("peer-{}", i)}
                        })
                        .to_string();
                        handle_client_text(&state, &peer_id, &text).await;
                    }
                }

                let leaves = i % 3 == 0;
                if leaves {
                    handle_disconnect(state.clone(), &peer_id).await;
                }
                (peer_id, rx, seen, leaves)
            }));
        }

        let mut outcomes = Vec::new();
        for task in tasks {
            outcomes.push(task.await.unwrap());
        }

        let lobby = state.lobby.lock().await;
        let mut survivors = 0;
        let mut in_rooms = 0;

        for (peer_id, mut rx, mut seen, leaves) in outcomes {
            if leaves {
                assert!(lobby.lookup(&peer_id).is_none());
                assert!(!lobby.is_queued(&peer_id));
                assert!(lobby.room_of(&peer_id).is_none());
                continue;
            }
            survivors += 1;

            while let Ok(frame) = rx.try_recv() {
                seen.push(frame);
            }
            assert_frame_order(&seen);

            let last_state = seen.iter().rev().find(|frame| {
                matches!(
                    frame,
                    ServerFrame::Lobby
                        | ServerFrame::Message(ServerMessage::SendOffer { .. })
                        | ServerFrame::Message(ServerMessage::WaitForOffer { .. })
                        | ServerFrame::Message(ServerMessage::PeerDisconnected { .. })
                )
            });

            match lobby.room_of(&peer_id) {
                Some(room) => {
                    in_rooms += 1;
                    assert!(!lobby.is_queued(&peer_id));
                    assert!(lobby.lookup(&room.offerer).is_some());
                    assert!(lobby.lookup(&room.answerer).is_some());

                    let expected = if room.offerer == peer_id {
                        ServerMessage::SendOffer { room_id: room.id.clone() }
                    } else {
                        ServerMessage::WaitForOffer { room_id: room.id.clone() }
                    };
                    assert_eq!(last_state, Some(&ServerFrame::from(expected)));
                }
                None => {
                    assert!(lobby.is_queued(&peer_id));
                    assert_eq!(last_state, Some(&ServerFrame::Lobby));
                }
            }
        }

        // 모든 방의 두 멤버가 살아 있는 피어
        assert_eq!(lobby.room_count() * 2, in_rooms);
        assert_eq!(lobby.peer_count(), survivors);
        assert!(lobby.queued_count() <= 1);
    }
}
