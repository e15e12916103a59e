//! 애플리케이션 상태 관리

use crate::config::Config;
use crate::lobby::Lobby;
use crate::protocol::ServerFrame;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use uuid::Uuid;

/// 피어 송신 핸들 (소켓 송신 태스크로 연결된 채널)
pub type PeerSender = UnboundedSender<ServerFrame>;

/// 전역 애플리케이션 상태
pub struct AppState {
    /// 연결 레지스트리 + 대기열 + 방 레지스트리 (단일 락)
    pub lobby: Mutex<Lobby>,
    /// 설정
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            lobby: Mutex::new(Lobby::new(config.lobby.clone())),
            config: Arc::new(config),
        }
    }
}

/// 피어 식별자 (UUID v4)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerId(String);

impl PeerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 연결된 피어 정보
pub struct Peer {
    pub id: PeerId,
    /// offer/answer 메시지의 `name`으로 갱신됨
    pub display_name: String,
    pub sender: PeerSender,
    pub connected_at: Instant,
}

impl Peer {
    pub fn new(id: PeerId, display_name: String, sender: PeerSender) -> Self {
        Self {
            id,
            display_name,
            sender,
            connected_at: Instant::now(),
        }
    }
}
