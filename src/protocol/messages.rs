//! 클라이언트-서버 메시지 프로토콜 정의

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// 대기 상태로 돌아갈 때 보내는 봉투 없는 텍스트
pub const LOBBY_SENTINEL: &str = "lobby";

/// 방 식별자 (프로세스 단위 증가 카운터의 10진 문자열)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[allow(dead_code)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ICE 후보를 만든 쪽
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Sender,
    Receiver,
}

/// 클라이언트 → 서버 메시지
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    // WebRTC Signaling
    Offer {
        sdp: Value,
        room_id: RoomId,
        #[serde(default)]
        name: Option<String>,
    },
    Answer {
        sdp: Value,
        room_id: RoomId,
        #[serde(default)]
        name: Option<String>,
    },
    AddIceCandidate {
        candidate: Value,
        room_id: RoomId,
        user_type: UserType,
    },
}

/// 서버 → 클라이언트 메시지
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    // Pairing
    SendOffer {
        room_id: RoomId,
    },
    WaitForOffer {
        room_id: RoomId,
    },

    // WebRTC Signaling
    Offer {
        sdp: Value,
        room_id: RoomId,
        name: String,
    },
    Answer {
        sdp: Value,
        room_id: RoomId,
        name: String,
    },
    AddIceCandidate {
        candidate: Value,
        room_id: RoomId,
        user_type: UserType,
    },

    // Room Events
    PeerDisconnected {
        room_id: RoomId,
        message: String,
    },
}

/// 소켓으로 나가는 한 프레임
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    /// `"lobby"` 텍스트 그대로
    Lobby,
    /// JSON 봉투 메시지
    Message(ServerMessage),
}

impl ServerFrame {
    /// 텍스트 프레임으로 직렬화
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        match self {
            ServerFrame::Lobby => Ok(LOBBY_SENTINEL.to_string()),
            ServerFrame::Message(msg) => serde_json::to_string(msg),
        }
    }
}

impl From<ServerMessage> for ServerFrame {
    fn from(msg: ServerMessage) -> Self {
        ServerFrame::Message(msg)
    }
}
