//! 환경 변수 기반 설정 관리

use std::env;

/// 서버 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    /// 허용 Origin 목록 (`*` 하나면 전체 허용)
    pub cors_origins: Vec<String>,
    pub lobby: LobbyConfig,
    pub log_level: String,
}

/// 로비 / 매칭 설정
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// 새 피어에게 부여하는 기본 표시 이름
    pub default_display_name: String,
    /// 상대가 나갔을 때 남은 피어를 다시 대기열에 넣을지 여부
    pub requeue_on_peer_left: bool,
    /// `peer-disconnected` 알림 문구
    pub peer_disconnected_message: String,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            default_display_name: "Anonymous".to_string(),
            requeue_on_peer_left: true,
            peer_disconnected_message: "Your peer has disconnected".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            cors_origins: vec!["*".to_string()],
            lobby: LobbyConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = LobbyConfig::default();

        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            cors_origins: parse_origins(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            ),
            lobby: LobbyConfig {
                default_display_name: env::var("DEFAULT_DISPLAY_NAME")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(defaults.default_display_name),
                requeue_on_peer_left: env::var("REQUEUE_ON_PEER_LEFT")
                    .map(|v| v != "false")
                    .unwrap_or(defaults.requeue_on_peer_left),
                peer_disconnected_message: env::var("PEER_DISCONNECTED_MESSAGE")
                    .unwrap_or(defaults.peer_disconnected_message),
            },
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// 모든 Origin 허용 여부
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
