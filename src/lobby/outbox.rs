//! 로비 연산 중 보낼 메시지 모음
//!
//! 연산은 소켓을 직접 건드리지 않고 프레임을 여기 모은다.
//! 핸들러는 로비 락을 쥔 채로 `flush` 한다. 채널은 무제한이라 전송이 블로킹되지 않고,
//! 한 피어가 받는 프레임 순서는 로비 연산 순서와 같다.

use crate::error::SignalingError;
use crate::protocol::ServerFrame;
use crate::state::{Peer, PeerId, PeerSender};

struct Delivery {
    peer_id: PeerId,
    sender: PeerSender,
    frame: ServerFrame,
}

#[derive(Default)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, peer: &Peer, frame: impl Into<ServerFrame>) {
        self.deliveries.push(Delivery {
            peer_id: peer.id.clone(),
            sender: peer.sender.clone(),
            frame: frame.into(),
        });
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// 모아 둔 프레임 전송. 닫힌 채널은 무시하고 전달 성공 수를 돌려준다.
    pub fn flush(self) -> usize {
        let mut delivered = 0;
        for delivery in self.deliveries {
            match delivery.sender.send(delivery.frame) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    let err = SignalingError::ChannelClosed(delivery.peer_id);
                    tracing::debug!(error = %err, "Dropped outbound frame");
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn flush_skips_closed_channels() {
        let (tx_open, mut rx_open) = mpsc::unbounded_channel();
        let (tx_closed, rx_closed) = mpsc::unbounded_channel();
        drop(rx_closed);

        let open = Peer::new(PeerId::from("open"), "a".to_string(), tx_open);
        let closed = Peer::new(PeerId::from("closed"), "b".to_string(), tx_closed);

        let mut outbox = Outbox::new();
        outbox.push(&closed, ServerFrame::Lobby);
        outbox.push(&open, ServerFrame::Lobby);
        assert_eq!(outbox.len(), 2);

        assert_eq!(outbox.flush(), 1);
        assert_eq!(rx_open.try_recv().unwrap(), ServerFrame::Lobby);
    }
}
