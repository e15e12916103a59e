//! 매칭 대기열
//!
//! 가장 최근에 들어온 두 피어부터 짝을 짓는다 (LIFO).

use crate::state::PeerId;

#[derive(Default)]
pub struct PairingQueue {
    ids: Vec<PeerId>,
}

impl PairingQueue {
    /// 대기열에 추가. 이미 있으면 무시하고 false 반환
    pub fn enqueue(&mut self, peer_id: PeerId) -> bool {
        if self.ids.contains(&peer_id) {
            return false;
        }
        self.ids.push(peer_id);
        true
    }

    pub fn remove(&mut self, peer_id: &PeerId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| id != peer_id);
        self.ids.len() != before
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.ids.contains(peer_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// 두 명 미만이 남을 때까지 짝 짓기.
    ///
    /// `is_live`가 false인 ID는 버리고 나머지 하나는 다시 넣는다.
    /// 짝이 되면 `on_pair(offerer, answerer)` 호출 (먼저 들어온 쪽이 offerer).
    /// 매 반복마다 대기열이 최소 하나 줄어들기 때문에 반복 횟수는 대기열 길이로 제한된다.
    pub fn drain<L, P>(&mut self, is_live: L, mut on_pair: P) -> usize
    where
        L: Fn(&PeerId) -> bool,
        P: FnMut(PeerId, PeerId),
    {
        let mut paired = 0;

        while self.ids.len() >= 2 {
            let (Some(newest), Some(older)) = (self.ids.pop(), self.ids.pop()) else {
                break;
            };

            match (is_live(&older), is_live(&newest)) {
                (true, true) => {
                    on_pair(older, newest);
                    paired += 1;
                }
                (true, false) => {
                    tracing::debug!(peer_id = %newest, "Discarded stale queue entry");
                    self.ids.push(older);
                }
                (false, true) => {
                    tracing::debug!(peer_id = %older, "Discarded stale queue entry");
                    self.ids.push(newest);
                }
                (false, false) => {
                    tracing::debug!(first = %older, second = %newest, "Discarded stale queue entries");
                }
            }
        }

        paired
    }
}
