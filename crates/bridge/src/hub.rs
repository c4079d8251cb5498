//! 구독자 fan-out 허브
//!
//! 각 구독자는 용량이 제한된 mpsc 채널을 가집니다. 브로드캐스트는 `try_send`로
//! 전달하므로 느린 구독자 하나가 캡처 루프나 다른 구독자를 막지 않습니다.
//!
//! - 큐가 가득 찬 구독자: 이번 메시지만 건너뜀
//! - 채널이 닫힌 구독자: 레지스트리에서 제거

use bytes::Bytes;
use tokio::sync::{Mutex, mpsc};
use tokio::sync::mpsc::error::TrySendError;

use netpulse_core::metrics as m;

/// 구독자 식별자
pub type SubscriberId = u64;

/// 구독자 하나
struct Subscriber {
    id: SubscriberId,
    tx: mpsc::Sender<Bytes>,
}

/// 브로드캐스트 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// 전달된 구독자 수
    pub delivered: usize,
    /// 큐가 가득 차 건너뛴 구독자 수
    pub skipped: usize,
    /// 닫혀서 제거된 구독자 수
    pub removed: usize,
}

struct HubState {
    subscribers: Vec<Subscriber>,
    next_id: SubscriberId,
}

/// 구독자 레지스트리
pub struct BroadcastHub {
    state: Mutex<HubState>,
    buffer: usize,
}

impl BroadcastHub {
    /// 구독자별 큐 크기를 지정하여 허브를 만듭니다.
    pub fn new(buffer: usize) -> Self {
        Self {
            state: Mutex::new(HubState {
                subscribers: Vec::new(),
                next_id: 0,
            }),
            buffer: buffer.max(1),
        }
    }

    /// 새 구독자를 등록하고 수신 채널을 반환합니다.
    pub async fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let mut state = self.state.lock().await;
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push(Subscriber { id, tx });
        metrics::gauge!(m::BRIDGE_SUBSCRIBERS).set(state.subscribers.len() as f64);
        (id, rx)
    }

    /// 구독자를 제거합니다. 제거되었으면 `true`.
    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut state = self.state.lock().await;
        let before = state.subscribers.len();
        state.subscribers.retain(|s| s.id != id);
        metrics::gauge!(m::BRIDGE_SUBSCRIBERS).set(state.subscribers.len() as f64);
        state.subscribers.len() < before
    }

    /// 모든 구독자에게 메시지를 전달합니다.
    ///
    /// 한 구독자의 실패는 다른 구독자에게 영향을 주지 않습니다.
    pub async fn broadcast(&self, message: Bytes) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut state = self.state.lock().await;

        state.subscribers.retain(|sub| match sub.tx.try_send(message.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                report.skipped += 1;
                metrics::counter!(m::BRIDGE_SEND_FAILURES_TOTAL).increment(1);
                tracing::warn!(subscriber = sub.id, "subscriber queue full, message skipped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                report.removed += 1;
                metrics::counter!(m::BRIDGE_SEND_FAILURES_TOTAL).increment(1);
                tracing::debug!(subscriber = sub.id, "subscriber channel closed, removing");
                false
            }
        });

        if report.removed > 0 {
            metrics::gauge!(m::BRIDGE_SUBSCRIBERS).set(state.subscribers.len() as f64);
        }
        report
    }

    /// 현재 구독자 수
    pub async fn len(&self) -> usize {
        self.state.lock().await.subscribers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}
