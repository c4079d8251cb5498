//! 히스토리 저장소: 용량 제한이 있는 FIFO 버퍼
//!
//! [`BoundedHistory`]는 삽입 순서를 유지하며, 용량을 넘으면 가장 오래된
//! 엔트리부터 제거합니다. 저장된 엔트리는 재정렬되거나 수정되지 않습니다.
//! [`HistoryStore`]는 패킷 히스토리와 알림 히스토리를 함께 보관합니다.

use std::collections::VecDeque;

use netpulse_core::types::{Packet, ThreatAlert};

/// 용량 제한 FIFO 버퍼
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    items: VecDeque<T>,
    capacity: usize,
    /// 축출된 엔트리 수 (통계용)
    evicted: u64,
}

impl<T> BoundedHistory<T> {
    /// 새 버퍼를 생성합니다. 용량 0은 1로 취급합니다.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity.min(10_000)),
            capacity,
            evicted: 0,
        }
    }

    /// 엔트리를 꼬리에 추가합니다. 축출이 발생하면 `true`를 반환합니다.
    pub fn push(&mut self, item: T) -> bool {
        self.items.push_back(item);
        if self.items.len() > self.capacity {
            self.items.pop_front();
            self.evicted += 1;
            return true;
        }
        false
    }

    /// 여러 엔트리를 순서대로 추가하고 축출된 개수를 반환합니다.
    pub fn extend(&mut self, items: impl IntoIterator<Item = T>) -> usize {
        let mut evicted = 0;
        for item in items {
            if self.push(item) {
                evicted += 1;
            }
        }
        evicted
    }

    /// 저장된 엔트리를 오래된 순서로 순회합니다.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// 가장 최근에 추가된 엔트리
    pub fn latest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 지금까지 축출된 엔트리 수
    pub fn evicted_count(&self) -> u64 {
        self.evicted
    }
}

impl<T: Clone> BoundedHistory<T> {
    /// 최근 `n`개 엔트리를 오래된 순서로 복사해 반환합니다. 버퍼는 변경하지 않습니다.
    pub fn recent(&self, n: usize) -> Vec<T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip).cloned().collect()
    }
}

/// 패킷/알림 히스토리 저장소
#[derive(Debug, Clone)]
pub struct HistoryStore {
    packets: BoundedHistory<Packet>,
    alerts: BoundedHistory<ThreatAlert>,
}

impl HistoryStore {
    pub fn new(packet_capacity: usize, alert_capacity: usize) -> Self {
        Self {
            packets: BoundedHistory::new(packet_capacity),
            alerts: BoundedHistory::new(alert_capacity),
        }
    }

    /// 새 패킷 배치를 추가합니다.
    pub fn append_packets(&mut self, packets: impl IntoIterator<Item = Packet>) {
        let evicted = self.packets.extend(packets);
        if evicted > 0 {
            tracing::debug!(
                evicted,
                total_evicted = self.packets.evicted_count(),
                capacity = self.packets.capacity(),
                "packet history full, evicted oldest entries"
            );
        }
    }

    /// 알림 하나를 추가합니다.
    pub fn append_alert(&mut self, alert: ThreatAlert) {
        if self.alerts.push(alert) {
            tracing::debug!(
                total_evicted = self.alerts.evicted_count(),
                capacity = self.alerts.capacity(),
                "alert history full, evicted oldest alert"
            );
        }
    }

    pub fn recent_packets(&self, n: usize) -> Vec<Packet> {
        self.packets.recent(n)
    }

    pub fn recent_alerts(&self, n: usize) -> Vec<ThreatAlert> {
        self.alerts.recent(n)
    }

    pub fn packets(&self) -> &BoundedHistory<Packet> {
        &self.packets
    }

    pub fn alerts(&self) -> &BoundedHistory<ThreatAlert> {
        &self.alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_within_capacity_keeps_everything() {
        let mut history = BoundedHistory::new(3);
        assert!(!history.push(1));
        assert!(!history.push(2));
        assert_eq!(history.len(), 2);
        assert_eq!(history.evicted_count(), 0);
    }

    #[test]
    fn push_past_capacity_evicts_oldest() {
        let mut history = BoundedHistory::new(3);
        for i in 1..=3 {
            history.push(i);
        }
        assert!(history.push(4));
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(history.evicted_count(), 1);
    }

    #[test]
    fn extend_reports_evictions() {
        let mut history = BoundedHistory::new(5);
        assert_eq!(history.extend(0..4), 0);
        assert_eq!(history.extend(4..10), 5);
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![5, 6, 7, 8, 9]);
        assert_eq!(history.latest(), Some(&9));
    }

    #[test]
    fn recent_returns_tail_without_mutation() {
        let mut history = BoundedHistory::new(10);
        history.extend(0..8);
        assert_eq!(history.recent(3), vec![5, 6, 7]);
        assert_eq!(history.recent(100).len(), 8);
        assert_eq!(history.recent(0), Vec::<i32>::new());
        assert_eq!(history.len(), 8);
    }

    #[test]
    fn zero_capacity_is_treated_as_one() {
        let mut history = BoundedHistory::new(0);
        history.push("a");
        history.push("b");
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Some(&"b"));
    }

    #[test]
    fn store_keeps_independent_buffers() {
        let store = HistoryStore::new(1_000, 50);
        assert_eq!(store.packets().capacity(), 1_000);
        assert_eq!(store.alerts().capacity(), 50);
        assert!(store.recent_packets(100).is_empty());
        assert!(store.recent_alerts(10).is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn length_never_exceeds_capacity(
                capacity in 1usize..64,
                batches in proptest::collection::vec(0usize..40, 0..30),
            ) {
                let mut history = BoundedHistory::new(capacity);
                let mut pushed = 0usize;
                for batch in batches {
                    history.extend(pushed..pushed + batch);
                    pushed += batch;
                    prop_assert!(history.len() <= capacity);
                }
                prop_assert_eq!(history.len(), pushed.min(capacity));
                prop_assert_eq!(history.evicted_count() as usize, pushed.saturating_sub(capacity));
                // 남은 엔트리는 가장 최근에 추가된 것들이며 순서가 유지됨
                let expected: Vec<usize> = (pushed.saturating_sub(capacity)..pushed).collect();
                prop_assert_eq!(history.iter().copied().collect::<Vec<_>>(), expected);
            }
        }
    }
}
