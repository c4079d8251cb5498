//! 메트릭 집계기: 히스토리에서 윈도우 기반 트래픽/위협/송신자 통계를 계산합니다.
//!
//! 매 tick마다 [`NetworkMetrics`]를 새로 계산하며 이전 스냅샷을 수정하지 않습니다.
//! `now - timestamp < window_ms`인 패킷만 "최근 패킷"으로 집계합니다.
//!
//! `total_packets`/`total_bytes`는 히스토리 용량과 무관한 엔진 수명 누적값입니다.
//! 연결 수, 대역폭 사용률, 지연 시간, 손실률은 패킷 내용과 무관한 합성 게이지입니다.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use netpulse_core::config::GaugeConfig;
use netpulse_core::metrics as m;
use netpulse_core::types::{NetworkMetrics, Packet, TopTalker};

use crate::history::BoundedHistory;
use crate::random::RandomSource;

/// 상위 송신자 최대 개수
pub const TOP_TALKER_LIMIT: usize = 10;

/// 윈도우 기반 메트릭 집계기
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    window_ms: u64,
    gauges: GaugeConfig,
    total_packets: u64,
    total_bytes: u64,
}

impl MetricsAggregator {
    pub fn new(window_ms: u64, gauges: GaugeConfig) -> Self {
        Self {
            window_ms,
            gauges,
            total_packets: 0,
            total_bytes: 0,
        }
    }

    /// 새로 생성된 패킷을 수명 누적 카운터에 반영합니다.
    pub fn record_batch(&mut self, batch: &[Packet]) {
        self.total_packets = self
            .total_packets
            .saturating_add(u64::try_from(batch.len()).unwrap_or(u64::MAX));
        self.total_bytes = self
            .total_bytes
            .saturating_add(batch.iter().map(|p| u64::from(p.size)).sum::<u64>());
    }

    /// 누적 (패킷 수, 바이트 수)
    pub fn totals(&self) -> (u64, u64) {
        (self.total_packets, self.total_bytes)
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// 히스토리와 현재 시각으로 메트릭 스냅샷을 계산합니다.
    ///
    /// 최근 패킷이 없어도 0/빈 목록을 반환하며 실패하지 않습니다.
    /// 합성 게이지는 연결 수, 사용률, 지연 시간, 손실률 순서로 난수를 소비합니다.
    pub fn compute(
        &self,
        history: &BoundedHistory<Packet>,
        now_ms: u64,
        rng: &mut dyn RandomSource,
    ) -> NetworkMetrics {
        let mut metrics = NetworkMetrics {
            total_packets: self.total_packets,
            total_bytes: self.total_bytes,
            ..Default::default()
        };

        let mut recent_count = 0u64;
        let mut recent_bytes = 0u64;
        let mut talkers: Vec<TopTalker> = Vec::new();
        let mut talker_index: HashMap<Ipv4Addr, usize> = HashMap::new();

        for packet in history
            .iter()
            .filter(|p| now_ms.saturating_sub(p.timestamp) < self.window_ms)
        {
            let size = u64::from(packet.size);
            recent_count += 1;
            recent_bytes += size;

            *metrics
                .protocol_distribution
                .entry(packet.protocol)
                .or_insert(0) += 1;
            if let Some(threat_type) = packet.threat_type {
                *metrics.threat_counts.entry(threat_type).or_insert(0) += 1;
            }

            let idx = *talker_index.entry(packet.source_ip).or_insert_with(|| {
                talkers.push(TopTalker {
                    ip: packet.source_ip,
                    packets: 0,
                    bytes: 0,
                    country: packet.country().map(str::to_owned),
                });
                talkers.len() - 1
            });
            if let Some(talker) = talkers.get_mut(idx) {
                talker.packets += 1;
                talker.bytes += size;
            }
        }

        let window_secs = self.window_ms as f64 / 1_000.0;
        metrics.packets_per_second = per_second(recent_count, window_secs);
        metrics.bytes_per_second = per_second(recent_bytes, window_secs);
        metrics.unique_ips = u64::try_from(talkers.len()).unwrap_or(u64::MAX);

        // 안정 정렬: 바이트가 같으면 처음 관측된 순서 유지
        talkers.sort_by(|a, b| b.bytes.cmp(&a.bytes));
        talkers.truncate(TOP_TALKER_LIMIT);
        metrics.top_talkers = talkers;

        self.fill_gauges(&mut metrics, rng);
        metrics
    }

    fn fill_gauges(&self, metrics: &mut NetworkMetrics, rng: &mut dyn RandomSource) {
        let g = &self.gauges;
        let connections = rng.range_u64(u64::from(g.connections_min), u64::from(g.connections_span));
        metrics.active_connections = u32::try_from(connections).unwrap_or(u32::MAX);
        metrics.bandwidth_utilization =
            (g.utilization_floor + rng.next_f64() * g.utilization_span).min(g.utilization_cap);
        metrics.latency = g.latency_min_ms + rng.next_f64() * g.latency_span_ms;
        metrics.packet_loss = rng.next_f64() * g.packet_loss_max;
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(60_000, GaugeConfig::default())
    }
}

fn per_second(value: u64, window_secs: f64) -> u64 {
    if window_secs <= 0.0 {
        return 0;
    }
    (value as f64 / window_secs).round() as u64
}

/// 메트릭 스냅샷을 `metrics` 파사드 게이지로 내보냅니다.
pub fn publish(metrics: &NetworkMetrics, history_len: usize) {
    metrics::gauge!(m::ENGINE_PACKETS_PER_SECOND).set(metrics.packets_per_second as f64);
    metrics::gauge!(m::ENGINE_BYTES_PER_SECOND).set(metrics.bytes_per_second as f64);
    metrics::gauge!(m::ENGINE_UNIQUE_IPS).set(metrics.unique_ips as f64);
    metrics::gauge!(m::ENGINE_HISTORY_SIZE).set(history_len as f64);
    for (protocol, count) in &metrics.protocol_distribution {
        metrics::gauge!(m::ENGINE_PROTOCOL_PACKETS, m::LABEL_PROTOCOL => protocol.as_str())
            .set(*count as f64);
    }
}
