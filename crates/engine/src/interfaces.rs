//! 인터페이스 통계: 새 패킷 일부를 각 인터페이스의 누적 카운터에 반영합니다.
//!
//! 인터페이스마다, 배치의 각 패킷을 독립적으로 확률 `p`(기본 0.3)로 샘플링합니다.
//! - `packets_in += n`, `bytes_in += Σsize`
//! - `packets_out += floor(n × 0.8)`
//! - `bytes_out = max(bytes_out, floor(0.9 × bytes_in))`
//!
//! 네 카운터 모두 단조 비감소이며 포화 산술을 사용합니다.

use netpulse_core::config::InterfaceConfig;
use netpulse_core::metrics as m;
use netpulse_core::types::{NetworkInterface, Packet};

use crate::random::RandomSource;

/// 샘플링한 수신 패킷 대비 송신 패킷 비율
const OUTBOUND_PACKET_RATIO: f64 = 0.8;

/// 누적 수신 바이트 대비 송신 바이트 비율
const OUTBOUND_BYTE_RATIO: f64 = 0.9;

/// 인터페이스 통계 갱신기
#[derive(Debug, Clone)]
pub struct InterfaceStatsUpdater {
    interfaces: Vec<NetworkInterface>,
    sample_probability: f64,
}

impl InterfaceStatsUpdater {
    /// 설정된 인터페이스 목록으로 생성합니다. 모든 카운터는 0에서 시작합니다.
    pub fn new(interfaces: &[InterfaceConfig], sample_probability: f64) -> Self {
        Self {
            interfaces: interfaces
                .iter()
                .map(|i| NetworkInterface::new(i.name.clone(), i.ip))
                .collect(),
            sample_probability,
        }
    }

    /// 새 배치를 각 인터페이스에 반영합니다.
    ///
    /// 난수는 인터페이스 순서, 그 안에서 패킷 순서로 소비됩니다.
    pub fn update(&mut self, batch: &[Packet], rng: &mut dyn RandomSource) {
        for iface in &mut self.interfaces {
            let mut sampled = 0u64;
            let mut sampled_bytes = 0u64;
            for packet in batch {
                if rng.chance(self.sample_probability) {
                    sampled += 1;
                    sampled_bytes += u64::from(packet.size);
                }
            }

            iface.packets_in = iface.packets_in.saturating_add(sampled);
            iface.bytes_in = iface.bytes_in.saturating_add(sampled_bytes);
            iface.packets_out = iface
                .packets_out
                .saturating_add((sampled as f64 * OUTBOUND_PACKET_RATIO).floor() as u64);
            let bytes_out = (iface.bytes_in as f64 * OUTBOUND_BYTE_RATIO).floor() as u64;
            iface.bytes_out = iface.bytes_out.max(bytes_out);

            metrics::gauge!(m::ENGINE_INTERFACE_BYTES_IN, m::LABEL_INTERFACE => iface.name.clone())
                .set(iface.bytes_in as f64);
        }
    }

    pub fn interfaces(&self) -> &[NetworkInterface] {
        &self.interfaces
    }
}
