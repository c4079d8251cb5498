//! 패킷 생성기: 무작위 주소/프로토콜/크기를 가진 합성 패킷을 만듭니다.
//!
//! 난수 소비 순서: 프로토콜, 출발지 주소(4 옥텟), 목적지 주소(4 옥텟),
//! 출발지 포트, 목적지 포트, 크기, 국가, ISP, 분류 규칙, TCP 플래그.

use std::net::Ipv4Addr;

use netpulse_core::config::GeneratorConfig;
use netpulse_core::types::{GeoLocation, Packet, Protocol, TcpFlag};

use crate::classifier::ThreatClassifier;
use crate::random::RandomSource;

/// 전체 포트 범위 폭 (`[0, 65535]`)
const PORT_SPAN: u64 = 65_536;

/// 합성 패킷 생성기
#[derive(Debug, Clone)]
pub struct PacketGenerator {
    config: GeneratorConfig,
}

impl PacketGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// 분류까지 끝난 패킷 하나를 생성합니다. 실패하지 않습니다.
    pub fn generate(
        &self,
        classifier: &ThreatClassifier,
        rng: &mut dyn RandomSource,
        now_ms: u64,
    ) -> Packet {
        let protocol = Protocol::ALL[rng.index(Protocol::ALL.len())];
        let source_ip = random_ipv4(rng);
        let destination_ip = random_ipv4(rng);
        let source_port = self.random_port(rng);
        let destination_port = self.random_port(rng);
        let size = self.random_size(rng);
        let country = pick_string(&self.config.countries, rng);
        let isp = pick_string(&self.config.isps, rng);

        let mut packet = Packet {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now_ms,
            source_ip,
            destination_ip,
            source_port,
            destination_port,
            protocol,
            size,
            flags: None,
            threat_level: Default::default(),
            threat_type: None,
            geo: Some(GeoLocation { country, isp }),
        };

        let classification = classifier.classify(&packet, rng);
        packet.threat_level = classification.level;
        packet.threat_type = classification.threat_type;

        if protocol == Protocol::Tcp {
            packet.flags = Some(self.random_flags(rng));
        }

        packet
    }

    /// 잘 알려진 포트 목록 또는 전체 범위에서 포트를 고릅니다.
    fn random_port(&self, rng: &mut dyn RandomSource) -> u16 {
        if rng.chance(self.config.well_known_port_probability) {
            let ports = &self.config.well_known_ports;
            ports.get(rng.index(ports.len())).copied().unwrap_or(0)
        } else {
            u16::try_from(rng.range_u64(0, PORT_SPAN)).unwrap_or(u16::MAX)
        }
    }

    fn random_size(&self, rng: &mut dyn RandomSource) -> u32 {
        let size = rng.range_u64(
            u64::from(self.config.min_size),
            u64::from(self.config.size_span),
        );
        u32::try_from(size).unwrap_or(u32::MAX)
    }

    fn random_flags(&self, rng: &mut dyn RandomSource) -> Vec<TcpFlag> {
        TcpFlag::ALL
            .into_iter()
            .filter(|_| rng.chance(self.config.tcp_flag_probability))
            .collect()
    }
}

impl Default for PacketGenerator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

fn random_ipv4(rng: &mut dyn RandomSource) -> Ipv4Addr {
    let mut octets = [0u8; 4];
    for octet in &mut octets {
        *octet = u8::try_from(rng.range_u64(0, 256)).unwrap_or(u8::MAX);
    }
    Ipv4Addr::from(octets)
}

fn pick_string(items: &[String], rng: &mut dyn RandomSource) -> String {
    items
        .get(rng.index(items.len()))
        .cloned()
        .unwrap_or_default()
}
