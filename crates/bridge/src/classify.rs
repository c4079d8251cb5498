//! 브리지 분류 규칙
//!
//! 브리지는 엔진의 규칙표와 별개로 단 하나의 규칙만 적용합니다.
//! TCP이면서 목적지 주소가 `.1`로 끝나면 medium / port_scan, 그 외는 low.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use netpulse_core::types::{ThreatLevel, ThreatType};

use crate::frame::{DecodedFrame, IPPROTO_ICMP, IPPROTO_TCP, IPPROTO_UDP};

/// 브리지 메시지의 프로토콜 이름
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BridgeProtocol {
    Tcp,
    Udp,
    Icmp,
    Other,
}

impl BridgeProtocol {
    /// IP 프로토콜 번호를 이름으로 변환합니다.
    pub fn from_number(protocol: u8) -> Self {
        match protocol {
            IPPROTO_TCP => Self::Tcp,
            IPPROTO_UDP => Self::Udp,
            IPPROTO_ICMP => Self::Icmp,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Icmp => "ICMP",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for BridgeProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 목적지 주소의 점 표기가 `.1`로 끝나는지 확인합니다.
///
/// 마지막 옥텟이 정확히 1일 때만 참입니다 (`.11`, `.201`은 아님).
fn ends_with_dot_one(addr: Ipv4Addr) -> bool {
    addr.octets()[3] == 1
}

/// 디코딩된 프레임을 분류합니다.
pub fn classify(frame: &DecodedFrame) -> (ThreatLevel, Option<ThreatType>) {
    let protocol = BridgeProtocol::from_number(frame.protocol);
    if protocol == BridgeProtocol::Tcp && ends_with_dot_one(frame.destination) {
        (ThreatLevel::Medium, Some(ThreatType::PortScan))
    } else {
        (ThreatLevel::Low, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(protocol: u8, destination: [u8; 4]) -> DecodedFrame {
        DecodedFrame {
            source: Ipv4Addr::new(192, 168, 1, 50),
            destination: Ipv4Addr::from(destination),
            protocol,
            size: 60,
            vlan_tagged: false,
        }
    }

    #[test]
    fn protocol_numbers_map_to_names() {
        assert_eq!(BridgeProtocol::from_number(6), BridgeProtocol::Tcp);
        assert_eq!(BridgeProtocol::from_number(17), BridgeProtocol::Udp);
        assert_eq!(BridgeProtocol::from_number(1), BridgeProtocol::Icmp);
        assert_eq!(BridgeProtocol::from_number(2), BridgeProtocol::Other);
        assert_eq!(BridgeProtocol::from_number(47).to_string(), "OTHER");
    }

    #[test]
    fn tcp_to_gateway_is_port_scan() {
        let (level, threat) = classify(&frame(IPPROTO_TCP, [192, 168, 1, 1]));
        assert_eq!(level, ThreatLevel::Medium);
        assert_eq!(threat, Some(ThreatType::PortScan));
    }

    #[test]
    fn udp_to_gateway_is_low() {
        let (level, threat) = classify(&frame(IPPROTO_UDP, [192, 168, 1, 1]));
        assert_eq!(level, ThreatLevel::Low);
        assert_eq!(threat, None);
    }

    #[test]
    fn trailing_digits_other_than_one_are_low() {
        for last in [11, 21, 201, 0, 10] {
            let (level, _) = classify(&frame(IPPROTO_TCP, [10, 0, 0, last]));
            assert_eq!(level, ThreatLevel::Low, "10.0.0.{last}");
        }
    }

    #[test]
    fn protocol_serializes_uppercase() {
        let json = serde_json::to_string(&BridgeProtocol::Other).unwrap();
        assert_eq!(json, "\"OTHER\"");
    }
}
