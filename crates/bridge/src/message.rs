//! 브리지 메시지: 구독자에게 전달되는 JSON 형식
//!
//! 캡처된 프레임 하나당 메시지 하나를 만들며, 메시지의 `packets` 배열에는
//! 항상 패킷 하나만 들어 있습니다. 메시지 하나가 WebSocket 텍스트 프레임 하나가 됩니다.

use std::net::Ipv4Addr;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use netpulse_core::types::{ThreatLevel, ThreatType};

use crate::classify::{BridgeProtocol, classify};
use crate::error::BridgeError;
use crate::frame::DecodedFrame;

/// 지리 정보 조회를 하지 않으므로 항상 이 값을 사용
pub const UNKNOWN_GEO: &str = "Unknown";

/// 캡처된 패킷 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgePacket {
    /// 캡처 시각 (Unix epoch 밀리초)
    pub timestamp: u64,
    /// 프레임 크기 (바이트)
    pub size: usize,
    pub source_ip: Ipv4Addr,
    pub destination_ip: Ipv4Addr,
    pub protocol: BridgeProtocol,
    pub threat_level: ThreatLevel,
    pub threat_type: Option<ThreatType>,
    pub country: String,
    pub isp: String,
}

impl BridgePacket {
    /// 디코딩된 프레임에서 분류까지 끝난 패킷을 만듭니다.
    pub fn from_frame(frame: &DecodedFrame, timestamp: u64) -> Self {
        let (threat_level, threat_type) = classify(frame);
        Self {
            timestamp,
            size: frame.size,
            source_ip: frame.source,
            destination_ip: frame.destination,
            protocol: BridgeProtocol::from_number(frame.protocol),
            threat_level,
            threat_type,
            country: UNKNOWN_GEO.to_owned(),
            isp: UNKNOWN_GEO.to_owned(),
        }
    }
}

/// 구독자에게 보내는 메시지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMessage {
    pub packets: Vec<BridgePacket>,
}

impl BridgeMessage {
    pub fn single(packet: BridgePacket) -> Self {
        Self {
            packets: vec![packet],
        }
    }

    /// JSON으로 직렬화합니다. 결과는 항상 유효한 UTF-8입니다.
    pub fn to_json(&self) -> Result<Bytes, BridgeError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}

/// 현재 시각 (Unix epoch 밀리초)
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::IPPROTO_TCP;

    fn decoded(destination: Ipv4Addr) -> DecodedFrame {
        DecodedFrame {
            source: Ipv4Addr::new(192, 168, 1, 20),
            destination,
            protocol: IPPROTO_TCP,
            size: 74,
            vlan_tagged: false,
        }
    }

    #[test]
    fn message_json_shape() {
        let packet = BridgePacket::from_frame(&decoded(Ipv4Addr::new(192, 168, 1, 1)), 1_700);
        let json = serde_json::to_value(BridgeMessage::single(packet)).unwrap();

        let p = &json["packets"][0];
        assert_eq!(p["timestamp"], 1_700);
        assert_eq!(p["size"], 74);
        assert_eq!(p["sourceIp"], "192.168.1.20");
        assert_eq!(p["destinationIp"], "192.168.1.1");
        assert_eq!(p["protocol"], "TCP");
        assert_eq!(p["threatLevel"], "medium");
        assert_eq!(p["threatType"], "port_scan");
        assert_eq!(p["country"], "Unknown");
        assert_eq!(p["isp"], "Unknown");
        assert_eq!(json["packets"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn benign_packet_has_null_threat_type() {
        let packet = BridgePacket::from_frame(&decoded(Ipv4Addr::new(8, 8, 8, 8)), 0);
        let json = serde_json::to_value(&packet).unwrap();
        assert_eq!(json["threatLevel"], "low");
        assert!(json["threatType"].is_null());
    }

    #[test]
    fn serialized_message_is_single_json_object() {
        let packet = BridgePacket::from_frame(&decoded(Ipv4Addr::new(8, 8, 8, 8)), 0);
        let json = BridgeMessage::single(packet.clone()).to_json().unwrap();
        assert!(std::str::from_utf8(&json).is_ok());
        assert!(json.starts_with(b"{\"packets\":["));
        assert!(!json.contains(&b'\n'));

        let parsed: BridgeMessage = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.packets[0], packet);
    }

    #[test]
    fn now_ms_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
