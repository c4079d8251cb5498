//! 알림 생성기: 새 배치에서 high/critical 패킷으로부터 알림을 만듭니다.
//!
//! 배치에서 처음 나타난 high 이상 패킷 하나만 알림으로 만들며,
//! tick당 알림은 최대 하나입니다. 설명/권장 조치는 위협 유형별 고정 표에서 찾습니다.

use netpulse_core::metrics as m;
use netpulse_core::types::{Packet, ThreatAlert, ThreatType, UNKNOWN_ALERT_TYPE};

/// 유형을 알 수 없을 때의 설명
pub const FALLBACK_DESCRIPTION: &str = "Unknown threat detected";

/// 유형을 알 수 없을 때의 권장 조치
pub const FALLBACK_RECOMMENDATION: &str = "Investigate further";

/// 위협 유형별 설명을 만듭니다.
pub fn describe(threat_type: Option<ThreatType>, packet: &Packet) -> String {
    let (src, dst) = (packet.source_ip, packet.destination_ip);
    match threat_type {
        Some(ThreatType::PortScan) => format!("Port scanning detected from {src}"),
        Some(ThreatType::Ddos) => format!("Potential DDoS attack detected targeting {dst}"),
        Some(ThreatType::Malware) => {
            format!("Malware communication detected between {src} and {dst}")
        }
        Some(ThreatType::SuspiciousTraffic) => {
            format!("Suspicious traffic pattern detected from {src}")
        }
        Some(ThreatType::BruteForce) => format!(
            "Brute force attack detected against {dst}:{}",
            packet.destination_port
        ),
        Some(ThreatType::DataExfiltration) => {
            format!("Potential data exfiltration detected from {src}")
        }
        None => FALLBACK_DESCRIPTION.to_owned(),
    }
}

/// 위협 유형별 권장 조치
pub fn recommend(threat_type: Option<ThreatType>) -> &'static str {
    match threat_type {
        Some(ThreatType::PortScan) => {
            "Block source IP and monitor for additional scanning attempts"
        }
        Some(ThreatType::Ddos) => "Implement rate limiting and consider DDoS protection services",
        Some(ThreatType::Malware) => "Isolate affected systems and run full antivirus scan",
        Some(ThreatType::SuspiciousTraffic) => {
            "Monitor traffic patterns and consider blocking if confirmed malicious"
        }
        Some(ThreatType::BruteForce) => {
            "Implement account lockout policies and consider IP blocking"
        }
        Some(ThreatType::DataExfiltration) => {
            "Review data access logs and implement data loss prevention measures"
        }
        None => FALLBACK_RECOMMENDATION,
    }
}

/// 알림 생성기
#[derive(Debug, Default)]
pub struct AlertGenerator {
    /// 생성된 총 알림 수
    total_generated: u64,
}

impl AlertGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 배치에서 첫 번째 high/critical 패킷으로 알림을 만듭니다.
    ///
    /// 해당 패킷이 없으면 `None`을 반환합니다.
    pub fn generate(&mut self, batch: &[Packet], now_ms: u64) -> Option<ThreatAlert> {
        let trigger = batch.iter().find(|p| p.threat_level.is_alertable())?;

        let alert = ThreatAlert {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now_ms,
            alert_type: trigger
                .threat_type
                .map_or(UNKNOWN_ALERT_TYPE, ThreatType::as_str)
                .to_owned(),
            severity: trigger.threat_level,
            source_ip: trigger.source_ip,
            destination_ip: trigger.destination_ip,
            description: describe(trigger.threat_type, trigger),
            recommendation: recommend(trigger.threat_type).to_owned(),
            packets: vec![trigger.clone()],
        };

        self.total_generated += 1;
        metrics::counter!(m::ENGINE_ALERTS_TOTAL, m::LABEL_SEVERITY => alert.severity.as_str())
            .increment(1);
        tracing::info!(
            alert_id = %alert.id,
            alert_type = %alert.alert_type,
            severity = %alert.severity,
            source_ip = %alert.source_ip,
            destination_ip = %alert.destination_ip,
            "threat alert generated"
        );

        Some(alert)
    }

    /// 생성된 총 알림 수를 반환합니다.
    pub fn total_generated(&self) -> u64 {
        self.total_generated
    }
}
