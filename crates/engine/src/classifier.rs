//! 위협 분류기: 순서가 있는 휴리스틱 규칙 목록
//!
//! 규칙은 위에서부터 평가되며 처음 만족한 규칙의 결과가 적용됩니다.
//! 규칙의 확률 판정(난수 소비)은 조건이 참일 때만 일어나므로, 규칙 순서와
//! 확률이 곧 난수 소비 순서를 결정합니다.
//!
//! 기본 규칙표:
//!
//! | # | 조건 | 확률 | 결과 |
//! |---|------|------|------|
//! | 1 | 목적지 포트 22 | 10% | high / brute_force |
//! | 2 | ICMP && size > 1000 | - | medium / ddos |
//! | 3 | 출발지/목적지 포트 < 1024 | 5% | critical / malware |
//! | 4 | size > 5000 | 8% | medium / data_exfiltration |
//! | 5 | 항상 | 2% | low / suspicious_traffic |
//! | - | 그 외 | - | low / 없음 |
//!
//! 이 규칙은 예시용 휴리스틱이며 실제 침입 탐지를 제공하지 않습니다.

use netpulse_core::config::ClassifierConfig;
use netpulse_core::types::{Packet, Protocol, ThreatLevel, ThreatType};

use crate::random::RandomSource;

/// 규칙 조건 (난수를 쓰지 않는 순수 술어)
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCondition {
    /// 목적지 포트가 일치
    DestinationPort(u16),
    /// 지정 프로토콜이면서 크기가 임계값 초과
    ProtocolLargerThan { protocol: Protocol, size: u32 },
    /// 출발지와 목적지 포트가 모두 경계값 미만
    BothPortsBelow(u16),
    /// 크기가 임계값 초과
    LargerThan(u32),
    /// 항상 참
    Always,
}

impl RuleCondition {
    /// 패킷이 조건을 만족하는지 확인합니다.
    pub fn matches(&self, packet: &Packet) -> bool {
        match *self {
            Self::DestinationPort(port) => packet.destination_port == port,
            Self::ProtocolLargerThan { protocol, size } => {
                packet.protocol == protocol && packet.size > size
            }
            Self::BothPortsBelow(limit) => {
                packet.source_port < limit && packet.destination_port < limit
            }
            Self::LargerThan(size) => packet.size > size,
            Self::Always => true,
        }
    }
}

/// 분류 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub level: ThreatLevel,
    pub threat_type: Option<ThreatType>,
}

impl Classification {
    /// 어떤 규칙도 맞지 않을 때의 결과
    pub const BENIGN: Classification = Classification {
        level: ThreatLevel::Low,
        threat_type: None,
    };
}

/// 분류 규칙 하나: 조건, 선택적 확률, 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRule {
    /// 규칙 이름 (로그용)
    pub name: &'static str,
    pub condition: RuleCondition,
    /// 조건이 참일 때 적용할 확률 (`None`이면 항상 적용)
    pub probability: Option<f64>,
    pub outcome: Classification,
}

impl ClassificationRule {
    /// 규칙을 평가합니다. 조건이 참일 때만 난수를 소비합니다.
    fn evaluate(&self, packet: &Packet, rng: &mut dyn RandomSource) -> bool {
        if !self.condition.matches(packet) {
            return false;
        }
        match self.probability {
            Some(p) => rng.chance(p),
            None => true,
        }
    }
}

/// 순서가 있는 규칙 목록 기반 분류기
#[derive(Debug, Clone)]
pub struct ThreatClassifier {
    rules: Vec<ClassificationRule>,
}

impl ThreatClassifier {
    /// 설정값으로 기본 규칙표를 만듭니다.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let rules = vec![
            ClassificationRule {
                name: "brute_force",
                condition: RuleCondition::DestinationPort(config.brute_force_port),
                probability: Some(config.brute_force_probability),
                outcome: Classification {
                    level: ThreatLevel::High,
                    threat_type: Some(ThreatType::BruteForce),
                },
            },
            ClassificationRule {
                name: "icmp_flood",
                condition: RuleCondition::ProtocolLargerThan {
                    protocol: Protocol::Icmp,
                    size: config.ddos_icmp_size,
                },
                probability: None,
                outcome: Classification {
                    level: ThreatLevel::Medium,
                    threat_type: Some(ThreatType::Ddos),
                },
            },
            ClassificationRule {
                name: "privileged_ports",
                condition: RuleCondition::BothPortsBelow(config.privileged_port_limit),
                probability: Some(config.malware_probability),
                outcome: Classification {
                    level: ThreatLevel::Critical,
                    threat_type: Some(ThreatType::Malware),
                },
            },
            ClassificationRule {
                name: "large_transfer",
                condition: RuleCondition::LargerThan(config.exfiltration_size),
                probability: Some(config.exfiltration_probability),
                outcome: Classification {
                    level: ThreatLevel::Medium,
                    threat_type: Some(ThreatType::DataExfiltration),
                },
            },
            ClassificationRule {
                name: "background_noise",
                condition: RuleCondition::Always,
                probability: Some(config.suspicious_probability),
                outcome: Classification {
                    level: ThreatLevel::Low,
                    threat_type: Some(ThreatType::SuspiciousTraffic),
                },
            },
        ];
        Self { rules }
    }

    /// 임의의 규칙 목록으로 분류기를 만듭니다.
    pub fn with_rules(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// 패킷을 분류합니다. 처음 만족한 규칙의 결과를 반환합니다.
    pub fn classify(&self, packet: &Packet, rng: &mut dyn RandomSource) -> Classification {
        for rule in &self.rules {
            if rule.evaluate(packet, rng) {
                return rule.outcome;
            }
        }
        Classification::BENIGN
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }
}

impl Default for ThreatClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::random::ScriptedRandom;

    fn packet(protocol: Protocol, sport: u16, dport: u16, size: u32) -> Packet {
        Packet {
            id: "test".to_owned(),
            timestamp: 0,
            source_ip: Ipv4Addr::new(1, 2, 3, 4),
            destination_ip: Ipv4Addr::new(5, 6, 7, 8),
            source_port: sport,
            destination_port: dport,
            protocol,
            size,
            flags: None,
            threat_level: ThreatLevel::Low,
            threat_type: None,
            geo: None,
        }
    }

    #[test]
    fn default_rule_order_is_fixed() {
        let names: Vec<&str> = ThreatClassifier::default()
            .rules()
            .iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "brute_force",
                "icmp_flood",
                "privileged_ports",
                "large_transfer",
                "background_noise"
            ]
        );
    }

    #[test]
    fn ssh_with_winning_draw_is_brute_force() {
        let classifier = ThreatClassifier::default();
        let mut rng = ScriptedRandom::constant(0.05);
        let result = classifier.classify(&packet(Protocol::Tcp, 50000, 22, 100), &mut rng);
        assert_eq!(result.level, ThreatLevel::High);
        assert_eq!(result.threat_type, Some(ThreatType::BruteForce));
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn large_icmp_is_ddos_without_consuming_draws() {
        let classifier = ThreatClassifier::default();
        let mut rng = ScriptedRandom::constant(0.99);
        let result = classifier.classify(&packet(Protocol::Icmp, 50000, 8080, 2000), &mut rng);
        assert_eq!(result.level, ThreatLevel::Medium);
        assert_eq!(result.threat_type, Some(ThreatType::Ddos));
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn icmp_at_threshold_is_not_ddos() {
        let classifier = ThreatClassifier::default();
        let mut rng = ScriptedRandom::constant(0.99);
        let result = classifier.classify(&packet(Protocol::Icmp, 50000, 8080, 1000), &mut rng);
        assert_eq!(result, Classification::BENIGN);
    }

    #[test]
    fn losing_draw_falls_through_to_next_rule() {
        let classifier = ThreatClassifier::default();
        // 1번 규칙(22번 포트) 실패 -> 3번 규칙(특권 포트) 성공
        let mut rng = ScriptedRandom::new(vec![0.5, 0.01]);
        let result = classifier.classify(&packet(Protocol::Tcp, 80, 22, 100), &mut rng);
        assert_eq!(result.level, ThreatLevel::Critical);
        assert_eq!(result.threat_type, Some(ThreatType::Malware));
        assert_eq!(rng.draws(), 2);
    }

    #[test]
    fn large_packet_with_winning_draw_is_exfiltration() {
        let classifier = ThreatClassifier::default();
        let mut rng = ScriptedRandom::constant(0.07);
        let result = classifier.classify(&packet(Protocol::Udp, 50000, 8080, 6000), &mut rng);
        assert_eq!(result.threat_type, Some(ThreatType::DataExfiltration));
        assert_eq!(result.level, ThreatLevel::Medium);
    }

    #[test]
    fn background_rule_is_low_suspicious() {
        let classifier = ThreatClassifier::default();
        let mut rng = ScriptedRandom::constant(0.01);
        let result = classifier.classify(&packet(Protocol::Udp, 50000, 8080, 100), &mut rng);
        assert_eq!(result.level, ThreatLevel::Low);
        assert_eq!(result.threat_type, Some(ThreatType::SuspiciousTraffic));
    }

    #[test]
    fn no_match_is_benign() {
        let classifier = ThreatClassifier::default();
        let mut rng = ScriptedRandom::constant(0.9);
        let result = classifier.classify(&packet(Protocol::Https, 50000, 443, 100), &mut rng);
        assert_eq!(result, Classification::BENIGN);
        // 조건이 참인 규칙은 background_noise 뿐
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn custom_rules_are_evaluated_in_order() {
        let classifier = ThreatClassifier::with_rules(vec![
            ClassificationRule {
                name: "first",
                condition: RuleCondition::Always,
                probability: None,
                outcome: Classification {
                    level: ThreatLevel::Critical,
                    threat_type: Some(ThreatType::PortScan),
                },
            },
            ClassificationRule {
                name: "never_reached",
                condition: RuleCondition::Always,
                probability: None,
                outcome: Classification::BENIGN,
            },
        ]);
        let mut rng = ScriptedRandom::constant(0.5);
        let result = classifier.classify(&packet(Protocol::Tcp, 1, 1, 1), &mut rng);
        assert_eq!(result.threat_type, Some(ThreatType::PortScan));
    }
}
