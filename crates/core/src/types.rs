//! 도메인 타입: 텔레메트리 엔진과 소비자가 공유하는 데이터 구조
//!
//! 모든 타입은 camelCase 필드명으로 직렬화되어 렌더링 레이어가 기대하는
//! JSON 형태(`sourceIp`, `threatLevel`, `topTalkers` ...)를 그대로 유지합니다.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// 알림 타입을 알 수 없을 때 사용하는 이름
pub const UNKNOWN_ALERT_TYPE: &str = "unknown";

/// 패킷 프로토콜
///
/// 합성 트래픽 생성기가 균등 분포로 선택하는 고정 열거형입니다.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Http,
    Https,
    Dns,
    Ssh,
    Ftp,
}

impl Protocol {
    /// 생성기가 샘플링하는 순서대로 나열한 전체 프로토콜
    pub const ALL: [Protocol; 8] = [
        Self::Tcp,
        Self::Udp,
        Self::Http,
        Self::Https,
        Self::Dns,
        Self::Ssh,
        Self::Ftp,
        Self::Icmp,
    ];

    /// 대문자 프로토콜 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Icmp => "ICMP",
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
            Self::Dns => "DNS",
            Self::Ssh => "SSH",
            Self::Ftp => "FTP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 위협 레벨
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    /// 낮음 (기본값)
    #[default]
    Low,
    /// 중간
    Medium,
    /// 높음
    High,
    /// 치명적
    Critical,
}

impl ThreatLevel {
    /// 알림 생성 대상인지 확인합니다 (`High` 이상).
    pub fn is_alertable(self) -> bool {
        self >= Self::High
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 위협 유형
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ThreatType {
    PortScan,
    Ddos,
    Malware,
    SuspiciousTraffic,
    BruteForce,
    DataExfiltration,
}

impl ThreatType {
    pub const ALL: [ThreatType; 6] = [
        Self::PortScan,
        Self::Ddos,
        Self::Malware,
        Self::SuspiciousTraffic,
        Self::BruteForce,
        Self::DataExfiltration,
    ];

    /// snake_case 유형 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PortScan => "port_scan",
            Self::Ddos => "ddos",
            Self::Malware => "malware",
            Self::SuspiciousTraffic => "suspicious_traffic",
            Self::BruteForce => "brute_force",
            Self::DataExfiltration => "data_exfiltration",
        }
    }

    /// 문자열에서 위협 유형을 파싱합니다.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for ThreatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// TCP 플래그
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TcpFlag {
    Syn,
    Ack,
    Fin,
    Rst,
    Psh,
    Urg,
}

impl TcpFlag {
    /// 생성기가 포함 여부를 결정하는 순서
    pub const ALL: [TcpFlag; 6] = [
        Self::Syn,
        Self::Ack,
        Self::Fin,
        Self::Rst,
        Self::Psh,
        Self::Urg,
    ];
}

/// 지리 정보 (국가, ISP)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// 국가 코드
    pub country: String,
    /// ISP 이름
    pub isp: String,
}

/// 합성 네트워크 패킷
///
/// 생성기가 만들고 분류기가 한 번 분류한 뒤에는 변경되지 않습니다.
/// 히스토리 저장소의 FIFO 축출로 소멸합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Packet {
    /// 패킷 ID (불투명 문자열)
    pub id: String,
    /// 생성 시각 (Unix epoch 밀리초)
    pub timestamp: u64,
    /// 출발지 주소
    pub source_ip: Ipv4Addr,
    /// 목적지 주소
    pub destination_ip: Ipv4Addr,
    /// 출발지 포트
    pub source_port: u16,
    /// 목적지 포트
    pub destination_port: u16,
    /// 프로토콜
    pub protocol: Protocol,
    /// 크기 (바이트)
    pub size: u32,
    /// TCP 플래그 (TCP일 때만 존재)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<TcpFlag>>,
    /// 위협 레벨
    pub threat_level: ThreatLevel,
    /// 위협 유형
    #[serde(default)]
    pub threat_type: Option<ThreatType>,
    /// 지리 정보 (`country`, `isp` 필드로 평탄화)
    #[serde(flatten)]
    pub geo: Option<GeoLocation>,
}

impl Packet {
    /// 지리 정보의 국가 코드를 반환합니다.
    pub fn country(&self) -> Option<&str> {
        self.geo.as_ref().map(|g| g.country.as_str())
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} proto={} size={} threat={}",
            self.source_ip,
            self.source_port,
            self.destination_ip,
            self.destination_port,
            self.protocol,
            self.size,
            self.threat_level,
        )
    }
}

/// 위협 알림
///
/// 알림 생성기가 high/critical 패킷으로부터 만들며 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAlert {
    /// 알림 ID
    pub id: String,
    /// 생성 시각 (Unix epoch 밀리초)
    pub timestamp: u64,
    /// 알림 유형 (위협 유형 이름 또는 `"unknown"`)
    #[serde(rename = "type")]
    pub alert_type: String,
    /// 심각도 (트리거 패킷의 위협 레벨)
    pub severity: ThreatLevel,
    /// 출발지 주소
    pub source_ip: Ipv4Addr,
    /// 목적지 주소
    pub destination_ip: Ipv4Addr,
    /// 상세 설명
    pub description: String,
    /// 권장 조치
    pub recommendation: String,
    /// 알림을 유발한 패킷
    pub packets: Vec<Packet>,
}

impl fmt::Display for ThreatAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({})",
            self.severity, self.description, self.alert_type,
        )
    }
}

/// 인터페이스 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceStatus {
    #[default]
    Active,
    Inactive,
}

/// 네트워크 인터페이스와 누적 카운터
///
/// 네 개의 카운터는 엔진 수명 동안 단조 비감소합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    /// 인터페이스 이름 (예: `eth0`)
    pub name: String,
    /// 바인드된 주소
    pub ip: Ipv4Addr,
    /// 상태
    pub status: InterfaceStatus,
    /// 수신 바이트 (누적)
    pub bytes_in: u64,
    /// 송신 바이트 (누적)
    pub bytes_out: u64,
    /// 수신 패킷 (누적)
    pub packets_in: u64,
    /// 송신 패킷 (누적)
    pub packets_out: u64,
}

impl NetworkInterface {
    /// 카운터가 0인 활성 인터페이스를 생성합니다.
    pub fn new(name: impl Into<String>, ip: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            ip,
            status: InterfaceStatus::Active,
            bytes_in: 0,
            bytes_out: 0,
            packets_in: 0,
            packets_out: 0,
        }
    }
}

/// 상위 송신자 (윈도우 내 출발지 주소별 집계)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopTalker {
    pub ip: Ipv4Addr,
    pub packets: u64,
    pub bytes: u64,
    /// 해당 주소가 처음 관측된 패킷의 국가
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// 네트워크 메트릭 스냅샷
///
/// 매 tick마다 히스토리에서 새로 계산되며 제자리 수정되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkMetrics {
    /// 엔진 수명 동안 생성된 전체 패킷 수
    pub total_packets: u64,
    /// 엔진 수명 동안 생성된 전체 바이트 수
    pub total_bytes: u64,
    /// 초당 패킷 수 (윈도우 기준)
    pub packets_per_second: u64,
    /// 초당 바이트 수 (윈도우 기준)
    pub bytes_per_second: u64,
    /// 활성 연결 수 (합성 게이지)
    pub active_connections: u32,
    /// 윈도우 내 고유 출발지 주소 수
    pub unique_ips: u64,
    /// 윈도우 내 프로토콜별 패킷 수
    pub protocol_distribution: BTreeMap<Protocol, u64>,
    /// 윈도우 내 위협 유형별 패킷 수
    pub threat_counts: BTreeMap<ThreatType, u64>,
    /// 바이트 기준 상위 송신자 (최대 10개)
    pub top_talkers: Vec<TopTalker>,
    /// 대역폭 사용률 (%, 합성 게이지)
    pub bandwidth_utilization: f64,
    /// 지연 시간 (ms, 합성 게이지)
    pub latency: f64,
    /// 패킷 손실률 (%, 합성 게이지)
    pub packet_loss: f64,
}

/// 한 번의 tick 결과
///
/// 최근 패킷/알림 뷰와 새로 계산한 메트릭, 인터페이스 상태의 일관된 스냅샷입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    /// 최근 패킷 (최대 100개)
    pub packets: Vec<Packet>,
    /// 메트릭
    pub metrics: NetworkMetrics,
    /// 최근 알림 (최대 10개)
    pub alerts: Vec<ThreatAlert>,
    /// 인터페이스 목록
    pub interfaces: Vec<NetworkInterface>,
}
