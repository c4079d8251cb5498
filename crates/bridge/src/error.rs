//! 브리지 에러 타입
//!
//! [`FrameError`]는 프레임 하나의 디코딩 실패로, 캡처 루프는 이를 기록하고
//! 건너뜁니다. [`BridgeError`]는 소켓 바인드나 I/O처럼 브리지 자체의 실패입니다.

use netpulse_core::error::NetpulseError;

/// 프레임 디코딩 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// 헤더를 읽기에 프레임이 너무 짧음
    #[error("frame too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },

    /// IPv4가 아닌 EtherType
    #[error("unsupported ethertype 0x{0:04x}")]
    UnsupportedEtherType(u16),

    /// IP 버전 필드가 4가 아님
    #[error("not an IPv4 packet (version {0})")]
    NotIpv4(u8),

    /// IHL이 최소값(5) 미만
    #[error("invalid IPv4 header length: {0} words")]
    InvalidHeaderLength(u8),

    /// total length 필드가 헤더 길이보다 작음
    #[error("invalid IPv4 total length: {0} bytes")]
    InvalidTotalLength(u16),

    /// 그 밖의 헤더 파싱 실패
    #[error("malformed frame: {0}")]
    Malformed(String),
}

impl FrameError {
    /// 메트릭 레이블용 사유 문자열
    pub fn reason(&self) -> &'static str {
        match self {
            Self::TooShort { .. } => "too_short",
            Self::UnsupportedEtherType(_) => "unsupported_ethertype",
            Self::NotIpv4(_) => "not_ipv4",
            Self::InvalidHeaderLength(_) => "invalid_header_length",
            Self::InvalidTotalLength(_) => "invalid_total_length",
            Self::Malformed(_) => "malformed",
        }
    }
}

/// 라이브 캡처 브리지 에러
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// 프레임 디코딩 실패
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// 소켓 바인드 실패
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    /// 소켓 I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 메시지 직렬화 실패
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<BridgeError> for NetpulseError {
    fn from(err: BridgeError) -> Self {
        NetpulseError::Bridge(err.to_string())
    }
}
