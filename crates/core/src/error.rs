//! 에러 타입: 도메인별 에러 정의
//!
//! 텔레메트리 엔진의 tick 경로(생성 → 분류 → 저장 → 집계)는 메모리 내 계산만
//! 수행하므로 에러를 반환하지 않습니다. 에러는 설정 로딩, 모듈 생명주기,
//! 라이브 캡처 브리지 경계에서만 발생합니다.

/// Netpulse 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum NetpulseError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 라이브 캡처 브리지 에러
    #[error("bridge error: {0}")]
    Bridge(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,

    /// 파이프라인 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 채널 전송 실패
    #[error("channel send failed: {0}")]
    ChannelSend(String),
}
