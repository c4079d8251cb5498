//! 엔진 에러 타입
//!
//! tick 자체는 실패하지 않으며, 에러는 엔진 구성과 드라이버 생명주기에서만 발생합니다.

use netpulse_core::error::{NetpulseError, PipelineError};

/// 텔레메트리 엔진 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 엔진 설정 오류
    #[error("invalid engine config: {0}")]
    Config(String),

    /// 드라이버가 이미 실행 중
    #[error("tick driver is already running")]
    AlreadyRunning,

    /// 드라이버가 실행 중이 아님
    #[error("tick driver is not running")]
    NotRunning,
}

impl From<EngineError> for NetpulseError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::AlreadyRunning => NetpulseError::Pipeline(PipelineError::AlreadyRunning),
            EngineError::NotRunning => NetpulseError::Pipeline(PipelineError::NotRunning),
            EngineError::Config(_) => {
                NetpulseError::Pipeline(PipelineError::InitFailed(err.to_string()))
            }
        }
    }
}
