//! 파이프라인 trait: 모듈 생명주기 정의
//!
//! 데몬이 관리하는 모든 장기 실행 모듈(tick 드라이버, 캡처 브리지)은
//! [`Pipeline`]을 구현합니다. 데몬은 이를 [`DynPipeline`] trait 객체로
//! 보관하여 순서대로 시작하고 역순으로 정지합니다.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::error::NetpulseError;

/// `Send` 가능한 boxed future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 모듈 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 성능 저하
    Degraded(String),
    /// 비정상
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 장기 실행 모듈의 생명주기 trait
///
/// 구현체는 `async fn`으로 구현할 수 있으며, 반환 future는 `Send`여야 합니다.
pub trait Pipeline: Send {
    /// 모듈을 시작합니다. 이미 실행 중이면 [`PipelineError::AlreadyRunning`].
    ///
    /// [`PipelineError::AlreadyRunning`]: crate::error::PipelineError::AlreadyRunning
    fn start(&mut self) -> impl Future<Output = Result<(), NetpulseError>> + Send;

    /// 모듈을 정지합니다. 실행 중이 아니면 [`PipelineError::NotRunning`].
    ///
    /// [`PipelineError::NotRunning`]: crate::error::PipelineError::NotRunning
    fn stop(&mut self) -> impl Future<Output = Result<(), NetpulseError>> + Send;

    /// 현재 헬스 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// object-safe 버전의 [`Pipeline`]
///
/// 모든 `Pipeline` 구현체는 blanket impl로 자동 구현됩니다.
pub trait DynPipeline: Send {
    fn start(&mut self) -> BoxFuture<'_, Result<(), NetpulseError>>;
    fn stop(&mut self) -> BoxFuture<'_, Result<(), NetpulseError>>;
    fn health_check(&self) -> BoxFuture<'_, HealthStatus>;
}

impl<T: Pipeline> DynPipeline for T {
    fn start(&mut self) -> BoxFuture<'_, Result<(), NetpulseError>> {
        Box::pin(Pipeline::start(self))
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), NetpulseError>> {
        Box::pin(Pipeline::stop(self))
    }

    fn health_check(&self) -> BoxFuture<'_, HealthStatus> {
        Box::pin(Pipeline::health_check(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    struct Toggle {
        running: bool,
    }

    impl Pipeline for Toggle {
        async fn start(&mut self) -> Result<(), NetpulseError> {
            if self.running {
                return Err(PipelineError::AlreadyRunning.into());
            }
            self.running = true;
            Ok(())
        }

        async fn stop(&mut self) -> Result<(), NetpulseError> {
            if !self.running {
                return Err(PipelineError::NotRunning.into());
            }
            self.running = false;
            Ok(())
        }

        async fn health_check(&self) -> HealthStatus {
            if self.running {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy("not running".to_owned())
            }
        }
    }

    #[test]
    fn health_status_serializes_with_reason() {
        let json = serde_json::to_value(HealthStatus::Degraded("slow".to_owned())).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["reason"], "slow");

        let json = serde_json::to_value(HealthStatus::Healthy).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn dyn_pipeline_delegates_to_pipeline() {
        let mut boxed: Box<dyn DynPipeline> = Box::new(Toggle { running: false });
        assert!(!boxed.health_check().await.is_healthy());

        boxed.start().await.unwrap();
        assert!(boxed.health_check().await.is_healthy());

        let err = boxed.start().await.unwrap_err();
        assert!(matches!(
            err,
            NetpulseError::Pipeline(PipelineError::AlreadyRunning)
        ));

        boxed.stop().await.unwrap();
        assert!(boxed.stop().await.is_err());
    }
}
