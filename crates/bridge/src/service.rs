//! 브리지 서비스: UDP 프레임 소스, 캡처 루프, 구독자 리스너를 하나의 모듈로 묶습니다.
//!
//! 데몬은 [`BridgeService`]를 [`Pipeline`]으로 등록하여 시작/정지합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use netpulse_core::config::BridgeConfig;
use netpulse_core::error::{NetpulseError, PipelineError};
use netpulse_core::pipeline::{HealthStatus, Pipeline};

use crate::capture::CaptureBridge;
use crate::hub::BroadcastHub;
use crate::listener::SubscriberListener;
use crate::source::UdpFrameSource;

/// 실행 중에만 존재하는 자원
struct Running {
    cancel: CancellationToken,
    capture: JoinHandle<()>,
    listener: JoinHandle<()>,
    frame_addr: SocketAddr,
    subscriber_addr: SocketAddr,
}

/// 라이브 캡처 브리지 모듈
pub struct BridgeService {
    config: BridgeConfig,
    hub: Arc<BroadcastHub>,
    running: Option<Running>,
}

impl BridgeService {
    pub fn new(config: BridgeConfig) -> Self {
        let hub = Arc::new(BroadcastHub::new(config.subscriber_buffer));
        Self {
            config,
            hub,
            running: None,
        }
    }

    /// 구독자 허브
    pub fn hub(&self) -> Arc<BroadcastHub> {
        Arc::clone(&self.hub)
    }

    /// 실행 중일 때 프레임 소스의 실제 주소
    pub fn frame_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.frame_addr)
    }

    /// 실행 중일 때 구독자 리스너의 실제 주소
    pub fn subscriber_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.subscriber_addr)
    }
}

impl Pipeline for BridgeService {
    async fn start(&mut self) -> Result<(), NetpulseError> {
        if self.running.is_some() {
            return Err(PipelineError::AlreadyRunning.into());
        }

        let source = UdpFrameSource::bind(&self.config.frame_bind).await?;
        let listener = SubscriberListener::bind(
            &self.config.subscriber_bind,
            Arc::clone(&self.hub),
            self.config.max_subscribers,
        )
        .await?;
        let frame_addr = source.local_addr()?;
        let subscriber_addr = listener.local_addr()?;

        let cancel = CancellationToken::new();

        let capture_cancel = cancel.clone();
        let mut bridge = CaptureBridge::new(source, Arc::clone(&self.hub));
        let capture = tokio::spawn(async move {
            if let Err(e) = bridge.run(capture_cancel).await {
                tracing::error!(error = %e, "capture loop failed");
            }
        });

        let listener_cancel = cancel.clone();
        let listener = tokio::spawn(async move {
            if let Err(e) = listener.run(listener_cancel).await {
                tracing::error!(error = %e, "subscriber listener failed");
            }
        });

        tracing::info!(
            frame_addr = %frame_addr,
            subscriber_addr = %subscriber_addr,
            "live capture bridge started"
        );

        self.running = Some(Running {
            cancel,
            capture,
            listener,
            frame_addr,
            subscriber_addr,
        });
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), NetpulseError> {
        let Some(running) = self.running.take() else {
            return Err(PipelineError::NotRunning.into());
        };

        running.cancel.cancel();
        for (name, task) in [("capture", running.capture), ("listener", running.listener)] {
            if let Err(e) = task.await {
                tracing::warn!(task = name, error = %e, "bridge task ended abnormally");
            }
        }

        tracing::info!("live capture bridge stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match &self.running {
            None => HealthStatus::Unhealthy("not started".to_owned()),
            Some(r) if r.capture.is_finished() => {
                HealthStatus::Unhealthy("capture loop exited".to_owned())
            }
            Some(r) if r.listener.is_finished() => {
                HealthStatus::Degraded("subscriber listener exited".to_owned())
            }
            Some(_) => HealthStatus::Healthy,
        }
    }
}
