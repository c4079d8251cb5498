//! tick 드라이버: 엔진을 단일 워커 태스크에서 주기적으로 실행합니다.
//!
//! 엔진은 `tick()` 중에 I/O나 대기를 하지 않으므로 한 tick은 항상 끝까지 실행됩니다.
//! 드라이버는 `tokio::time::interval`로 tick을 트리거하고, 결과 스냅샷을
//! `Arc<TickSnapshot>`으로 broadcast 채널에 발행합니다. 모든 구독자는 같은
//! tick에서 같은 스냅샷 인스턴스를 받습니다.
//!
//! 정지는 다음 tick을 예약하지 않는 것뿐이며, 취소할 진행 중 작업은 없습니다.
//!
//! ```text
//! interval ──> [worker task] ──lock──> TelemetryEngine::tick()
//!                   │
//!                   └── broadcast<Arc<TickSnapshot>> ──> subscribers
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use netpulse_core::error::NetpulseError;
use netpulse_core::pipeline::{HealthStatus, Pipeline};
use netpulse_core::types::TickSnapshot;

use crate::engine::TelemetryEngine;
use crate::error::EngineError;

/// 여러 호출자가 공유하는 엔진 핸들
///
/// 뮤텍스로 tick을 직렬화하여 단일 작성자 가정을 유지합니다.
pub type SharedEngine = Arc<Mutex<TelemetryEngine>>;

/// 엔진을 [`SharedEngine`]으로 감쌉니다.
pub fn shared(engine: TelemetryEngine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

/// 스냅샷 broadcast 채널 기본 용량
pub const DEFAULT_SNAPSHOT_CAPACITY: usize = 16;

/// 드라이버 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Initialized,
    Running,
    Stopped,
}

/// 주기적 tick 드라이버
pub struct TickDriver {
    engine: SharedEngine,
    interval: Duration,
    snapshot_tx: broadcast::Sender<Arc<TickSnapshot>>,
    published: Arc<AtomicU64>,
    state: DriverState,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TickDriver {
    /// 새 드라이버와 첫 번째 스냅샷 수신기를 생성합니다.
    pub fn new(
        engine: TelemetryEngine,
        interval: Duration,
        capacity: usize,
    ) -> (Self, broadcast::Receiver<Arc<TickSnapshot>>) {
        Self::with_shared(shared(engine), interval, capacity)
    }

    /// 이미 공유 중인 엔진으로 드라이버를 생성합니다.
    pub fn with_shared(
        engine: SharedEngine,
        interval: Duration,
        capacity: usize,
    ) -> (Self, broadcast::Receiver<Arc<TickSnapshot>>) {
        let (snapshot_tx, snapshot_rx) = broadcast::channel(capacity.max(1));
        let driver = Self {
            engine,
            interval,
            snapshot_tx,
            published: Arc::new(AtomicU64::new(0)),
            state: DriverState::Initialized,
            cancel: CancellationToken::new(),
            task: None,
        };
        (driver, snapshot_rx)
    }

    /// 엔진 설정의 tick 주기로 드라이버를 생성합니다.
    pub fn from_engine(
        engine: TelemetryEngine,
    ) -> (Self, broadcast::Receiver<Arc<TickSnapshot>>) {
        let interval = Duration::from_millis(engine.config().tick_interval_ms);
        Self::new(engine, interval, DEFAULT_SNAPSHOT_CAPACITY)
    }

    /// 스냅샷 구독자를 추가합니다.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TickSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// 공유 엔진 핸들을 반환합니다.
    pub fn engine(&self) -> SharedEngine {
        Arc::clone(&self.engine)
    }

    /// 주기와 무관하게 즉시 tick을 실행하고 구독자에게 발행합니다.
    pub async fn tick_now(&self) -> Arc<TickSnapshot> {
        run_tick(&self.engine, &self.snapshot_tx, &self.published).await
    }

    /// 지금까지 발행한 스냅샷 수
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }
}

async fn run_tick(
    engine: &SharedEngine,
    tx: &broadcast::Sender<Arc<TickSnapshot>>,
    published: &AtomicU64,
) -> Arc<TickSnapshot> {
    let (tick, snapshot) = {
        let mut engine = engine.lock().await;
        let snapshot = Arc::new(engine.tick());
        (engine.ticks(), snapshot)
    };
    published.fetch_add(1, Ordering::Relaxed);

    tracing::info!(
        tick,
        total_packets = snapshot.metrics.total_packets,
        packets_per_second = snapshot.metrics.packets_per_second,
        unique_ips = snapshot.metrics.unique_ips,
        alerts = snapshot.alerts.len(),
        "tick published"
    );

    // 구독자가 없으면 전송 실패는 정상
    if tx.send(Arc::clone(&snapshot)).is_err() {
        tracing::debug!(tick, "no snapshot subscribers");
    }
    snapshot
}

impl Pipeline for TickDriver {
    async fn start(&mut self) -> Result<(), NetpulseError> {
        if self.state == DriverState::Running {
            return Err(EngineError::AlreadyRunning.into());
        }

        tracing::info!(interval_ms = self.interval.as_millis() as u64, "starting tick driver");

        // 정지 후 재시작할 수 있도록 토큰을 새로 만든다
        self.cancel = CancellationToken::new();
        let cancel = self.cancel.clone();
        let engine = Arc::clone(&self.engine);
        let tx = self.snapshot_tx.clone();
        let published = Arc::clone(&self.published);
        let period = self.interval;

        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("tick driver received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        run_tick(&engine, &tx, &published).await;
                    }
                }
            }
        }));

        self.state = DriverState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), NetpulseError> {
        if self.state != DriverState::Running {
            return Err(EngineError::NotRunning.into());
        }

        tracing::info!("stopping tick driver");
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "tick driver task ended abnormally");
        }

        self.state = DriverState::Stopped;
        tracing::info!(published = self.published(), "tick driver stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            DriverState::Running => match &self.task {
                Some(task) if task.is_finished() => {
                    HealthStatus::Unhealthy("tick worker exited".to_owned())
                }
                _ => HealthStatus::Healthy,
            },
            DriverState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            DriverState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}
