//! 엔진 컨트롤러: 한 번의 tick(생성 → 분류 → 저장 → 알림 → 인터페이스 → 집계)을 수행합니다.
//!
//! [`TelemetryEngine`]은 히스토리, 인터페이스 카운터, 난수 소스를 단독으로 소유합니다.
//! `tick()`은 `&mut self`를 받으므로 동시에 두 tick이 실행될 수 없으며,
//! 여러 호출자가 공유해야 할 때는 [`TickDriver`](crate::driver::TickDriver)나
//! [`SharedEngine`](crate::driver::SharedEngine)으로 직렬화합니다.
//!
//! # 사용 예시
//! ```
//! use netpulse_engine::{ManualClock, ScriptedRandom, TelemetryEngine};
//!
//! let mut engine = TelemetryEngine::builder()
//!     .random_source(ScriptedRandom::constant(0.5))
//!     .clock(ManualClock::new(1_700_000_000_000))
//!     .build()
//!     .unwrap();
//!
//! let snapshot = engine.tick();
//! assert_eq!(snapshot.metrics.total_packets, snapshot.packets.len() as u64);
//! ```

use std::sync::Arc;

use netpulse_core::config::EngineConfig;
use netpulse_core::metrics as m;
use netpulse_core::types::{NetworkInterface, Packet, TickSnapshot};

use crate::aggregator::{self, MetricsAggregator};
use crate::alert::AlertGenerator;
use crate::classifier::ThreatClassifier;
use crate::clock::{Clock, SystemClock};
use crate::error::EngineError;
use crate::generator::PacketGenerator;
use crate::history::HistoryStore;
use crate::interfaces::InterfaceStatsUpdater;
use crate::random::{RandomSource, StdRandom};

/// 합성 텔레메트리 엔진
pub struct TelemetryEngine {
    config: EngineConfig,
    rng: Box<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    generator: PacketGenerator,
    classifier: ThreatClassifier,
    history: HistoryStore,
    aggregator: MetricsAggregator,
    alerts: AlertGenerator,
    interfaces: InterfaceStatsUpdater,
    ticks: u64,
}

impl TelemetryEngine {
    /// 새 빌더를 생성합니다.
    pub fn builder() -> TelemetryEngineBuilder {
        TelemetryEngineBuilder::new()
    }

    /// tick 하나를 실행하고 스냅샷을 반환합니다. 실패하지 않습니다.
    pub fn tick(&mut self) -> TickSnapshot {
        let now = self.clock.now_ms();

        let span = (self.config.batch_max - self.config.batch_min + 1) as u64;
        let batch_size = self.rng.range_u64(self.config.batch_min as u64, span);

        let mut batch: Vec<Packet> = Vec::with_capacity(batch_size as usize);
        for _ in 0..batch_size {
            batch.push(
                self.generator
                    .generate(&self.classifier, self.rng.as_mut(), now),
            );
        }

        self.aggregator.record_batch(&batch);
        let alert = self.alerts.generate(&batch, now);
        self.interfaces.update(&batch, self.rng.as_mut());

        let batch_bytes: u64 = batch.iter().map(|p| u64::from(p.size)).sum();
        self.history.append_packets(batch);
        let alert_generated = alert.is_some();
        if let Some(alert) = alert {
            self.history.append_alert(alert);
        }

        let metrics = self
            .aggregator
            .compute(self.history.packets(), now, self.rng.as_mut());
        self.ticks += 1;

        metrics::counter!(m::ENGINE_TICKS_TOTAL).increment(1);
        metrics::counter!(m::ENGINE_PACKETS_TOTAL).increment(batch_size);
        metrics::counter!(m::ENGINE_BYTES_TOTAL).increment(batch_bytes);
        aggregator::publish(&metrics, self.history.packets().len());

        tracing::debug!(
            tick = self.ticks,
            batch_size,
            batch_bytes,
            alert_generated,
            history = self.history.packets().len(),
            "tick completed"
        );

        TickSnapshot {
            packets: self.history.recent_packets(self.config.packet_view),
            metrics,
            alerts: self.history.recent_alerts(self.config.alert_view),
            interfaces: self.interfaces.interfaces().to_vec(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn interfaces(&self) -> &[NetworkInterface] {
        self.interfaces.interfaces()
    }

    pub fn classifier(&self) -> &ThreatClassifier {
        &self.classifier
    }

    /// 실행된 tick 수
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// 생성된 총 알림 수
    pub fn alerts_generated(&self) -> u64 {
        self.alerts.total_generated()
    }
}

impl std::fmt::Debug for TelemetryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryEngine")
            .field("ticks", &self.ticks)
            .field("packets", &self.history.packets().len())
            .field("alerts", &self.history.alerts().len())
            .finish_non_exhaustive()
    }
}

/// 텔레메트리 엔진 빌더
///
/// 설정, 난수 소스, 시계, 분류기를 주입할 수 있습니다.
/// 난수 소스를 지정하지 않으면 `config.seed`에 따라 [`StdRandom`]을 사용합니다.
pub struct TelemetryEngineBuilder {
    config: EngineConfig,
    rng: Option<Box<dyn RandomSource>>,
    clock: Option<Arc<dyn Clock>>,
    classifier: Option<ThreatClassifier>,
}

impl TelemetryEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            rng: None,
            clock: None,
            classifier: None,
        }
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 난수 소스를 주입합니다.
    pub fn random_source(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// 시계를 주입합니다.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// 설정 기반 규칙표 대신 사용할 분류기를 지정합니다.
    pub fn classifier(mut self, classifier: ThreatClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// 엔진을 빌드합니다. 설정이 유효하지 않으면 에러를 반환합니다.
    pub fn build(self) -> Result<TelemetryEngine, EngineError> {
        self.config
            .validate()
            .map_err(|e| EngineError::Config(e.to_string()))?;

        let config = self.config;
        let rng = self
            .rng
            .unwrap_or_else(|| Box::new(StdRandom::from_seed_option(config.seed)));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let classifier = self
            .classifier
            .unwrap_or_else(|| ThreatClassifier::from_config(&config.classifier));

        tracing::info!(
            window_ms = config.window_ms,
            packet_capacity = config.packet_capacity,
            alert_capacity = config.alert_capacity,
            interfaces = config.interfaces.len(),
            seeded = config.seed.is_some(),
            "telemetry engine initialized"
        );

        Ok(TelemetryEngine {
            generator: PacketGenerator::new(config.generator.clone()),
            classifier,
            history: HistoryStore::new(config.packet_capacity, config.alert_capacity),
            aggregator: MetricsAggregator::new(config.window_ms, config.gauges.clone()),
            alerts: AlertGenerator::new(),
            interfaces: InterfaceStatsUpdater::new(
                &config.interfaces,
                config.interface_sample_probability,
            ),
            rng,
            clock,
            config,
            ticks: 0,
        })
    }
}

impl Default for TelemetryEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
