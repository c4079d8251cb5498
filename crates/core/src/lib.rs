#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`types`]: 패킷, 메트릭, 알림, 인터페이스 도메인 타입
//! - [`config`]: `netpulse.toml` 설정 (파일 + 환경변수 오버라이드 + 검증)
//! - [`pipeline`]: 장기 실행 모듈의 생명주기 trait
//! - [`metrics`]: Prometheus 메트릭 이름 상수
//! - [`error`]: 공통 에러 타입

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, NetpulseError, PipelineError};

// 설정
pub use config::{
    BridgeConfig, ClassifierConfig, EngineConfig, GaugeConfig, GeneralConfig, GeneratorConfig,
    InterfaceConfig, MetricsConfig, NetpulseConfig,
};

// 파이프라인 trait
pub use pipeline::{BoxFuture, DynPipeline, HealthStatus, Pipeline};

// 도메인 타입
pub use types::{
    GeoLocation, InterfaceStatus, NetworkInterface, NetworkMetrics, Packet, Protocol, TcpFlag,
    ThreatAlert, ThreatLevel, ThreatType, TickSnapshot, TopTalker,
};
