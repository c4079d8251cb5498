#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`engine`]: tick 컨트롤러 ([`TelemetryEngine`]) 및 빌더
//! - [`driver`]: 주기 실행 및 스냅샷 broadcast ([`TickDriver`])
//! - [`generator`]: 합성 패킷 생성
//! - [`classifier`]: 순서가 있는 위협 분류 규칙
//! - [`history`]: 용량 제한 히스토리
//! - [`aggregator`]: 롤링 윈도우 메트릭 집계
//! - [`alert`]: 배치 단위 알림 생성
//! - [`interfaces`]: 인터페이스 카운터 갱신
//! - [`random`], [`clock`]: 주입 가능한 난수 소스와 시계
//! - [`error`]: 도메인 에러 타입

pub mod aggregator;
pub mod alert;
pub mod classifier;
pub mod clock;
pub mod driver;
pub mod engine;
pub mod error;
pub mod generator;
pub mod history;
pub mod interfaces;
pub mod random;

// --- 주요 타입 re-export ---

// 엔진
pub use driver::{SharedEngine, TickDriver};
pub use engine::{TelemetryEngine, TelemetryEngineBuilder};

// 에러
pub use error::EngineError;

// 구성 요소
pub use aggregator::MetricsAggregator;
pub use alert::AlertGenerator;
pub use classifier::{Classification, ClassificationRule, RuleCondition, ThreatClassifier};
pub use generator::PacketGenerator;
pub use history::{BoundedHistory, HistoryStore};
pub use interfaces::InterfaceStatsUpdater;

// 주입 가능한 의존성
pub use clock::{Clock, ManualClock, SystemClock};
pub use random::{RandomSource, ScriptedRandom, StdRandom};
