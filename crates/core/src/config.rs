//! 설정 관리: netpulse.toml 파싱 및 런타임 설정
//!
//! [`NetpulseConfig`]는 엔진, 브리지, 메트릭 설정을 담는 최상위 구조체입니다.
//! 엔진의 모든 튜닝 값(윈도우, 용량, 배치 크기, 분류 확률, 게이지 범위,
//! 인터페이스 목록)은 이 구조체 하나에서 나옵니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`NETPULSE_ENGINE_TICK_INTERVAL_MS=500` 형식)
//! 3. 설정 파일 (`netpulse.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), netpulse_core::error::NetpulseError> {
//! use netpulse_core::config::NetpulseConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = NetpulseConfig::load("netpulse.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = NetpulseConfig::parse("[engine]\nwindow_ms = 30000")?;
//! # Ok(())
//! # }
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, NetpulseError};

/// Netpulse 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetpulseConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 텔레메트리 엔진 설정
    #[serde(default)]
    pub engine: EngineConfig,
    /// 라이브 캡처 브리지 설정
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl NetpulseConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, NetpulseError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, NetpulseError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NetpulseError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                NetpulseError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, NetpulseError> {
        toml::from_str(toml_str).map_err(|e| {
            NetpulseError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `NETPULSE_{SECTION}_{FIELD}`
    /// 예: `NETPULSE_BRIDGE_ENABLED=true`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "NETPULSE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "NETPULSE_GENERAL_LOG_FORMAT");

        // Engine
        override_u64(
            &mut self.engine.tick_interval_ms,
            "NETPULSE_ENGINE_TICK_INTERVAL_MS",
        );
        override_u64(&mut self.engine.window_ms, "NETPULSE_ENGINE_WINDOW_MS");
        override_usize(
            &mut self.engine.packet_capacity,
            "NETPULSE_ENGINE_PACKET_CAPACITY",
        );
        override_usize(
            &mut self.engine.alert_capacity,
            "NETPULSE_ENGINE_ALERT_CAPACITY",
        );
        override_usize(&mut self.engine.batch_min, "NETPULSE_ENGINE_BATCH_MIN");
        override_usize(&mut self.engine.batch_max, "NETPULSE_ENGINE_BATCH_MAX");
        override_opt_u64(&mut self.engine.seed, "NETPULSE_ENGINE_SEED");

        // Bridge
        override_bool(&mut self.bridge.enabled, "NETPULSE_BRIDGE_ENABLED");
        override_string(&mut self.bridge.frame_bind, "NETPULSE_BRIDGE_FRAME_BIND");
        override_string(
            &mut self.bridge.subscriber_bind,
            "NETPULSE_BRIDGE_SUBSCRIBER_BIND",
        );
        override_usize(
            &mut self.bridge.subscriber_buffer,
            "NETPULSE_BRIDGE_SUBSCRIBER_BUFFER",
        );
        override_usize(
            &mut self.bridge.max_subscribers,
            "NETPULSE_BRIDGE_MAX_SUBSCRIBERS",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "NETPULSE_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "NETPULSE_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "NETPULSE_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), NetpulseError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        self.engine.validate()?;

        if self.bridge.enabled {
            self.bridge.validate()?;
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> NetpulseError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

fn check_probability(field: &str, value: f64) -> Result<(), NetpulseError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(field, format!("must be within [0, 1], got {value}")));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<(), NetpulseError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            field,
            format!("must be a finite non-negative number, got {value}"),
        ));
    }
    Ok(())
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 텔레메트리 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// tick 주기 (밀리초)
    pub tick_interval_ms: u64,
    /// 메트릭 집계 윈도우 (밀리초)
    pub window_ms: u64,
    /// 패킷 히스토리 최대 크기
    pub packet_capacity: usize,
    /// 알림 히스토리 최대 크기
    pub alert_capacity: usize,
    /// tick 스냅샷에 포함할 최근 패킷 수
    pub packet_view: usize,
    /// tick 스냅샷에 포함할 최근 알림 수
    pub alert_view: usize,
    /// tick당 최소 생성 패킷 수
    pub batch_min: usize,
    /// tick당 최대 생성 패킷 수 (포함)
    pub batch_max: usize,
    /// 인터페이스별 패킷 샘플링 확률
    pub interface_sample_probability: f64,
    /// 난수 시드 (없으면 OS 엔트로피 사용)
    pub seed: Option<u64>,
    /// 패킷 생성기 설정
    pub generator: GeneratorConfig,
    /// 위협 분류기 설정
    pub classifier: ClassifierConfig,
    /// 합성 게이지 설정
    pub gauges: GaugeConfig,
    /// 시뮬레이션 인터페이스 목록
    pub interfaces: Vec<InterfaceConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2_000,
            window_ms: 60_000,
            packet_capacity: 1_000,
            alert_capacity: 50,
            packet_view: 100,
            alert_view: 10,
            batch_min: 5,
            batch_max: 14,
            interface_sample_probability: 0.3,
            seed: None,
            generator: GeneratorConfig::default(),
            classifier: ClassifierConfig::default(),
            gauges: GaugeConfig::default(),
            interfaces: vec![
                InterfaceConfig::new("eth0", Ipv4Addr::new(192, 168, 1, 100)),
                InterfaceConfig::new("wlan0", Ipv4Addr::new(10, 0, 0, 50)),
                InterfaceConfig::new("lo", Ipv4Addr::LOCALHOST),
            ],
        }
    }
}

impl EngineConfig {
    /// 엔진 설정의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), NetpulseError> {
        if self.tick_interval_ms == 0 {
            return Err(invalid("engine.tick_interval_ms", "must be greater than 0"));
        }
        if self.window_ms == 0 {
            return Err(invalid("engine.window_ms", "must be greater than 0"));
        }
        if self.packet_capacity == 0 {
            return Err(invalid("engine.packet_capacity", "must be greater than 0"));
        }
        if self.alert_capacity == 0 {
            return Err(invalid("engine.alert_capacity", "must be greater than 0"));
        }
        if self.packet_view > self.packet_capacity {
            return Err(invalid(
                "engine.packet_view",
                "must not exceed engine.packet_capacity",
            ));
        }
        if self.alert_view > self.alert_capacity {
            return Err(invalid(
                "engine.alert_view",
                "must not exceed engine.alert_capacity",
            ));
        }
        if self.batch_min > self.batch_max {
            return Err(invalid(
                "engine.batch_min",
                format!(
                    "must not exceed engine.batch_max ({} > {})",
                    self.batch_min, self.batch_max
                ),
            ));
        }
        check_probability(
            "engine.interface_sample_probability",
            self.interface_sample_probability,
        )?;
        if self.interfaces.is_empty() {
            return Err(invalid("engine.interfaces", "at least one interface is required"));
        }
        if self.interfaces.iter().any(|i| i.name.is_empty()) {
            return Err(invalid("engine.interfaces.name", "must not be empty"));
        }

        self.generator.validate()?;
        self.classifier.validate()?;
        self.gauges.validate()?;
        Ok(())
    }
}

/// 패킷 생성기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// 잘 알려진 포트 목록에서 포트를 고를 확률
    pub well_known_port_probability: f64,
    /// 잘 알려진 포트 목록
    pub well_known_ports: Vec<u16>,
    /// 최소 패킷 크기 (바이트)
    pub min_size: u32,
    /// 패킷 크기 범위 폭 (`[min_size, min_size + size_span)`)
    pub size_span: u32,
    /// 각 TCP 플래그의 포함 확률
    pub tcp_flag_probability: f64,
    /// 국가 코드 후보
    pub countries: Vec<String>,
    /// ISP 후보
    pub isps: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            well_known_port_probability: 0.7,
            well_known_ports: vec![
                80, 443, 22, 21, 25, 53, 110, 143, 993, 995, 3389, 5432, 3306,
            ],
            min_size: 64,
            size_span: 8_192,
            tcp_flag_probability: 0.3,
            countries: ["US", "CN", "RU", "DE", "GB", "FR", "JP", "KR", "IN", "BR"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            isps: [
                "Cloudflare",
                "Amazon AWS",
                "Google Cloud",
                "Microsoft Azure",
                "DigitalOcean",
                "Akamai",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> Result<(), NetpulseError> {
        check_probability(
            "engine.generator.well_known_port_probability",
            self.well_known_port_probability,
        )?;
        check_probability(
            "engine.generator.tcp_flag_probability",
            self.tcp_flag_probability,
        )?;
        if self.well_known_ports.is_empty() {
            return Err(invalid("engine.generator.well_known_ports", "must not be empty"));
        }
        if self.size_span == 0 {
            return Err(invalid("engine.generator.size_span", "must be greater than 0"));
        }
        if self.countries.is_empty() {
            return Err(invalid("engine.generator.countries", "must not be empty"));
        }
        if self.isps.is_empty() {
            return Err(invalid("engine.generator.isps", "must not be empty"));
        }
        Ok(())
    }
}

/// 위협 분류기 설정
///
/// 규칙 순서는 고정이며 확률과 임계값만 조정할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// 무차별 대입 대상 포트
    pub brute_force_port: u16,
    /// 무차별 대입 판정 확률
    pub brute_force_probability: f64,
    /// ICMP DDoS 판정 크기 임계값 (초과)
    pub ddos_icmp_size: u32,
    /// 특권 포트 경계 (미만)
    pub privileged_port_limit: u16,
    /// 악성코드 판정 확률
    pub malware_probability: f64,
    /// 데이터 유출 판정 크기 임계값 (초과)
    pub exfiltration_size: u32,
    /// 데이터 유출 판정 확률
    pub exfiltration_probability: f64,
    /// 의심 트래픽 판정 확률
    pub suspicious_probability: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            brute_force_port: 22,
            brute_force_probability: 0.10,
            ddos_icmp_size: 1_000,
            privileged_port_limit: 1_024,
            malware_probability: 0.05,
            exfiltration_size: 5_000,
            exfiltration_probability: 0.08,
            suspicious_probability: 0.02,
        }
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<(), NetpulseError> {
        check_probability(
            "engine.classifier.brute_force_probability",
            self.brute_force_probability,
        )?;
        check_probability(
            "engine.classifier.malware_probability",
            self.malware_probability,
        )?;
        check_probability(
            "engine.classifier.exfiltration_probability",
            self.exfiltration_probability,
        )?;
        check_probability(
            "engine.classifier.suspicious_probability",
            self.suspicious_probability,
        )?;
        Ok(())
    }
}

/// 합성 게이지 범위 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugeConfig {
    /// 활성 연결 수 최소값
    pub connections_min: u32,
    /// 활성 연결 수 범위 폭
    pub connections_span: u32,
    /// 대역폭 사용률 하한 (%)
    pub utilization_floor: f64,
    /// 대역폭 사용률 범위 폭 (%)
    pub utilization_span: f64,
    /// 대역폭 사용률 상한 (%)
    pub utilization_cap: f64,
    /// 지연 시간 최소값 (ms)
    pub latency_min_ms: f64,
    /// 지연 시간 범위 폭 (ms)
    pub latency_span_ms: f64,
    /// 패킷 손실률 상한 (%, 미포함)
    pub packet_loss_max: f64,
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            connections_min: 100,
            connections_span: 500,
            utilization_floor: 10.0,
            utilization_span: 80.0,
            utilization_cap: 95.0,
            latency_min_ms: 5.0,
            latency_span_ms: 50.0,
            packet_loss_max: 2.0,
        }
    }
}

impl GaugeConfig {
    fn validate(&self) -> Result<(), NetpulseError> {
        check_non_negative("engine.gauges.utilization_floor", self.utilization_floor)?;
        check_non_negative("engine.gauges.utilization_span", self.utilization_span)?;
        check_non_negative("engine.gauges.utilization_cap", self.utilization_cap)?;
        check_non_negative("engine.gauges.latency_min_ms", self.latency_min_ms)?;
        check_non_negative("engine.gauges.latency_span_ms", self.latency_span_ms)?;
        check_non_negative("engine.gauges.packet_loss_max", self.packet_loss_max)?;
        if self.utilization_cap > 100.0 {
            return Err(invalid("engine.gauges.utilization_cap", "must not exceed 100"));
        }
        Ok(())
    }
}

/// 시뮬레이션 인터페이스 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// 인터페이스 이름
    pub name: String,
    /// 주소
    pub ip: Ipv4Addr,
}

impl InterfaceConfig {
    pub fn new(name: impl Into<String>, ip: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            ip,
        }
    }
}

/// 라이브 캡처 브리지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 원시 프레임을 받을 UDP 주소
    pub frame_bind: String,
    /// 구독자 WebSocket 리스너 주소
    pub subscriber_bind: String,
    /// 구독자별 전송 큐 크기
    pub subscriber_buffer: usize,
    /// 최대 동시 구독자 수
    pub max_subscribers: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            frame_bind: "127.0.0.1:9999".to_owned(),
            subscriber_bind: "127.0.0.1:8080".to_owned(),
            subscriber_buffer: 256,
            max_subscribers: 64,
        }
    }
}

impl BridgeConfig {
    fn validate(&self) -> Result<(), NetpulseError> {
        if self.frame_bind.parse::<SocketAddr>().is_err() {
            return Err(invalid(
                "bridge.frame_bind",
                format!("not a valid socket address: {}", self.frame_bind),
            ));
        }
        if self.subscriber_bind.parse::<SocketAddr>().is_err() {
            return Err(invalid(
                "bridge.subscriber_bind",
                format!("not a valid socket address: {}", self.subscriber_bind),
            ));
        }
        if self.subscriber_buffer == 0 {
            return Err(invalid("bridge.subscriber_buffer", "must be greater than 0"));
        }
        if self.max_subscribers == 0 {
            return Err(invalid("bridge.max_subscribers", "must be greater than 0"));
        }
        Ok(())
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리스닝 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    override_parsed(target, env_key, "bool");
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_opt_u64(target: &mut Option<u64>, env_key: &str) {
    let mut value = 0u64;
    if std::env::var(env_key).is_ok() && override_parsed(&mut value, env_key, "u64") {
        *target = Some(value);
    }
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, ty: &str) -> bool {
    let Ok(val) = std::env::var(env_key) else {
        return false;
    };
    match val.parse::<T>() {
        Ok(parsed) => {
            *target = parsed;
            true
        }
        Err(_) => {
            warn!(
                env_key,
                value = val.as_str(),
                ty,
                "failed to parse env var, ignoring"
            );
            false
        }
    }
}
