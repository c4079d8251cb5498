//! netpulse.toml 통합 설정 테스트
//!
//! - netpulse.toml.example 파싱 테스트
//! - 파일 로딩 + 환경변수 우선순위 테스트
//! - 잘못된 형식 에러 테스트

use std::io::Write;
use std::net::Ipv4Addr;

use netpulse_core::config::NetpulseConfig;
use netpulse_core::error::{ConfigError, NetpulseError};
use serial_test::serial;

const EXAMPLE: &str = include_str!("../../../netpulse.toml.example");

// =============================================================================
// netpulse.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = NetpulseConfig::parse(EXAMPLE).expect("example config should parse");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.engine.seed, None);
}

#[test]
fn example_config_passes_validation() {
    let config = NetpulseConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_defaults() {
    let config = NetpulseConfig::parse(EXAMPLE).expect("should parse");
    let defaults = NetpulseConfig::default();

    assert_eq!(config.engine.window_ms, defaults.engine.window_ms);
    assert_eq!(config.engine.packet_capacity, defaults.engine.packet_capacity);
    assert_eq!(config.engine.alert_capacity, defaults.engine.alert_capacity);
    assert_eq!(config.engine.interfaces, defaults.engine.interfaces);
    assert_eq!(
        config.engine.generator.well_known_ports,
        defaults.engine.generator.well_known_ports
    );
    assert_eq!(
        config.engine.classifier.suspicious_probability,
        defaults.engine.classifier.suspicious_probability
    );
    assert_eq!(config.bridge.subscriber_bind, defaults.bridge.subscriber_bind);
    assert_eq!(config.metrics.port, defaults.metrics.port);
}

#[test]
fn example_config_interfaces() {
    let config = NetpulseConfig::parse(EXAMPLE).expect("should parse");
    let names: Vec<&str> = config
        .engine
        .interfaces
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(names, vec!["eth0", "wlan0", "lo"]);
    assert_eq!(config.engine.interfaces[2].ip, Ipv4Addr::LOCALHOST);
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
#[serial]
async fn load_reads_file_and_applies_env() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[engine]\nwindow_ms = 10000\nbatch_max = 20").unwrap();

    // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
    unsafe { std::env::set_var("NETPULSE_ENGINE_BATCH_MAX", "30") };
    let config = NetpulseConfig::load(file.path()).await;
    unsafe { std::env::remove_var("NETPULSE_ENGINE_BATCH_MAX") };

    let config = config.unwrap();
    assert_eq!(config.engine.window_ms, 10_000);
    // 환경변수가 파일 값보다 우선
    assert_eq!(config.engine.batch_max, 30);
}

#[tokio::test]
#[serial]
async fn load_rejects_env_override_that_fails_validation() {
    let file = tempfile::NamedTempFile::new().unwrap();

    // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
    unsafe { std::env::set_var("NETPULSE_ENGINE_WINDOW_MS", "0") };
    let result = NetpulseConfig::load(file.path()).await;
    unsafe { std::env::remove_var("NETPULSE_ENGINE_WINDOW_MS") };

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        NetpulseError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "engine.window_ms"
    ));
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[engine]\nbatch_min = 10\nbatch_max = 2").unwrap();

    let err = NetpulseConfig::from_file(file.path()).await.unwrap_err();
    assert!(err.to_string().contains("engine.batch_min"));
}

#[tokio::test]
async fn from_file_reports_parse_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[engine\nwindow_ms = ").unwrap();

    let err = NetpulseConfig::from_file(file.path()).await.unwrap_err();
    assert!(matches!(
        err,
        NetpulseError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn unknown_interface_address_is_rejected() {
    let toml = r#"
[[engine.interfaces]]
name = "eth0"
ip = "999.1.1.1"
"#;
    assert!(NetpulseConfig::parse(toml).is_err());
}
