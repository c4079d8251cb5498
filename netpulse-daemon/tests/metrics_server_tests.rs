//! Integration tests for metrics server functionality.
//!
//! The global recorder can only be installed once per process, so exactly
//! one test here is expected to install it successfully.

use netpulse_core::config::MetricsConfig;
use netpulse_daemon::metrics_server;
use serial_test::serial;

#[test]
#[serial]
fn test_install_metrics_recorder_succeeds_with_valid_config() {
    // Given: A valid metrics configuration
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "127.0.0.1".to_string(),
        port: 19190, // Non-standard port to avoid conflicts
        endpoint: "/metrics".to_string(),
    };

    // When: Installing the metrics recorder
    let result = metrics_server::install_metrics_recorder(&config);

    // Then: Should succeed
    assert!(
        result.is_ok(),
        "install_metrics_recorder should succeed with valid config: {:?}",
        result.err()
    );
}

#[test]
#[serial]
fn test_install_metrics_recorder_fails_with_invalid_address() {
    // Given: An invalid listen address
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "999.999.999.999".to_string(),
        port: 9100,
        endpoint: "/metrics".to_string(),
    };

    let result = metrics_server::install_metrics_recorder(&config);

    // Then: Rejected before any recorder is installed
    let err = result.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(err.contains("invalid metrics listen address"), "unexpected: {err}");
}

#[test]
#[serial]
fn test_install_metrics_recorder_rejects_unsupported_endpoint() {
    let config = MetricsConfig {
        enabled: true,
        listen_addr: "127.0.0.1".to_string(),
        port: 19191,
        endpoint: "/custom".to_string(),
    };

    let result = metrics_server::install_metrics_recorder(&config);

    let err = result.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(err.contains("unsupported metrics endpoint"), "unexpected: {err}");
}
