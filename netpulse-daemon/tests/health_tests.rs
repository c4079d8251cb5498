//! Health aggregation tests.

use netpulse_core::pipeline::HealthStatus;
use netpulse_daemon::health::{DaemonHealth, ModuleHealth, aggregate_status};

fn module(name: &str, enabled: bool, status: HealthStatus) -> ModuleHealth {
    ModuleHealth {
        name: name.to_owned(),
        enabled,
        status,
    }
}

#[test]
fn test_aggregate_status_all_healthy() {
    let modules = vec![
        module("tick-driver", true, HealthStatus::Healthy),
        module("capture-bridge", true, HealthStatus::Healthy),
    ];
    assert!(aggregate_status(&modules).is_healthy());
}

#[test]
fn test_aggregate_status_empty_is_healthy() {
    assert!(aggregate_status(&[]).is_healthy());
}

#[test]
fn test_aggregate_status_one_degraded() {
    let modules = vec![
        module("tick-driver", true, HealthStatus::Healthy),
        module(
            "capture-bridge",
            true,
            HealthStatus::Degraded("subscriber listener exited".to_owned()),
        ),
    ];
    assert_eq!(
        aggregate_status(&modules),
        HealthStatus::Degraded("capture-bridge: subscriber listener exited".to_owned())
    );
}

#[test]
fn test_aggregate_status_unhealthy_wins_over_degraded() {
    let modules = vec![
        module("capture-bridge", true, HealthStatus::Degraded("slow".to_owned())),
        module("tick-driver", true, HealthStatus::Unhealthy("stopped".to_owned())),
    ];
    match aggregate_status(&modules) {
        HealthStatus::Unhealthy(reason) => {
            assert!(reason.contains("capture-bridge: slow"));
            assert!(reason.contains("tick-driver: stopped"));
            assert!(reason.contains("; "));
        }
        other => panic!("expected unhealthy, got {other:?}"),
    }
}

#[test]
fn test_aggregate_status_ignores_disabled_modules() {
    let modules = vec![
        module("tick-driver", true, HealthStatus::Healthy),
        module(
            "capture-bridge",
            false,
            HealthStatus::Unhealthy("not started".to_owned()),
        ),
    ];
    assert!(aggregate_status(&modules).is_healthy());
}

#[test]
fn test_daemon_health_serializes_to_json() {
    let health = DaemonHealth {
        status: HealthStatus::Healthy,
        uptime_secs: 12,
        ticks_published: 6,
        modules: vec![module("tick-driver", true, HealthStatus::Healthy)],
    };
    let json = serde_json::to_value(&health).unwrap();
    assert_eq!(json["status"]["status"], "healthy");
    assert_eq!(json["ticks_published"], 6);
    assert_eq!(json["modules"][0]["name"], "tick-driver");
}
