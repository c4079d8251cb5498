//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 크레이트는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `netpulse_`
//! - 모듈명: `engine_`, `bridge_`, `daemon_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use netpulse_core::metrics as m;
//!
//! metrics::counter!(m::ENGINE_TICKS_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 프로토콜 레이블 키 (TCP, UDP, ICMP, ...)
pub const LABEL_PROTOCOL: &str = "protocol";

/// 심각도 레이블 키 (low, medium, high, critical)
pub const LABEL_SEVERITY: &str = "severity";

/// 인터페이스 레이블 키 (eth0, wlan0, lo)
pub const LABEL_INTERFACE: &str = "interface";

/// 프레임 거부 사유 레이블 키
pub const LABEL_REASON: &str = "reason";

// ─── Engine 메트릭 ────────────────────────────────────────────────

/// Engine: 실행된 tick 수 (counter)
pub const ENGINE_TICKS_TOTAL: &str = "netpulse_engine_ticks_total";

/// Engine: 생성된 전체 패킷 수 (counter)
pub const ENGINE_PACKETS_TOTAL: &str = "netpulse_engine_packets_total";

/// Engine: 생성된 전체 바이트 수 (counter)
pub const ENGINE_BYTES_TOTAL: &str = "netpulse_engine_bytes_total";

/// Engine: 생성된 알림 수 (counter, label: severity)
pub const ENGINE_ALERTS_TOTAL: &str = "netpulse_engine_alerts_total";

/// Engine: 윈도우 기준 초당 패킷 수 (gauge)
pub const ENGINE_PACKETS_PER_SECOND: &str = "netpulse_engine_packets_per_second";

/// Engine: 윈도우 기준 초당 바이트 수 (gauge)
pub const ENGINE_BYTES_PER_SECOND: &str = "netpulse_engine_bytes_per_second";

/// Engine: 윈도우 내 고유 출발지 주소 수 (gauge)
pub const ENGINE_UNIQUE_IPS: &str = "netpulse_engine_unique_ips";

/// Engine: 윈도우 내 프로토콜별 패킷 수 (gauge, label: protocol)
pub const ENGINE_PROTOCOL_PACKETS: &str = "netpulse_engine_protocol_packets";

/// Engine: 패킷 히스토리 크기 (gauge)
pub const ENGINE_HISTORY_SIZE: &str = "netpulse_engine_history_size";

/// Engine: 인터페이스 수신 바이트 (gauge, label: interface)
pub const ENGINE_INTERFACE_BYTES_IN: &str = "netpulse_engine_interface_bytes_in";

// ─── Bridge 메트릭 ────────────────────────────────────────────────

/// Bridge: 수신한 프레임 수 (counter)
pub const BRIDGE_FRAMES_TOTAL: &str = "netpulse_bridge_frames_total";

/// Bridge: 디코딩 실패로 버린 프레임 수 (counter, label: reason)
pub const BRIDGE_FRAMES_DROPPED_TOTAL: &str = "netpulse_bridge_frames_dropped_total";

/// Bridge: 프레임 소스 수신 에러 수 (counter)
pub const BRIDGE_SOURCE_ERRORS_TOTAL: &str = "netpulse_bridge_source_errors_total";

/// Bridge: 연결된 구독자 수 (gauge)
pub const BRIDGE_SUBSCRIBERS: &str = "netpulse_bridge_subscribers";

/// Bridge: 구독자 전송 실패 수 (counter)
pub const BRIDGE_SEND_FAILURES_TOTAL: &str = "netpulse_bridge_send_failures_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "netpulse_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "netpulse_daemon_build_info";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
/// 일반적으로 `netpulse-daemon`의 시작 시점에서 호출합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    // Engine
    describe_counter!(ENGINE_TICKS_TOTAL, "Total number of engine ticks executed");
    describe_counter!(
        ENGINE_PACKETS_TOTAL,
        "Total number of synthetic packets generated"
    );
    describe_counter!(ENGINE_BYTES_TOTAL, "Total bytes of synthetic packets generated");
    describe_counter!(
        ENGINE_ALERTS_TOTAL,
        "Threat alerts generated, by severity"
    );
    describe_gauge!(
        ENGINE_PACKETS_PER_SECOND,
        "Packets per second over the rolling window"
    );
    describe_gauge!(
        ENGINE_BYTES_PER_SECOND,
        "Bytes per second over the rolling window"
    );
    describe_gauge!(
        ENGINE_UNIQUE_IPS,
        "Distinct source addresses in the rolling window"
    );
    describe_gauge!(
        ENGINE_PROTOCOL_PACKETS,
        "Packets per protocol in the rolling window"
    );
    describe_gauge!(ENGINE_HISTORY_SIZE, "Packets currently held in history");
    describe_gauge!(
        ENGINE_INTERFACE_BYTES_IN,
        "Cumulative inbound bytes per simulated interface"
    );

    // Bridge
    describe_counter!(BRIDGE_FRAMES_TOTAL, "Raw frames received by the bridge");
    describe_counter!(
        BRIDGE_FRAMES_DROPPED_TOTAL,
        "Frames dropped because they failed to decode"
    );
    describe_counter!(
        BRIDGE_SOURCE_ERRORS_TOTAL,
        "Receive errors reported by the frame source"
    );
    describe_gauge!(BRIDGE_SUBSCRIBERS, "Connected bridge subscribers");
    describe_counter!(
        BRIDGE_SEND_FAILURES_TOTAL,
        "Messages that could not be delivered to a subscriber"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Netpulse daemon uptime in seconds");
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
