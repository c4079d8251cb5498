//! 캡처 루프: 프레임 소스에서 받은 프레임을 디코딩, 분류, 브로드캐스트합니다.
//!
//! 디코딩에 실패한 프레임은 warn 로그와 카운터만 남기고 버립니다.
//! 잘못된 프레임이나 소스의 일시적 수신 에러 때문에 루프가 끝나는 일은 없습니다.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use netpulse_core::metrics as m;

use crate::error::{BridgeError, FrameError};
use crate::frame::decode_frame;
use crate::hub::BroadcastHub;
use crate::message::{BridgeMessage, BridgePacket, now_ms};
use crate::source::FrameSource;

/// 소스 수신 에러 후 다시 읽기 전 대기 시간
const SOURCE_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// 캡처 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// 수신한 프레임 수
    pub frames: u64,
    /// 브로드캐스트된 메시지 수
    pub published: u64,
    /// 디코딩 실패로 버린 프레임 수
    pub dropped: u64,
    /// 프레임 소스 수신 에러 수
    pub source_errors: u64,
}

/// 원시 프레임 하나를 브리지 메시지로 변환합니다.
pub fn process_frame(data: &[u8], timestamp: u64) -> Result<BridgeMessage, FrameError> {
    let frame = decode_frame(data)?;
    Ok(BridgeMessage::single(BridgePacket::from_frame(
        &frame, timestamp,
    )))
}

/// 캡처 루프
pub struct CaptureBridge<S> {
    source: S,
    hub: Arc<BroadcastHub>,
    stats: CaptureStats,
}

impl<S: FrameSource> CaptureBridge<S> {
    pub fn new(source: S, hub: Arc<BroadcastHub>) -> Self {
        Self {
            source,
            hub,
            stats: CaptureStats::default(),
        }
    }

    /// 취소되거나 소스가 끝날 때까지 프레임을 처리합니다.
    ///
    /// 소스 수신 에러는 기록하고 잠시 대기한 뒤 계속 읽습니다.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<CaptureStats, BridgeError> {
        info!("capture loop started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("capture loop received shutdown signal");
                    break;
                }
                frame = self.source.next_frame() => {
                    match frame {
                        Ok(Some(data)) => self.handle_frame(&data).await,
                        Ok(None) => {
                            info!("frame source exhausted");
                            break;
                        }
                        Err(e) => {
                            self.stats.source_errors += 1;
                            metrics::counter!(m::BRIDGE_SOURCE_ERRORS_TOTAL).increment(1);
                            warn!(error = %e, "frame source receive error, continuing");
                            tokio::time::sleep(SOURCE_ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }

        info!(
            frames = self.stats.frames,
            published = self.stats.published,
            dropped = self.stats.dropped,
            source_errors = self.stats.source_errors,
            "capture loop stopped"
        );
        Ok(self.stats)
    }

    /// 프레임 하나를 처리합니다. 실패해도 에러를 반환하지 않습니다.
    pub async fn handle_frame(&mut self, data: &[u8]) {
        self.stats.frames += 1;
        metrics::counter!(m::BRIDGE_FRAMES_TOTAL).increment(1);

        let message = match process_frame(data, now_ms()) {
            Ok(message) => message,
            Err(e) => {
                self.stats.dropped += 1;
                metrics::counter!(m::BRIDGE_FRAMES_DROPPED_TOTAL, m::LABEL_REASON => e.reason())
                    .increment(1);
                warn!(error = %e, len = data.len(), "packet decode error, frame skipped");
                return;
            }
        };

        let payload = match message.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.dropped += 1;
                warn!(error = %e, "failed to serialize bridge message");
                return;
            }
        };

        let report = self.hub.broadcast(payload).await;
        self.stats.published += 1;
        debug!(
            delivered = report.delivered,
            skipped = report.skipped,
            removed = report.removed,
            "bridge message broadcast"
        );
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::IPPROTO_TCP;
    use crate::frame::testing::ipv4_frame;
    use crate::source::ChannelFrameSource;
    use bytes::Bytes;

    #[test]
    fn process_frame_builds_single_packet_message() {
        let frame = ipv4_frame([10, 0, 0, 5], [10, 0, 0, 1], IPPROTO_TCP, 10);
        let message = process_frame(&frame, 42).unwrap();
        assert_eq!(message.packets.len(), 1);
        assert_eq!(message.packets[0].timestamp, 42);
        assert_eq!(message.packets[0].size, frame.len());
    }

    #[tokio::test]
    async fn bad_frames_are_skipped_and_loop_continues() {
        let hub = Arc::new(BroadcastHub::new(8));
        let (_, mut rx) = hub.subscribe().await;
        let (tx, source) = ChannelFrameSource::new(8);
        let mut bridge = CaptureBridge::new(source, Arc::clone(&hub));

        tx.send(Bytes::from_static(&[0u8; 5])).await.unwrap();
        tx.send(Bytes::from(ipv4_frame([1, 2, 3, 4], [5, 6, 7, 1], IPPROTO_TCP, 0)))
            .await
            .unwrap();
        drop(tx);

        let stats = bridge.run(CancellationToken::new()).await.unwrap();
        assert_eq!(
            stats,
            CaptureStats {
                frames: 2,
                published: 1,
                dropped: 1,
                source_errors: 0,
            }
        );

        let payload = rx.recv().await.unwrap();
        let message: BridgeMessage = serde_json::from_slice(&payload).unwrap();
        assert_eq!(message.packets[0].destination_ip.to_string(), "5.6.7.1");
    }

    /// 미리 정해 둔 결과를 순서대로 돌려주는 소스
    struct ScriptedSource {
        results: std::collections::VecDeque<Result<Option<Bytes>, BridgeError>>,
    }

    impl FrameSource for ScriptedSource {
        async fn next_frame(&mut self) -> Result<Option<Bytes>, BridgeError> {
            self.results.pop_front().unwrap_or(Ok(None))
        }
    }

    #[tokio::test]
    async fn source_errors_do_not_stop_the_loop() {
        let hub = Arc::new(BroadcastHub::new(8));
        let (_, mut rx) = hub.subscribe().await;
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "icmp unreachable");
        let source = ScriptedSource {
            results: [
                Err(BridgeError::Io(refused)),
                Ok(Some(Bytes::from(ipv4_frame(
                    [10, 0, 0, 2],
                    [10, 0, 0, 1],
                    IPPROTO_TCP,
                    0,
                )))),
            ]
            .into(),
        };
        let mut bridge = CaptureBridge::new(source, Arc::clone(&hub));

        let stats = bridge.run(CancellationToken::new()).await.unwrap();
        assert_eq!(stats.source_errors, 1);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.published, 1);
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn cancellation_stops_idle_loop() {
        let hub = Arc::new(BroadcastHub::new(8));
        let (_tx, source) = ChannelFrameSource::new(8);
        let mut bridge = CaptureBridge::new(source, hub);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let stats = bridge.run(cancel).await.unwrap();
        assert_eq!(stats.frames, 0);
    }
}
