//! 프레임 소스
//!
//! 링크 계층 캡처 자체는 브리지 바깥에 있습니다. 브리지는 [`FrameSource`]에서
//! 원시 프레임을 하나씩 받아 처리할 뿐입니다.
//!
//! - [`UdpFrameSource`]: 데이터그램 하나가 프레임 하나 (포트 미러 익스포터 등)
//! - [`ChannelFrameSource`]: 프로세스 내부에서 프레임을 주입할 때

use std::future::Future;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::error::BridgeError;

/// 최대 프레임 크기 (UDP 데이터그램 최대 크기)
pub const MAX_FRAME_SIZE: usize = 65_535;

/// 원시 프레임 공급자
pub trait FrameSource: Send {
    /// 다음 프레임을 기다립니다. 소스가 끝나면 `Ok(None)`.
    fn next_frame(&mut self) -> impl Future<Output = Result<Option<Bytes>, BridgeError>> + Send;
}

/// UDP 데이터그램 프레임 소스
pub struct UdpFrameSource {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl UdpFrameSource {
    /// 주소에 바인드합니다.
    pub async fn bind(addr: &str) -> Result<Self, BridgeError> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| BridgeError::Bind {
            addr: addr.to_owned(),
            reason: e.to_string(),
        })?;
        tracing::info!(addr = %addr, "frame source bound");
        Ok(Self {
            socket,
            buf: vec![0u8; MAX_FRAME_SIZE],
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        Ok(self.socket.local_addr()?)
    }
}

impl FrameSource for UdpFrameSource {
    async fn next_frame(&mut self) -> Result<Option<Bytes>, BridgeError> {
        let (len, peer) = self.socket.recv_from(&mut self.buf).await?;
        tracing::trace!(len, peer = %peer, "frame datagram received");
        Ok(Some(Bytes::copy_from_slice(&self.buf[..len])))
    }
}

/// mpsc 채널 기반 프레임 소스
pub struct ChannelFrameSource {
    rx: mpsc::Receiver<Bytes>,
}

impl ChannelFrameSource {
    /// 소스와 프레임 주입용 송신자를 만듭니다.
    pub fn new(capacity: usize) -> (mpsc::Sender<Bytes>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }
}

impl FrameSource for ChannelFrameSource {
    async fn next_frame(&mut self) -> Result<Option<Bytes>, BridgeError> {
        Ok(self.rx.recv().await)
    }
}
