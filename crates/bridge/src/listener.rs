//! 구독자 WebSocket 리스너
//!
//! 연결마다 WebSocket 핸드셰이크를 마친 뒤 허브에 구독자를 등록하고,
//! 브리지 메시지 하나를 JSON 텍스트 프레임 하나로 보냅니다. 클라이언트가
//! 보내는 메시지는 읽어서 버리며, close 프레임이나 전송 실패가 나면 연결을
//! 정리합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::BridgeError;
use crate::hub::BroadcastHub;

/// 핸들러가 공유하는 상태
#[derive(Clone)]
struct ListenerState {
    hub: Arc<BroadcastHub>,
    slots: Arc<Semaphore>,
    max_subscribers: usize,
    cancel: CancellationToken,
}

/// 구독자 WebSocket 리스너
pub struct SubscriberListener {
    listener: TcpListener,
    hub: Arc<BroadcastHub>,
    max_subscribers: usize,
}

impl SubscriberListener {
    /// 주소에 바인드합니다.
    pub async fn bind(
        addr: &str,
        hub: Arc<BroadcastHub>,
        max_subscribers: usize,
    ) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| BridgeError::Bind {
                addr: addr.to_owned(),
                reason: e.to_string(),
            })?;
        info!(addr = %addr, "subscriber listener bound");
        Ok(Self {
            listener,
            hub,
            max_subscribers: max_subscribers.max(1),
        })
    }

    /// 실제 바인드된 주소 (포트 0 바인드 시 유용)
    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        Ok(self.listener.local_addr()?)
    }

    /// 취소될 때까지 연결을 수락합니다.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), BridgeError> {
        let state = ListenerState {
            hub: self.hub,
            slots: Arc::new(Semaphore::new(self.max_subscribers)),
            max_subscribers: self.max_subscribers,
            cancel: cancel.clone(),
        };
        let app = Router::new()
            .route("/", get(upgrade))
            .with_state(state);

        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
            info!("subscriber listener received shutdown signal");
        })
        .await?;

        Ok(())
    }
}

/// 연결 수 제한을 확인한 뒤 WebSocket으로 업그레이드합니다.
async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<ListenerState>,
) -> Response {
    let permit = match Arc::clone(&state.slots).try_acquire_owned() {
        Ok(p) => p,
        Err(_) => {
            warn!(peer = %peer, max = state.max_subscribers, "max subscribers reached, rejecting");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    };

    ws.on_upgrade(move |socket| async move {
        serve_subscriber(socket, peer, state.hub, state.cancel).await;
        drop(permit);
    })
}

/// 연결 하나를 처리합니다.
async fn serve_subscriber(
    socket: WebSocket,
    peer: SocketAddr,
    hub: Arc<BroadcastHub>,
    cancel: CancellationToken,
) {
    let (id, mut rx) = hub.subscribe().await;
    let clients = hub.len().await;
    info!(peer = %peer, clients, "client connected");

    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else { break };
                let text = match Utf8Bytes::try_from(message) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(peer = %peer, error = %e, "bridge message is not valid UTF-8");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    debug!(peer = %peer, error = %e, "send to subscriber failed");
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
        }
    }

    hub.unsubscribe(id).await;
    let clients = hub.len().await;
    info!(peer = %peer, clients, "client disconnected");
}
