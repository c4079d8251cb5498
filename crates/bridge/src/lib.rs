#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`frame`]: Ethernet/IPv4 프레임 디코더
//! - [`classify`]: 브리지 단일 분류 규칙과 프로토콜 이름
//! - [`message`]: 구독자에게 보내는 JSON 메시지
//! - [`hub`]: 구독자 fan-out
//! - [`listener`]: 구독자 WebSocket 리스너
//! - [`source`]: 프레임 소스 trait 및 UDP/채널 구현
//! - [`capture`]: 캡처 루프
//! - [`service`]: 데몬용 [`Pipeline`](netpulse_core::Pipeline) 구현
//! - [`error`]: 도메인 에러 타입

pub mod capture;
pub mod classify;
pub mod error;
pub mod frame;
pub mod hub;
pub mod listener;
pub mod message;
pub mod service;
pub mod source;

// --- 주요 타입 re-export ---

pub use capture::{CaptureBridge, CaptureStats, process_frame};
pub use classify::{BridgeProtocol, classify};
pub use error::{BridgeError, FrameError};
pub use frame::{DecodedFrame, decode_frame};
pub use hub::{BroadcastHub, BroadcastReport, SubscriberId};
pub use listener::SubscriberListener;
pub use message::{BridgeMessage, BridgePacket};
pub use service::BridgeService;
pub use source::{ChannelFrameSource, FrameSource, UdpFrameSource};
