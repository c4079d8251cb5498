//! Ethernet II / IPv4 프레임 디코더
//!
//! 캡처된 원시 프레임에서 출발지/목적지 주소와 IP 프로토콜 번호만 추출합니다.
//! 헤더 슬라이싱과 길이 검증은 `etherparse`가 담당하며, 상위 계층(TCP/UDP 헤더,
//! 페이로드)은 해석하지 않습니다.
//!
//! ```text
//! | dst mac (6) | src mac (6) | [0x8100 TCI (4)] | ethertype (2) | IPv4 header ... |
//! ```

use std::net::Ipv4Addr;

use etherparse::{Ethernet2HeaderSlice, Ipv4HeaderSlice, ReadError, SingleVlanHeaderSlice};

use crate::error::FrameError;

/// Ethernet II 헤더 길이
pub const ETHERNET_HEADER_LEN: usize = 14;

/// IPv4 최소 헤더 길이
pub const IPV4_MIN_HEADER_LEN: usize = 20;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_VLAN: u16 = 0x8100;

/// IP 프로토콜 번호
pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;

/// 디코딩된 IPv4 프레임 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// IP 헤더의 프로토콜 번호
    pub protocol: u8,
    /// 캡처된 전체 프레임 크기 (바이트)
    pub size: usize,
    /// VLAN 태그 존재 여부
    pub vlan_tagged: bool,
}

/// 원시 프레임을 디코딩합니다.
///
/// # Errors
/// - 헤더가 잘린 경우 [`FrameError::TooShort`]
/// - IPv4가 아닌 EtherType이면 [`FrameError::UnsupportedEtherType`]
/// - IP 버전이 4가 아니면 [`FrameError::NotIpv4`]
/// - IHL이 5 미만이면 [`FrameError::InvalidHeaderLength`]
/// - total length가 헤더보다 작으면 [`FrameError::InvalidTotalLength`]
pub fn decode_frame(data: &[u8]) -> Result<DecodedFrame, FrameError> {
    let ethernet =
        Ethernet2HeaderSlice::from_slice(data).map_err(|e| frame_error(e, 0, data.len()))?;
    let mut ethertype = ethernet.ether_type();
    let mut offset = ethernet.slice().len();

    let vlan_tagged = ethertype == ETHERTYPE_VLAN;
    if vlan_tagged {
        let vlan = SingleVlanHeaderSlice::from_slice(&data[offset..])
            .map_err(|e| frame_error(e, offset, data.len()))?;
        ethertype = vlan.ether_type();
        offset += vlan.slice().len();
    }

    if ethertype != ETHERTYPE_IPV4 {
        return Err(FrameError::UnsupportedEtherType(ethertype));
    }

    // 버전, IHL, 옵션 포함 헤더 길이, total length를 모두 검사한다
    let ip = Ipv4HeaderSlice::from_slice(&data[offset..])
        .map_err(|e| frame_error(e, offset, data.len()))?;

    Ok(DecodedFrame {
        source: ip.source_addr(),
        destination: ip.destination_addr(),
        protocol: ip.protocol(),
        size: data.len(),
        vlan_tagged,
    })
}

/// `etherparse` 에러를 프레임 에러로 변환합니다. `offset`은 헤더가 시작한 위치입니다.
fn frame_error(err: ReadError, offset: usize, actual: usize) -> FrameError {
    match err {
        ReadError::UnexpectedEndOfSlice(needed) => FrameError::TooShort {
            needed: offset + needed,
            actual,
        },
        ReadError::Ipv4UnexpectedVersion(version) => FrameError::NotIpv4(version),
        ReadError::Ipv4HeaderLengthBad(ihl) => FrameError::InvalidHeaderLength(ihl),
        ReadError::Ipv4TotalLengthTooSmall(len) => FrameError::InvalidTotalLength(len),
        other => FrameError::Malformed(other.to_string()),
    }
}

/// 테스트용 프레임 빌더
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub fn ipv4_frame(src: [u8; 4], dst: [u8; 4], protocol: u8, payload_len: usize) -> Vec<u8> {
        let mut frame = vec![0u8; ETHERNET_HEADER_LEN];
        frame[12..14].copy_from_slice(&ETHERTYPE_IPV4.to_be_bytes());

        let total_len = (IPV4_MIN_HEADER_LEN + payload_len) as u16;
        let mut ip = [0u8; IPV4_MIN_HEADER_LEN];
        ip[0] = 0x45;
        ip[2..4].copy_from_slice(&total_len.to_be_bytes());
        ip[8] = 64;
        ip[9] = protocol;
        ip[12..16].copy_from_slice(&src);
        ip[16..20].copy_from_slice(&dst);
        frame.extend_from_slice(&ip);
        frame.resize(frame.len() + payload_len, 0);
        frame
    }
}
