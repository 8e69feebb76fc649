//! Slicing captured Ethernet frames down to TCP payloads.
//!
//! Every offset is checked against the captured byte count before use;
//! anything undersized, non-IPv4, or non-TCP yields `None` and is skipped
//! by the caller.

use std::net::Ipv4Addr;

const ETHERNET_HEADER_LEN: usize = 14;
const ETHERTYPE_IPV4: u16 = 0x0800;
const IP_PROTOCOL_TCP: u8 = 6;
const MIN_IPV4_HEADER_LEN: usize = 20;
const MIN_TCP_HEADER_LEN: usize = 20;

/// One TCP segment cut out of a captured Ethernet frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpSegment<'a> {
    /// IPv4 source address.
    pub src_ip: Ipv4Addr,
    /// IPv4 destination address.
    pub dst_ip: Ipv4Addr,
    /// TCP source port.
    pub src_port: u16,
    /// TCP destination port.
    pub dst_port: u16,
    /// The segment's payload bytes.
    pub payload: &'a [u8],
}

/// Extract the TCP payload and endpoints from one captured Ethernet frame.
///
/// Returns `None` for anything that is not a complete IPv4 TCP segment
/// with a non-empty payload. The payload length comes from the IPv4
/// total-length field, not from the capture length, so trailing link-layer
/// padding is never mistaken for payload.
#[must_use]
pub fn extract_tcp_segment(data: &[u8]) -> Option<TcpSegment<'_>> {
    if data.len() < ETHERNET_HEADER_LEN {
        return None;
    }
    let ethertype = u16::from_be_bytes([data[12], data[13]]);
    if ethertype != ETHERTYPE_IPV4 {
        return None;
    }

    let ip = &data[ETHERNET_HEADER_LEN..];
    if ip.len() < MIN_IPV4_HEADER_LEN || (ip[0] >> 4) != 4 {
        return None;
    }

    let ip_header_len = (ip[0] & 0x0F) as usize * 4;
    if ip_header_len < MIN_IPV4_HEADER_LEN || ip.len() < ip_header_len {
        return None;
    }
    if ip[9] != IP_PROTOCOL_TCP {
        return None;
    }

    let total_len = u16::from_be_bytes([ip[2], ip[3]]) as usize;
    let src_ip = Ipv4Addr::new(ip[12], ip[13], ip[14], ip[15]);
    let dst_ip = Ipv4Addr::new(ip[16], ip[17], ip[18], ip[19]);

    let tcp = &ip[ip_header_len..];
    if tcp.len() < MIN_TCP_HEADER_LEN {
        return None;
    }
    let tcp_header_len = ((tcp[12] >> 4) as usize) * 4;
    if tcp_header_len < MIN_TCP_HEADER_LEN || tcp.len() < tcp_header_len {
        return None;
    }

    let src_port = u16::from_be_bytes([tcp[0], tcp[1]]);
    let dst_port = u16::from_be_bytes([tcp[2], tcp[3]]);

    let payload_len = total_len.checked_sub(ip_header_len + tcp_header_len)?;
    if payload_len == 0 {
        return None;
    }
    let payload = tcp.get(tcp_header_len..tcp_header_len + payload_len)?;

    Some(TcpSegment {
        src_ip,
        dst_ip,
        src_port,
        dst_port,
        payload,
    })
}


#[cfg(test)]
mod tests {
    use super::testutil::build_tcp_frame;
    use super::*;

    #[test]
    fn test_extract_basic_segment() {
        let frame = build_tcp_frame(52480, 8080, b"payload bytes");
        let segment = extract_tcp_segment(&frame).unwrap();

        assert_eq!(segment.src_ip, Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(segment.dst_ip, Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(segment.src_port, 52480);
        assert_eq!(segment.dst_port, 8080);
        assert_eq!(segment.payload, b"payload bytes");
    }

    #[test]
    fn test_extract_ignores_link_padding() {
        // Short frames get padded on the wire; the IP total length keeps
        // the padding out of the payload
        let mut frame = build_tcp_frame(1000, 2000, b"abc");
        frame.extend_from_slice(&[0xEE; 7]);

        let segment = extract_tcp_segment(&frame).unwrap();
        assert_eq!(segment.payload, b"abc");
    }

    #[test]
    fn test_extract_empty_payload() {
        let frame = build_tcp_frame(1000, 2000, b"");
        assert!(extract_tcp_segment(&frame).is_none());
    }

    #[test]
    fn test_extract_non_ipv4_ethertype() {
        let mut frame = build_tcp_frame(1000, 2000, b"abc");
        frame[12] = 0x86; // IPv6
        frame[13] = 0xDD;
        assert!(extract_tcp_segment(&frame).is_none());
    }

    #[test]
    fn test_extract_non_tcp_protocol() {
        let mut frame = build_tcp_frame(1000, 2000, b"abc");
        frame[14 + 9] = 17; // UDP
        assert!(extract_tcp_segment(&frame).is_none());
    }

    #[test]
    fn test_extract_undersized_buffers() {
        let frame = build_tcp_frame(1000, 2000, b"abc");

        // Cut inside Ethernet, IPv4, and TCP headers in turn
        assert!(extract_tcp_segment(&frame[..10]).is_none());
        assert!(extract_tcp_segment(&frame[..20]).is_none());
        assert!(extract_tcp_segment(&frame[..40]).is_none());
    }

    #[test]
    fn test_extract_bad_ihl() {
        let mut frame = build_tcp_frame(1000, 2000, b"abc");
        frame[14] = 0x42; // IHL 2, below the minimum of 5
        assert!(extract_tcp_segment(&frame).is_none());
    }

    #[test]
    fn test_extract_ihl_with_options() {
        // Rebuild with IHL 6 (one 4-byte option word)
        let payload = b"opt";
        let mut frame = Vec::new();
        frame.extend_from_slice(&[0x02, 0, 0, 0, 0, 1, 0x02, 0, 0, 0, 0, 2]);
        frame.extend_from_slice(&0x0800u16.to_be_bytes());

        let total_len = (24 + 20 + payload.len()) as u16;
        frame.push(0x46); // version 4, IHL 6
        frame.push(0x00);
        frame.extend_from_slice(&total_len.to_be_bytes());
        frame.extend_from_slice(&[0x00; 4]);
        frame.push(64);
        frame.push(6);
        frame.extend_from_slice(&[0x00; 2]);
        frame.extend_from_slice(&[172, 16, 0, 1]);
        frame.extend_from_slice(&[172, 16, 0, 2]);
        frame.extend_from_slice(&[0x00; 4]); // the option word

        frame.extend_from_slice(&4444u16.to_be_bytes());
        frame.extend_from_slice(&5555u16.to_be_bytes());
        frame.extend_from_slice(&[0x00; 8]);
        frame.push(0x50);
        frame.push(0x18);
        frame.extend_from_slice(&[0x00; 6]);
        frame.extend_from_slice(payload);

        let segment = extract_tcp_segment(&frame).unwrap();
        assert_eq!(segment.src_ip, Ipv4Addr::new(172, 16, 0, 1));
        assert_eq!(segment.payload, b"opt");
    }

    #[test]
    fn test_extract_bad_tcp_data_offset() {
        let mut frame = build_tcp_frame(1000, 2000, b"abc");
        frame[14 + 20 + 12] = 0x20; // data offset 2, below the minimum of 5
        assert!(extract_tcp_segment(&frame).is_none());
    }

    #[test]
    fn test_extract_truncated_capture() {
        // Total length claims more payload than was captured
        let mut frame = build_tcp_frame(1000, 2000, b"abcdef");
        frame.truncate(frame.len() - 3);
        assert!(extract_tcp_segment(&frame).is_none());
    }

    #[test]
    fn test_extract_total_length_smaller_than_headers() {
        let mut frame = build_tcp_frame(1000, 2000, b"abc");
        frame[14 + 2] = 0x00;
        frame[14 + 3] = 0x10; // total length 16 < 40 header bytes
        assert!(extract_tcp_segment(&frame).is_none());
    }
}
