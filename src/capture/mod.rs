//! Packet capture: header slicing and the live sniffing loop.

pub mod packet;
pub mod sniffer;

pub use packet::{TcpSegment, extract_tcp_segment};
pub use sniffer::{CaptureStats, Sniffer};
