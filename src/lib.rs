//! # wstap - Passive WebSocket Traffic Sniffer
//!
//! `wstap` captures WebSocket frames off the wire, decodes them, and keeps
//! them around for inspection and replay.
//!
//! ## Features
//!
//! - **Passive capture** over libpcap with a BPF port filter
//! - **RFC 6455 frame decoding** with masking removed at ingest
//! - **permessage-deflate inflation** with raw-payload fallback
//! - **Persistent message store** with a length-prefixed on-disk format
//! - **Raw payload replay** against an arbitrary TCP endpoint
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wstap::{CaptureConfig, Sniffer};
//!
//! let config = CaptureConfig::new().with_port(8080);
//! let mut sniffer = Sniffer::new(config);
//! sniffer.run(&stop_flag)?;
//! ```

pub mod capture;
pub mod classify;
pub mod config;
pub mod error;
pub mod extensions;
pub mod message;
pub mod protocol;
pub mod replay;
pub mod store;

pub use capture::{CaptureStats, Sniffer, TcpSegment, extract_tcp_segment};
pub use classify::{Classification, classify};
pub use config::{CaptureConfig, ReplayConfig};
pub use error::{Error, Result};
pub use message::CapturedMessage;
pub use protocol::{Frame, OpCode};
pub use replay::replay;
pub use store::{DEFAULT_STORE_FILE, MessageStore};
