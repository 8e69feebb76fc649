//! WebSocket extension payload transforms.
//!
//! Only permessage-deflate is handled; the sniffer never negotiates
//! extensions, it just undoes their payload encoding where it can.

pub mod deflate;

pub use deflate::{compress, decompress};
