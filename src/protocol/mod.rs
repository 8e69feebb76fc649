//! WebSocket wire-format handling (RFC 6455): opcodes, masking, frames.

pub mod frame;
pub mod mask;
pub mod opcode;

pub use frame::Frame;
pub use mask::{apply_mask, apply_mask_fast};
pub use opcode::OpCode;
