//! WebSocket frame opcodes as defined in RFC 6455.

use crate::error::{Error, Result};

/// Opcode of a captured WebSocket frame.
///
/// Tags how the frame's payload is to be interpreted. Only the six
/// RFC-assigned values exist here; reserved values are rejected at decode
/// time and never reach stored messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Continuation frame (0x0).
    ///
    /// Later fragment of a message. Recorded as seen; fragments are not
    /// reassembled.
    Continuation = 0x0,

    /// Text frame (0x1).
    Text = 0x1,

    /// Binary frame (0x2).
    Binary = 0x2,

    /// Close frame (0x8). Payload may carry a status code and reason.
    Close = 0x8,

    /// Ping frame (0x9).
    Ping = 0x9,

    /// Pong frame (0xA).
    Pong = 0xA,
}

impl OpCode {
    /// Interpret a raw opcode value.
    ///
    /// Called with the low nibble of a frame's first byte during decoding,
    /// and with a full stored byte when loading a capture file (which is why
    /// values above 0xF are possible and distinguished).
    ///
    /// # Errors
    ///
    /// Returns `Error::ReservedOpcode` for the RFC-reserved nibbles
    /// (0x3-0x7, 0xB-0xF) and `Error::InvalidOpcode` for anything wider
    /// than a nibble.
    pub fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x3..=0x7 => Err(Error::ReservedOpcode(byte)),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            0xB..=0xF => Err(Error::ReservedOpcode(byte)),
            _ => Err(Error::InvalidOpcode(byte)),
        }
    }

    /// The wire nibble, also used as the stored opcode byte.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether a set RSV1 bit on this frame marks a compressed payload.
    ///
    /// permessage-deflate applies to complete data messages, so only Text
    /// and Binary frames are candidates for inflation. Control frames and
    /// continuations with RSV1 set are recorded as observed.
    #[inline]
    #[must_use]
    pub const fn is_compressible(self) -> bool {
        matches!(self, OpCode::Text | OpCode::Binary)
    }

    /// Human-readable name, as shown by the message listing.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OpCode::Continuation => "Continuation",
            OpCode::Text => "Text",
            OpCode::Binary => "Binary",
            OpCode::Close => "Close",
            OpCode::Ping => "Ping",
            OpCode::Pong => "Pong",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
