//! WebSocket frame decoding for captured traffic (RFC 6455).
//!
//! Every header read is bounds-checked against the buffer; a frame whose
//! declared payload extends past the captured bytes is rejected, never
//! partially decoded. Fragmentation is not reassembled: each physical frame
//! is decoded as a complete unit, whatever its FIN bit says.

use crate::error::{Error, Result};
use crate::protocol::OpCode;
use crate::protocol::mask::{apply_mask, apply_mask_fast};

#[derive(Debug, Clone)]
struct FrameHeader {
    fin: bool,
    rsv1: bool,
    opcode: OpCode,
    mask: Option<[u8; 4]>,
    payload_len: usize,
    header_len: usize,
}

/// Parse the frame header from a captured buffer.
///
/// Layout: byte 0 is FIN/RSV/opcode, byte 1 is mask flag plus 7-bit base
/// length, then an optional 2- or 8-byte big-endian extended length
/// (base 126 / 127), then the 4-byte masking key when the mask flag is set.
///
/// # Errors
///
/// - `Error::IncompleteFrame` if the buffer ends inside the header
/// - `Error::InvalidOpcode` / `Error::ReservedOpcode` for bad opcode nibbles
/// - `Error::PayloadTooLarge` if the declared length cannot fit a `usize`
#[inline]
fn parse_header(buf: &[u8]) -> Result<FrameHeader> {
    if buf.len() < 2 {
        return Err(Error::IncompleteFrame {
            needed: 2 - buf.len(),
        });
    }

    let byte0 = buf[0];
    let byte1 = buf[1];

    let fin = (byte0 & 0x80) != 0;
    let rsv1 = (byte0 & 0x40) != 0;
    let opcode = OpCode::from_u8(byte0 & 0x0F)?;

    let masked = (byte1 & 0x80) != 0;
    let base_len = byte1 & 0x7F;

    let (payload_len, header_size) = match base_len {
        0..=125 => (base_len as usize, 2),
        126 => {
            if buf.len() < 4 {
                return Err(Error::IncompleteFrame {
                    needed: 4 - buf.len(),
                });
            }
            let len = u16::from_be_bytes([buf[2], buf[3]]) as usize;
            (len, 4)
        }
        127 => {
            if buf.len() < 10 {
                return Err(Error::IncompleteFrame {
                    needed: 10 - buf.len(),
                });
            }
            let len_u64 = u64::from_be_bytes([
                buf[2], buf[3], buf[4], buf[5], buf[6], buf[7], buf[8], buf[9],
            ]);
            let len = usize::try_from(len_u64).map_err(|_| Error::PayloadTooLarge(len_u64))?;
            (len, 10)
        }
        _ => unreachable!(),
    };

    let mask_offset = header_size;
    let total_header_size = if masked { header_size + 4 } else { header_size };

    if masked && buf.len() < total_header_size {
        return Err(Error::IncompleteFrame {
            needed: total_header_size - buf.len(),
        });
    }

    let mask = if masked {
        Some([
            buf[mask_offset],
            buf[mask_offset + 1],
            buf[mask_offset + 2],
            buf[mask_offset + 3],
        ])
    } else {
        None
    };

    Ok(FrameHeader {
        fin,
        rsv1,
        opcode,
        mask,
        payload_len,
        header_len: total_header_size,
    })
}

/// A decoded WebSocket frame.
///
/// Holds the header bits the sniffer cares about and the payload with any
/// masking already removed. RSV1 is kept because permessage-deflate uses it
/// to mark compressed payloads; the masking key itself is consumed during
/// decode and not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment flag, as observed. Not acted on.
    pub fin: bool,
    /// RSV1 bit: payload is permessage-deflate compressed.
    pub rsv1: bool,
    /// Frame opcode.
    pub opcode: OpCode,
    /// Whether the frame arrived masked.
    pub is_masked: bool,
    /// Unmasked payload bytes, still compressed if RSV1 is set.
    payload: Vec<u8>,
}

impl Frame {
    /// Create a frame from its logical fields.
    #[must_use]
    pub fn new(fin: bool, rsv1: bool, opcode: OpCode, payload: Vec<u8>) -> Self {
        Self {
            fin,
            rsv1,
            opcode,
            is_masked: false,
            payload,
        }
    }

    /// Get the payload bytes.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take ownership of the payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Decode one frame from a captured buffer.
    ///
    /// Returns the frame and the number of bytes it occupied. The payload is
    /// unmasked in the returned frame; `is_masked` records that a key was
    /// present on the wire.
    ///
    /// # Errors
    ///
    /// - `Error::IncompleteFrame` if the buffer is shorter than the header
    ///   plus the declared payload length
    /// - `Error::InvalidOpcode` / `Error::ReservedOpcode` for bad opcodes
    /// - `Error::PayloadTooLarge` for lengths beyond platform limits
    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        let header = parse_header(buf)?;

        let total_size = header
            .header_len
            .checked_add(header.payload_len)
            .ok_or(Error::PayloadTooLarge(header.payload_len as u64))?;

        if buf.len() < total_size {
            return Err(Error::IncompleteFrame {
                needed: total_size - buf.len(),
            });
        }

        let payload_start = header.header_len;
        let payload_end = payload_start + header.payload_len;
        let mut payload = buf[payload_start..payload_end].to_vec();
        if let Some(mask) = header.mask {
            apply_mask_fast(&mut payload, mask);
        }

        let frame = Frame {
            fin: header.fin,
            rsv1: header.rsv1,
            opcode: header.opcode,
            is_masked: header.mask.is_some(),
            payload,
        };

        Ok((frame, total_size))
    }

    /// Encode the frame back to wire bytes.
    ///
    /// Chooses the 7-bit, 16-bit, or 64-bit length encoding from the payload
    /// size. When `mask` is given the mask flag is set, the key is written
    /// after the length, and the payload is masked with it.
    #[must_use]
    pub fn encode(&self, mask: Option<[u8; 4]>) -> Vec<u8> {
        let payload_len = self.payload.len();

        let (len_byte, extended_len_size) = if payload_len <= 125 {
            (payload_len as u8, 0)
        } else if payload_len <= 65535 {
            (126, 2)
        } else {
            (127, 8)
        };

        let mut buf = Vec::with_capacity(self.wire_size(mask.is_some()));

        let mut byte0 = self.opcode.as_u8();
        if self.fin {
            byte0 |= 0x80;
        }
        if self.rsv1 {
            byte0 |= 0x40;
        }
        buf.push(byte0);

        let mut byte1 = len_byte;
        if mask.is_some() {
            byte1 |= 0x80;
        }
        buf.push(byte1);

        match extended_len_size {
            2 => buf.extend_from_slice(&(payload_len as u16).to_be_bytes()),
            8 => buf.extend_from_slice(&(payload_len as u64).to_be_bytes()),
            _ => {}
        }

        if let Some(mask_key) = mask {
            buf.extend_from_slice(&mask_key);
            let payload_start = buf.len();
            buf.extend_from_slice(&self.payload);
            apply_mask(&mut buf[payload_start..], mask_key);
        } else {
            buf.extend_from_slice(&self.payload);
        }

        buf
    }

    /// Size this frame occupies on the wire.
    #[must_use]
    pub fn wire_size(&self, masked: bool) -> usize {
        let payload_len = self.payload.len();
        let extended_len_size = if payload_len <= 125 {
            0
        } else if payload_len <= 65535 {
            2
        } else {
            8
        };
        let mask_size = if masked { 4 } else { 0 };
        2 + extended_len_size + mask_size + payload_len
    }
}
