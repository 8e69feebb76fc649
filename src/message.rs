//! Captured message record and listing helpers.

use crate::protocol::OpCode;

/// One decoded WebSocket frame observed on the wire.
///
/// The payload is already unmasked and, when the frame was compressed and
/// inflation succeeded, decompressed. If inflation failed `is_compressed`
/// is false and the payload holds the still-compressed wire bytes; the
/// record then no longer reflects the original frame exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedMessage {
    /// Capture time, `YYYY-MM-DD HH:MM:SS` local time.
    pub timestamp: String,
    /// Source address, dotted decimal.
    pub src_ip: String,
    /// Destination address, dotted decimal.
    pub dst_ip: String,
    /// Source TCP port.
    pub src_port: u16,
    /// Destination TCP port.
    pub dst_port: u16,
    /// Frame opcode.
    pub opcode: OpCode,
    /// Whether the frame arrived masked.
    pub is_masked: bool,
    /// Whether the payload was compressed and successfully inflated.
    pub is_compressed: bool,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

impl CapturedMessage {
    /// `src:port -> dst:port` for logs and listings.
    #[must_use]
    pub fn endpoints(&self) -> String {
        format!(
            "{}:{} -> {}:{}",
            self.src_ip, self.src_port, self.dst_ip, self.dst_port
        )
    }

    /// Text preview for listings, up to `max_chars` characters.
    ///
    /// Only for non-empty Text payloads whose bytes are displayable:
    /// printable ASCII, tab, newline, carriage return, or anything above
    /// 0x7F (multi-byte UTF-8 passes through). Returns `None` otherwise;
    /// callers fall back to a hex preview.
    #[must_use]
    pub fn text_preview(&self, max_chars: usize) -> Option<String> {
        if self.opcode != OpCode::Text || self.payload.is_empty() {
            return None;
        }
        if !self
            .payload
            .iter()
            .all(|&c| c >= 0x20 || c == b'\n' || c == b'\r' || c == b'\t')
        {
            return None;
        }

        let text = String::from_utf8_lossy(&self.payload);
        let mut preview: String = text.chars().take(max_chars).collect();
        if text.chars().count() > max_chars {
            preview.push_str("...");
        }
        Some(preview)
    }

    /// Close status code and reason, for Close frames carrying one.
    #[must_use]
    pub fn close_info(&self) -> Option<(u16, String)> {
        if self.opcode != OpCode::Close || self.payload.len() < 2 {
            return None;
        }
        let code = u16::from_be_bytes([self.payload[0], self.payload[1]]);
        let reason = String::from_utf8_lossy(&self.payload[2..]).into_owned();
        Some((code, reason))
    }
}

/// Space-separated hex dump of at most `max_len` bytes, `...` if cut.
#[must_use]
pub fn hex_preview(data: &[u8], max_len: usize) -> String {
    let shown = &data[..data.len().min(max_len)];
    let mut out = shown
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    if data.len() > max_len {
        out.push_str(" ...");
    }
    out
}
