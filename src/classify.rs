//! Triage of captured TCP payloads.
//!
//! Decides whether a segment's bytes are HTTP upgrade traffic, a plausible
//! WebSocket frame, or neither. This is a heuristic without handshake or
//! session tracking: any TCP payload whose first byte happens to carry a
//! low opcode nibble will be offered to the frame decoder, and may decode
//! as garbage. Accepted false-positive risk.

/// Bytes of a segment inspected for handshake markers.
const HANDSHAKE_SCAN_LIMIT: usize = 200;

const UPGRADE_MARKER: &[u8] = b"Upgrade: websocket";
const SEC_WEBSOCKET_MARKER: &[u8] = b"Sec-WebSocket";

/// What a captured TCP payload looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// HTTP upgrade traffic; part of the handshake, not a frame.
    Handshake,
    /// Plausibly a frame header; worth attempting a decode.
    CandidateFrame,
    /// Too short or an impossible opcode nibble.
    NotAFrame,
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Classify a captured TCP payload.
///
/// Handshake markers are searched in the first 200 bytes as raw byte
/// substrings. Past that, a buffer needs at least the 2-byte frame header
/// and an opcode nibble of 0x0-0xA to count as a candidate.
#[must_use]
pub fn classify(buf: &[u8]) -> Classification {
    let scan = &buf[..buf.len().min(HANDSHAKE_SCAN_LIMIT)];
    if contains(scan, UPGRADE_MARKER) || contains(scan, SEC_WEBSOCKET_MARKER) {
        return Classification::Handshake;
    }

    if buf.len() < 2 {
        return Classification::NotAFrame;
    }

    let opcode = buf[0] & 0x0F;
    if opcode > 0x0A && opcode != 0x00 {
        return Classification::NotAFrame;
    }

    Classification::CandidateFrame
}
