//! Permessage-deflate payload handling (RFC 7692).
//!
//! Compressed payloads travel as raw DEFLATE (window size up to 32KB, no
//! zlib or gzip wrapper) with the trailing block-end marker
//! `0x00 0x00 0xFF 0xFF` stripped off. [`decompress`] restores that marker
//! before inflating; without it the inflate would fail or truncate.

use flate2::Compression;
use flate2::read::{DeflateDecoder, DeflateEncoder};
use std::io::Read;

use crate::error::{Error, Result};

const DEFLATE_TRAILER: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

/// Inflate a captured permessage-deflate payload.
///
/// Appends the block-end marker the wire format omits, then inflates the
/// whole stream. The marker bytes are consumed as input and never appear in
/// the output.
///
/// # Errors
///
/// Returns `Error::Decompress` if the inflater reports a corrupt stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut with_trailer = Vec::with_capacity(data.len() + DEFLATE_TRAILER.len());
    with_trailer.extend_from_slice(data);
    with_trailer.extend_from_slice(&DEFLATE_TRAILER);

    let mut decoder = DeflateDecoder::new(with_trailer.as_slice());
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::Decompress(e.to_string()))?;

    Ok(decompressed)
}

/// Deflate a payload into wire form.
///
/// The counterpart of [`decompress`]: raw DEFLATE with the trailing
/// block-end marker stripped when present. Used to build wire-faithful
/// compressed payloads in tests and benchmarks.
///
/// # Errors
///
/// Returns `Error::Io` if the encoder fails.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut encoder = DeflateEncoder::new(data, Compression::default());
    let mut compressed = Vec::new();
    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| Error::Io(e.to_string()))?;

    if compressed.len() >= DEFLATE_TRAILER.len()
        && compressed[compressed.len() - 4..] == DEFLATE_TRAILER
    {
        compressed.truncate(compressed.len() - 4);
    }

    Ok(compressed)
}
