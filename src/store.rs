//! Message storage and its on-disk format.
//!
//! The file layout is, in strict field order with no padding: a u64 message
//! count, then per message the length-prefixed timestamp, source address and
//! destination address strings, the two ports, the opcode byte, the masked
//! and compressed flag bytes, and the length-prefixed payload. All length
//! prefixes are u64 byte counts of the content that follows.
//!
//! Multi-byte integers are stored in the host's native byte order; files
//! written on one byte-order architecture are not readable on the other.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::message::CapturedMessage;
use crate::protocol::OpCode;

/// Default storage filename.
pub const DEFAULT_STORE_FILE: &str = "captured_messages.dat";

/// Insertion-ordered collection of captured messages.
///
/// Append-only during capture; [`MessageStore::load`] replaces the whole
/// contents at once and leaves the store untouched when the file cannot be
/// read or parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageStore {
    messages: Vec<CapturedMessage>,
}

impl MessageStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded message.
    pub fn append(&mut self, message: CapturedMessage) {
        self.messages.push(message);
    }

    /// Get a message by zero-based index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CapturedMessage> {
        self.messages.get(index)
    }

    /// Number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the store holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Iterate over stored messages in capture order.
    pub fn iter(&self) -> std::slice::Iter<'_, CapturedMessage> {
        self.messages.iter()
    }

    /// Write the store to `path` in the binary format above.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileOpen` if the file cannot be created and
    /// `Error::Io` if a write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::FileOpen {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut out = BufWriter::new(file);

        out.write_all(&(self.messages.len() as u64).to_ne_bytes())?;

        let mut text = 0usize;
        let mut binary = 0usize;
        let mut other = 0usize;
        let mut payload_bytes = 0usize;

        for msg in &self.messages {
            write_bytes(&mut out, msg.timestamp.as_bytes())?;
            write_bytes(&mut out, msg.src_ip.as_bytes())?;
            write_bytes(&mut out, msg.dst_ip.as_bytes())?;
            out.write_all(&msg.src_port.to_ne_bytes())?;
            out.write_all(&msg.dst_port.to_ne_bytes())?;
            out.write_all(&[msg.opcode.as_u8(), msg.is_masked as u8, msg.is_compressed as u8])?;
            write_bytes(&mut out, &msg.payload)?;

            match msg.opcode {
                OpCode::Text => text += 1,
                OpCode::Binary => binary += 1,
                _ => other += 1,
            }
            payload_bytes += msg.payload.len();
        }
        out.flush()?;

        info!(
            "saved {} messages to {} ({} text, {} binary, {} other, {} payload bytes)",
            self.messages.len(),
            path.display(),
            text,
            binary,
            other,
            payload_bytes
        );
        Ok(())
    }

    /// Replace the store's contents with the messages in `path`.
    ///
    /// The file is parsed completely before anything is replaced, so a
    /// failed load leaves the current contents intact.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileOpen` if the file cannot be read,
    /// `Error::TruncatedFile` if a declared count or length runs past the
    /// end of the file, and an opcode error if a stored opcode byte is not
    /// one of the six valid values.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let buf = fs::read(path).map_err(|e| Error::FileOpen {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let messages = parse_store(&buf)?;
        let count = messages.len();
        self.messages = messages;

        info!("loaded {} messages from {}", count, path.display());
        Ok(count)
    }
}

impl<'a> IntoIterator for &'a MessageStore {
    type Item = &'a CapturedMessage;
    type IntoIter = std::slice::Iter<'a, CapturedMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn write_bytes(out: &mut impl Write, data: &[u8]) -> Result<()> {
    out.write_all(&(data.len() as u64).to_ne_bytes())?;
    out.write_all(data)?;
    Ok(())
}

/// Bounds-checked sequential reader over the raw file bytes.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn truncated(&self, detail: &str) -> Error {
        Error::TruncatedFile {
            offset: self.pos as u64,
            detail: detail.to_string(),
        }
    }

    fn take(&mut self, len: usize, detail: &str) -> Result<&'a [u8]> {
        if self.buf.len() - self.pos < len {
            return Err(self.truncated(detail));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_u64(&mut self, detail: &str) -> Result<u64> {
        let bytes = self.take(8, detail)?;
        Ok(u64::from_ne_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn take_u16(&mut self, detail: &str) -> Result<u16> {
        let bytes = self.take(2, detail)?;
        Ok(u16::from_ne_bytes([bytes[0], bytes[1]]))
    }

    fn take_u8(&mut self, detail: &str) -> Result<u8> {
        Ok(self.take(1, detail)?[0])
    }

    /// Read a u64 length prefix and that many content bytes.
    fn take_prefixed(&mut self, detail: &str) -> Result<&'a [u8]> {
        let len = self.take_u64(detail)?;
        let remaining = (self.buf.len() - self.pos) as u64;
        if len > remaining {
            return Err(self.truncated(detail));
        }
        self.take(len as usize, detail)
    }

    fn take_string(&mut self, detail: &str) -> Result<String> {
        let bytes = self.take_prefixed(detail)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

fn parse_store(buf: &[u8]) -> Result<Vec<CapturedMessage>> {
    let mut reader = Reader::new(buf);
    let count = reader.take_u64("message count")?;

    let mut messages = Vec::new();
    for i in 0..count {
        let timestamp = reader.take_string(&format!("message {i} timestamp"))?;
        let src_ip = reader.take_string(&format!("message {i} source address"))?;
        let dst_ip = reader.take_string(&format!("message {i} destination address"))?;
        let src_port = reader.take_u16(&format!("message {i} source port"))?;
        let dst_port = reader.take_u16(&format!("message {i} destination port"))?;
        let opcode = OpCode::from_u8(reader.take_u8(&format!("message {i} opcode"))?)?;
        let is_masked = reader.take_u8(&format!("message {i} masked flag"))? != 0;
        let is_compressed = reader.take_u8(&format!("message {i} compressed flag"))? != 0;
        let payload = reader.take_prefixed(&format!("message {i} payload"))?.to_vec();

        messages.push(CapturedMessage {
            timestamp,
            src_ip,
            dst_ip,
            src_port,
            dst_port,
            opcode,
            is_masked,
            is_compressed,
            payload,
        });
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_message(opcode: OpCode, payload: &[u8]) -> CapturedMessage {
        CapturedMessage {
            timestamp: "2026-08-22 15:40:01".into(),
            src_ip: "192.168.1.10".into(),
            dst_ip: "10.0.0.5".into(),
            src_port: 52480,
            dst_port: 8080,
            opcode,
            is_masked: true,
            is_compressed: false,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn test_store_append_get() {
        let mut store = MessageStore::new();
        assert!(store.is_empty());

        store.append(sample_message(OpCode::Text, b"hello"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().payload, b"hello");
        assert!(store.get(1).is_none());

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_roundtrip_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.dat");

        let store = MessageStore::new();
        store.save(&path).unwrap();

        let mut loaded = MessageStore::new();
        assert_eq!(loaded.load(&path).unwrap(), 0);
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_roundtrip_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("messages.dat");

        let mut store = MessageStore::new();
        store.append(sample_message(OpCode::Text, "привет мир".as_bytes()));
        store.append(sample_message(OpCode::Binary, &[0x00, 0xff, 0x80, 0x7f]));
        store.append(sample_message(OpCode::Ping, b""));
        store.append(sample_message(OpCode::Close, &[0x03, 0xe8]));
        store.save(&path).unwrap();

        let mut loaded = MessageStore::new();
        assert_eq!(loaded.load(&path).unwrap(), 4);
        assert_eq!(loaded, store);
    }

    #[test]
    fn test_load_missing_file_keeps_store() {
        let mut store = MessageStore::new();
        store.append(sample_message(OpCode::Text, b"keep me"));

        let result = store.load("/nonexistent/path/messages.dat");
        assert!(matches!(result, Err(Error::FileOpen { .. })));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_save_bad_path() {
        let store = MessageStore::new();
        let result = store.save("/nonexistent/dir/messages.dat");
        assert!(matches!(result, Err(Error::FileOpen { .. })));
    }

    #[test]
    fn test_load_truncated_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.dat");
        fs::write(&path, [0x01, 0x02, 0x03]).unwrap();

        let mut store = MessageStore::new();
        let result = store.load(&path);
        assert!(matches!(result, Err(Error::TruncatedFile { .. })));
    }

    #[test]
    fn test_load_count_exceeds_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lying_count.dat");
        // Claims 5 messages, carries none
        fs::write(&path, 5u64.to_ne_bytes()).unwrap();

        let mut store = MessageStore::new();
        store.append(sample_message(OpCode::Text, b"survivor"));
        let result = store.load(&path);
        assert!(matches!(result, Err(Error::TruncatedFile { .. })));
        assert_eq!(store.len(), 1, "failed load must not replace contents");
    }

    #[test]
    fn test_load_truncated_mid_message() {
        let dir = tempdir().unwrap();
        let full = dir.path().join("full.dat");
        let cut = dir.path().join("cut.dat");

        let mut store = MessageStore::new();
        store.append(sample_message(OpCode::Text, b"some payload data"));
        store.save(&full).unwrap();

        let bytes = fs::read(&full).unwrap();
        fs::write(&cut, &bytes[..bytes.len() - 5]).unwrap();

        let mut loaded = MessageStore::new();
        let result = loaded.load(&cut);
        assert!(matches!(result, Err(Error::TruncatedFile { .. })));
    }

    #[test]
    fn test_load_length_field_exceeds_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lying_len.dat");

        // One message whose timestamp length claims more than the file holds
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1u64.to_ne_bytes());
        bytes.extend_from_slice(&u64::MAX.to_ne_bytes());
        bytes.extend_from_slice(b"short");
        fs::write(&path, &bytes).unwrap();

        let mut store = MessageStore::new();
        let result = store.load(&path);
        assert!(matches!(result, Err(Error::TruncatedFile { .. })));
    }

    #[test]
    fn test_load_invalid_opcode_byte() {
        let dir = tempdir().unwrap();
        let full = dir.path().join("ok.dat");
        let bad = dir.path().join("bad_opcode.dat");

        let mut store = MessageStore::new();
        store.append(sample_message(OpCode::Text, b"x"));
        store.save(&full).unwrap();

        // Opcode byte sits after count, three length-prefixed strings, and
        // the two ports
        let mut bytes = fs::read(&full).unwrap();
        let msg = store.get(0).unwrap();
        let opcode_at = 8
            + (8 + msg.timestamp.len())
            + (8 + msg.src_ip.len())
            + (8 + msg.dst_ip.len())
            + 2
            + 2;
        bytes[opcode_at] = 0x05;
        fs::write(&bad, &bytes).unwrap();

        let mut loaded = MessageStore::new();
        let result = loaded.load(&bad);
        assert!(matches!(result, Err(Error::ReservedOpcode(0x05))));
    }

    #[test]
    fn test_flag_bytes_nonzero_is_true() {
        let dir = tempdir().unwrap();
        let full = dir.path().join("flags.dat");

        let mut store = MessageStore::new();
        let mut msg = sample_message(OpCode::Text, b"x");
        msg.is_masked = false;
        msg.is_compressed = true;
        store.append(msg);
        store.save(&full).unwrap();

        let mut loaded = MessageStore::new();
        loaded.load(&full).unwrap();
        assert!(!loaded.get(0).unwrap().is_masked);
        assert!(loaded.get(0).unwrap().is_compressed);
    }

    #[test]
    fn test_iter_order() {
        let mut store = MessageStore::new();
        store.append(sample_message(OpCode::Text, b"one"));
        store.append(sample_message(OpCode::Text, b"two"));

        let payloads: Vec<&[u8]> = store.iter().map(|m| m.payload.as_slice()).collect();
        assert_eq!(payloads, vec![b"one".as_slice(), b"two".as_slice()]);
    }
}
