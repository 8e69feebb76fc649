//! Replay of stored payloads to an arbitrary destination.
//!
//! A replay opens a fresh TCP connection, presents a minimal upgrade
//! request, discards whatever comes back, and then writes the stored
//! payload bytes as-is. The request always carries the same hard-coded
//! `Sec-WebSocket-Key`, and neither the `101` status line nor the accept
//! key is checked. The payload is NOT re-framed: the peer receives the
//! decoded application bytes, not a WebSocket frame. Capture decodes full
//! frames, replay injects raw bytes; that asymmetry is intentional and
//! kept.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};

use tracing::{debug, info, warn};

use crate::config::ReplayConfig;
use crate::error::{Error, Result};
use crate::store::MessageStore;

/// Size of the single handshake-response read.
const RESPONSE_BUFFER_SIZE: usize = 4096;

/// The fixed key every replay presents. Never recomputed.
const REPLAY_WS_KEY: &str = "dGhlIHNhbXBsZSBub25jZQ==";

fn upgrade_request(host: &str) -> String {
    format!(
        "GET / HTTP/1.1\r\n\
         Host: {host}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {REPLAY_WS_KEY}\r\n\
         Sec-WebSocket-Version: 13\r\n\r\n"
    )
}

/// Replay a stored message to `target_ip:target_port`.
///
/// `index` is zero-based. Returns the number of payload bytes sent. The
/// socket is closed on every exit path.
///
/// # Errors
///
/// - `Error::InvalidIndex` if the store has no message at `index`; no
///   connection is opened in that case
/// - `Error::Connect` if the address does not parse or the connection
///   cannot be established within the configured timeout
/// - `Error::Io` for handshake or payload write failures
pub fn replay(
    store: &MessageStore,
    index: usize,
    target_ip: &str,
    target_port: u16,
    config: &ReplayConfig,
) -> Result<usize> {
    let message = store.get(index).ok_or(Error::InvalidIndex {
        index,
        len: store.len(),
    })?;

    let target = format!("{target_ip}:{target_port}");
    let addr: SocketAddr = target.parse().map_err(|_| Error::Connect {
        target: target.clone(),
        reason: "invalid address".to_string(),
    })?;

    info!(
        "replaying message #{} ({} bytes, {}) to {}",
        index + 1,
        message.payload.len(),
        message.opcode,
        target
    );

    let mut stream =
        TcpStream::connect_timeout(&addr, config.connect_timeout).map_err(|e| Error::Connect {
            target: target.clone(),
            reason: e.to_string(),
        })?;
    stream.set_read_timeout(Some(config.read_timeout))?;
    stream.set_write_timeout(Some(config.write_timeout))?;

    stream.write_all(upgrade_request(target_ip).as_bytes())?;

    // One response buffer, content ignored. A clean EOF or a timeout does
    // not stop the replay; the payload goes out regardless of the answer.
    let mut response = [0u8; RESPONSE_BUFFER_SIZE];
    match stream.read(&mut response) {
        Ok(0) => debug!("peer closed before answering the handshake"),
        Ok(n) => debug!("discarded {} handshake response bytes", n),
        Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
            warn!("no handshake response within timeout, sending payload anyway");
        }
        Err(e) => return Err(e.into()),
    }

    stream.write_all(&message.payload)?;
    info!("sent {} payload bytes", message.payload.len());

    Ok(message.payload.len())
}
