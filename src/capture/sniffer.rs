//! Live capture loop and the packet-to-message pipeline.
//!
//! The [`Sniffer`] owns a [`MessageStore`] and fills it from a pcap handle.
//! Each captured packet is sliced to its TCP payload, triaged by
//! [`classify`], decoded as a WebSocket frame, optionally inflated, and
//! appended to the store. Anything that fails a stage is counted and
//! dropped; capture itself never stops for a bad packet.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use pcap::{Capture, Device};
use tracing::{debug, info, warn};

use crate::capture::packet::{TcpSegment, extract_tcp_segment};
use crate::classify::{Classification, classify};
use crate::config::CaptureConfig;
use crate::error::{Error, Result};
use crate::extensions::decompress;
use crate::message::CapturedMessage;
use crate::protocol::Frame;
use crate::store::MessageStore;

/// Counters kept across one capture run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Packets handed to the sniffer.
    pub packets: u64,
    /// Packets without a usable TCP payload.
    pub no_payload: u64,
    /// Payloads recognized as handshake traffic and skipped.
    pub handshakes: u64,
    /// Payloads that did not look like frames at all.
    pub non_frames: u64,
    /// Candidate frames the decoder rejected.
    pub decode_failed: u64,
    /// Compressed payloads stored raw after inflation failed.
    pub decompress_fallbacks: u64,
    /// Messages appended to the store.
    pub captured: u64,
}

/// Passive WebSocket sniffer.
#[derive(Debug)]
pub struct Sniffer {
    config: CaptureConfig,
    store: MessageStore,
    stats: CaptureStats,
}

impl Sniffer {
    /// Create a sniffer with an empty store.
    #[must_use]
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            store: MessageStore::new(),
            stats: CaptureStats::default(),
        }
    }

    /// Messages captured so far.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Counters for the current run.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Consume the sniffer, keeping the captured messages.
    #[must_use]
    pub fn into_store(self) -> MessageStore {
        self.store
    }

    /// Capture packets until `stop` is set or the handle runs dry.
    ///
    /// Opens the configured device (or the system default when none is
    /// named), applies the BPF filter from the configuration and feeds
    /// every packet through [`Sniffer::handle_packet`]. The stop flag is
    /// polled between reads; the handle's read timeout bounds how long a
    /// quiet wire can delay shutdown.
    ///
    /// # Errors
    ///
    /// Returns `Error::Capture` when no device is available, the device
    /// cannot be opened, the filter does not compile, or the capture
    /// handle reports a read error.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        let device = match self.config.device.as_deref() {
            Some(name) => Device::from(name),
            None => Device::lookup()
                .map_err(|e| Error::Capture(e.to_string()))?
                .ok_or_else(|| Error::Capture("no capture device available".to_string()))?,
        };
        let device_name = device.name.clone();

        let mut cap = Capture::from_device(device)
            .map_err(|e| Error::Capture(e.to_string()))?
            .promisc(self.config.promiscuous)
            .snaplen(self.config.snaplen)
            .timeout(self.config.read_timeout_ms)
            .open()
            .map_err(|e| Error::Capture(e.to_string()))?;

        let filter = self.config.bpf_filter();
        cap.filter(&filter, true)
            .map_err(|e| Error::Capture(e.to_string()))?;

        info!(device = %device_name, filter = %filter, "capture started");

        while !stop.load(Ordering::SeqCst) {
            match cap.next_packet() {
                Ok(packet) => self.handle_packet(packet.data),
                Err(pcap::Error::TimeoutExpired) => {}
                Err(pcap::Error::NoMorePackets) => break,
                Err(e) => return Err(Error::Capture(e.to_string())),
            }
        }

        info!(
            packets = self.stats.packets,
            captured = self.stats.captured,
            handshakes = self.stats.handshakes,
            rejected = self.stats.decode_failed,
            "capture stopped"
        );
        Ok(())
    }

    /// Feed one raw captured frame through the pipeline.
    pub fn handle_packet(&mut self, data: &[u8]) {
        self.stats.packets += 1;
        match extract_tcp_segment(data) {
            Some(segment) => self.ingest(segment),
            None => self.stats.no_payload += 1,
        }
    }

    /// Triage, decode and store one TCP payload.
    ///
    /// Only the first frame in the payload is considered; a segment
    /// carrying several coalesced frames contributes one message, as any
    /// trailing bytes are ignored.
    pub fn ingest(&mut self, segment: TcpSegment<'_>) {
        match classify(segment.payload) {
            Classification::Handshake => {
                self.stats.handshakes += 1;
                debug!(
                    src = %segment.src_ip,
                    dst = %segment.dst_ip,
                    "handshake traffic skipped"
                );
                return;
            }
            Classification::NotAFrame => {
                self.stats.non_frames += 1;
                return;
            }
            Classification::CandidateFrame => {}
        }

        let frame = match Frame::parse(segment.payload) {
            Ok((frame, _)) => frame,
            Err(err) => {
                self.stats.decode_failed += 1;
                debug!(src = %segment.src_ip, dst = %segment.dst_ip, error = %err, "frame rejected");
                return;
            }
        };

        let opcode = frame.opcode;
        let is_masked = frame.is_masked;
        let rsv1 = frame.rsv1;
        let mut is_compressed = rsv1;
        let mut payload = frame.into_payload();

        // RSV1 on a control or continuation frame is recorded as-is; only
        // data payloads carry a complete DEFLATE block to inflate.
        if rsv1 && opcode.is_compressible() {
            match decompress(&payload) {
                Ok(inflated) => payload = inflated,
                Err(err) => {
                    self.stats.decompress_fallbacks += 1;
                    is_compressed = false;
                    warn!(opcode = %opcode, error = %err, "inflation failed, storing raw payload");
                }
            }
        }

        let message = CapturedMessage {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            src_ip: segment.src_ip.to_string(),
            dst_ip: segment.dst_ip.to_string(),
            src_port: segment.src_port,
            dst_port: segment.dst_port,
            opcode,
            is_masked,
            is_compressed,
            payload,
        };

        self.stats.captured += 1;
        info!(
            index = self.store.len() + 1,
            endpoints = %message.endpoints(),
            opcode = %message.opcode,
            masked = message.is_masked,
            compressed = message.is_compressed,
            len = message.payload.len(),
            "frame captured"
        );
        self.store.append(message);
    }
}
