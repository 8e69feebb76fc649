//! Capture and replay configuration.

use std::time::Duration;

/// Default snapshot length for the capture handle, in bytes.
pub const DEFAULT_SNAPLEN: i32 = 65535;

/// Default capture read timeout, in milliseconds.
///
/// Also bounds how long the capture loop can go without observing a stop
/// request on an idle wire.
pub const DEFAULT_READ_TIMEOUT_MS: i32 = 1000;

/// Default timeout applied to each replay socket operation.
pub const DEFAULT_REPLAY_TIMEOUT: Duration = Duration::from_secs(5);

/// Live-capture configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Device to capture on. `None` selects the first available device.
    pub device: Option<String>,

    /// TCP port to filter on. `None` captures all TCP traffic.
    pub port: Option<u16>,

    /// Put the device into promiscuous mode.
    ///
    /// Default: true
    pub promiscuous: bool,

    /// Bytes captured per packet.
    ///
    /// Default: 65535
    pub snaplen: i32,

    /// Read timeout handed to the capture handle, in milliseconds.
    ///
    /// Default: 1000
    pub read_timeout_ms: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            port: None,
            promiscuous: true,
            snaplen: DEFAULT_SNAPLEN,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl CaptureConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture on a specific device.
    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Restrict capture to one TCP port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set promiscuous mode.
    #[must_use]
    pub const fn with_promiscuous(mut self, promiscuous: bool) -> Self {
        self.promiscuous = promiscuous;
        self
    }

    /// Set the per-packet snapshot length.
    #[must_use]
    pub const fn with_snaplen(mut self, snaplen: i32) -> Self {
        self.snaplen = snaplen;
        self
    }

    /// Set the capture read timeout in milliseconds.
    #[must_use]
    pub const fn with_read_timeout_ms(mut self, timeout_ms: i32) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    /// BPF filter program for this configuration.
    ///
    /// `tcp` when no port is set, `tcp port N` otherwise.
    #[must_use]
    pub fn bpf_filter(&self) -> String {
        match self.port {
            Some(port) => format!("tcp port {port}"),
            None => "tcp".to_string(),
        }
    }
}

/// Timeouts for the replay connection.
///
/// The platform defaults would let a silent peer stall a replay
/// indefinitely; every socket operation here is bounded instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Maximum time to establish the TCP connection.
    ///
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Maximum time to wait for the handshake response.
    ///
    /// Default: 5 seconds
    pub read_timeout: Duration,

    /// Maximum time to wait for outgoing data to be accepted.
    ///
    /// Default: 5 seconds
    pub write_timeout: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_REPLAY_TIMEOUT,
            read_timeout: DEFAULT_REPLAY_TIMEOUT,
            write_timeout: DEFAULT_REPLAY_TIMEOUT,
        }
    }
}

impl ReplayConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the handshake-response read timeout.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.device, None);
        assert_eq!(config.port, None);
        assert!(config.promiscuous);
        assert_eq!(config.snaplen, DEFAULT_SNAPLEN);
        assert_eq!(config.read_timeout_ms, DEFAULT_READ_TIMEOUT_MS);
    }

    #[test]
    fn test_capture_builder() {
        let config = CaptureConfig::new()
            .with_device("lo")
            .with_port(8080)
            .with_promiscuous(false)
            .with_snaplen(2048)
            .with_read_timeout_ms(250);
        assert_eq!(config.device.as_deref(), Some("lo"));
        assert_eq!(config.port, Some(8080));
        assert!(!config.promiscuous);
        assert_eq!(config.snaplen, 2048);
        assert_eq!(config.read_timeout_ms, 250);
    }

    #[test]
    fn test_bpf_filter() {
        assert_eq!(CaptureConfig::new().bpf_filter(), "tcp");
        assert_eq!(CaptureConfig::new().with_port(9001).bpf_filter(), "tcp port 9001");
    }

    #[test]
    fn test_replay_defaults() {
        let config = ReplayConfig::default();
        assert_eq!(config.connect_timeout, DEFAULT_REPLAY_TIMEOUT);
        assert_eq!(config.read_timeout, DEFAULT_REPLAY_TIMEOUT);
        assert_eq!(config.write_timeout, DEFAULT_REPLAY_TIMEOUT);
    }

    #[test]
    fn test_replay_builder() {
        let config = ReplayConfig::new()
            .with_connect_timeout(Duration::from_secs(1))
            .with_read_timeout(Duration::from_secs(2))
            .with_write_timeout(Duration::from_secs(3));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.read_timeout, Duration::from_secs(2));
        assert_eq!(config.write_timeout, Duration::from_secs(3));
    }
}
