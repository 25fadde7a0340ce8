//! Host-side console forwarder.
//!
//! The node prints its report blocks over a serial console. The host copies
//! every line to a sink and, after each line that starts with a marker,
//! appends its own monotonic receive time so device and host timelines can
//! be lined up afterwards.

use std::time::Instant;

use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use crate::error::SyncError;

/// Prefix of the host timestamp line.
pub const HOST_STAMP_PREFIX: &str = "RPI_rx_ts_nanosec:";

/// Source of host receive times.
pub trait HostClock: Send + Sync {
    /// Current time in nanoseconds on a monotonic timeline.
    fn now_nanos(&self) -> u64;
}

/// Monotonic clock counting from its creation.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start a new clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HostClock for MonotonicClock {
    fn now_nanos(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Forwarder configuration
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Lines starting with this text get a host timestamp line after them
    pub marker: String,
    /// Longest accepted line; a longer line ends forwarding
    pub max_line_len: usize,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            marker: "R".to_string(),
            max_line_len: 1024,
        }
    }
}

impl ForwarderConfig {
    /// Create with a custom marker
    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            ..Default::default()
        }
    }
}

/// Totals reported when forwarding ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    /// Lines copied to the sink.
    pub lines: u64,
    /// Host timestamp lines written.
    pub stamped: u64,
    /// Oversized lines seen; forwarding stops at the first.
    pub oversized: u64,
}

/// Copies console lines and stamps marker lines with host time.
#[derive(Debug, Clone)]
pub struct LineForwarder<C: HostClock> {
    config: ForwarderConfig,
    clock: C,
}

impl LineForwarder<MonotonicClock> {
    /// Forwarder stamping with a fresh monotonic clock.
    #[must_use]
    pub fn monotonic(config: ForwarderConfig) -> Self {
        Self::new(config, MonotonicClock::new())
    }
}

impl<C: HostClock> LineForwarder<C> {
    /// Create a forwarder with a custom clock.
    pub fn new(config: ForwarderConfig, clock: C) -> Self {
        Self { config, clock }
    }

    /// Forward until EOF, shutdown or a line longer than `max_line_len`.
    ///
    /// Host time is read once each line has been handed to the writer.
    ///
    /// # Errors
    /// Returns an error if reading or writing fails.
    pub async fn forward<R, W>(
        &self,
        reader: R,
        mut writer: W,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<ForwardStats, SyncError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let codec = LinesCodec::new_with_max_length(self.config.max_line_len);
        let mut lines = FramedRead::new(reader, codec);
        let mut stats = ForwardStats::default();
        let mut watching = true;

        loop {
            tokio::select! {
                next = lines.next() => {
                    let line = match next {
                        None => break,
                        Some(Ok(line)) => line,
                        Some(Err(LinesCodecError::Io(err))) => return Err(err.into()),
                        Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                            // The framed stream ends after its first error.
                            stats.oversized += 1;
                            tracing::warn!(
                                max = self.config.max_line_len,
                                "Forwarder: oversized line, stopping"
                            );
                            break;
                        }
                    };

                    writer.write_all(line.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    let host_ns = self.clock.now_nanos();
                    stats.lines += 1;

                    if line.starts_with(&self.config.marker) {
                        let stamp = format!("{HOST_STAMP_PREFIX}{host_ns}\n");
                        writer.write_all(stamp.as_bytes()).await?;
                        stats.stamped += 1;
                    }
                }

                changed = shutdown.changed(), if watching => {
                    if changed.is_err() {
                        watching = false;
                    } else if *shutdown.borrow() {
                        tracing::info!("Forwarder shutting down");
                        break;
                    }
                }
            }
        }

        writer.flush().await?;
        tracing::debug!(lines = stats.lines, stamped = stats.stamped, "Forwarder finished");
        Ok(stats)
    }
}
