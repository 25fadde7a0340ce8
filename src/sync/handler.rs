//! Async ranging loop.
//!
//! Waits for one receive outcome per cycle, feeds frames to the shared
//! [`ClockSynchronizer`], resets the radio on timeouts and errors, and
//! publishes [`SyncEvent`]s for downstream reporting.

use std::sync::Arc;

use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinHandle;

use super::clock::{ClockSynchronizer, FrameOutcome};
use super::frame::SN_IDX;
use super::radio::{ReceiveOutcome, RxFrame, Transceiver};
use super::report::{DropReason, SyncEvent, SyncStats};
use super::sequence::SequenceTracker;
use crate::config::SyncConfig;
use crate::error::{FrameError, SyncError};

/// Synchronizer shared between the ranging loop and readers.
///
/// Only the ranging loop takes the write lock.
pub type SharedSynchronizer = Arc<RwLock<ClockSynchronizer>>;

/// Create a new shared, uncalibrated synchronizer.
#[must_use]
pub fn create_shared_synchronizer(config: &SyncConfig) -> SharedSynchronizer {
    Arc::new(RwLock::new(ClockSynchronizer::new(config)))
}

/// The ranging loop.
pub struct RangingLoop<T: Transceiver> {
    /// Radio receive path.
    transceiver: T,
    /// Receive outcomes from the driver.
    outcomes: mpsc::Receiver<ReceiveOutcome>,
    /// Events for downstream reporting.
    events: mpsc::Sender<SyncEvent>,
    /// Shared synchronizer state.
    synchronizer: SharedSynchronizer,
    /// Configuration.
    config: SyncConfig,
    /// Master frame sequence tracking.
    master_sequence: SequenceTracker,
    /// Counters.
    stats: SyncStats,
}

impl<T: Transceiver> RangingLoop<T> {
    /// Create a loop with a fresh synchronizer.
    pub fn new(
        config: SyncConfig,
        transceiver: T,
        outcomes: mpsc::Receiver<ReceiveOutcome>,
        events: mpsc::Sender<SyncEvent>,
    ) -> Self {
        let synchronizer = create_shared_synchronizer(&config);
        Self::with_synchronizer(config, transceiver, outcomes, events, synchronizer)
    }

    /// Create a loop around an existing shared synchronizer.
    pub fn with_synchronizer(
        config: SyncConfig,
        transceiver: T,
        outcomes: mpsc::Receiver<ReceiveOutcome>,
        events: mpsc::Sender<SyncEvent>,
        synchronizer: SharedSynchronizer,
    ) -> Self {
        Self {
            transceiver,
            outcomes,
            events,
            synchronizer,
            config,
            master_sequence: SequenceTracker::new(),
            stats: SyncStats::default(),
        }
    }

    /// Handle to the shared synchronizer.
    #[must_use]
    pub fn synchronizer(&self) -> SharedSynchronizer {
        self.synchronizer.clone()
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    /// Access the transceiver.
    pub fn transceiver(&self) -> &T {
        &self.transceiver
    }

    /// Run until shutdown is signalled or the outcome channel closes.
    ///
    /// # Errors
    /// Returns an error only when the transceiver fails; frame, timeout and
    /// radio errors are recovered by resetting the receive path.
    pub async fn run(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<SyncStats, SyncError> {
        tracing::info!(
            master_id = ?self.config.master_id,
            rollover_period_ns = self.config.rollover_period_ns,
            "Ranging loop starting"
        );

        let mut watching = true;

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.transceiver.enable_receiver().await?;

            tokio::select! {
                outcome = self.outcomes.recv() => {
                    let Some(outcome) = outcome else {
                        tracing::info!("Ranging loop: outcome channel closed");
                        break;
                    };
                    self.handle_outcome(outcome).await?;
                }

                changed = shutdown.changed(), if watching => {
                    if changed.is_err() {
                        // Sender gone: no shutdown can arrive any more.
                        watching = false;
                    } else if *shutdown.borrow() {
                        tracing::info!("Ranging loop shutting down");
                        break;
                    }
                }
            }

            if !self.config.cycle_delay.is_zero() {
                tokio::time::sleep(self.config.cycle_delay).await;
            }
        }

        tracing::info!(stats = ?self.stats, "Ranging loop stopped");
        Ok(self.stats)
    }

    /// Process a single receive outcome.
    ///
    /// # Errors
    /// Returns an error if the transceiver cannot be reset.
    pub async fn handle_outcome(&mut self, outcome: ReceiveOutcome) -> Result<(), SyncError> {
        match outcome {
            ReceiveOutcome::Received(frame) => {
                self.stats.receptions += 1;
                let event = self.handle_frame(&frame).await?;
                self.emit(event);
            }
            ReceiveOutcome::Timeout => {
                self.stats.timeouts += 1;
                tracing::info!("Ranging loop: reception timeout");
                self.transceiver.reset_receiver().await?;
                self.emit(SyncEvent::Timeout);
            }
            ReceiveOutcome::Error(kind) => {
                self.stats.rx_errors += 1;
                tracing::info!(%kind, "Ranging loop: reception error");
                self.transceiver.reset_receiver().await?;
                self.emit(SyncEvent::RxError(kind));
            }
        }
        Ok(())
    }

    async fn handle_frame(&mut self, frame: &RxFrame) -> Result<SyncEvent, SyncError> {
        let result = {
            let mut sync = self.synchronizer.write().await;
            sync.process_payload(&frame.payload, self.config.rx_buf_len, frame.rx_timestamp)
        };

        match result {
            Ok(FrameOutcome::Master(observation)) => {
                self.stats.master_frames += 1;
                if let Some(seq) = observation.sequence {
                    if let Some(gap) = self.master_sequence.record(seq) {
                        self.stats.master_sequence_lost += u64::from(gap.count);
                        tracing::debug!(
                            start = gap.start,
                            count = gap.count,
                            "Ranging loop: master frames missed"
                        );
                    }
                }
                Ok(SyncEvent::MasterObserved(observation))
            }
            Ok(FrameOutcome::Synced(synced)) => {
                self.stats.synced_frames += 1;
                let block = synced.render_block(self.stats.receptions, &self.config.anchor_name);
                tracing::debug!(
                    sequence = synced.sequence,
                    synced_master_ns = synced.synced_master_ns,
                    sender = ?synced.sender,
                    "Ranging loop: frame synchronized"
                );
                tracing::info!("{}", block.trim_end());
                Ok(SyncEvent::Synced {
                    frame: synced,
                    block,
                })
            }
            Err(SyncError::Uncalibrated { master_frames }) => {
                self.stats.uncalibrated_drops += 1;
                tracing::debug!(master_frames, "Ranging loop: dropping frame, not calibrated");
                Ok(SyncEvent::Dropped {
                    sequence: frame.payload.get(SN_IDX).copied(),
                    reason: DropReason::Uncalibrated { master_frames },
                })
            }
            Err(SyncError::Frame(err)) => {
                self.stats.discarded_frames += 1;
                tracing::debug!(%err, "Ranging loop: discarding frame");
                // Length errors leave the header unread.
                let sequence = match &err {
                    FrameError::MissingTimestamps { .. } => frame.payload.get(SN_IDX).copied(),
                    FrameError::TooShort { .. } | FrameError::TooLong { .. } => None,
                };
                Ok(SyncEvent::Dropped {
                    sequence,
                    reason: DropReason::from(&err),
                })
            }
            Err(err) => Err(err),
        }
    }

    fn emit(&self, event: SyncEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Ranging loop: event channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Ranging loop: no event receiver");
            }
        }
    }
}

impl<T: Transceiver + 'static> RangingLoop<T> {
    /// Spawn the loop on the current runtime.
    pub fn spawn(
        mut self,
        shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<Result<SyncStats, SyncError>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
