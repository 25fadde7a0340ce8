//! Virtual master clock.
//!
//! Maps local receive timestamps onto the master's timeline with a two-point
//! linear model: the last master observation `(tS, tM)` and the drift ratio
//! `R` between the two most recent master observations.
//!
//! ```text
//! master frame:  tM' = resp_tx - tof
//!                R   = (tM' - tM) / (tS' - tS)     (from the 2nd frame on)
//!                tS, tM = tS', tM'
//! other frame:   t   = R * (rx - tS) + tM
//! ```
//!
//! Every difference goes through [`rollover_delta`], so a counter wrap
//! between two samples costs exactly one period.

use serde::Serialize;

use super::classifier::{FrameClassifier, FrameOrigin};
use super::frame::ReceivedFrame;
use super::ranging::tof_nanos;
use super::report::SyncedFrame;
use super::timestamp::{DeviceTimestamp, normalize_rollover, rollover_delta};
use crate::config::{RatioMode, SyncConfig};
use crate::error::SyncError;

/// Elapsed-master over elapsed-local ratio, kept as an exact fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriftRatio {
    master_delta_ns: i64,
    local_delta_ns: i64,
}

impl DriftRatio {
    /// Clocks running at the same rate.
    pub const UNITY: Self = Self {
        master_delta_ns: 1,
        local_delta_ns: 1,
    };

    /// Ratio of two elapsed intervals; `None` when the local interval is not positive.
    #[must_use]
    pub fn new(master_delta_ns: i64, local_delta_ns: i64) -> Option<Self> {
        (local_delta_ns > 0).then_some(Self {
            master_delta_ns,
            local_delta_ns,
        })
    }

    /// Whole-number ratio.
    #[must_use]
    pub const fn from_integer(ratio: i64) -> Self {
        Self {
            master_delta_ns: ratio,
            local_delta_ns: 1,
        }
    }

    /// Integer quotient of the two intervals, as a ratio.
    #[must_use]
    pub const fn truncated(self) -> Self {
        Self::from_integer(self.master_delta_ns / self.local_delta_ns)
    }

    /// Elapsed master nanoseconds the ratio was built from.
    #[must_use]
    pub const fn master_delta_ns(&self) -> i64 {
        self.master_delta_ns
    }

    /// Elapsed local nanoseconds the ratio was built from.
    #[must_use]
    pub const fn local_delta_ns(&self) -> i64 {
        self.local_delta_ns
    }

    /// Scale a local interval into master nanoseconds (truncating, saturating).
    #[must_use]
    pub fn apply(&self, local_delta_ns: i64) -> i64 {
        let scaled = i128::from(local_delta_ns) * i128::from(self.master_delta_ns)
            / i128::from(self.local_delta_ns);
        i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX })
    }

    /// Ratio as a float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        self.master_delta_ns as f64 / self.local_delta_ns as f64
    }

    /// Rate offset of the master relative to the local clock, in ppm.
    #[must_use]
    pub fn ppm(&self) -> f64 {
        (self.as_f64() - 1.0) * 1e6
    }
}

/// Calibration state of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CalibrationState {
    /// Fewer than two master frames, or no usable ratio yet.
    Uncalibrated,
    /// Non-master frames can be synchronized.
    Calibrated,
}

/// The linear local → master model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncModel {
    reference_local_ns: i64,
    reference_master_ns: i64,
    drift_ratio: Option<DriftRatio>,
    master_frames_received: u64,
}

impl SyncModel {
    /// A model that already has references and a ratio.
    #[must_use]
    pub fn calibrated(
        reference_local_ns: i64,
        reference_master_ns: i64,
        drift_ratio: DriftRatio,
        master_frames_received: u64,
    ) -> Self {
        Self {
            reference_local_ns,
            reference_master_ns,
            drift_ratio: Some(drift_ratio),
            master_frames_received: master_frames_received.max(2),
        }
    }

    /// Local receive time of the last master frame (tS).
    #[must_use]
    pub fn reference_local_ns(&self) -> i64 {
        self.reference_local_ns
    }

    /// Corrected send time of the last master frame (tM).
    #[must_use]
    pub fn reference_master_ns(&self) -> i64 {
        self.reference_master_ns
    }

    /// Current drift ratio (R), only meaningful once calibrated.
    #[must_use]
    pub fn drift_ratio(&self) -> Option<DriftRatio> {
        self.drift_ratio
    }

    /// Master frames observed.
    #[must_use]
    pub fn master_frames_received(&self) -> u64 {
        self.master_frames_received
    }

    /// Calibration state.
    #[must_use]
    pub fn state(&self) -> CalibrationState {
        if self.master_frames_received >= 2 && self.drift_ratio.is_some() {
            CalibrationState::Calibrated
        } else {
            CalibrationState::Uncalibrated
        }
    }
}

/// Model update caused by one master frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MasterObservation {
    /// Master frame sequence number, when known.
    pub sequence: Option<u8>,
    /// Local receive time in nanoseconds (new tS).
    pub local_rx_ns: i64,
    /// Corrected master send time in nanoseconds (new tM).
    pub master_send_ns: i64,
    /// Time-of-flight correction applied, in nanoseconds.
    pub tof_ns: f64,
    /// Ratio computed from this frame, if any.
    pub drift_ratio: Option<DriftRatio>,
    /// Master frames observed, this one included.
    pub master_frames_received: u64,
}

/// Result of feeding one decoded frame to the synchronizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// A master frame updated the model.
    Master(MasterObservation),
    /// A non-master frame was synchronized.
    Synced(SyncedFrame),
}

/// Clock synchronizer.
///
/// Owns the [`SyncModel`]; master frames write it, other frames only read it.
#[derive(Debug, Clone)]
pub struct ClockSynchronizer {
    classifier: FrameClassifier,
    model: SyncModel,
    rollover_period_ns: i64,
    speed_of_light: f64,
    distance_m: f64,
    ratio_mode: RatioMode,
    uncalibrated_drops: u64,
}

impl ClockSynchronizer {
    /// Create an uncalibrated synchronizer.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_model(config, SyncModel::default())
    }

    /// Create a synchronizer starting from an existing model.
    #[must_use]
    pub fn with_model(config: &SyncConfig, model: SyncModel) -> Self {
        Self {
            classifier: FrameClassifier::new(config.master_id),
            model,
            rollover_period_ns: config.rollover_period_ns,
            speed_of_light: config.speed_of_light,
            distance_m: config.initial_distance_m,
            ratio_mode: config.ratio_mode,
            uncalibrated_drops: 0,
        }
    }

    /// Current model.
    #[must_use]
    pub fn model(&self) -> &SyncModel {
        &self.model
    }

    /// Calibration state.
    #[must_use]
    pub fn state(&self) -> CalibrationState {
        self.model.state()
    }

    /// Whether non-master frames can be synchronized.
    #[must_use]
    pub fn is_calibrated(&self) -> bool {
        self.state() == CalibrationState::Calibrated
    }

    /// Frame classifier in use.
    #[must_use]
    pub fn classifier(&self) -> &FrameClassifier {
        &self.classifier
    }

    /// Distance to the master used for the time-of-flight correction.
    #[must_use]
    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Update the distance estimate to the master.
    pub fn set_distance(&mut self, distance_m: f64) {
        self.distance_m = distance_m.max(0.0);
    }

    /// Non-master frames dropped while uncalibrated.
    #[must_use]
    pub fn uncalibrated_drops(&self) -> u64 {
        self.uncalibrated_drops
    }

    /// Rollover-corrected difference of two nanosecond timestamps.
    #[must_use]
    pub fn delta(&self, later_ns: i64, earlier_ns: i64) -> i64 {
        rollover_delta(later_ns, earlier_ns, self.rollover_period_ns)
    }

    /// Master send time for a response TX timestamp, corrected for flight time.
    #[must_use]
    pub fn master_send_time_ns(&self, response_tx_ns: i64) -> i64 {
        let tof = tof_nanos(self.distance_m, self.speed_of_light);
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        let send = (response_tx_ns as f64 - tof) as i64;
        normalize_rollover(send, self.rollover_period_ns)
    }

    /// Record a master frame.
    pub fn observe_master(
        &mut self,
        local_rx: DeviceTimestamp,
        response_tx: DeviceTimestamp,
    ) -> MasterObservation {
        self.observe_master_nanos(local_rx.to_nanos(), response_tx.to_nanos())
    }

    /// Record a master frame given both timestamps in nanoseconds.
    pub fn observe_master_nanos(
        &mut self,
        local_rx_ns: i64,
        response_tx_ns: i64,
    ) -> MasterObservation {
        let tof_ns = tof_nanos(self.distance_m, self.speed_of_light);
        let master_send_ns = self.master_send_time_ns(response_tx_ns);

        let mut new_ratio = None;
        if self.model.master_frames_received >= 1 {
            let master_delta = self.delta(master_send_ns, self.model.reference_master_ns);
            let local_delta = self.delta(local_rx_ns, self.model.reference_local_ns);
            match DriftRatio::new(master_delta, local_delta) {
                Some(ratio) => {
                    let ratio = match self.ratio_mode {
                        RatioMode::Exact => ratio,
                        RatioMode::Truncated => ratio.truncated(),
                    };
                    let was_calibrated = self.is_calibrated();
                    self.model.drift_ratio = Some(ratio);
                    new_ratio = Some(ratio);
                    if !was_calibrated {
                        tracing::info!(
                            ppm = ratio.ppm(),
                            master_delta_ns = master_delta,
                            local_delta_ns = local_delta,
                            "Clock sync: calibrated to master"
                        );
                    }
                }
                None => {
                    tracing::warn!(
                        local_rx_ns,
                        "Clock sync: zero local interval between master frames, keeping ratio"
                    );
                }
            }
        }

        self.model.reference_local_ns = local_rx_ns;
        self.model.reference_master_ns = master_send_ns;
        self.model.master_frames_received += 1;

        tracing::debug!(
            local_rx_ns,
            master_send_ns,
            master_frames = self.model.master_frames_received,
            "Clock sync: master frame"
        );

        MasterObservation {
            sequence: None,
            local_rx_ns,
            master_send_ns,
            tof_ns,
            drift_ratio: new_ratio,
            master_frames_received: self.model.master_frames_received,
        }
    }

    /// Place a local receive time on the master timeline.
    ///
    /// # Errors
    /// Returns [`SyncError::Uncalibrated`] before two master frames.
    pub fn synchronize(&mut self, local_rx: DeviceTimestamp) -> Result<i64, SyncError> {
        self.synchronize_nanos(local_rx.to_nanos())
    }

    /// Place a local receive time, in nanoseconds, on the master timeline.
    ///
    /// # Errors
    /// Returns [`SyncError::Uncalibrated`] before two master frames.
    pub fn synchronize_nanos(&mut self, local_rx_ns: i64) -> Result<i64, SyncError> {
        match self.predict_nanos(local_rx_ns) {
            Some(synced) => Ok(synced),
            None => {
                self.uncalibrated_drops += 1;
                Err(SyncError::Uncalibrated {
                    master_frames: self.model.master_frames_received,
                })
            }
        }
    }

    /// Same as [`synchronize_nanos`](Self::synchronize_nanos) without counting drops.
    #[must_use]
    pub fn predict_nanos(&self, local_rx_ns: i64) -> Option<i64> {
        if !self.is_calibrated() {
            return None;
        }
        let ratio = self.model.drift_ratio?;
        let local_delta = self.delta(local_rx_ns, self.model.reference_local_ns);
        Some(ratio.apply(local_delta).saturating_add(self.model.reference_master_ns))
    }

    /// Classify a decoded frame and run the matching path.
    ///
    /// # Errors
    /// Returns [`FrameError::MissingTimestamps`] for a master frame without
    /// embedded timestamps and [`SyncError::Uncalibrated`] for an early
    /// non-master frame. Neither changes the model.
    pub fn process_frame(
        &mut self,
        frame: &ReceivedFrame,
        frame_len: usize,
        local_rx: DeviceTimestamp,
    ) -> Result<FrameOutcome, SyncError> {
        match self.classifier.classify(frame.sender) {
            FrameOrigin::Master => {
                let timestamps = frame.require_timestamps(frame_len)?;
                let mut observation = self.observe_master(local_rx, timestamps.response_tx);
                observation.sequence = Some(frame.sequence);
                Ok(FrameOutcome::Master(observation))
            }
            FrameOrigin::Other => {
                let synced_master_ns = self.synchronize(local_rx)?;
                Ok(FrameOutcome::Synced(SyncedFrame {
                    sequence: frame.sequence,
                    synced_master_ns,
                    sender: frame.sender,
                    master_frames_received: self.model.master_frames_received,
                    local_rx,
                }))
            }
        }
    }

    /// Decode a raw payload and process it.
    ///
    /// # Errors
    /// See [`ReceivedFrame::decode`] and [`process_frame`](Self::process_frame).
    pub fn process_payload(
        &mut self,
        payload: &[u8],
        capacity: usize,
        local_rx: DeviceTimestamp,
    ) -> Result<FrameOutcome, SyncError> {
        let frame = ReceivedFrame::decode_with_capacity(payload, capacity)?;
        self.process_frame(&frame, payload.len(), local_rx)
    }

    /// Forget every master observation.
    pub fn reset(&mut self) {
        self.model = SyncModel::default();
        self.uncalibrated_drops = 0;
    }
}
