//! Synchronizer configuration

use std::time::Duration;

use crate::constants;

/// Arithmetic used when applying the drift ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatioMode {
    /// Keep the ratio as an exact fraction of the two deltas
    #[default]
    Exact,
    /// Truncate the ratio to an integer quotient before use
    ///
    /// Any clock offset below 100% collapses the ratio to 1 (or 0 when the
    /// master runs slower). Only useful for comparing against legacy logs.
    Truncated,
}

/// Synchronizer configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Sender identifier of the master emitter
    pub master_id: [u8; 2],

    /// Wrap boundary of the nanosecond timeline
    pub rollover_period_ns: i64,

    /// Propagation speed used for the time-of-flight correction (m/s)
    pub speed_of_light: f64,

    /// Initial distance to the master anchor in metres
    pub initial_distance_m: f64,

    /// Drift ratio arithmetic
    pub ratio_mode: RatioMode,

    /// Pause between ranging cycles
    pub cycle_delay: Duration,

    /// Receive buffer capacity in bytes
    pub rx_buf_len: usize,

    /// Anchor name used in report blocks
    pub anchor_name: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            master_id: constants::MASTER_ID,
            rollover_period_ns: constants::ROLLOVER_PERIOD_NS,
            speed_of_light: constants::SPEED_OF_LIGHT,
            initial_distance_m: constants::DEFAULT_DISTANCE_M,
            ratio_mode: RatioMode::Exact,
            cycle_delay: Duration::from_millis(constants::RNG_DELAY_MS),
            rx_buf_len: constants::RX_BUF_LEN,
            anchor_name: constants::DEFAULT_ANCHOR_NAME.to_string(),
        }
    }
}

impl SyncConfig {
    /// Create with a custom master identifier
    #[must_use]
    pub fn with_master_id(master_id: [u8; 2]) -> Self {
        Self {
            master_id,
            ..Default::default()
        }
    }

    /// Set rollover period
    #[must_use]
    pub fn rollover_period_ns(mut self, period: i64) -> Self {
        self.rollover_period_ns = period;
        self
    }

    /// Set initial distance
    #[must_use]
    pub fn initial_distance_m(mut self, distance: f64) -> Self {
        self.initial_distance_m = distance;
        self
    }

    /// Set drift ratio arithmetic
    #[must_use]
    pub fn ratio_mode(mut self, mode: RatioMode) -> Self {
        self.ratio_mode = mode;
        self
    }

    /// Set delay between ranging cycles
    #[must_use]
    pub fn cycle_delay(mut self, delay: Duration) -> Self {
        self.cycle_delay = delay;
        self
    }

    /// Set anchor name
    #[must_use]
    pub fn anchor_name(mut self, name: impl Into<String>) -> Self {
        self.anchor_name = name.into();
        self
    }
}
