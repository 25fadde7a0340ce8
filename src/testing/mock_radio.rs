//! Mock radio transceiver for testing the ranging loop
//!
//! Counts receiver arm/reset requests so tests can check how the loop drives
//! the driver, without real hardware.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use crate::error::SyncError;
use crate::sync::radio::Transceiver;

#[derive(Debug, Default)]
struct Counters {
    enables: AtomicU64,
    resets: AtomicU64,
    fail_enable: AtomicBool,
}

/// Mock transceiver
///
/// Clones share counters, so a test can keep one handle while the loop owns
/// the other.
#[derive(Debug, Clone, Default)]
pub struct MockRadio {
    counters: Arc<Counters>,
}

impl MockRadio {
    /// Create a new mock radio
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the receiver was armed
    #[must_use]
    pub fn enables(&self) -> u64 {
        self.counters.enables.load(Ordering::SeqCst)
    }

    /// Number of receiver resets
    #[must_use]
    pub fn resets(&self) -> u64 {
        self.counters.resets.load(Ordering::SeqCst)
    }

    /// Make the next `enable_receiver` call fail
    pub fn fail_next_enable(&self) {
        self.counters.fail_enable.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transceiver for MockRadio {
    async fn enable_receiver(&mut self) -> Result<(), SyncError> {
        if self.counters.fail_enable.swap(false, Ordering::SeqCst) {
            return Err(SyncError::Transceiver("receiver enable failed".to_string()));
        }
        self.counters.enables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn reset_receiver(&mut self) -> Result<(), SyncError> {
        self.counters.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
