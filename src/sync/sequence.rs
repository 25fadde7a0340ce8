//! Master frame sequence tracking and loss detection

use std::collections::VecDeque;

/// Gaps larger than this are treated as a restarted emitter, not as loss.
const MAX_GAP: u8 = 128;

/// Tracks 8-bit frame sequence numbers to detect gaps
#[derive(Debug, Clone)]
pub struct SequenceTracker {
    /// Expected next sequence number
    expected_seq: Option<u8>,
    /// Recent gap history
    recent_gaps: VecDeque<GapInfo>,
    /// Maximum history size
    max_history: usize,
    /// Total frames recorded
    frames_received: u64,
    /// Total gaps detected
    total_gaps: u64,
    /// Total frames lost
    total_lost: u64,
}

/// Information about a detected gap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapInfo {
    /// First missing sequence
    pub start: u8,
    /// Count of missing frames
    pub count: u8,
}

impl SequenceTracker {
    /// Create a new sequence tracker
    #[must_use]
    pub fn new() -> Self {
        Self::with_history(32)
    }

    /// Create a tracker keeping at most `max_history` recent gaps
    #[must_use]
    pub fn with_history(max_history: usize) -> Self {
        Self {
            expected_seq: None,
            recent_gaps: VecDeque::with_capacity(max_history),
            max_history,
            frames_received: 0,
            total_gaps: 0,
            total_lost: 0,
        }
    }

    /// Record a received frame, returning any detected gap
    pub fn record(&mut self, seq: u8) -> Option<GapInfo> {
        self.frames_received += 1;

        let gap = self.expected_seq.and_then(|expected| {
            let gap_size = seq.wrapping_sub(expected);
            (gap_size > 0 && gap_size < MAX_GAP).then_some(GapInfo {
                start: expected,
                count: gap_size,
            })
        });

        if let Some(info) = gap {
            self.total_gaps += 1;
            self.total_lost += u64::from(info.count);
            if self.recent_gaps.len() >= self.max_history {
                self.recent_gaps.pop_front();
            }
            self.recent_gaps.push_back(info);
        }

        self.expected_seq = Some(seq.wrapping_add(1));
        gap
    }

    /// Get frame loss ratio (0.0 to 1.0)
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        reason = "Precision loss acceptable for ratio calculation"
    )]
    pub fn loss_ratio(&self) -> f64 {
        if self.frames_received == 0 {
            return 0.0;
        }
        let total = self.frames_received + self.total_lost;
        self.total_lost as f64 / total as f64
    }

    /// Total frames recorded
    #[must_use]
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Total gaps detected
    #[must_use]
    pub fn total_gaps(&self) -> u64 {
        self.total_gaps
    }

    /// Total frames lost
    #[must_use]
    pub fn total_lost(&self) -> u64 {
        self.total_lost
    }

    /// Recent gaps, oldest first
    pub fn recent_gaps(&self) -> impl Iterator<Item = &GapInfo> {
        self.recent_gaps.iter()
    }

    /// Reset tracking state
    pub fn reset(&mut self) {
        self.expected_seq = None;
        self.recent_gaps.clear();
        self.frames_received = 0;
        self.total_gaps = 0;
        self.total_lost = 0;
    }
}

impl Default for SequenceTracker {
    fn default() -> Self {
        Self::new()
    }
}
