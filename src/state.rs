//! State machine for the scan decoder
//!
//! Idle → Accumulating → Idle
//!
//! A flush (terminator or inter-key timeout) returns the decoder straight
//! to `Idle` within the same call.

use std::time::Instant;

/// Decoder state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    /// Empty buffer, no timeout armed
    Idle,

    /// Buffer non-empty, inter-key timeout armed
    Accumulating {
        /// When the first character of this burst arrived
        started_at: Instant,
        /// Characters captured so far
        chars: usize,
    },
}

impl ScanState {
    /// Create a new idle state
    pub fn new() -> Self {
        ScanState::Idle
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ScanState::Idle)
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self, ScanState::Accumulating { .. })
    }

    /// Name written to the state file for status bar integrations
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::Accumulating { .. } => "accumulating",
        }
    }
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Idle => write!(f, "Idle"),
            ScanState::Accumulating { started_at, chars } => write!(
                f,
                "Accumulating ({} chars, {}ms)",
                chars,
                started_at.elapsed().as_millis()
            ),
        }
    }
}
