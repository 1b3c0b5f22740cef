//! Keystroke barcode decoder
//!
//! Turns a stream of key presses into candidate barcodes. A HID scanner
//! types a whole code within a few milliseconds and usually finishes with
//! Enter; a human types much slower. The decoder buffers qualifying
//! characters and flushes either on the terminator (when enough characters
//! are buffered) or when the inter-key timeout elapses, whichever comes
//! first.
//!
//! The decoder never reads the clock itself. Callers pass the current
//! `Instant` and arm their own timer from [`KeystrokeDecoder::deadline`].

pub mod dedupe;

pub use dedupe::DedupeGuard;

use crate::scanner::{KeyEvent, KeyInput, KeyTarget};
use crate::state::ScanState;
use std::time::{Duration, Instant};

/// Characters a scanner may contribute to a barcode
pub fn is_barcode_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Strip stray control characters and surrounding whitespace
pub fn clean_barcode(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Characters accumulated from key events plus the auto-flush deadline
#[derive(Debug, Default)]
pub struct ScanBuffer {
    chars: String,
    started_at: Option<Instant>,
    deadline: Option<Instant>,
}

impl ScanBuffer {
    pub fn len(&self) -> usize {
        self.chars.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.chars
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn push(&mut self, c: char, now: Instant, timeout: Duration) {
        if self.chars.is_empty() {
            self.started_at = Some(now);
        }
        self.chars.push(c);
        self.deadline = Some(now + timeout);
    }

    fn take(&mut self) -> String {
        self.started_at = None;
        self.deadline = None;
        std::mem::take(&mut self.chars)
    }
}

/// Buffers scanner keystrokes into candidate barcodes
#[derive(Debug)]
pub struct KeystrokeDecoder {
    min_length: usize,
    inter_key_timeout: Duration,
    terminator: KeyInput,
    buffer: ScanBuffer,
}

impl KeystrokeDecoder {
    pub fn new(min_length: usize, inter_key_timeout: Duration, terminator: KeyInput) -> Self {
        Self {
            min_length,
            inter_key_timeout,
            terminator,
            buffer: ScanBuffer::default(),
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// When the buffer will auto-flush, if anything is buffered
    pub fn deadline(&self) -> Option<Instant> {
        self.buffer.deadline()
    }

    /// Currently buffered characters
    pub fn buffered(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn state(&self) -> ScanState {
        match self.buffer.started_at {
            Some(started_at) if !self.buffer.is_empty() => ScanState::Accumulating {
                started_at,
                chars: self.buffer.len(),
            },
            _ => ScanState::Idle,
        }
    }

    /// Feed one key event
    ///
    /// Returns a raw candidate when this event (or an already-expired
    /// deadline) flushed the buffer with enough characters.
    pub fn feed(&mut self, event: &KeyEvent, now: Instant) -> Option<String> {
        if event.target == KeyTarget::Editable {
            return None;
        }

        // A deadline that passed before this key arrived ends the previous burst
        let expired = self.expire(now);

        match event.input {
            KeyInput::Char(c) if is_barcode_char(c) => {
                self.buffer.push(c, now, self.inter_key_timeout);
                tracing::trace!("Buffered {:?} ({} chars)", c, self.buffer.len());
                expired
            }
            input if input == self.terminator && self.buffer.len() >= self.min_length => {
                tracing::trace!("Terminator received, flushing {} chars", self.buffer.len());
                let candidate = self.buffer.take();
                // Both cannot be set: an expired flush leaves the buffer empty
                expired.or(Some(candidate))
            }
            _ => expired,
        }
    }

    /// Flush the buffer if its deadline has passed
    ///
    /// Sub-minimum bursts are dropped silently.
    pub fn expire(&mut self, now: Instant) -> Option<String> {
        match self.buffer.deadline() {
            Some(deadline) if now >= deadline => {
                let raw = self.buffer.take();
                let len = raw.chars().count();
                if len >= self.min_length {
                    tracing::trace!("Inter-key timeout, flushing {} chars", len);
                    Some(raw)
                } else {
                    tracing::trace!("Discarding {} char burst below minimum", len);
                    None
                }
            }
            _ => None,
        }
    }

    /// Drop anything buffered without emitting it
    pub fn reset(&mut self) {
        self.buffer.take();
    }
}
