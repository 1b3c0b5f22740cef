//! Double-read suppression
//!
//! Scanners occasionally read the same label twice in quick succession.
//! The guard remembers the last accepted code and refuses an identical
//! one until the cooldown has passed.

use std::time::{Duration, Instant};

/// Last accepted barcode and when it was accepted
#[derive(Debug)]
pub struct DedupeGuard {
    cooldown: Duration,
    last: Option<(String, Instant)>,
}

impl DedupeGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    /// Record `code` if it is not a repeat within the cooldown
    ///
    /// Returns false (and leaves the guard untouched) for a double-read.
    pub fn admit(&mut self, code: &str, now: Instant) -> bool {
        if let Some((ref last_code, last_at)) = self.last {
            if last_code == code && now.saturating_duration_since(last_at) < self.cooldown {
                return false;
            }
        }
        self.last = Some((code.to_string(), now));
        true
    }

    pub fn last_code(&self) -> Option<&str> {
        self.last.as_ref().map(|(code, _)| code.as_str())
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_within_cooldown_rejected() {
        let mut guard = DedupeGuard::new(Duration::from_millis(2000));
        let t0 = Instant::now();
        assert!(guard.admit("1234", t0));
        assert!(!guard.admit("1234", t0 + Duration::from_millis(500)));
        assert!(!guard.admit("1234", t0 + Duration::from_millis(1999)));
        assert!(guard.admit("1234", t0 + Duration::from_millis(2000)));
    }

    #[test]
    fn test_rejection_does_not_extend_window() {
        let mut guard = DedupeGuard::new(Duration::from_millis(2000));
        let t0 = Instant::now();
        guard.admit("1234", t0);
        assert!(!guard.admit("1234", t0 + Duration::from_millis(1500)));
        // Measured from the accepted scan, not the rejected one
        assert!(guard.admit("1234", t0 + Duration::from_millis(2100)));
    }

    #[test]
    fn test_different_code_resets_guard() {
        let mut guard = DedupeGuard::new(Duration::from_millis(2000));
        let t0 = Instant::now();
        assert!(guard.admit("AAAA", t0));
        assert!(guard.admit("BBBB", t0 + Duration::from_millis(10)));
        assert!(guard.admit("AAAA", t0 + Duration::from_millis(20)));
        assert_eq!(guard.last_code(), Some("AAAA"));

        guard.clear();
        assert!(guard.last_code().is_none());
    }
}
