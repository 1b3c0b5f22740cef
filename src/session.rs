//! Scanning session
//!
//! Ties the keystroke decoder, the dedupe guard and the active shipment
//! together for the lifetime of one scanning run. Every entry point takes
//! the current time so the whole pipeline can be driven from tests.

use crate::config::ScannerConfig;
use crate::decoder::{clean_barcode, DedupeGuard, KeystrokeDecoder};
use crate::error::ScannerError;
use crate::scanner::{parse_terminator, KeyEvent};
use crate::selection::ShipmentRef;
use crate::state::ScanState;
use std::time::Instant;

/// An accepted barcode and the shipment it was scanned against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub barcode: String,
    pub shipment: ShipmentRef,
    /// Typed by hand rather than read by the scanner
    pub manual: bool,
}

/// Result of a flushed candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Hand to the consumer
    Accepted(Scan),
    /// Same code again inside the cooldown window
    Duplicate(String),
    /// No shipment selected; the scan was not processed
    NoActiveShipment(String),
    /// Manual entry shorter than the minimum length
    TooShort { len: usize, min: usize },
}

/// Decoder, dedupe guard and shipment context for one scanning run
#[derive(Debug)]
pub struct ScanSession {
    decoder: KeystrokeDecoder,
    guard: DedupeGuard,
    shipment: Option<ShipmentRef>,
}

impl ScanSession {
    pub fn new(config: &ScannerConfig) -> Result<Self, ScannerError> {
        let terminator = parse_terminator(&config.terminator)?;
        Ok(Self {
            decoder: KeystrokeDecoder::new(
                config.min_length,
                config.inter_key_timeout(),
                terminator,
            ),
            guard: DedupeGuard::new(config.cooldown()),
            shipment: None,
        })
    }

    pub fn with_shipment(mut self, shipment: Option<ShipmentRef>) -> Self {
        self.shipment = shipment;
        self
    }

    pub fn shipment(&self) -> Option<&ShipmentRef> {
        self.shipment.as_ref()
    }

    pub fn set_shipment(&mut self, shipment: ShipmentRef) {
        if self.shipment.as_ref() != Some(&shipment) {
            // Same label on a different shipment is a new scan
            self.guard.clear();
        }
        self.shipment = Some(shipment);
    }

    pub fn clear_shipment(&mut self) {
        self.shipment = None;
    }

    pub fn state(&self) -> ScanState {
        self.decoder.state()
    }

    /// When the caller should invoke [`ScanSession::handle_timeout`]
    pub fn deadline(&self) -> Option<Instant> {
        self.decoder.deadline()
    }

    /// Process one key event from the capture surface
    pub fn handle_key(&mut self, event: &KeyEvent, now: Instant) -> Option<ScanOutcome> {
        let raw = self.decoder.feed(event, now)?;
        self.process_scanned(&raw, now)
    }

    /// Process an elapsed inter-key timeout
    pub fn handle_timeout(&mut self, now: Instant) -> Option<ScanOutcome> {
        let raw = self.decoder.expire(now)?;
        self.process_scanned(&raw, now)
    }

    /// Process a line typed into the manual entry field
    ///
    /// Manual entry is deliberate, so it skips the double-read window.
    pub fn submit_manual(&mut self, text: &str) -> Option<ScanOutcome> {
        let barcode = clean_barcode(text);
        if barcode.is_empty() {
            return None;
        }

        let len = barcode.chars().count();
        let min = self.decoder.min_length();
        if len < min {
            tracing::debug!("Manual entry too short ({} < {})", len, min);
            return Some(ScanOutcome::TooShort { len, min });
        }

        Some(self.accept(barcode, true))
    }

    /// Drop any partially buffered scan
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    fn process_scanned(&mut self, raw: &str, now: Instant) -> Option<ScanOutcome> {
        let barcode = clean_barcode(raw);
        if barcode.is_empty() {
            return None;
        }

        if self.shipment.is_none() {
            return Some(ScanOutcome::NoActiveShipment(barcode));
        }

        if !self.guard.admit(&barcode, now) {
            tracing::debug!("Suppressed double-read of {}", barcode);
            return Some(ScanOutcome::Duplicate(barcode));
        }

        Some(self.accept(barcode, false))
    }

    fn accept(&self, barcode: String, manual: bool) -> ScanOutcome {
        match self.shipment {
            Some(ref shipment) => ScanOutcome::Accepted(Scan {
                barcode,
                shipment: shipment.clone(),
                manual,
            }),
            None => ScanOutcome::NoActiveShipment(barcode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{KeyInput, KeyTarget};
    use std::time::Duration;

    fn session() -> ScanSession {
        ScanSession::new(&ScannerConfig::default())
            .unwrap()
            .with_shipment(Some(ShipmentRef::new(7, Some("SHP-007".into()))))
    }

    fn scan(s: &mut ScanSession, code: &str, at: Instant) -> Option<ScanOutcome> {
        for c in code.chars() {
            assert!(s.handle_key(&KeyEvent::scanner_char(c), at).is_none());
        }
        s.handle_key(&KeyEvent::scanner_enter(), at)
    }

    #[test]
    fn test_accepted_scan_carries_shipment() {
        let mut s = session();
        let out = scan(&mut s, "7501031311309", Instant::now()).unwrap();
        match out {
            ScanOutcome::Accepted(scan) => {
                assert_eq!(scan.barcode, "7501031311309");
                assert_eq!(scan.shipment.id, 7);
                assert!(!scan.manual);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_no_shipment_blocks_scan() {
        let mut s = ScanSession::new(&ScannerConfig::default()).unwrap();
        let out = scan(&mut s, "ABCD", Instant::now());
        assert_eq!(out, Some(ScanOutcome::NoActiveShipment("ABCD".into())));
        // A blocked scan does not arm the dedupe guard
        s.set_shipment(ShipmentRef::new(1, None));
        assert!(matches!(
            scan(&mut s, "ABCD", Instant::now()),
            Some(ScanOutcome::Accepted(_))
        ));
    }

    #[test]
    fn test_duplicate_suppressed() {
        let mut s = session();
        let t0 = Instant::now();
        assert!(matches!(scan(&mut s, "1234", t0), Some(ScanOutcome::Accepted(_))));
        assert_eq!(
            scan(&mut s, "1234", t0 + Duration::from_millis(400)),
            Some(ScanOutcome::Duplicate("1234".into()))
        );
    }

    #[test]
    fn test_switching_shipment_clears_guard() {
        let mut s = session();
        let t0 = Instant::now();
        scan(&mut s, "1234", t0);
        s.set_shipment(ShipmentRef::new(8, None));
        assert!(matches!(
            scan(&mut s, "1234", t0 + Duration::from_millis(100)),
            Some(ScanOutcome::Accepted(_))
        ));
    }

    #[test]
    fn test_manual_entry_bypasses_dedupe() {
        let mut s = session();
        let t0 = Instant::now();
        scan(&mut s, "1234", t0);
        let out = s.submit_manual(" 1234\n").unwrap();
        match out {
            ScanOutcome::Accepted(scan) => {
                assert_eq!(scan.barcode, "1234");
                assert!(scan.manual);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // Scanner double-read window still measured from the scanner read
        assert_eq!(
            scan(&mut s, "1234", t0 + Duration::from_millis(100)),
            Some(ScanOutcome::Duplicate("1234".into()))
        );
    }

    #[test]
    fn test_manual_entry_length_check() {
        let mut s = session();
        assert_eq!(
            s.submit_manual("AB"),
            Some(ScanOutcome::TooShort { len: 2, min: 4 })
        );
        assert_eq!(s.submit_manual("  \t "), None);
    }

    #[test]
    fn test_manual_entry_requires_shipment() {
        let mut s = ScanSession::new(&ScannerConfig::default()).unwrap();
        assert_eq!(
            s.submit_manual("ABCDE"),
            Some(ScanOutcome::NoActiveShipment("ABCDE".into()))
        );
    }

    #[test]
    fn test_timeout_path() {
        let mut s = session();
        let t0 = Instant::now();
        for c in "QWER".chars() {
            s.handle_key(&KeyEvent::scanner_char(c), t0);
        }
        let deadline = s.deadline().unwrap();
        assert!(matches!(
            s.handle_timeout(deadline),
            Some(ScanOutcome::Accepted(_))
        ));
        assert!(s.state().is_idle());
    }

    #[test]
    fn test_editable_typing_does_not_reach_buffer() {
        let mut s = session();
        let t0 = Instant::now();
        for c in "typing".chars() {
            let ev = KeyEvent::new(KeyInput::Char(c), KeyTarget::Editable);
            assert!(s.handle_key(&ev, t0).is_none());
        }
        assert!(s.deadline().is_none());
    }

    #[test]
    fn test_unknown_terminator_rejected() {
        let config = ScannerConfig {
            terminator: "F13".into(),
            ..ScannerConfig::default()
        };
        assert!(ScanSession::new(&config).is_err());
    }
}
