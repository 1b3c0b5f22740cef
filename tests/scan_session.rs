//! Deterministic scanning tests driven through the public session API
//!
//! Key events and timestamps are synthesized, so these run in CI without a
//! scanner attached or a server to report to.

use barcodeverify::config::ScannerConfig;
use barcodeverify::scanner::{KeyEvent, KeyInput, KeyTarget};
use barcodeverify::selection::ShipmentRef;
use barcodeverify::{ScanOutcome, ScanSession};
use std::time::{Duration, Instant};

/// Session with default scanner settings and shipment 12 selected
fn session() -> ScanSession {
    ScanSession::new(&ScannerConfig::default())
        .expect("default scanner config is valid")
        .with_shipment(Some(ShipmentRef::new(12, Some("ENV-0012".into()))))
}

/// Type `code` as a scanner burst, one key every 5 ms starting at `start`
///
/// Returns any outcome produced along the way and the time of the last key.
fn burst(s: &mut ScanSession, code: &str, start: Instant) -> (Vec<ScanOutcome>, Instant) {
    let mut outcomes = Vec::new();
    let mut now = start;
    for c in code.chars() {
        outcomes.extend(s.handle_key(&KeyEvent::scanner_char(c), now));
        now += Duration::from_millis(5);
    }
    (outcomes, now)
}

fn accepted(outcome: Option<ScanOutcome>) -> String {
    match outcome {
        Some(ScanOutcome::Accepted(scan)) => scan.barcode,
        other => panic!("expected an accepted scan, got {:?}", other),
    }
}

#[test]
fn test_burst_without_terminator_flushes_on_timeout() {
    let mut s = session();
    let t0 = Instant::now();

    let (outcomes, last) = burst(&mut s, "ABCD1", t0);
    assert!(outcomes.is_empty());

    // Nothing happens before the inter-key timeout
    assert!(s.handle_timeout(last + Duration::from_millis(50)).is_none());

    let code = accepted(s.handle_timeout(last + Duration::from_millis(150)));
    assert_eq!(code, "ABCD1");

    // Accepted exactly once
    assert!(s.handle_timeout(last + Duration::from_millis(300)).is_none());
    assert!(s.deadline().is_none());
}

#[test]
fn test_short_burst_is_discarded() {
    let mut s = session();
    let t0 = Instant::now();

    let (outcomes, last) = burst(&mut s, "AB", t0);
    assert!(outcomes.is_empty());
    assert!(s.handle_timeout(last + Duration::from_millis(150)).is_none());
    assert!(s.state().is_idle());
}

#[test]
fn test_enter_flushes_immediately() {
    let mut s = session();
    let t0 = Instant::now();

    let (_, last) = burst(&mut s, "XYZ9", t0);
    let code = accepted(s.handle_key(&KeyEvent::scanner_enter(), last));
    assert_eq!(code, "XYZ9");

    // Buffer is empty, so the old deadline no longer fires
    assert!(s.handle_timeout(last + Duration::from_millis(150)).is_none());
}

#[test]
fn test_enter_below_minimum_keeps_buffering() {
    let mut s = session();
    let t0 = Instant::now();

    let (_, last) = burst(&mut s, "AB", t0);
    assert!(s.handle_key(&KeyEvent::scanner_enter(), last).is_none());
    let (_, last) = burst(&mut s, "CD", last);
    assert_eq!(accepted(s.handle_key(&KeyEvent::scanner_enter(), last)), "ABCD");
}

#[test]
fn test_double_read_within_cooldown() {
    let mut s = session();
    let t0 = Instant::now();

    let (_, last) = burst(&mut s, "1234", t0);
    assert_eq!(accepted(s.handle_key(&KeyEvent::scanner_enter(), last)), "1234");

    let t1 = t0 + Duration::from_millis(500);
    let (_, last) = burst(&mut s, "1234", t1);
    assert_eq!(
        s.handle_key(&KeyEvent::scanner_enter(), last),
        Some(ScanOutcome::Duplicate("1234".into()))
    );

    // Past the cooldown the same label counts again
    let t2 = t0 + Duration::from_millis(2500);
    let (_, last) = burst(&mut s, "1234", t2);
    assert_eq!(accepted(s.handle_key(&KeyEvent::scanner_enter(), last)), "1234");
}

#[test]
fn test_different_code_is_not_a_duplicate() {
    let mut s = session();
    let t0 = Instant::now();

    let (_, last) = burst(&mut s, "1234", t0);
    accepted(s.handle_key(&KeyEvent::scanner_enter(), last));
    let (_, last) = burst(&mut s, "5678", last + Duration::from_millis(20));
    assert_eq!(accepted(s.handle_key(&KeyEvent::scanner_enter(), last)), "5678");
}

#[test]
fn test_typing_in_editable_fields_is_ignored() {
    let mut s = session();
    let t0 = Instant::now();

    for c in "hello world".chars() {
        let ev = KeyEvent::new(KeyInput::Char(c), KeyTarget::Editable);
        assert!(s.handle_key(&ev, t0).is_none());
    }
    let enter = KeyEvent::new(KeyInput::Enter, KeyTarget::Editable);
    assert!(s.handle_key(&enter, t0).is_none());
    assert!(s.deadline().is_none());
}

#[test]
fn test_non_barcode_characters_are_skipped() {
    let mut s = session();
    let t0 = Instant::now();

    let (_, last) = burst(&mut s, "AB 12+34", t0);
    assert_eq!(accepted(s.handle_key(&KeyEvent::scanner_enter(), last)), "AB1234");
}

#[test]
fn test_next_burst_after_gap_flushes_previous() {
    let mut s = session();
    let t0 = Instant::now();

    let (_, last) = burst(&mut s, "AAAA", t0);
    // No timer fired; the first key of the next burst ends the previous one
    let outcome = s.handle_key(
        &KeyEvent::scanner_char('B'),
        last + Duration::from_millis(400),
    );
    assert_eq!(accepted(outcome), "AAAA");
    assert!(!s.state().is_idle());
}

#[test]
fn test_manual_entry_skips_cooldown() {
    let mut s = session();
    let t0 = Instant::now();

    let (_, last) = burst(&mut s, "1234", t0);
    accepted(s.handle_key(&KeyEvent::scanner_enter(), last));

    match s.submit_manual("1234") {
        Some(ScanOutcome::Accepted(scan)) => {
            assert!(scan.manual);
            assert_eq!(scan.shipment.id, 12);
        }
        other => panic!("expected an accepted manual scan, got {:?}", other),
    }
}

#[test]
fn test_scans_need_a_shipment() {
    let mut s = ScanSession::new(&ScannerConfig::default()).expect("valid config");
    let t0 = Instant::now();

    let (_, last) = burst(&mut s, "ZX81", t0);
    assert_eq!(
        s.handle_key(&KeyEvent::scanner_enter(), last),
        Some(ScanOutcome::NoActiveShipment("ZX81".into()))
    );

    s.set_shipment(ShipmentRef::new(3, None));
    let (_, last) = burst(&mut s, "ZX81", last);
    assert_eq!(accepted(s.handle_key(&KeyEvent::scanner_enter(), last)), "ZX81");
}

#[test]
fn test_tab_terminator() {
    let config = ScannerConfig {
        terminator: "tab".into(),
        ..ScannerConfig::default()
    };
    let mut s = ScanSession::new(&config)
        .expect("tab is a valid terminator")
        .with_shipment(Some(ShipmentRef::new(1, None)));
    let t0 = Instant::now();

    let (_, last) = burst(&mut s, "Q1W2", t0);
    assert!(s.handle_key(&KeyEvent::scanner_enter(), last).is_none());
    let tab = KeyEvent::new(KeyInput::Tab, KeyTarget::Scanner);
    assert_eq!(accepted(s.handle_key(&tab, last)), "Q1W2");
}
