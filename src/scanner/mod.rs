//! Scanner capture module
//!
//! USB barcode scanners present themselves as keyboards. On Linux the
//! listener reads their key events at the kernel level using evdev, which
//! works regardless of display server or focused window.
//!
//! Linux: Requires the user to be in the 'input' group.

#[cfg(target_os = "linux")]
pub mod evdev_source;

use crate::config::ScannerConfig;
use crate::error::ScannerError;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::mpsc;

/// Kernel timestamps older than this are treated as a wall-clock step
const MAX_EVENT_AGE: Duration = Duration::from_secs(5);

/// What a key press produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A single printable character
    Char(char),
    /// Enter / Return (the usual scanner terminator)
    Enter,
    /// Horizontal tab
    Tab,
    /// Any other key (modifiers, navigation, function keys)
    Other,
}

/// Where a key event was headed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTarget {
    /// The global capture surface (a scanner device)
    Scanner,
    /// The decoder's own manual-entry field
    ManualInput,
    /// An ordinary editable field or a keyboard used for typing
    Editable,
}

/// A single key press delivered to the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub input: KeyInput,
    pub target: KeyTarget,
    /// When the key was pressed, if the source knows
    pub pressed_at: Option<Instant>,
}

impl KeyEvent {
    pub fn new(input: KeyInput, target: KeyTarget) -> Self {
        Self {
            input,
            target,
            pressed_at: None,
        }
    }

    /// Stamp the event with its press time
    pub fn at(mut self, pressed_at: Instant) -> Self {
        self.pressed_at = Some(pressed_at);
        self
    }

    /// Press time, or `received` for sources without timestamps
    pub fn time_or(&self, received: Instant) -> Instant {
        self.pressed_at.unwrap_or(received)
    }

    /// Shorthand for a character from a scanner device
    pub fn scanner_char(c: char) -> Self {
        Self::new(KeyInput::Char(c), KeyTarget::Scanner)
    }

    /// Shorthand for Enter from a scanner device
    pub fn scanner_enter() -> Self {
        Self::new(KeyInput::Enter, KeyTarget::Scanner)
    }
}

/// Place a wall-clock event timestamp on the monotonic clock
///
/// `wall_now` and `mono_now` must be read together. Stamps from the future
/// or from before a clock step fall back to `mono_now`.
pub fn instant_from_timestamp(
    stamp: SystemTime,
    wall_now: SystemTime,
    mono_now: Instant,
) -> Instant {
    match wall_now.duration_since(stamp) {
        Ok(age) if age <= MAX_EVENT_AGE => mono_now.checked_sub(age).unwrap_or(mono_now),
        _ => mono_now,
    }
}

/// Trait for key event sources
#[async_trait::async_trait]
pub trait KeySource: Send + Sync {
    /// Start listening for key events
    /// Returns a channel receiver for events
    async fn start(&mut self) -> Result<mpsc::Receiver<KeyEvent>, ScannerError>;

    /// Stop listening and clean up
    async fn stop(&mut self) -> Result<(), ScannerError>;
}

/// Factory function to create the appropriate key source
///
/// On Linux, uses evdev for kernel-level key event detection.
#[cfg(target_os = "linux")]
pub fn create_source(config: &ScannerConfig) -> Result<Box<dyn KeySource>, ScannerError> {
    Ok(Box::new(evdev_source::EvdevSource::new(config)?))
}

/// Factory function to create the appropriate key source
///
/// Only Linux evdev capture is implemented; use manual input elsewhere.
#[cfg(not(target_os = "linux"))]
pub fn create_source(_config: &ScannerConfig) -> Result<Box<dyn KeySource>, ScannerError> {
    Err(ScannerError::NotSupported(
        "Scanner capture requires Linux evdev. Run with --manual to type barcodes instead."
            .to_string(),
    ))
}

/// Parse the configured terminator key name
///
/// Accepts the same spellings as evdev key names (with or without the
/// KEY_ prefix, case-insensitive).
pub fn parse_terminator(name: &str) -> Result<KeyInput, ScannerError> {
    let normalized: String = name
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    let normalized = normalized.strip_prefix("KEY_").unwrap_or(&normalized);

    match normalized {
        "ENTER" | "RETURN" | "KPENTER" => Ok(KeyInput::Enter),
        "TAB" => Ok(KeyInput::Tab),
        _ => Err(ScannerError::UnknownKey(format!(
            "{}. Scanner terminators can be ENTER or TAB",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_terminator() {
        assert_eq!(parse_terminator("ENTER").unwrap(), KeyInput::Enter);
        assert_eq!(parse_terminator("key_enter").unwrap(), KeyInput::Enter);
        assert_eq!(parse_terminator("KPENTER").unwrap(), KeyInput::Enter);
        assert_eq!(parse_terminator("Tab").unwrap(), KeyInput::Tab);
        assert!(parse_terminator("SPACE").is_err());
    }

    #[test]
    fn test_scanner_shorthands() {
        let ev = KeyEvent::scanner_char('A');
        assert_eq!(ev.input, KeyInput::Char('A'));
        assert_eq!(ev.target, KeyTarget::Scanner);
        assert_eq!(KeyEvent::scanner_enter().input, KeyInput::Enter);
    }

    #[test]
    fn test_press_time_falls_back_to_receive_time() {
        let received = Instant::now();
        assert_eq!(KeyEvent::scanner_char('A').time_or(received), received);

        let pressed = received - Duration::from_millis(150);
        let ev = KeyEvent::scanner_char('A').at(pressed);
        assert_eq!(ev.time_or(received), pressed);
    }

    #[test]
    fn test_kernel_timestamp_mapped_to_monotonic() {
        let wall_now = SystemTime::now();
        let mono_now = Instant::now();

        let stamp = wall_now - Duration::from_millis(120);
        assert_eq!(
            instant_from_timestamp(stamp, wall_now, mono_now),
            mono_now - Duration::from_millis(120)
        );

        // Future stamps and clock steps use the receive time
        let future = wall_now + Duration::from_millis(50);
        assert_eq!(instant_from_timestamp(future, wall_now, mono_now), mono_now);
        let ancient = wall_now - Duration::from_secs(3600);
        assert_eq!(instant_from_timestamp(ancient, wall_now, mono_now), mono_now);
    }
}
