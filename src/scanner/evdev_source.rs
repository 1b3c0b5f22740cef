//! evdev-based scanner capture
//!
//! Uses the Linux evdev interface to read key presses at the kernel level.
//! Scanners are matched by device name; every other keyboard is still read
//! but its events are tagged as ordinary typing so the decoder skips them.
//!
//! The user must be in the 'input' group to access /dev/input/* devices.

use super::{KeyEvent, KeyInput, KeySource, KeyTarget};
use crate::config::ScannerConfig;
use crate::error::ScannerError;
use evdev::{Device, InputEventKind, Key};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use tokio::sync::{mpsc, oneshot};

/// Key code → (unshifted, shifted) character, US layout as emitted by HID scanners
const CHAR_KEYS: &[(Key, char, char)] = &[
    (Key::KEY_A, 'a', 'A'),
    (Key::KEY_B, 'b', 'B'),
    (Key::KEY_C, 'c', 'C'),
    (Key::KEY_D, 'd', 'D'),
    (Key::KEY_E, 'e', 'E'),
    (Key::KEY_F, 'f', 'F'),
    (Key::KEY_G, 'g', 'G'),
    (Key::KEY_H, 'h', 'H'),
    (Key::KEY_I, 'i', 'I'),
    (Key::KEY_J, 'j', 'J'),
    (Key::KEY_K, 'k', 'K'),
    (Key::KEY_L, 'l', 'L'),
    (Key::KEY_M, 'm', 'M'),
    (Key::KEY_N, 'n', 'N'),
    (Key::KEY_O, 'o', 'O'),
    (Key::KEY_P, 'p', 'P'),
    (Key::KEY_Q, 'q', 'Q'),
    (Key::KEY_R, 'r', 'R'),
    (Key::KEY_S, 's', 'S'),
    (Key::KEY_T, 't', 'T'),
    (Key::KEY_U, 'u', 'U'),
    (Key::KEY_V, 'v', 'V'),
    (Key::KEY_W, 'w', 'W'),
    (Key::KEY_X, 'x', 'X'),
    (Key::KEY_Y, 'y', 'Y'),
    (Key::KEY_Z, 'z', 'Z'),
    (Key::KEY_1, '1', '!'),
    (Key::KEY_2, '2', '@'),
    (Key::KEY_3, '3', '#'),
    (Key::KEY_4, '4', '$'),
    (Key::KEY_5, '5', '%'),
    (Key::KEY_6, '6', '^'),
    (Key::KEY_7, '7', '&'),
    (Key::KEY_8, '8', '*'),
    (Key::KEY_9, '9', '('),
    (Key::KEY_0, '0', ')'),
    (Key::KEY_MINUS, '-', '_'),
    (Key::KEY_EQUAL, '=', '+'),
    (Key::KEY_DOT, '.', '>'),
    (Key::KEY_COMMA, ',', '<'),
    (Key::KEY_SLASH, '/', '?'),
    (Key::KEY_SEMICOLON, ';', ':'),
    (Key::KEY_SPACE, ' ', ' '),
    (Key::KEY_KP0, '0', '0'),
    (Key::KEY_KP1, '1', '1'),
    (Key::KEY_KP2, '2', '2'),
    (Key::KEY_KP3, '3', '3'),
    (Key::KEY_KP4, '4', '4'),
    (Key::KEY_KP5, '5', '5'),
    (Key::KEY_KP6, '6', '6'),
    (Key::KEY_KP7, '7', '7'),
    (Key::KEY_KP8, '8', '8'),
    (Key::KEY_KP9, '9', '9'),
    (Key::KEY_KPMINUS, '-', '-'),
];

/// Modifier state tracked per device
#[derive(Debug, Default, Clone, Copy)]
struct Modifiers {
    left_shift: bool,
    right_shift: bool,
    caps_lock: bool,
}

impl Modifiers {
    fn shift(&self) -> bool {
        self.left_shift || self.right_shift
    }

    /// Update modifier state; returns true if the key was a modifier
    fn update(&mut self, key: Key, value: i32) -> bool {
        if key == Key::KEY_LEFTSHIFT {
            self.left_shift = value != 0;
        } else if key == Key::KEY_RIGHTSHIFT {
            self.right_shift = value != 0;
        } else if key == Key::KEY_CAPSLOCK {
            if value == 1 {
                self.caps_lock = !self.caps_lock;
            }
        } else {
            return false;
        }
        true
    }
}

/// Translate a key press into decoder input
fn translate_key(key: Key, modifiers: &Modifiers) -> KeyInput {
    if key == Key::KEY_ENTER || key == Key::KEY_KPENTER {
        return KeyInput::Enter;
    }
    if key == Key::KEY_TAB {
        return KeyInput::Tab;
    }

    match CHAR_KEYS.iter().find(|(k, _, _)| *k == key) {
        Some(&(_, lower, upper)) => {
            let shifted = if lower.is_ascii_alphabetic() {
                modifiers.shift() != modifiers.caps_lock
            } else {
                modifiers.shift()
            };
            KeyInput::Char(if shifted { upper } else { lower })
        }
        None => KeyInput::Other,
    }
}

/// Whether a device name matches the configured scanner filters
fn is_scanner(name: &str, filters: &[String]) -> bool {
    if filters.is_empty() {
        return true;
    }
    let name = name.to_lowercase();
    filters
        .iter()
        .any(|f| !f.trim().is_empty() && name.contains(&f.trim().to_lowercase()))
}

/// A keyboard device and the role it plays
#[derive(Debug, Clone)]
struct InputDevice {
    path: PathBuf,
    target: KeyTarget,
}

/// evdev-based scanner key source
pub struct EvdevSource {
    /// Keyboards to read, tagged scanner or ordinary
    devices: Vec<InputDevice>,
    /// Grab scanner devices exclusively
    grab: bool,
    /// Signal to stop the listener task
    stop_signal: Option<oneshot::Sender<()>>,
}

impl EvdevSource {
    /// Create a new evdev source for the configured scanners
    pub fn new(config: &ScannerConfig) -> Result<Self, ScannerError> {
        let keyboards = find_keyboard_devices()?;

        if keyboards.is_empty() {
            return Err(ScannerError::NoKeyboard);
        }

        let devices: Vec<InputDevice> = keyboards
            .into_iter()
            .map(|(path, name)| {
                let target = if is_scanner(&name, &config.devices) {
                    KeyTarget::Scanner
                } else {
                    KeyTarget::Editable
                };
                tracing::debug!("Keyboard {:?} ({}) -> {:?}", path, name, target);
                InputDevice { path, target }
            })
            .collect();

        if !devices.iter().any(|d| d.target == KeyTarget::Scanner) {
            return Err(ScannerError::NoScanner(config.devices.clone()));
        }

        tracing::debug!(
            "Found {} keyboard device(s), {} scanner(s)",
            devices.len(),
            devices
                .iter()
                .filter(|d| d.target == KeyTarget::Scanner)
                .count()
        );

        Ok(Self {
            devices,
            grab: config.grab,
            stop_signal: None,
        })
    }
}

#[async_trait::async_trait]
impl KeySource for EvdevSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<KeyEvent>, ScannerError> {
        let (tx, rx) = mpsc::channel(256);
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_signal = Some(stop_tx);

        let devices = self.devices.clone();
        let grab = self.grab;

        // Spawn the listener task
        tokio::task::spawn_blocking(move || {
            evdev_listener_loop(devices, grab, tx, stop_rx);
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), ScannerError> {
        if let Some(stop) = self.stop_signal.take() {
            let _ = stop.send(());
        }
        Ok(())
    }
}

impl Drop for EvdevSource {
    fn drop(&mut self) {
        if let Some(stop) = self.stop_signal.take() {
            let _ = stop.send(());
        }
    }
}

/// Main listener loop running in a blocking task
fn evdev_listener_loop(
    device_list: Vec<InputDevice>,
    grab: bool,
    tx: mpsc::Sender<KeyEvent>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    // Open all keyboard devices in non-blocking mode
    let mut devices: Vec<(Device, KeyTarget, Modifiers)> = device_list
        .iter()
        .filter_map(|input| match Device::open(&input.path) {
            Ok(mut device) => {
                // Set device to non-blocking mode so fetch_events doesn't block
                let fd = device.as_raw_fd();
                unsafe {
                    let flags = libc::fcntl(fd, libc::F_GETFL);
                    if flags != -1 {
                        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                    }
                }
                if grab && input.target == KeyTarget::Scanner {
                    match device.grab() {
                        Ok(()) => tracing::debug!("Grabbed scanner {:?}", input.path),
                        Err(e) => tracing::warn!("Failed to grab {:?}: {}", input.path, e),
                    }
                }
                tracing::debug!("Opened device (non-blocking): {:?}", input.path);
                Some((device, input.target, Modifiers::default()))
            }
            Err(e) => {
                tracing::warn!("Failed to open {:?}: {}", input.path, e);
                None
            }
        })
        .collect();

    if !devices.iter().any(|(_, target, _)| *target == KeyTarget::Scanner) {
        tracing::error!("No scanner devices could be opened");
        return;
    }

    tracing::info!("Listening for scanner input on {} device(s)", devices.len());

    loop {
        // Check for stop signal (non-blocking)
        match stop_rx.try_recv() {
            Ok(_) | Err(oneshot::error::TryRecvError::Closed) => {
                tracing::debug!("Scanner listener stopping");
                return;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
        }

        // Poll each device (all set to non-blocking mode)
        for (device, target, modifiers) in &mut devices {
            // fetch_events returns immediately if no events (non-blocking)
            if let Ok(events) = device.fetch_events() {
                for event in events {
                    if let InputEventKind::Key(key) = event.kind() {
                        let value = event.value();

                        if modifiers.update(key, value) {
                            continue;
                        }

                        // Only presses; releases (0) and repeats (2) carry no new input
                        if value != 1 {
                            continue;
                        }

                        let input = translate_key(key, modifiers);
                        if input == KeyInput::Other {
                            continue;
                        }

                        let pressed_at = super::instant_from_timestamp(
                            event.timestamp(),
                            SystemTime::now(),
                            Instant::now(),
                        );
                        let key_event = KeyEvent::new(input, *target).at(pressed_at);
                        if tx.blocking_send(key_event).is_err() {
                            return; // Channel closed
                        }
                    }
                }
            }
        }

        // Scanners type a character every few milliseconds; keep the poll short
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
}

/// What opening one /dev/input/event* node revealed
#[derive(Debug)]
enum DeviceCheck {
    Keyboard(String),
    NotKeyboard,
    Denied,
}

/// Keep the keyboards; unreadable nodes only matter if nothing else opened
fn collect_keyboards(
    checks: Vec<(PathBuf, DeviceCheck)>,
) -> Result<Vec<(PathBuf, String)>, ScannerError> {
    let mut keyboards = Vec::new();
    let mut denied = Vec::new();

    for (path, check) in checks {
        match check {
            DeviceCheck::Keyboard(name) => keyboards.push((path, name)),
            DeviceCheck::NotKeyboard => {}
            DeviceCheck::Denied => denied.push(path),
        }
    }

    if keyboards.is_empty() {
        if let Some(first) = denied.first() {
            return Err(ScannerError::DeviceAccess(first.display().to_string()));
        }
    } else if !denied.is_empty() {
        tracing::debug!("Skipped {} unreadable input device(s): {:?}", denied.len(), denied);
    }

    Ok(keyboards)
}

/// Open one event node and check whether it is a keyboard
fn check_device(path: &Path) -> DeviceCheck {
    match Device::open(path) {
        Ok(device) => {
            // Scanners report a full keyboard key set
            let has_keys = device
                .supported_keys()
                .map(|keys| {
                    keys.contains(Key::KEY_A)
                        && keys.contains(Key::KEY_Z)
                        && keys.contains(Key::KEY_ENTER)
                })
                .unwrap_or(false);

            if has_keys {
                let name = device.name().unwrap_or("unknown").to_string();
                tracing::debug!("Found keyboard: {:?} ({:?})", path, name);
                DeviceCheck::Keyboard(name)
            } else {
                DeviceCheck::NotKeyboard
            }
        }
        // Common for non-input-group users, or when udev opens up only the scanner
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => DeviceCheck::Denied,
        Err(e) => {
            tracing::trace!("Skipping {:?}: {}", path, e);
            DeviceCheck::NotKeyboard
        }
    }
}

/// Find all readable keyboard input devices, with their names
fn find_keyboard_devices() -> Result<Vec<(PathBuf, String)>, ScannerError> {
    let input_dir = std::fs::read_dir("/dev/input")
        .map_err(|e| ScannerError::DeviceAccess(format!("/dev/input: {}", e)))?;

    let mut checks = Vec::new();
    for entry in input_dir {
        let entry = entry.map_err(|e| ScannerError::DeviceAccess(e.to_string()))?;
        let path = entry.path();

        // Only look at event* devices
        let is_event_device = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false);

        if is_event_device {
            let check = check_device(&path);
            checks.push((path, check));
        }
    }

    collect_keyboards(checks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_letters_and_shift() {
        let plain = Modifiers::default();
        assert_eq!(translate_key(Key::KEY_A, &plain), KeyInput::Char('a'));

        let mut shifted = Modifiers::default();
        shifted.update(Key::KEY_LEFTSHIFT, 1);
        assert_eq!(translate_key(Key::KEY_A, &shifted), KeyInput::Char('A'));
        assert_eq!(translate_key(Key::KEY_MINUS, &shifted), KeyInput::Char('_'));
        assert_eq!(translate_key(Key::KEY_1, &shifted), KeyInput::Char('!'));

        shifted.update(Key::KEY_LEFTSHIFT, 0);
        assert!(!shifted.shift());
    }

    #[test]
    fn test_caps_lock_only_affects_letters() {
        let mut caps = Modifiers::default();
        caps.update(Key::KEY_CAPSLOCK, 1);
        caps.update(Key::KEY_CAPSLOCK, 0);
        assert_eq!(translate_key(Key::KEY_Q, &caps), KeyInput::Char('Q'));
        assert_eq!(translate_key(Key::KEY_7, &caps), KeyInput::Char('7'));

        caps.update(Key::KEY_RIGHTSHIFT, 1);
        assert_eq!(translate_key(Key::KEY_Q, &caps), KeyInput::Char('q'));
    }

    #[test]
    fn test_translate_named_keys() {
        let m = Modifiers::default();
        assert_eq!(translate_key(Key::KEY_ENTER, &m), KeyInput::Enter);
        assert_eq!(translate_key(Key::KEY_KPENTER, &m), KeyInput::Enter);
        assert_eq!(translate_key(Key::KEY_TAB, &m), KeyInput::Tab);
        assert_eq!(translate_key(Key::KEY_KP4, &m), KeyInput::Char('4'));
        assert_eq!(translate_key(Key::KEY_F5, &m), KeyInput::Other);
    }

    #[test]
    fn test_scanner_name_matching() {
        assert!(is_scanner("AT Translated Set 2 keyboard", &[]));

        let filters = vec!["honeywell".to_string(), " Zebra ".to_string()];
        assert!(is_scanner("Honeywell Imaging 1900g", &filters));
        assert!(is_scanner("ZEBRA DS2208", &filters));
        assert!(!is_scanner("Logitech USB Keyboard", &filters));

        // Blank filters never match everything
        assert!(!is_scanner("Logitech USB Keyboard", &["  ".to_string()]));
    }

    #[test]
    fn test_unreadable_devices_are_skipped() {
        let checks = vec![
            (PathBuf::from("/dev/input/event0"), DeviceCheck::Denied),
            (PathBuf::from("/dev/input/event3"), DeviceCheck::NotKeyboard),
            (
                PathBuf::from("/dev/input/event7"),
                DeviceCheck::Keyboard("Zebra DS2208".into()),
            ),
        ];
        let keyboards = collect_keyboards(checks).unwrap();
        assert_eq!(
            keyboards,
            vec![(PathBuf::from("/dev/input/event7"), "Zebra DS2208".to_string())]
        );
    }

    #[test]
    fn test_access_error_only_when_nothing_opened() {
        let checks = vec![
            (PathBuf::from("/dev/input/event0"), DeviceCheck::Denied),
            (PathBuf::from("/dev/input/event1"), DeviceCheck::NotKeyboard),
        ];
        match collect_keyboards(checks) {
            Err(ScannerError::DeviceAccess(path)) => assert_eq!(path, "/dev/input/event0"),
            other => panic!("expected DeviceAccess, got {:?}", other),
        }

        // No keyboards and nothing denied is not an access problem
        let checks = vec![(PathBuf::from("/dev/input/event1"), DeviceCheck::NotKeyboard)];
        assert!(collect_keyboards(checks).unwrap().is_empty());
    }
}
