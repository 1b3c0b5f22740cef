//! Configuration loading and types for barcodeverify
//!
//! Configuration is loaded in layers:
//! 1. Built-in defaults
//! 2. Config file (~/.config/barcodeverify/config.toml)
//! 3. Environment variables (BARCODEVERIFY_*)
//! 4. CLI arguments (highest priority)

use crate::error::BarcodeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = r#"# BarcodeVerify Configuration
#
# Location: ~/.config/barcodeverify/config.toml
# All settings can be overridden via CLI flags

# State file for external integrations (Waybar, polybar, etc.)
# Use "auto" for default location ($XDG_RUNTIME_DIR/barcodeverify/state),
# a custom path, or "disabled" to turn off. The daemon writes the scanner
# state ("idle", "accumulating") to this file whenever it changes.
state_file = "auto"

[scanner]
# Enable the built-in USB scanner listener (default: true)
# Set to false to only accept manual entry
# enabled = true

# Input devices that are barcode scanners, matched as case-insensitive
# substrings of the device name (evtest lists names).
# Empty list: every keyboard is treated as a scanner.
# Keystrokes from other keyboards are ignored by the decoder.
devices = []

# Grab scanner devices exclusively so scanned characters do not reach
# the focused application
grab = false

# Minimum barcode length; shorter bursts are discarded as noise
min_length = 4

# Flush the buffer when no key arrives for this long (milliseconds)
inter_key_timeout_ms = 100

# Ignore the same barcode scanned again within this window (milliseconds)
cooldown_ms = 2000

# Key that terminates a scan (most scanners send Enter)
terminator = "ENTER"

# Read manually typed barcodes from standard input, one per line
manual_input = false

[api]
# Shipment tracking backend
base_url = "https://barcodeverify-backend.onrender.com"

# Request timeout in seconds
timeout_secs = 10

[feedback]
# Beep on accepted / duplicate / rejected scans
enabled = true

# Sound theme: "default", "subtle", "mechanical", or path to custom theme directory
# (accepted.wav, duplicate.wav, rejected.wav, error.wav)
theme = "default"

# Volume level (0.0 to 1.0)
volume = 0.3

[notification]
# Desktop notification for every accepted scan
on_scan = true

# Notify when a scan is ignored as a double-read
on_duplicate = true

# Notify when a scan is rejected or fails to reach the server
on_error = true
"#;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub feedback: FeedbackConfig,

    #[serde(default)]
    pub notification: NotificationConfig,

    /// Optional path to state file for external integrations (e.g., Waybar)
    /// Example: "/run/user/1000/barcodeverify/state" or use "auto" for default location
    #[serde(default)]
    pub state_file: Option<String>,
}

/// Keystroke capture and decoding configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerConfig {
    /// Enable the evdev scanner listener
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Device name substrings identifying scanners (empty = all keyboards)
    #[serde(default)]
    pub devices: Vec<String>,

    /// Exclusively grab scanner devices
    #[serde(default)]
    pub grab: bool,

    /// Minimum accepted barcode length
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Idle time after the last key before the buffer is flushed
    #[serde(default = "default_inter_key_timeout_ms")]
    pub inter_key_timeout_ms: u64,

    /// Window in which an identical barcode is treated as a double-read
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Terminator key name (evdev KEY_* name, without the KEY_ prefix)
    #[serde(default = "default_terminator")]
    pub terminator: String,

    /// Accept manual entry on stdin
    #[serde(default)]
    pub manual_input: bool,
}

impl ScannerConfig {
    pub fn inter_key_timeout(&self) -> Duration {
        Duration::from_millis(self.inter_key_timeout_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Audio feedback configuration for sound cues
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Sound theme: "default", "subtle", "mechanical", or path to custom theme directory
    #[serde(default = "default_sound_theme")]
    pub theme: String,

    /// Volume level (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

/// Notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub on_scan: bool,

    #[serde(default = "default_true")]
    pub on_duplicate: bool,

    #[serde(default = "default_true")]
    pub on_error: bool,
}

fn default_true() -> bool {
    true
}

fn default_min_length() -> usize {
    4
}

fn default_inter_key_timeout_ms() -> u64 {
    100
}

fn default_cooldown_ms() -> u64 {
    2000
}

fn default_terminator() -> String {
    "ENTER".to_string()
}

fn default_base_url() -> String {
    "https://barcodeverify-backend.onrender.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_sound_theme() -> String {
    "default".to_string()
}

fn default_volume() -> f32 {
    0.3
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            devices: vec![],
            grab: false,
            min_length: default_min_length(),
            inter_key_timeout_ms: default_inter_key_timeout_ms(),
            cooldown_ms: default_cooldown_ms(),
            terminator: default_terminator(),
            manual_input: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: default_sound_theme(),
            volume: default_volume(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            on_scan: true,
            on_duplicate: true,
            on_error: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scanner: ScannerConfig::default(),
            api: ApiConfig::default(),
            feedback: FeedbackConfig::default(),
            notification: NotificationConfig::default(),
            state_file: Some("auto".to_string()),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "barcodeverify")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get the runtime directory for ephemeral files (state, pid, selection)
    pub fn runtime_dir() -> PathBuf {
        // Use XDG_RUNTIME_DIR if available, otherwise fall back to /tmp
        std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("barcodeverify")
    }

    /// Resolve the state file path from config
    /// Returns None if state_file is not configured or explicitly disabled
    pub fn resolve_state_file(&self) -> Option<PathBuf> {
        self.state_file.as_ref().and_then(|path| {
            match path.to_lowercase().as_str() {
                "disabled" | "none" | "off" | "false" => None,
                "auto" => Some(Self::runtime_dir().join("state")),
                _ => Some(PathBuf::from(path)),
            }
        })
    }

    /// Get the data directory path (credential store)
    pub fn data_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "barcodeverify")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Reject values the decoder or API client cannot work with
    pub fn validate(&self) -> Result<(), BarcodeError> {
        if self.scanner.min_length == 0 {
            return Err(BarcodeError::Config(
                "scanner.min_length must be at least 1".into(),
            ));
        }
        if self.scanner.inter_key_timeout_ms == 0 {
            return Err(BarcodeError::Config(
                "scanner.inter_key_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(BarcodeError::Config(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.feedback.volume) {
            return Err(BarcodeError::Config(format!(
                "feedback.volume must be between 0.0 and 1.0, got {}",
                self.feedback.volume
            )));
        }
        let url = self.api.base_url.as_str();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(BarcodeError::Config(format!(
                "api.base_url must start with http:// or https://, got: {}",
                url
            )));
        }
        Ok(())
    }
}

/// Load configuration from file, with defaults for missing values
pub fn load_config(path: Option<&Path>) -> Result<Config, BarcodeError> {
    // Start with defaults
    let mut config = Config::default();

    // Determine config file path
    let config_path = path.map(PathBuf::from).or_else(Config::default_path);

    // Load from file if it exists
    if let Some(ref path) = config_path {
        if path.exists() {
            tracing::debug!("Loading config from {:?}", path);
            let contents = std::fs::read_to_string(path)
                .map_err(|e| BarcodeError::Config(format!("Failed to read config: {}", e)))?;

            config = toml::from_str(&contents)
                .map_err(|e| BarcodeError::Config(format!("Invalid config: {}", e)))?;
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
        }
    }

    // Override from environment variables
    if let Ok(url) = std::env::var("BARCODEVERIFY_API_URL") {
        config.api.base_url = url;
    }
    if let Ok(device) = std::env::var("BARCODEVERIFY_SCANNER_DEVICE") {
        config.scanner.devices = vec![device];
    }
    if let Ok(min) = std::env::var("BARCODEVERIFY_MIN_LENGTH") {
        config.scanner.min_length = min.parse().map_err(|_| {
            BarcodeError::Config(format!("BARCODEVERIFY_MIN_LENGTH is not a number: {}", min))
        })?;
    }

    Ok(config)
}

/// Write the documented default config if no config file exists yet
pub fn write_default_config(path: &Path) -> Result<bool, BarcodeError> {
    if path.exists() {
        return Ok(false);
    }

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| BarcodeError::Config(format!("Failed to create config dir: {}", e)))?;
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| BarcodeError::Config(format!("Failed to write config: {}", e)))?;

    Ok(true)
}
