//! BarcodeVerify: USB barcode scanner daemon for shipment verification
//!
//! This library provides the core functionality for:
//! - Reading scanner keystrokes via evdev (kernel-level, any display server)
//! - Telling scanner bursts apart from human typing by timing
//! - Suppressing double-reads of the same label
//! - Recording accepted scans against the active shipment over HTTP
//! - Audio and desktop-notification feedback for every outcome
//!
//! # Architecture
//!
//! ```text
//!                            ┌─────────────────────────────────────┐
//!                            │              Daemon                 │
//!                            └─────────────────────────────────────┘
//!                                            │
//!                   ┌────────────────────────┼────────────────────────┐
//!                   │                        │                        │
//!                   ▼                        ▼                        ▼
//!          ┌──────────────┐         ┌──────────────┐         ┌──────────────┐
//!          │   Scanner    │         │ Manual entry │         │  Selection   │
//!          │   (evdev)    │         │   (stdin)    │         │  (SIGUSR1)   │
//!          └──────────────┘         └──────────────┘         └──────────────┘
//!                   │                        │                        │
//!                   │ key events             │ lines                  │ shipment
//!                   ▼                        ▼                        ▼
//!          ┌─────────────────────────────────────────────────────────────────┐
//!          │                         Scan Session                            │
//!          │   KeystrokeDecoder ──▶ clean ──▶ shipment check ──▶ DedupeGuard │
//!          └─────────────────────────────────────────────────────────────────┘
//!                                            │
//!                                            ▼ ScanOutcome
//!                   ┌────────────────────────┼────────────────────────┐
//!                   ▼                        ▼                        ▼
//!          ┌──────────────┐         ┌──────────────┐         ┌──────────────┐
//!          │   Feedback   │         │ Notification │         │   Reporter   │
//!          │   (rodio)    │         │ (notify-send)│         │ (ureq / API) │
//!          └──────────────┘         └──────────────┘         └──────────────┘
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod daemon;
pub mod decoder;
pub mod error;
pub mod feedback;
pub mod format;
pub mod notification;
pub mod report;
pub mod scanner;
pub mod selection;
pub mod session;
pub mod state;

pub use api::ApiClient;
pub use cli::{Cli, Commands, ShipmentAction, TransportAction, UsersAction};
pub use config::Config;
pub use daemon::Daemon;
pub use decoder::{DedupeGuard, KeystrokeDecoder};
pub use error::{ApiError, BarcodeError, Result, ScannerError};
pub use session::{Scan, ScanOutcome, ScanSession};
