//! Active shipment selection
//!
//! The shipment scans are recorded against is chosen with
//! `barcodeverify shipment select` and kept in the runtime directory so a
//! running daemon can pick it up. After writing the file the CLI sends
//! SIGUSR1 to the daemon (found through its PID file) to reload it.

use crate::config::Config;
use crate::error::BarcodeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The shipment scans are being recorded against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRef {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipment_number: Option<String>,
}

impl ShipmentRef {
    pub fn new(id: i64, shipment_number: Option<String>) -> Self {
        Self {
            id,
            shipment_number,
        }
    }
}

impl std::fmt::Display for ShipmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.shipment_number {
            Some(ref number) => write!(f, "{} (#{})", number, self.id),
            None => write!(f, "#{}", self.id),
        }
    }
}

/// Path of the selection file
pub fn selection_path() -> PathBuf {
    Config::runtime_dir().join("shipment")
}

/// Path of the daemon PID file
pub fn pid_path() -> PathBuf {
    Config::runtime_dir().join("pid")
}

/// Read the current selection; a missing or unreadable file means none
pub fn load(path: &Path) -> Option<ShipmentRef> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(selection) => Some(selection),
        Err(e) => {
            tracing::warn!("Ignoring invalid shipment selection {:?}: {}", path, e);
            None
        }
    }
}

pub fn save(path: &Path, shipment: &ShipmentRef) -> Result<(), BarcodeError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(shipment)
        .map_err(|e| BarcodeError::Config(format!("Failed to encode selection: {}", e)))?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn clear(path: &Path) -> Result<(), BarcodeError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Ask a running daemon to reload the selection
///
/// Returns false if no daemon is running.
#[cfg(target_os = "linux")]
pub fn notify_daemon() -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let pid = match std::fs::read_to_string(pid_path())
        .ok()
        .and_then(|s| s.trim().parse::<i32>().ok())
    {
        Some(pid) => pid,
        None => return false,
    };

    match kill(Pid::from_raw(pid), Signal::SIGUSR1) {
        Ok(()) => {
            tracing::debug!("Sent SIGUSR1 to daemon (pid={})", pid);
            true
        }
        Err(e) => {
            tracing::debug!("Daemon pid {} not reachable: {}", pid, e);
            false
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn notify_daemon() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub/shipment");
        assert!(load(&path).is_none());

        let shipment = ShipmentRef::new(42, Some("ENV-2024-042".into()));
        save(&path, &shipment).unwrap();
        assert_eq!(load(&path), Some(shipment));

        clear(&path).unwrap();
        assert!(load(&path).is_none());
        // Clearing twice is fine
        clear(&path).unwrap();
    }

    #[test]
    fn test_invalid_selection_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shipment");
        std::fs::write(&path, "not json").unwrap();
        assert!(load(&path).is_none());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&ShipmentRef::new(3, Some("A-1".into()))).unwrap();
        assert_eq!(json, r#"{"id":3,"shipmentNumber":"A-1"}"#);
        let bare: ShipmentRef = serde_json::from_str(r#"{"id":9}"#).unwrap();
        assert_eq!(bare, ShipmentRef::new(9, None));
    }

    #[test]
    fn test_display() {
        assert_eq!(ShipmentRef::new(3, None).to_string(), "#3");
        assert_eq!(
            ShipmentRef::new(3, Some("A-1".into())).to_string(),
            "A-1 (#3)"
        );
    }
}
