//! Stored login session
//!
//! The token and user profile returned by a successful login are kept in
//! `credentials.json` in the data directory, readable only by the owner.
//! Any 401 from the server removes the file so the next command asks for a
//! fresh login.

use crate::api::models::User;
use crate::config::Config;
use crate::error::BarcodeError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub user: User,
}

impl Credentials {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// File-backed credential store
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the default data directory
    pub fn default_location() -> Self {
        Self::new(Config::data_dir().join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, if any
    ///
    /// A missing file is not an error; a corrupt one is.
    pub fn load(&self) -> Result<Option<Credentials>, BarcodeError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let credentials: Credentials = serde_json::from_str(&contents).map_err(|e| {
            BarcodeError::Credentials(format!(
                "{} is corrupt ({}). Run 'barcodeverify logout' and log in again.",
                self.path.display(),
                e
            ))
        })?;

        if credentials.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(credentials))
    }

    pub fn save(&self, credentials: &Credentials) -> Result<(), BarcodeError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(credentials)
            .map_err(|e| BarcodeError::Credentials(format!("Failed to encode: {}", e)))?;
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            // mode() only applies when the file is created
            options.mode(0o600);
            if self.path.exists() {
                std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
            }
        }
        let mut file = options.open(&self.path)?;
        file.write_all(json.as_bytes())?;

        tracing::debug!("Saved credentials to {:?}", self.path);
        Ok(())
    }

    /// Remove the stored session; returns whether one existed
    pub fn clear(&self) -> Result<bool, BarcodeError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Removed credentials {:?}", self.path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
