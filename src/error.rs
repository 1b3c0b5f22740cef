//! Error types for barcodeverify
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use thiserror::Error;

/// Top-level error type for the barcodeverify application
#[derive(Error, Debug)]
pub enum BarcodeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scanner error: {0}")]
    Scanner(#[from] ScannerError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Credential store error: {0}")]
    Credentials(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to capturing scanner keystrokes
#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("Cannot open input device '{0}'. Is the user in the 'input' group?\n  Run: sudo usermod -aG input $USER\n  Then log out and back in.")]
    DeviceAccess(String),

    #[error("Unknown key name: '{0}'. Use evtest to find valid key names.")]
    UnknownKey(String),

    #[error("No keyboard device found in /dev/input/")]
    NoKeyboard,

    #[error("No input device matches {0:?}. Check [scanner] devices in config.toml (evtest lists device names).")]
    NoScanner(Vec<String>),

    #[error("evdev error: {0}")]
    Evdev(String),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

/// Errors returned by the shipment API client
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not logged in. Run 'barcodeverify login' first.")]
    NotLoggedIn,

    #[error("Administrator role required for this command")]
    AdminRequired,

    #[error("Bad request (400): {0}")]
    BadRequest(String),

    #[error("Unauthorized (401)")]
    Unauthorized,

    #[error("Forbidden (403)")]
    Forbidden,

    #[error("Not found (404): {0}")]
    NotFound(String),

    #[error("Conflict (409): {0}")]
    Conflict(String),

    #[error("Unprocessable entity (422): {0}")]
    Unprocessable(String),

    #[error("Internal server error (500)")]
    Server,

    #[error("Server returned {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map an HTTP status and the server's message (possibly empty) to an error
    pub fn from_status(code: u16, message: String) -> Self {
        match code {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            422 => ApiError::Unprocessable(message),
            500 => ApiError::Server,
            _ => ApiError::Status { code, message },
        }
    }

    /// Short message suitable for a notification or terminal banner
    pub fn user_message(&self) -> String {
        fn or(message: &str, fallback: &str) -> String {
            if message.trim().is_empty() {
                fallback.to_string()
            } else {
                message.to_string()
            }
        }

        match self {
            ApiError::NotLoggedIn => "Not logged in. Please log in first.".to_string(),
            ApiError::AdminRequired => "Administrator role required".to_string(),
            ApiError::BadRequest(m) => or(m, "Invalid data"),
            ApiError::Unauthorized => "Not authorized. Please log in again.".to_string(),
            ApiError::Forbidden => "You do not have permission to perform this action".to_string(),
            ApiError::NotFound(_) => "Resource not found".to_string(),
            ApiError::Conflict(m) => or(m, "Data conflict"),
            ApiError::Unprocessable(m) => or(m, "Invalid input data"),
            ApiError::Server => "Internal server error".to_string(),
            ApiError::Status { code, message } => or(message, &format!("Error {}", code)),
            ApiError::Network(_) => {
                "Could not connect to the server. Check your internet connection.".to_string()
            }
            ApiError::Decode(m) => or(m, "Unknown error"),
        }
    }

    /// Whether the stored session should be discarded
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Result type alias using BarcodeError
pub type Result<T> = std::result::Result<T, BarcodeError>;

impl From<std::io::Error> for ScannerError {
    fn from(e: std::io::Error) -> Self {
        ScannerError::Evdev(e.to_string())
    }
}
