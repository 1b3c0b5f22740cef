//! Desktop notifications
//!
//! The scanning station's equivalent of a toast: a short-lived popup via
//! notify-send (libnotify). Notifications are best-effort; failures are
//! logged and never reach the caller.

use std::process::Stdio;
use tokio::process::Command;

/// How long a notice stays on screen
const EXPIRE_MS: u32 = 2500;

/// Kind of notice, mapped to a notification urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Warning,
    Error,
}

impl NoticeKind {
    pub fn urgency(self) -> &'static str {
        match self {
            NoticeKind::Success | NoticeKind::Info => "low",
            NoticeKind::Warning => "normal",
            NoticeKind::Error => "critical",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            NoticeKind::Success => "emblem-ok-symbolic",
            NoticeKind::Info => "dialog-information",
            NoticeKind::Warning => "dialog-warning",
            NoticeKind::Error => "dialog-error",
        }
    }
}

/// Arguments passed to notify-send
fn notify_args(kind: NoticeKind, title: &str, body: &str) -> Vec<String> {
    vec![
        "--app-name=BarcodeVerify".to_string(),
        format!("--expire-time={}", EXPIRE_MS),
        format!("--urgency={}", kind.urgency()),
        format!("--icon={}", kind.icon()),
        title.to_string(),
        body.to_string(),
    ]
}

/// Send a desktop notification.
pub async fn send(kind: NoticeKind, title: &str, body: &str) {
    #[cfg(target_os = "linux")]
    {
        let result = Command::new("notify-send")
            .args(notify_args(kind, title, body))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        if let Err(e) = result {
            tracing::debug!("Failed to send notification: {}", e);
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        tracing::debug!("Notifications not supported on this platform");
        let _ = (kind, title, body);
    }
}

/// Send a notification in the background; the caller never waits on notify-send
pub fn spawn(kind: NoticeKind, title: impl Into<String>, body: impl Into<String>) {
    let title = title.into();
    let body = body.into();
    tokio::spawn(async move {
        send(kind, &title, &body).await;
    });
}
