//! Daemon module - main event loop orchestration
//!
//! Feeds scanner key events and manual entries through the scan session,
//! plays feedback for each outcome and hands accepted scans to the
//! reporter without waiting for it.

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::error::{ApiError, BarcodeError, Result};
use crate::feedback::{AudioFeedback, SoundEvent};
use crate::notification::{self, NoticeKind};
use crate::report::{ScanReceipt, ScanReporter};
use crate::scanner::{self, KeyEvent};
use crate::selection::{self, ShipmentRef};
use crate::session::{Scan, ScanOutcome, ScanSession};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

/// Write state to file for external integrations (e.g., Waybar)
fn write_state_file(path: &Path, state: &str) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Failed to create state file directory: {}", e);
            return;
        }
    }

    if let Err(e) = std::fs::write(path, state) {
        tracing::warn!("Failed to write state file: {}", e);
    } else {
        tracing::trace!("State file updated: {}", state);
    }
}

/// Remove a runtime file on shutdown
fn cleanup_file(path: &Path, what: &str) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("Failed to remove {} file: {}", what, e);
        }
    }
}

/// Write PID file so `shipment select` can signal us
fn write_pid_file() -> Option<PathBuf> {
    let pid_path = selection::pid_path();

    if let Some(parent) = pid_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Failed to create PID file directory: {}", e);
            return None;
        }
    }

    let pid = std::process::id();
    if let Err(e) = std::fs::write(&pid_path, pid.to_string()) {
        tracing::warn!("Failed to write PID file: {}", e);
        return None;
    }

    tracing::debug!("PID file written: {:?} (pid={})", pid_path, pid);
    Some(pid_path)
}

/// Read manual entries from stdin, one barcode per line
fn spawn_manual_input() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::debug!("Manual input closed");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Failed to read manual input: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

/// A finished report task
struct ReportDone {
    scan: Scan,
    result: std::result::Result<ScanReceipt, ApiError>,
}

/// Shown once the server has rejected the stored token
const SIGNED_OUT_HINT: &str = "Run 'barcodeverify login', then restart the daemon";

/// Main daemon that orchestrates all components
pub struct Daemon {
    config: Config,
    reporter: Arc<dyn ScanReporter>,
    credentials: Option<CredentialStore>,
    shipment_override: Option<ShipmentRef>,
    state_file_path: Option<PathBuf>,
    pid_file_path: Option<PathBuf>,
    audio_feedback: Option<AudioFeedback>,
    /// Set after a 401; the token is gone and further reports would fail
    signed_out: bool,
}

impl Daemon {
    /// Create a new daemon with the given configuration and scan consumer
    pub fn new(config: Config, reporter: Arc<dyn ScanReporter>) -> Self {
        let state_file_path = config.resolve_state_file();

        let audio_feedback = if config.feedback.enabled {
            match AudioFeedback::new(&config.feedback) {
                Ok(feedback) => {
                    tracing::info!(
                        "Audio feedback enabled (theme: {}, volume: {:.0}%)",
                        config.feedback.theme,
                        config.feedback.volume * 100.0
                    );
                    Some(feedback)
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize audio feedback: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            config,
            reporter,
            credentials: None,
            shipment_override: None,
            state_file_path,
            pid_file_path: None,
            audio_feedback,
            signed_out: false,
        }
    }

    /// Scan against this shipment instead of the stored selection
    pub fn with_shipment(mut self, shipment: Option<ShipmentRef>) -> Self {
        self.shipment_override = shipment;
        self
    }

    /// Session to discard when the server rejects the token
    pub fn with_credentials(mut self, store: CredentialStore) -> Self {
        self.credentials = Some(store);
        self
    }

    fn play_feedback(&self, event: SoundEvent) {
        if let Some(ref feedback) = self.audio_feedback {
            feedback.play(event);
        }
    }

    fn update_state(&self, state_name: &str) {
        if let Some(ref path) = self.state_file_path {
            write_state_file(path, state_name);
        }
    }

    fn notify(&self, enabled: bool, kind: NoticeKind, title: &str, body: impl Into<String>) {
        if enabled {
            notification::spawn(kind, title, body);
        }
    }

    /// Feed one key, dated by its press time when the source recorded one
    fn on_key(
        &self,
        session: &mut ScanSession,
        event: &KeyEvent,
        report_tx: &mpsc::Sender<ReportDone>,
    ) {
        let now = event.time_or(Instant::now());
        if let Some(outcome) = session.handle_key(event, now) {
            self.handle_outcome(outcome, report_tx);
        }
    }

    /// The inter-key timer fired
    ///
    /// Keys already queued were pressed before `now`, so they are fed first;
    /// otherwise a stalled loop would cut one label in two.
    fn on_deadline(
        &self,
        session: &mut ScanSession,
        pending: Option<&mut mpsc::Receiver<KeyEvent>>,
        now: Instant,
        report_tx: &mpsc::Sender<ReportDone>,
    ) {
        if let Some(rx) = pending {
            while let Ok(event) = rx.try_recv() {
                self.on_key(session, &event, report_tx);
            }
        }
        if let Some(outcome) = session.handle_timeout(now) {
            self.handle_outcome(outcome, report_tx);
        }
    }

    fn on_manual(
        &self,
        session: &mut ScanSession,
        line: &str,
        report_tx: &mpsc::Sender<ReportDone>,
    ) {
        if let Some(outcome) = session.submit_manual(line) {
            self.handle_outcome(outcome, report_tx);
        }
    }

    /// React to a decoded scan
    fn handle_outcome(&self, outcome: ScanOutcome, report_tx: &mpsc::Sender<ReportDone>) {
        let notify = &self.config.notification;

        match outcome {
            ScanOutcome::Accepted(scan) => {
                if self.signed_out {
                    tracing::warn!("Not recording {}: logged out", scan.barcode);
                    self.play_feedback(SoundEvent::Error);
                    self.notify(
                        notify.on_error,
                        NoticeKind::Error,
                        "Logged out",
                        SIGNED_OUT_HINT,
                    );
                    return;
                }

                tracing::info!(
                    "Scanned {} for shipment {}{}",
                    scan.barcode,
                    scan.shipment,
                    if scan.manual { " (manual)" } else { "" }
                );
                self.play_feedback(SoundEvent::Accepted);

                let reporter = Arc::clone(&self.reporter);
                let tx = report_tx.clone();
                tokio::spawn(async move {
                    let result = reporter.report(&scan).await;
                    let _ = tx.send(ReportDone { scan, result }).await;
                });
            }
            ScanOutcome::Duplicate(code) => {
                tracing::warn!("Duplicate scan ignored: {}", code);
                self.play_feedback(SoundEvent::Duplicate);
                self.notify(
                    notify.on_duplicate,
                    NoticeKind::Warning,
                    "Duplicate scan",
                    format!("{} was just scanned", code),
                );
            }
            ScanOutcome::NoActiveShipment(code) => {
                tracing::warn!("No shipment selected, scan {} not recorded", code);
                self.play_feedback(SoundEvent::Rejected);
                self.notify(
                    notify.on_error,
                    NoticeKind::Error,
                    "No shipment selected",
                    "Select a shipment first: barcodeverify shipment select <ID>",
                );
            }
            ScanOutcome::TooShort { len, min } => {
                tracing::warn!("Manual entry too short ({} < {})", len, min);
                self.play_feedback(SoundEvent::Rejected);
                self.notify(
                    notify.on_error,
                    NoticeKind::Warning,
                    "Barcode too short",
                    format!("At least {} characters required", min),
                );
            }
        }
    }

    /// React to a finished report
    fn handle_report(&mut self, done: ReportDone) {
        let notify = &self.config.notification;

        match done.result {
            Ok(receipt) => {
                let label = receipt
                    .product_name
                    .unwrap_or_else(|| done.scan.barcode.clone());
                tracing::info!(
                    "Recorded {} on shipment {} via {}",
                    done.scan.barcode,
                    done.scan.shipment,
                    self.reporter.name()
                );
                self.notify(
                    notify.on_scan,
                    NoticeKind::Success,
                    "Scanned",
                    format!("{} added to {}", label, done.scan.shipment),
                );
            }
            Err(e) if e.is_unauthorized() => {
                tracing::error!(
                    "Server rejected the session while recording {}; no further scans will be reported",
                    done.scan.barcode
                );
                self.play_feedback(SoundEvent::Error);

                if let Some(ref store) = self.credentials {
                    if let Err(e) = store.clear() {
                        tracing::warn!("Failed to clear credentials: {}", e);
                    }
                }

                if !self.signed_out {
                    self.notify(
                        notify.on_error,
                        NoticeKind::Error,
                        "Session expired",
                        SIGNED_OUT_HINT,
                    );
                }
                self.signed_out = true;
            }
            Err(e) => {
                tracing::error!("Failed to record {}: {}", done.scan.barcode, e);
                self.play_feedback(SoundEvent::Error);
                self.notify(
                    notify.on_error,
                    NoticeKind::Error,
                    "Scan failed",
                    format!("{}: {}", done.scan.barcode, e.user_message()),
                );
            }
        }
    }

    /// Reload the active shipment after `shipment select` / `shipment clear`
    fn reload_selection(&self, session: &mut ScanSession) {
        match selection::load(&selection::selection_path()) {
            Some(shipment) => {
                if session.shipment() != Some(&shipment) {
                    tracing::info!("Active shipment: {}", shipment);
                    self.notify(
                        self.config.notification.on_scan,
                        NoticeKind::Info,
                        "Shipment selected",
                        format!("Scanning into {}", shipment),
                    );
                }
                session.set_shipment(shipment);
            }
            None => {
                if session.shipment().is_some() {
                    tracing::info!("Active shipment cleared");
                }
                session.clear_shipment();
            }
        }
    }

    /// Run the daemon main loop
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Starting barcodeverify daemon");

        self.pid_file_path = write_pid_file();

        // Set up signal handlers
        let mut sigusr1 = signal(SignalKind::user_defined1()).map_err(|e| {
            BarcodeError::Config(format!("Failed to set up SIGUSR1 handler: {}", e))
        })?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            BarcodeError::Config(format!("Failed to set up SIGTERM handler: {}", e))
        })?;

        if let Some(ref path) = self.state_file_path {
            tracing::info!("State file: {:?}", path);
        }

        let mut session = ScanSession::new(&self.config.scanner)?;
        match self.shipment_override.clone() {
            Some(shipment) => session.set_shipment(shipment),
            None => self.reload_selection(&mut session),
        }
        match session.shipment() {
            Some(shipment) => tracing::info!("Scanning into shipment {}", shipment),
            None => tracing::warn!(
                "No shipment selected; scans will be rejected until 'barcodeverify shipment select'"
            ),
        }

        // Initialize scanner capture (if enabled)
        let mut source = if self.config.scanner.enabled {
            Some(scanner::create_source(&self.config.scanner)?)
        } else {
            tracing::info!("Scanner capture disabled");
            None
        };

        let mut key_rx: Option<mpsc::Receiver<KeyEvent>> = match source {
            Some(ref mut s) => Some(s.start().await?),
            None => None,
        };

        let mut manual_rx = if self.config.scanner.manual_input {
            tracing::info!("Manual entry enabled: type a barcode and press Enter");
            Some(spawn_manual_input())
        } else {
            None
        };

        if key_rx.is_none() && manual_rx.is_none() {
            return Err(BarcodeError::Config(
                "Nothing to read scans from: enable [scanner] or manual input".into(),
            ));
        }

        tracing::info!(
            "Ready (min length {}, inter-key timeout {}ms, cooldown {}ms, reporter: {})",
            self.config.scanner.min_length,
            self.config.scanner.inter_key_timeout_ms,
            self.config.scanner.cooldown_ms,
            self.reporter.name()
        );

        let (report_tx, mut report_rx) = mpsc::channel::<ReportDone>(32);

        let mut last_state = session.state().as_str();
        self.update_state(last_state);

        // Main event loop
        loop {
            let deadline = session.deadline();

            tokio::select! {
                // Scanner key events
                event = async {
                    match &mut key_rx {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => {
                    match event {
                        Some(event) => self.on_key(&mut session, &event, &report_tx),
                        None => {
                            tracing::error!("Scanner listener stopped");
                            self.play_feedback(SoundEvent::Error);
                            key_rx = None;
                            session.reset();
                            if manual_rx.is_none() {
                                break;
                            }
                        }
                    }
                }

                // Inter-key timeout; re-armed from the session every iteration
                _ = async {
                    match deadline {
                        Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
                        None => std::future::pending().await,
                    }
                } => {
                    self.on_deadline(&mut session, key_rx.as_mut(), Instant::now(), &report_tx);
                }

                // Manual entries
                line = async {
                    match &mut manual_rx {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => {
                    match line {
                        Some(line) => self.on_manual(&mut session, &line, &report_tx),
                        None => {
                            manual_rx = None;
                            if key_rx.is_none() {
                                break;
                            }
                        }
                    }
                }

                // Finished reports
                Some(done) = report_rx.recv() => {
                    self.handle_report(done);
                }

                // Handle SIGUSR1 - reload shipment selection
                _ = sigusr1.recv() => {
                    tracing::debug!("Received SIGUSR1 (reload selection)");
                    if self.shipment_override.is_some() {
                        tracing::info!("Shipment fixed by --shipment, ignoring selection change");
                    } else {
                        self.reload_selection(&mut session);
                    }
                }

                // Handle graceful shutdown (SIGINT from Ctrl+C)
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down...");
                    break;
                }

                // Handle graceful shutdown (SIGTERM from systemctl stop)
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                    break;
                }
            }

            let state = session.state().as_str();
            if state != last_state {
                self.update_state(state);
                last_state = state;
            }
        }

        // Cleanup
        if let Some(mut source) = source {
            source.stop().await?;
        }

        if let Some(ref path) = self.state_file_path {
            cleanup_file(path, "state");
        }

        if let Some(ref path) = self.pid_file_path {
            cleanup_file(path, "PID");
        }

        tracing::info!("Daemon stopped");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::User;
    use crate::config::ScannerConfig;
    use crate::credentials::Credentials;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records every barcode it is asked to report
    struct RecordingReporter {
        reported: Mutex<Vec<String>>,
        /// HTTP status returned for the first report
        fail_first: Option<u16>,
    }

    impl RecordingReporter {
        fn new(fail_first: Option<u16>) -> Arc<Self> {
            Arc::new(Self {
                reported: Mutex::new(Vec::new()),
                fail_first,
            })
        }

        fn reported(&self) -> Vec<String> {
            self.reported.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ScanReporter for RecordingReporter {
        async fn report(&self, scan: &Scan) -> std::result::Result<ScanReceipt, ApiError> {
            let first = {
                let mut reported = self.reported.lock().unwrap();
                reported.push(scan.barcode.clone());
                reported.len() == 1
            };
            match self.fail_first {
                Some(code) if first => Err(ApiError::from_status(code, String::new())),
                _ => Ok(ScanReceipt { product_name: None }),
            }
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    /// No sound, no popups, no state file
    fn quiet_daemon(reporter: &Arc<RecordingReporter>) -> Daemon {
        let mut config = Config::default();
        config.feedback.enabled = false;
        config.notification.on_scan = false;
        config.notification.on_duplicate = false;
        config.notification.on_error = false;
        config.state_file = None;
        Daemon::new(config, reporter.clone())
    }

    fn session(shipment: Option<ShipmentRef>) -> ScanSession {
        ScanSession::new(&ScannerConfig::default())
            .unwrap()
            .with_shipment(shipment)
    }

    fn shipment() -> Option<ShipmentRef> {
        Some(ShipmentRef::new(12, Some("ENV-0012".into())))
    }

    /// Scanner keys for `code`, stamped 5 ms apart from `start`
    fn keys(code: &str, start: Instant) -> Vec<KeyEvent> {
        code.chars()
            .enumerate()
            .map(|(i, c)| {
                let at = start + Duration::from_millis(5 * i as u64);
                KeyEvent::scanner_char(c).at(at)
            })
            .collect()
    }

    /// Feed a whole label plus Enter; returns the time of the Enter press
    fn scan(
        daemon: &Daemon,
        session: &mut ScanSession,
        code: &str,
        start: Instant,
        tx: &mpsc::Sender<ReportDone>,
    ) -> Instant {
        for key in keys(code, start) {
            daemon.on_key(session, &key, tx);
        }
        let enter_at = start + Duration::from_millis(5 * code.len() as u64);
        daemon.on_key(session, &KeyEvent::scanner_enter().at(enter_at), tx);
        enter_at
    }

    /// Wait for every spawned report and hand it back to the daemon
    async fn drain_reports(
        daemon: &mut Daemon,
        tx: mpsc::Sender<ReportDone>,
        rx: &mut mpsc::Receiver<ReportDone>,
    ) {
        drop(tx);
        while let Some(done) = rx.recv().await {
            daemon.handle_report(done);
        }
    }

    #[tokio::test]
    async fn test_duplicate_is_reported_once() {
        let reporter = RecordingReporter::new(None);
        let mut daemon = quiet_daemon(&reporter);
        let mut session = session(shipment());
        let (tx, mut rx) = mpsc::channel(8);

        let t0 = Instant::now();
        let last = scan(&daemon, &mut session, "7501031311309", t0, &tx);
        scan(
            &daemon,
            &mut session,
            "7501031311309",
            last + Duration::from_millis(300),
            &tx,
        );

        drain_reports(&mut daemon, tx, &mut rx).await;
        assert_eq!(reporter.reported(), vec!["7501031311309"]);
    }

    #[tokio::test]
    async fn test_rejected_scans_are_not_reported() {
        let reporter = RecordingReporter::new(None);
        let mut daemon = quiet_daemon(&reporter);
        let (tx, mut rx) = mpsc::channel(8);

        let mut unselected = session(None);
        scan(&daemon, &mut unselected, "ZX81", Instant::now(), &tx);

        let mut selected = session(shipment());
        daemon.on_manual(&mut selected, "AB", &tx);

        drain_reports(&mut daemon, tx, &mut rx).await;
        assert!(reporter.reported().is_empty());
    }

    #[tokio::test]
    async fn test_failed_report_does_not_stop_scanning() {
        let reporter = RecordingReporter::new(Some(500));
        let mut daemon = quiet_daemon(&reporter);
        let mut session = session(shipment());
        let (tx, mut rx) = mpsc::channel(8);

        let last = scan(&daemon, &mut session, "1111", Instant::now(), &tx);
        let done = rx.recv().await.unwrap();
        assert!(done.result.is_err());
        daemon.handle_report(done);
        assert!(!daemon.signed_out);

        scan(&daemon, &mut session, "2222", last + Duration::from_millis(50), &tx);
        drain_reports(&mut daemon, tx, &mut rx).await;
        assert_eq!(reporter.reported(), vec!["1111", "2222"]);
    }

    #[tokio::test]
    async fn test_unauthorized_stops_reporting() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        let user: User = serde_json::from_value(serde_json::json!({
            "id": 7,
            "username": "dock",
            "email": "dock@example.com",
            "role": "Scanner",
        }))
        .unwrap();
        store
            .save(&Credentials {
                token: "stale".into(),
                user,
            })
            .unwrap();

        let reporter = RecordingReporter::new(Some(401));
        let mut daemon = quiet_daemon(&reporter).with_credentials(store.clone());
        let mut session = session(shipment());
        let (tx, mut rx) = mpsc::channel(8);

        let last = scan(&daemon, &mut session, "1111", Instant::now(), &tx);
        let done = rx.recv().await.unwrap();
        daemon.handle_report(done);
        assert!(daemon.signed_out);
        assert!(store.load().unwrap().is_none());

        // Still decoded, but nothing more goes to the server
        scan(&daemon, &mut session, "2222", last + Duration::from_millis(50), &tx);
        drain_reports(&mut daemon, tx, &mut rx).await;
        assert_eq!(reporter.reported(), vec!["1111"]);
    }

    #[tokio::test]
    async fn test_stalled_loop_keeps_one_label() {
        let reporter = RecordingReporter::new(None);
        let mut daemon = quiet_daemon(&reporter);
        let mut session = session(shipment());
        let (tx, mut rx) = mpsc::channel(8);

        // The kernel stamped the keys 5 ms apart; the loop only gets to the
        // second half well past the inter-key timeout
        let t0 = Instant::now();
        let mut all = keys("7501031311309", t0).into_iter();
        for key in all.by_ref().take(6) {
            daemon.on_key(&mut session, &key, &tx);
        }
        std::thread::sleep(Duration::from_millis(150));
        for key in all {
            daemon.on_key(&mut session, &key, &tx);
        }
        daemon.on_deadline(&mut session, None, Instant::now(), &tx);

        drain_reports(&mut daemon, tx, &mut rx).await;
        assert_eq!(reporter.reported(), vec!["7501031311309"]);
    }

    #[tokio::test]
    async fn test_deadline_feeds_queued_keys_first() {
        let reporter = RecordingReporter::new(None);
        let mut daemon = quiet_daemon(&reporter);
        let mut session = session(shipment());
        let (tx, mut rx) = mpsc::channel(8);
        let (key_tx, mut key_rx) = mpsc::channel(32);

        let t0 = Instant::now();
        let mut all = keys("7501031311309", t0).into_iter();
        for key in all.by_ref().take(6) {
            daemon.on_key(&mut session, &key, &tx);
        }
        // The rest were read from the device but are still queued when the
        // timer fires
        for key in all {
            key_tx.try_send(key).unwrap();
        }
        std::thread::sleep(Duration::from_millis(150));
        daemon.on_deadline(&mut session, Some(&mut key_rx), Instant::now(), &tx);

        drain_reports(&mut daemon, tx, &mut rx).await;
        assert_eq!(reporter.reported(), vec!["7501031311309"]);
    }
}
