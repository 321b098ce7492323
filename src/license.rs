//! License validity gate.
//!
//! The controller asks a [`ValidityGate`] before loading, saving and opening
//! a task. [`LicenseMonitor`] re-checks the gate on a timer in the
//! background and reports when validity is lost or regained; it never
//! touches task data.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use tokio::sync::mpsc;
use tokio::time::{interval_at, timeout, Instant};
use tokio_util::sync::CancellationToken;

use crate::{glog_debug, glog_warn, Error, Result};

const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Phrases a license file must contain.
pub const DEFAULT_KEYWORDS: [&str; 3] = ["Copyright", "All rights reserved", "trade secret"];

/// Something that can say whether the application may operate.
pub trait ValidityGate {
    fn check_valid(&self) -> impl Future<Output = bool> + Send;
}

/// Gate that is always open.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl ValidityGate for AlwaysValid {
    async fn check_valid(&self) -> bool {
        true
    }
}

/// Gate whose answer is set by hand.
#[derive(Debug)]
pub struct ManualGate {
    valid: AtomicBool,
}

impl ManualGate {
    pub fn new(valid: bool) -> Self {
        Self {
            valid: AtomicBool::new(valid),
        }
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }
}

impl ValidityGate for ManualGate {
    async fn check_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }
}

impl<G: ValidityGate + Send + Sync> ValidityGate for Arc<G> {
    fn check_valid(&self) -> impl Future<Output = bool> + Send {
        self.as_ref().check_valid()
    }
}

/// A license text file that must name the current year and carry every
/// required keyword.
#[derive(Debug, Clone)]
pub struct LicenseFile {
    path: PathBuf,
    keywords: Vec<String>,
}

impl LicenseFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `contents` satisfies the license rules for `year`.
    pub fn accepts(&self, contents: &str, year: i32) -> bool {
        self.keywords.iter().all(|k| contents.contains(k.as_str()))
            && contents.contains(&year.to_string())
    }

    async fn read(&self) -> Result<String> {
        match timeout(READ_TIMEOUT, tokio::fs::read_to_string(&self.path)).await {
            Ok(contents) => Ok(contents?),
            Err(_) => Err(Error::Timeout(READ_TIMEOUT)),
        }
    }
}

impl ValidityGate for LicenseFile {
    async fn check_valid(&self) -> bool {
        match self.read().await {
            Ok(contents) => {
                let valid = self.accepts(&contents, chrono::Local::now().year());
                glog_debug!("License check {}: valid={}", self.path.display(), valid);
                valid
            }
            Err(e) => {
                glog_warn!("License check {} failed: {}", self.path.display(), e);
                false
            }
        }
    }
}

/// Change of validity observed by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    /// The gate was open at the previous check and is now closed.
    Invalidated,
    /// The gate was closed at the previous check and is open again.
    Restored,
}

/// Handle to a running monitor, used to stop it.
#[derive(Debug)]
pub struct MonitorHandle {
    cancel: CancellationToken,
}

impl MonitorHandle {
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Periodic re-check of a gate. Starts assuming the gate is open, since it
/// is only spawned after a successful startup check.
pub struct LicenseMonitor<G> {
    gate: Arc<G>,
    events: mpsc::UnboundedSender<GateEvent>,
    interval: Duration,
}

impl<G: ValidityGate + Send + Sync + 'static> LicenseMonitor<G> {
    pub fn new(gate: Arc<G>, events: mpsc::UnboundedSender<GateEvent>, interval: Duration) -> Self {
        Self {
            gate,
            events,
            interval,
        }
    }

    pub fn spawn(self) -> MonitorHandle {
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        glog_debug!("LicenseMonitor::spawn interval={:?}", self.interval);

        tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + self.interval, self.interval);
            let mut last_valid = true;

            loop {
                tokio::select! {
                    _ = cancel_clone.cancelled() => {
                        glog_debug!("LicenseMonitor cancelled");
                        break;
                    }
                    _ = ticks.tick() => {
                        if self.events.is_closed() {
                            glog_debug!("LicenseMonitor: event channel closed");
                            break;
                        }
                        let valid = self.gate.check_valid().await;
                        let event = match (last_valid, valid) {
                            (true, false) => Some(GateEvent::Invalidated),
                            (false, true) => Some(GateEvent::Restored),
                            _ => None,
                        };
                        last_valid = valid;
                        if let Some(event) = event {
                            glog_warn!("LicenseMonitor: {:?}", event);
                            let _ = self.events.send(event);
                        }
                    }
                }
            }
        });

        MonitorHandle { cancel }
    }
}
