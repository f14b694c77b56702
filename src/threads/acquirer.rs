//! Frame pump: keeps the session's current frame fresh.
//!
//! Exactly one driver per connection, chosen from the session's
//! acquisition mode when the acquirer starts:
//!
//! - **Background** (server push / client pull): an `acquire` thread
//!   connects, configures, then fetches frames until stopped. The update
//!   tick only reads.
//! - **Synchronous** (retimed): a short-lived `connect` thread connects and
//!   configures; each update tick then calls
//!   [`on_update`](Acquirer::on_update), which resamples the stream with the
//!   configured offset.
//!
//! Stopping clears the acquirer's own running flag and joins its thread, so
//! no query can race a later disconnect.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::io::protocol::{DataStreamClient, QueryStatus};
use crate::io::session::{AcquisitionMode, StreamSession};

/// Counters shared with the acquisition thread.
#[derive(Debug, Default)]
pub struct PumpStats {
    pub frames_ok: AtomicU64,
    pub frames_failed: AtomicU64,
}

impl PumpStats {
    fn record(&self, status: QueryStatus) {
        if status.is_success() {
            self.frames_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.frames_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn frames_ok(&self) -> u64 {
        self.frames_ok.load(Ordering::Relaxed)
    }

    pub fn frames_failed(&self) -> u64 {
        self.frames_failed.load(Ordering::Relaxed)
    }
}

/// Thread-driven acquisition.
pub struct BackgroundAcquirer {
    handle: Option<JoinHandle<()>>,
}

/// Update-tick-driven acquisition.
pub struct SynchronousAcquirer {
    connector: Option<JoinHandle<()>>,
}

/// The active frame driver.
pub enum Acquirer<C: DataStreamClient + 'static> {
    Background {
        session: Arc<StreamSession<C>>,
        running: Arc<AtomicBool>,
        stats: Arc<PumpStats>,
        driver: BackgroundAcquirer,
    },
    Synchronous {
        session: Arc<StreamSession<C>>,
        running: Arc<AtomicBool>,
        stats: Arc<PumpStats>,
        driver: SynchronousAcquirer,
    },
}

impl<C: DataStreamClient + 'static> Acquirer<C> {
    /// Start the driver matching the session's acquisition mode.
    ///
    /// `poll_interval` paces the background loop for clients whose
    /// `get_frame` does not block; zero means back-to-back fetches.
    pub fn start(session: Arc<StreamSession<C>>, poll_interval: Duration) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(PumpStats::default());

        if session.mode() == AcquisitionMode::Retimed {
            let connector = {
                let session = Arc::clone(&session);
                let running = Arc::clone(&running);
                thread::Builder::new()
                    .name("mocap-connect".into())
                    .spawn(move || {
                        connect_and_configure(&session, &running);
                    })?
            };
            log::info!("Synchronous acquisition started");
            Ok(Acquirer::Synchronous {
                session,
                running,
                stats,
                driver: SynchronousAcquirer {
                    connector: Some(connector),
                },
            })
        } else {
            let handle = {
                let session = Arc::clone(&session);
                let running = Arc::clone(&running);
                let stats = Arc::clone(&stats);
                thread::Builder::new()
                    .name("mocap-acquire".into())
                    .spawn(move || run_background_loop(&session, &running, &stats, poll_interval))?
            };
            log::info!("Background acquisition started");
            Ok(Acquirer::Background {
                session,
                running,
                stats,
                driver: BackgroundAcquirer {
                    handle: Some(handle),
                },
            })
        }
    }

    pub fn session(&self) -> &Arc<StreamSession<C>> {
        match self {
            Acquirer::Background { session, .. } | Acquirer::Synchronous { session, .. } => session,
        }
    }

    pub fn stats(&self) -> &PumpStats {
        match self {
            Acquirer::Background { stats, .. } | Acquirer::Synchronous { stats, .. } => stats,
        }
    }

    fn running(&self) -> &AtomicBool {
        match self {
            Acquirer::Background { running, .. } | Acquirer::Synchronous { running, .. } => running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running().load(Ordering::Relaxed)
    }

    pub fn is_synchronous(&self) -> bool {
        matches!(self, Acquirer::Synchronous { .. })
    }

    /// Call once per consumer update.
    ///
    /// Synchronous: resamples the stream when connected and returns the
    /// status. Background: frames arrive on their own, returns `None`.
    pub fn on_update(&self) -> Option<QueryStatus> {
        match self {
            Acquirer::Synchronous { session, stats, running, .. } => {
                if !running.load(Ordering::Relaxed) || !session.is_connected() {
                    return None;
                }
                let status = session.update_frame();
                stats.record(status);
                Some(status)
            }
            Acquirer::Background { .. } => None,
        }
    }

    /// Request shutdown and join the driver thread.
    pub fn stop(&mut self) {
        self.running().store(false, Ordering::Relaxed);
        let handle = match self {
            Acquirer::Background { driver, .. } => driver.handle.take(),
            Acquirer::Synchronous { driver, .. } => driver.connector.take(),
        };
        if let Some(handle) = handle {
            let name = handle.thread().name().unwrap_or("acquirer").to_string();
            if handle.join().is_err() {
                log::error!("{} thread panicked", name);
            } else {
                log::debug!("{} thread joined", name);
            }
        }
    }
}

impl<C: DataStreamClient + 'static> Drop for Acquirer<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Connect and configure. Returns false if cancelled or failed.
fn connect_and_configure<C: DataStreamClient>(session: &StreamSession<C>, running: &AtomicBool) -> bool {
    if let Err(e) = session.connect(running) {
        log::info!("Connect ended: {}", e);
        return false;
    }
    if let Err(e) = session.configure() {
        log::warn!("Configure failed: {}", e);
        return false;
    }
    true
}

fn run_background_loop<C: DataStreamClient>(
    session: &StreamSession<C>,
    running: &AtomicBool,
    stats: &PumpStats,
    poll_interval: Duration,
) {
    log::info!("Acquisition thread starting");
    if !connect_and_configure(session, running) {
        return;
    }

    while running.load(Ordering::Relaxed) {
        let status = session.fetch_frame();
        stats.record(status);
        if !poll_interval.is_zero() {
            thread::sleep(poll_interval);
        }
    }
    log::info!(
        "Acquisition thread stopped ({} frames, {} failed)",
        stats.frames_ok(),
        stats.frames_failed()
    );
}
