//! Unread-message monitor
//!
//! A background thread polls the WhatsApp window once per interval and pushes
//! a new icon and tooltip to the tray whenever the running state or unread
//! count changes. The poll thread is the only writer of the icon cache and of
//! the monitor state.

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::error::TrayResult;
use crate::probe::WindowProbe;
use crate::render::{IconCache, IconFactory, IconKey};
use crate::tray::TraySurface;

/// Time between two poll ticks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Base tooltip text
pub const APP_TITLE: &str = "WhatsApp Tray Manager";

/// Tooltip shown for an icon state
pub fn status_text(key: IconKey) -> String {
    match key.normalized() {
        IconKey::Default => APP_TITLE.to_string(),
        IconKey::Inactive => format!("{} (not running)", APP_TITLE),
        IconKey::Count(n) => format!("{} ({} unread)", APP_TITLE, n),
        IconKey::CountOverflow => format!("{} (5+ unread)", APP_TITLE),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observation {
    running: bool,
    unread: u32,
}

/// What the monitor last pushed to the tray
#[derive(Debug, Default)]
pub struct MonitorState {
    last_unread_count: u32,
    // None until the first push of a cycle
    last_observation: Option<Observation>,
}

impl MonitorState {
    pub fn last_unread_count(&self) -> u32 {
        self.last_unread_count
    }
}

/// Result of a single poll tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Unchanged,
    Updated(IconKey),
}

/// Everything one tick touches
pub struct PollCore<P, T, F: IconFactory> {
    probe: Arc<P>,
    tray: Arc<T>,
    icons: IconCache<F>,
    state: MonitorState,
}

impl<P, T, F> PollCore<P, T, F>
where
    P: WindowProbe,
    T: TraySurface<Icon = F::Icon>,
    F: IconFactory,
{
    pub fn new(probe: Arc<P>, tray: Arc<T>, icons: IconCache<F>) -> Self {
        Self {
            probe,
            tray,
            icons,
            state: MonitorState::default(),
        }
    }

    /// Forget what was pushed so the next tick refreshes the tray
    pub fn reset(&mut self) {
        self.state = MonitorState::default();
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Observe WhatsApp once and update the tray if anything changed
    pub fn tick(&mut self) -> TrayResult<TickOutcome> {
        let running = self.probe.is_target_running();
        let observation = Observation {
            running,
            unread: if running { self.probe.unread_count() } else { 0 },
        };

        if self.state.last_observation == Some(observation) {
            return Ok(TickOutcome::Unchanged);
        }

        let key = IconKey::select(observation.running, observation.unread);
        let icon = self.icons.get_icon(key)?;
        self.tray.set_icon(icon)?;
        self.tray.set_tooltip(&status_text(key))?;

        debug!("Tray updated to {:?} (unread={})", key, observation.unread);
        self.state.last_unread_count = observation.unread;
        self.state.last_observation = Some(observation);
        Ok(TickOutcome::Updated(key))
    }
}

struct Worker {
    // Dropping the sender wakes the worker and ends its loop
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Periodically runs [`PollCore::tick`] on a background thread
pub struct MessageMonitor<P, T, F: IconFactory> {
    core: Arc<Mutex<PollCore<P, T, F>>>,
    interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl<P, T, F> MessageMonitor<P, T, F>
where
    P: WindowProbe + 'static,
    T: TraySurface<Icon = F::Icon> + 'static,
    F: IconFactory + Send + 'static,
{
    pub fn new(probe: Arc<P>, tray: Arc<T>, icons: IconCache<F>) -> Self {
        Self::with_interval(probe, tray, icons, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(probe: Arc<P>, tray: Arc<T>, icons: IconCache<F>, interval: Duration) -> Self {
        Self {
            core: Arc::new(Mutex::new(PollCore::new(probe, tray, icons))),
            interval,
            worker: Mutex::new(None),
        }
    }

    /// Start polling, replacing any running cycle with a fresh one
    pub fn start(&self) -> TrayResult<()> {
        let mut worker = self.worker.lock();
        Self::shutdown(worker.take());

        self.core.lock().reset();

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let core = self.core.clone();
        let interval = self.interval;

        let handle = std::thread::Builder::new()
            .name("message-monitor".to_string())
            .spawn(move || loop {
                if let Err(e) = core.lock().tick() {
                    warn!("Poll tick failed: {}", e);
                }

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        *worker = Some(Worker { stop_tx, handle });
        info!("Message monitor started ({:?} interval)", self.interval);
        Ok(())
    }

    /// Stop polling; no tick runs after this returns
    pub fn stop(&self) {
        let worker = self.worker.lock().take();
        if worker.is_some() {
            Self::shutdown(worker);
            info!("Message monitor stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().is_some()
    }

    fn shutdown(worker: Option<Worker>) {
        let Some(Worker { stop_tx, handle }) = worker else {
            return;
        };
        drop(stop_tx);
        if handle.join().is_err() {
            warn!("Message monitor thread panicked");
        }
    }
}

impl<P, T, F: IconFactory> Drop for MessageMonitor<P, T, F> {
    fn drop(&mut self) {
        if let Some(Worker { stop_tx, handle }) = self.worker.get_mut().take() {
            drop(stop_tx);
            let _ = handle.join();
        }
    }
}
