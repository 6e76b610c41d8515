//! PortManager Engine - Published scan state and background task orchestration.
//!
//! The engine owns the state a presentation layer displays: the current
//! port list, whether a scan is running, and the last error message. Scans
//! and kills run on worker tasks; their results come back over a channel to
//! a single update task, which is the only writer of the published
//! [`Snapshot`]. Each update replaces the snapshot as a whole, so readers
//! never see a half-applied update.
//!
//! # Usage Pattern
//! Call [`PortManagerEngine::scan`] or [`PortManagerEngine::kill`], then read
//! [`PortManagerEngine::snapshot`] or wait on [`PortManagerEngine::subscribe`].
//! Dropping the engine stops the update task and aborts all workers,
//! including a pending post-kill rescan.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{self, AbortHandle, JoinHandle, JoinSet};
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::PortService;
use crate::config::Config;
use crate::domain::PortRecord;
use crate::error::{KillError, ScanError};
use crate::ports::{PortScannerPort, ProcessKillerPort};

/// Timing options for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Delay between a successful kill and the follow-up scan, giving the OS
    /// time to release the binding. The rescan may still show the port.
    pub rescan_delay: Duration,
    /// Period of timer-triggered scans. `None` scans only on request.
    pub refresh_interval: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            rescan_delay: Duration::from_millis(500),
            refresh_interval: None,
        }
    }
}

impl EngineOptions {
    /// Options from configuration, without timer-triggered scans.
    pub fn from_config(config: &Config) -> Self {
        Self {
            rescan_delay: config.rescan_delay(),
            refresh_interval: None,
        }
    }

    /// Enable timer-triggered scans.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }
}

/// Published engine state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Records of the last finished scan, sorted by port.
    pub ports: Arc<Vec<PortRecord>>,
    /// A scan is in progress.
    pub is_scanning: bool,
    /// Message of the last failed scan or kill. Cleared only when a scan
    /// starts, so a scan already running when a kill fails keeps the message.
    pub error_message: Option<String>,
    /// Number of scans that have finished, successfully or not.
    pub completed_scans: u64,
}

enum Request {
    Scan,
    Kill(u32),
}

enum Completion {
    Scanned {
        ticket: u64,
        result: Result<Vec<PortRecord>, ScanError>,
    },
    Killed {
        pid: u32,
        result: Result<(), KillError>,
    },
    RescanDue,
}

/// Handle to a running engine.
pub struct PortManagerEngine {
    requests: mpsc::UnboundedSender<Request>,
    state: watch::Receiver<Snapshot>,
    update_task: JoinHandle<()>,
}

impl PortManagerEngine {
    /// Start the engine's update task on the current tokio runtime.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn start<S, K>(service: PortService<S>, killer: K, options: EngineOptions) -> Self
    where
        S: PortScannerPort + 'static,
        K: ProcessKillerPort + 'static,
    {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(Snapshot::default());

        let update_loop = UpdateLoop {
            service: Arc::new(service),
            killer: Arc::new(killer),
            options,
            state: state_tx,
            completions: completions_tx,
            workers: JoinSet::new(),
            in_flight_scan: None,
            scan_ticket: 0,
        };
        let update_task = tokio::spawn(update_loop.run(requests_rx, completions_rx));

        Self {
            requests: requests_tx,
            state: state_rx,
            update_task,
        }
    }

    /// Request a refresh. An in-flight scan is cancelled and restarted.
    pub fn scan(&self) {
        self.send(Request::Scan);
    }

    /// Request SIGKILL for `pid`. On success a single rescan follows after
    /// the configured delay; on failure the error message is published and
    /// the port list is left as it was.
    pub fn kill(&self, pid: u32) {
        self.send(Request::Kill(pid));
    }

    /// Current published state.
    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.clone()
    }

    fn send(&self, request: Request) {
        if self.requests.send(request).is_err() {
            warn!("Engine update task has stopped, request dropped");
        }
    }
}

impl Drop for PortManagerEngine {
    fn drop(&mut self) {
        self.update_task.abort();
    }
}

/// The single writer of the published state.
///
/// Dropping it (when the update task ends or is aborted) drops the
/// `JoinSet`, which aborts every worker.
struct UpdateLoop<S: PortScannerPort, K: ProcessKillerPort> {
    service: Arc<PortService<S>>,
    killer: Arc<K>,
    options: EngineOptions,
    state: watch::Sender<Snapshot>,
    completions: mpsc::UnboundedSender<Completion>,
    workers: JoinSet<()>,
    in_flight_scan: Option<AbortHandle>,
    scan_ticket: u64,
}

impl<S, K> UpdateLoop<S, K>
where
    S: PortScannerPort + 'static,
    K: ProcessKillerPort + 'static,
{
    async fn run(
        mut self,
        mut requests: mpsc::UnboundedReceiver<Request>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        let mut ticker = self.options.refresh_interval.map(|period| {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(Request::Scan) => self.begin_scan(),
                    Some(Request::Kill(pid)) => self.begin_kill(pid),
                    None => {
                        debug!("Engine handle dropped, stopping update task");
                        break;
                    }
                },
                Some(completion) = completions.recv() => self.apply(completion),
                _ = next_tick(&mut ticker) => {
                    debug!("Timer-triggered scan");
                    self.begin_scan();
                }
                Some(joined) = self.workers.join_next(), if !self.workers.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!(error = %e, "Engine worker panicked");
                            self.worker_panicked(e.id());
                        }
                    }
                }
            }
        }
    }

    fn begin_scan(&mut self) {
        if let Some(previous) = self.in_flight_scan.take() {
            debug!(ticket = self.scan_ticket, "Cancelling in-flight scan");
            previous.abort();
        }

        self.scan_ticket += 1;
        let ticket = self.scan_ticket;

        self.state.send_modify(|s| {
            s.is_scanning = true;
            s.error_message = None;
        });

        let service = Arc::clone(&self.service);
        let completions = self.completions.clone();
        let handle = self.workers.spawn(async move {
            let result = service.scan().await;
            // The engine may be gone; nobody is left to update then.
            let _ = completions.send(Completion::Scanned { ticket, result });
        });
        self.in_flight_scan = Some(handle);
    }

    fn begin_kill(&mut self, pid: u32) {
        let killer = Arc::clone(&self.killer);
        let completions = self.completions.clone();
        self.workers.spawn(async move {
            let result = killer.kill(pid).await;
            let _ = completions.send(Completion::Killed { pid, result });
        });
    }

    fn schedule_rescan(&mut self) {
        let delay = self.options.rescan_delay;
        let completions = self.completions.clone();
        self.workers.spawn(async move {
            sleep(delay).await;
            let _ = completions.send(Completion::RescanDue);
        });
    }

    /// A panicked scan worker never reports back; stop showing it as running.
    fn worker_panicked(&mut self, id: task::Id) {
        let is_current_scan = self
            .in_flight_scan
            .as_ref()
            .is_some_and(|handle| handle.id() == id);
        if is_current_scan {
            self.in_flight_scan = None;
            self.state.send_modify(|s| s.is_scanning = false);
        }
    }

    fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Scanned { ticket, result } => {
                if ticket != self.scan_ticket {
                    debug!(ticket, current = self.scan_ticket, "Ignoring stale scan result");
                    return;
                }
                self.in_flight_scan = None;

                match result {
                    Ok(ports) => {
                        info!(count = ports.len(), "Scan complete");
                        self.state.send_modify(|s| {
                            s.ports = Arc::new(ports);
                            s.is_scanning = false;
                            s.completed_scans += 1;
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Scan failed");
                        self.state.send_modify(|s| {
                            s.ports = Arc::new(Vec::new());
                            s.is_scanning = false;
                            s.error_message = Some(format!("Error scanning ports: {}", e));
                            s.completed_scans += 1;
                        });
                    }
                }
            }
            Completion::Killed { pid, result } => match result {
                Ok(()) => {
                    info!(
                        pid,
                        delay_ms = self.options.rescan_delay.as_millis() as u64,
                        "Process killed, rescan scheduled"
                    );
                    self.schedule_rescan();
                }
                Err(e) => {
                    warn!(pid, error = %e, "Kill failed");
                    self.state.send_modify(|s| {
                        s.error_message = Some(format!("Failed to kill process: {}", e));
                    });
                }
            },
            Completion::RescanDue => self.begin_scan(),
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
