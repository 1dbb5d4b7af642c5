//! # Scan Worker Module
//!
//! Runs the scan orchestrator on a dedicated thread. The worker owns the
//! step cadence and cancellation; the GUI thread only sends commands and
//! drains the resulting messages on its own tick.
//!
//! ## Architecture
//! - **Commands**: start, cancel and shutdown arrive on a crossbeam channel
//! - **Cadence**: a `crossbeam_channel::tick` drives one step per interval
//! - **Output**: every scan event is forwarded tagged with its scan id

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cardioscan_core::{RandomSource, ScanConfig, ScanEvent, ScanOrchestrator, ScanState};
use crossbeam_channel::{Receiver, Sender};
use log::{error, info, warn};

/// Requests sent from the GUI to the worker thread.
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    /// Start a scan, implicitly cancelling one in progress. `request` is
    /// echoed back in the reply.
    Start { request: u64, config: ScanConfig },
    Cancel,
    Shutdown,
}

/// Messages sent from the worker thread back to the GUI.
#[derive(Debug, Clone)]
pub enum WorkerMessage {
    /// Start request `request` was accepted; events for `scan_id` follow.
    Started { request: u64, scan_id: u64 },
    /// Start request `request` was refused (invalid configuration or no randomness).
    Rejected { request: u64, reason: String },
    Event(ScanEvent),
    /// A scan was aborted mid-way and the orchestrator returned to idle.
    Failed { scan_id: u64, reason: String },
}

/// Handle to the scan worker thread.
#[derive(Debug)]
pub struct ScanWorker {
    command_tx: Sender<WorkerCommand>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ScanWorker {
    /// Spawns the worker thread and returns its handle together with the
    /// receiving end of its message channel.
    pub fn spawn(source: RandomSource) -> (Self, Receiver<WorkerMessage>) {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (message_tx, message_rx) = crossbeam_channel::unbounded();

        let thread_handle = thread::spawn(move || {
            info!("[WORKER] Scan worker started");
            run(ScanOrchestrator::new(source), command_rx, message_tx);
            info!("[WORKER] Scan worker finished");
        });

        (
            Self {
                command_tx,
                thread_handle: Some(thread_handle),
            },
            message_rx,
        )
    }

    pub fn start(&self, request: u64, config: ScanConfig) {
        self.send(WorkerCommand::Start { request, config });
    }

    pub fn cancel(&self) {
        self.send(WorkerCommand::Cancel);
    }

    fn send(&self, command: WorkerCommand) {
        if self.command_tx.send(command).is_err() {
            error!("[WORKER] Worker thread is gone, command dropped");
        }
    }

    /// Stops the thread and waits for it to exit.
    pub fn shutdown(&mut self) {
        let _ = self.command_tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                error!("[WORKER] Worker thread panicked");
            }
        }
    }
}

impl Drop for ScanWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker loop: waits for commands and, while a scan is acquiring, advances
/// it once per cadence tick.
fn run(
    mut orchestrator: ScanOrchestrator,
    command_rx: Receiver<WorkerCommand>,
    message_tx: Sender<WorkerMessage>,
) {
    let mut ticker: Receiver<Instant> = crossbeam_channel::never();

    loop {
        let mut next_ticker = None;

        crossbeam_channel::select! {
            recv(command_rx) -> msg => match msg {
                Ok(WorkerCommand::Start { request, config }) => {
                    let cadence = Duration::from_millis(config.cadence_ms);
                    let reply = match orchestrator.start(config) {
                        Ok(scan_id) => {
                            next_ticker = Some(crossbeam_channel::tick(cadence));
                            WorkerMessage::Started { request, scan_id }
                        }
                        Err(e) => {
                            warn!("[WORKER] Scan rejected: {}", e);
                            if orchestrator.state() != ScanState::Acquiring {
                                next_ticker = Some(crossbeam_channel::never());
                            }
                            WorkerMessage::Rejected { request, reason: e.to_string() }
                        }
                    };
                    if message_tx.send(reply).is_err() {
                        break;
                    }
                }
                Ok(WorkerCommand::Cancel) => {
                    orchestrator.cancel();
                    next_ticker = Some(crossbeam_channel::never());
                }
                Ok(WorkerCommand::Shutdown) | Err(_) => {
                    info!("[WORKER] Received shutdown signal");
                    break;
                }
            },
            recv(ticker) -> _ => {
                let scan_id = orchestrator.session().map(|s| s.id()).unwrap_or_default();
                match orchestrator.advance() {
                    Ok(events) => {
                        if events
                            .into_iter()
                            .any(|event| message_tx.send(WorkerMessage::Event(event)).is_err())
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("[WORKER] Scan {} aborted: {}", scan_id, e);
                        let failed = WorkerMessage::Failed { scan_id, reason: e.to_string() };
                        if message_tx.send(failed).is_err() {
                            break;
                        }
                    }
                }
                if orchestrator.state() != ScanState::Acquiring {
                    next_ticker = Some(crossbeam_channel::never());
                }
            },
        }

        if let Some(t) = next_ticker {
            ticker = t;
        }
    }
}
