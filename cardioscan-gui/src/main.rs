//! # CardioScan - LVNC Cardiac Analysis GUI
//!
//! Desktop front end for the CardioScan scan simulator. It collects the
//! device settings and patient details, starts scans and renders their
//! progress, waveform, spectrum and final risk assessment.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application
//! - **Scan Thread**: Dedicated worker running the scan orchestrator at a fixed cadence
//! - **Communication**: Crossbeam channels for thread-safe data exchange
//! - **Updates**: 60 FPS continuous updates via subscription system

mod storage;
mod ui;
mod widgets;
mod worker;

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use cardioscan_core::{RandomSource, ScanConfig, ScanEvent, ScanOutcome, SpectralEstimate};
use crossbeam_channel::Receiver;
use iced::{Element, Subscription, Theme};
use log::{debug, error, info, warn};

use storage::{PatientInfo, REPORT_PATH, SETTINGS_PATH, ScanReport};
use ui::main_display::create_main_view;
use widgets::waveform::{MAX_TRACE_POINTS, WaveformTrace};
use worker::{ScanWorker, WorkerMessage};

/// Environment variable that pins the random seed for reproducible demos.
const SEED_ENV: &str = "CARDIOSCAN_SEED";

/// Main entry point for the CardioScan application.
pub fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("[MAIN] Starting CardioScan application...");
    let result = iced::application("CardioScan LVNC Detector", CardioScanApp::update, CardioScanApp::view)
        .subscription(CardioScanApp::subscription)
        .theme(CardioScanApp::theme)
        .run();
    info!("[MAIN] Application finished with result: {:?}", result);
    result
}

/// Application message types.
#[derive(Debug, Clone)]
pub enum Message {
    // Sidebar inputs
    DeviceStatusSelected(DeviceStatus),
    SensitivityChanged(u8),
    ScanDurationSelected(u32),
    PatientIdChanged(String),
    AgeChanged(String),

    // Scan control
    StartScan,
    CancelScan,

    // Persistence
    SaveSettings,
    LoadSettings,
    SaveReport,

    // Continuous update message
    Tick,
}

/// Connection state of the (simulated) acquisition hardware.
///
/// The gate is advisory: the GUI disables scanning while disconnected, the
/// core pipeline never looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Disconnected,
    Connected,
}

impl DeviceStatus {
    pub const ALL: [DeviceStatus; 2] = [DeviceStatus::Disconnected, DeviceStatus::Connected];
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// Where the display is in the scan lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanPhase {
    Idle,
    /// Start requested, waiting for the worker to accept it.
    Starting,
    Acquiring,
    Completed,
    Failed(String),
}

/// UI-specific data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub worker_active: bool,

    // Sidebar state
    pub device_status: DeviceStatus,
    pub sensitivity: u8,
    pub scan_duration: u32,
    pub patient: PatientInfo,
    pub age_input: String,

    // Scan display
    pub phase: ScanPhase,
    pub progress: u8,
    pub waveform: WaveformTrace,
    pub spectrum: Option<SpectralEstimate>,
    pub outcome: Option<ScanOutcome>,
    pub notice: Option<String>,
    /// When the most recent scan completed.
    pub last_completed: Option<Instant>,
}

/// Main application state.
#[derive(Debug)]
struct CardioScanApp {
    worker: Option<ScanWorker>,
    worker_receiver: Option<Receiver<WorkerMessage>>,
    /// Settings used for the next scan.
    config: ScanConfig,
    /// Settings of the scan currently shown.
    active_config: Option<ScanConfig>,
    /// Only events tagged with this id reach the display.
    current_scan: Option<u64>,
    /// Start request still waiting for the worker's reply.
    pending_request: Option<u64>,
    next_request: u64,
    settings_path: PathBuf,
    display_data: AppDisplayData,
}

impl Default for CardioScanApp {
    fn default() -> Self {
        info!("[MAIN] Creating CardioScanApp...");
        let settings_path = PathBuf::from(SETTINGS_PATH);
        let config = if settings_path.exists() {
            ScanConfig::load(&settings_path).unwrap_or_else(|e| {
                warn!("[MAIN] Ignoring saved settings: {}", e);
                ScanConfig::default()
            })
        } else {
            ScanConfig::default()
        };

        let source = match std::env::var(SEED_ENV).ok().and_then(|s| s.parse().ok()) {
            Some(seed) => {
                info!("[MAIN] Using fixed seed {}", seed);
                RandomSource::Seeded(seed)
            }
            None => RandomSource::Entropy,
        };
        let (worker, receiver) = ScanWorker::spawn(source);

        let patient = PatientInfo::default();
        Self {
            worker: Some(worker),
            worker_receiver: Some(receiver),
            active_config: None,
            current_scan: None,
            pending_request: None,
            next_request: 1,
            settings_path,
            display_data: AppDisplayData {
                worker_active: true,
                device_status: DeviceStatus::Disconnected,
                sensitivity: config.sensitivity,
                scan_duration: selected_duration(&config),
                age_input: patient.age.to_string(),
                patient,
                phase: ScanPhase::Idle,
                progress: 0,
                waveform: WaveformTrace::default(),
                spectrum: None,
                outcome: None,
                notice: None,
                last_completed: None,
            },
            config,
        }
    }
}

impl CardioScanApp {
    fn update(&mut self, message: Message) {
        if !matches!(message, Message::Tick) {
            debug!("[UPDATE] Received message: {:?}", message);
        }

        match message {
            Message::DeviceStatusSelected(status) => {
                info!("[MAIN] Device status: {}", status);
                self.display_data.device_status = status;
            }
            Message::SensitivityChanged(value) => {
                self.display_data.sensitivity = value;
            }
            Message::ScanDurationSelected(seconds) => {
                self.display_data.scan_duration = seconds;
            }
            Message::PatientIdChanged(id) => {
                self.display_data.patient.patient_id = id;
            }
            Message::AgeChanged(input) => {
                if let Ok(age) = input.trim().parse::<u8>() {
                    if (1..=120).contains(&age) {
                        self.display_data.patient.age = age;
                    }
                }
                self.display_data.age_input = input;
            }
            Message::StartScan => self.start_scan(),
            Message::CancelScan => {
                if let Some(worker) = &self.worker {
                    worker.cancel();
                }
                self.current_scan = None;
                self.pending_request = None;
                self.display_data.phase = ScanPhase::Idle;
                self.notify("Scan cancelled".to_string());
            }
            Message::SaveSettings => {
                let config = self.next_config();
                match config.save(&self.settings_path) {
                    Ok(()) => {
                        self.notify(format!("Settings saved to {}", self.settings_path.display()))
                    }
                    Err(e) => self.notify(format!("Error saving settings: {}", e)),
                }
            }
            Message::LoadSettings => match ScanConfig::load(&self.settings_path) {
                Ok(config) => {
                    self.display_data.sensitivity = config.sensitivity;
                    self.display_data.scan_duration = selected_duration(&config);
                    self.config = config;
                    self.notify("Settings loaded".to_string());
                }
                Err(e) => self.notify(format!("Error loading settings: {}", e)),
            },
            Message::SaveReport => self.save_report(),
            Message::Tick => {
                if let Some(receiver) = &self.worker_receiver {
                    // Collect all results first to avoid borrowing conflicts
                    let messages: Vec<WorkerMessage> = receiver.try_iter().collect();
                    for message in messages {
                        self.process_worker_message(message);
                    }
                }
            }
        }
    }

    /// Configuration for the next scan, with the sidebar values applied.
    fn next_config(&self) -> ScanConfig {
        ScanConfig {
            sensitivity: self.display_data.sensitivity,
            ..self.config.clone()
        }
    }

    fn start_scan(&mut self) {
        if self.display_data.device_status != DeviceStatus::Connected {
            self.notify("Please connect CardioScan hardware".to_string());
            return;
        }
        let config = self.next_config();
        if let Err(e) = config.validate() {
            self.display_data.phase = ScanPhase::Failed(e.to_string());
            return;
        }
        let Some(worker) = &self.worker else {
            error!("[MAIN] No scan worker available");
            return;
        };

        info!(
            "[MAIN] Starting scan (sensitivity {}, selected duration {} s)",
            config.sensitivity, self.display_data.scan_duration
        );
        // Anything still queued from a previous scan or an earlier start
        // request is dropped until the worker confirms this one.
        let request = self.next_request;
        self.next_request += 1;
        self.pending_request = Some(request);
        self.current_scan = None;
        self.active_config = Some(config.clone());
        self.display_data.phase = ScanPhase::Starting;
        self.display_data.progress = 0;
        self.display_data.waveform = WaveformTrace::default();
        self.display_data.spectrum = None;
        self.display_data.outcome = None;
        self.display_data.notice = None;
        worker.start(request, config);
    }

    /// Applies one message from the scan worker to the display state.
    fn process_worker_message(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Started { request, scan_id } => {
                if self.pending_request == Some(request) {
                    self.pending_request = None;
                    self.current_scan = Some(scan_id);
                    self.display_data.phase = ScanPhase::Acquiring;
                } else {
                    debug!("[MAIN] Ignoring superseded start request {}", request);
                }
            }
            WorkerMessage::Rejected { request, reason } => {
                if self.pending_request == Some(request) {
                    self.pending_request = None;
                    self.display_data.phase = ScanPhase::Failed(reason);
                }
            }
            WorkerMessage::Failed { scan_id, reason } => {
                if self.current_scan == Some(scan_id) {
                    self.current_scan = None;
                    self.display_data.phase = ScanPhase::Failed(reason);
                }
            }
            WorkerMessage::Event(event) => {
                if self.current_scan != Some(event.scan_id()) {
                    debug!("[MAIN] Dropping stale event from scan {}", event.scan_id());
                    return;
                }
                self.apply_scan_event(event);
            }
        }
    }

    fn apply_scan_event(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Progress { percent, .. } => {
                self.display_data.progress = percent;
            }
            ScanEvent::Window { buffer, window, .. } => {
                let (times, samples) = buffer.window(&window);
                let duration = buffer.len() as f64 / buffer.sample_rate() as f64;
                self.display_data.waveform =
                    WaveformTrace::from_window(times, samples, duration, MAX_TRACE_POINTS);
            }
            ScanEvent::Spectrum { estimate, .. } => {
                self.display_data.spectrum = Some(estimate);
            }
            ScanEvent::Completed { outcome, .. } => {
                info!(
                    "[MAIN] Scan complete: {} ({})",
                    outcome.assessment.score_display(),
                    outcome.assessment.band
                );
                self.display_data.outcome = Some(outcome);
                self.display_data.last_completed = Some(Instant::now());
                self.display_data.phase = ScanPhase::Completed;
            }
        }
    }

    fn save_report(&mut self) {
        let (Some(scan_id), Some(config), Some(outcome)) = (
            self.current_scan,
            self.active_config.as_ref(),
            self.display_data.outcome.as_ref(),
        ) else {
            self.notify("No completed scan to save".to_string());
            return;
        };
        let report = ScanReport::new(
            scan_id,
            &self.display_data.patient,
            self.display_data.scan_duration,
            config,
            outcome,
        );
        let notice = match storage::save_report(&report, REPORT_PATH) {
            Ok(()) => format!("Report saved to {}", REPORT_PATH),
            Err(e) => format!("Error saving report: {:#}", e),
        };
        self.notify(notice);
    }

    fn notify(&mut self, notice: String) {
        info!("[MAIN] {}", notice);
        self.display_data.notice = Some(notice);
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Returns a timer subscription that fires every 16ms (60 FPS).
    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(Duration::from_millis(16)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }
}

/// Scan-duration selector value matching a loaded configuration.
fn selected_duration(config: &ScanConfig) -> u32 {
    config.duration_seconds.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_app() -> CardioScanApp {
        let mut app = CardioScanApp::default();
        app.config = ScanConfig {
            sample_rate: 1000,
            duration_seconds: 1.0,
            cadence_ms: 1,
            ..ScanConfig::default()
        };
        app.update(Message::DeviceStatusSelected(DeviceStatus::Connected));
        app
    }

    fn tick_until(app: &mut CardioScanApp, phase: ScanPhase) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while app.display_data.phase != phase {
            assert!(Instant::now() < deadline, "stuck in {:?}", app.display_data.phase);
            std::thread::sleep(Duration::from_millis(5));
            app.update(Message::Tick);
        }
    }

    #[test]
    fn disconnected_device_blocks_scanning() {
        let mut app = CardioScanApp::default();
        app.update(Message::StartScan);
        assert_eq!(app.display_data.phase, ScanPhase::Idle);
        assert!(app.display_data.notice.is_some());
    }

    #[test]
    fn scan_fills_the_display() {
        let mut app = connected_app();
        app.update(Message::StartScan);
        tick_until(&mut app, ScanPhase::Completed);

        assert_eq!(app.display_data.progress, 100);
        assert!(!app.display_data.waveform.points.is_empty());
        assert!(app.display_data.spectrum.is_some());
        assert!(app.display_data.outcome.is_some());
    }

    #[test]
    fn restarting_clears_previous_results() {
        let mut app = connected_app();
        app.update(Message::StartScan);
        tick_until(&mut app, ScanPhase::Completed);
        let first = app.current_scan;

        app.update(Message::StartScan);
        assert!(app.display_data.outcome.is_none());
        assert_eq!(app.display_data.progress, 0);
        tick_until(&mut app, ScanPhase::Completed);
        assert_ne!(app.current_scan, first);
    }

    #[test]
    fn cancelling_stops_the_display() {
        let mut app = connected_app();
        app.config.cadence_ms = 50;
        app.update(Message::StartScan);
        tick_until(&mut app, ScanPhase::Acquiring);
        app.update(Message::CancelScan);
        assert_eq!(app.display_data.phase, ScanPhase::Idle);

        let progress = app.display_data.progress;
        std::thread::sleep(Duration::from_millis(200));
        app.update(Message::Tick);
        assert_eq!(app.display_data.progress, progress);
        assert!(app.display_data.outcome.is_none());
    }

    #[test]
    fn double_start_follows_the_latest_request() {
        let mut app = connected_app();
        app.update(Message::StartScan);
        app.update(Message::StartScan);
        tick_until(&mut app, ScanPhase::Completed);

        assert_eq!(app.display_data.progress, 100);
        assert!(app.display_data.outcome.is_some());
        assert!(app.pending_request.is_none());
    }

    #[test]
    fn superseded_replies_are_ignored() {
        let mut app = connected_app();
        app.pending_request = Some(2);
        app.display_data.phase = ScanPhase::Starting;

        app.process_worker_message(WorkerMessage::Started {
            request: 1,
            scan_id: 10,
        });
        app.process_worker_message(WorkerMessage::Rejected {
            request: 1,
            reason: "old".to_string(),
        });
        assert_eq!(app.display_data.phase, ScanPhase::Starting);
        assert_eq!(app.current_scan, None);

        app.process_worker_message(WorkerMessage::Started {
            request: 2,
            scan_id: 11,
        });
        assert_eq!(app.display_data.phase, ScanPhase::Acquiring);
        assert_eq!(app.current_scan, Some(11));
    }

    #[test]
    fn loading_settings_updates_the_sidebar() {
        let mut app = CardioScanApp::default();
        app.settings_path = std::env::temp_dir()
            .join(format!("cardioscan_settings_{}.json", std::process::id()));
        let saved = ScanConfig {
            duration_seconds: 30.0,
            sensitivity: 20,
            ..ScanConfig::default()
        };
        saved.save(&app.settings_path).unwrap();

        app.update(Message::LoadSettings);
        std::fs::remove_file(&app.settings_path).ok();

        assert_eq!(app.display_data.scan_duration, 30);
        assert_eq!(app.display_data.sensitivity, 20);
        assert_eq!(app.config, saved);
    }

    #[test]
    fn stale_events_are_ignored() {
        let mut app = connected_app();
        app.current_scan = Some(7);
        app.process_worker_message(WorkerMessage::Event(ScanEvent::Progress {
            scan_id: 6,
            percent: 40,
        }));
        assert_eq!(app.display_data.progress, 0);
        app.process_worker_message(WorkerMessage::Event(ScanEvent::Progress {
            scan_id: 7,
            percent: 40,
        }));
        assert_eq!(app.display_data.progress, 40);
    }

    #[test]
    fn age_input_only_accepts_valid_ages() {
        let mut app = CardioScanApp::default();
        app.update(Message::AgeChanged("130".to_string()));
        assert_eq!(app.display_data.patient.age, 45);
        app.update(Message::AgeChanged("62".to_string()));
        assert_eq!(app.display_data.patient.age, 62);
        assert_eq!(app.display_data.age_input, "62");
    }
}
