//! # Scan Orchestration Module
//!
//! Drives one scan through `Idle → Acquiring → Completed`.
//!
//! The orchestrator is a pure step generator: every call to
//! [`ScanOrchestrator::advance`] performs exactly one reveal step and returns
//! the events produced by it. Timing, threading and cancellation belong to
//! the presentation driver that calls it.

use std::sync::Arc;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use serde::Serialize;

use crate::config::ScanConfig;
use crate::error::Result;
use crate::random::RandomSource;
use crate::risk::{self, Biomarkers, MarkerAdvisories, RiskAssessment};
use crate::spectral::{self, SpectralEstimate};
use crate::stream::{self, ChunkStreamer, RevealWindow};
use crate::synth::{self, SignalBuffer};

/// Lifecycle state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanState {
    Idle,
    Acquiring,
    Completed,
}

/// Everything computed once acquisition has finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub biomarkers: Biomarkers,
    pub perturbation: u8,
    pub assessment: RiskAssessment,
    pub advisories: MarkerAdvisories,
}

/// Output of a single step, tagged with the scan it belongs to.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    /// Acquisition progress in percent, `1..=100`.
    Progress { scan_id: u64, percent: u8 },
    /// The currently revealed prefix of the recording.
    Window {
        scan_id: u64,
        buffer: Arc<SignalBuffer>,
        window: RevealWindow,
    },
    /// Power spectrum of the revealed prefix.
    Spectrum {
        scan_id: u64,
        step: usize,
        estimate: SpectralEstimate,
    },
    /// Final biomarkers and risk assessment.
    Completed { scan_id: u64, outcome: ScanOutcome },
}

impl ScanEvent {
    pub fn scan_id(&self) -> u64 {
        match self {
            Self::Progress { scan_id, .. }
            | Self::Window { scan_id, .. }
            | Self::Spectrum { scan_id, .. }
            | Self::Completed { scan_id, .. } => *scan_id,
        }
    }
}

/// The single active scan.
#[derive(Debug)]
pub struct ScanSession {
    id: u64,
    config: ScanConfig,
    buffer: Arc<SignalBuffer>,
    windows: ChunkStreamer,
    step: usize,
    outcome: Option<ScanOutcome>,
}

impl ScanSession {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn buffer(&self) -> &Arc<SignalBuffer> {
        &self.buffer
    }

    /// Number of steps performed so far.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn outcome(&self) -> Option<&ScanOutcome> {
        self.outcome.as_ref()
    }
}

/// State machine tying synthesis, streaming, spectral estimation and scoring
/// together.
#[derive(Debug)]
pub struct ScanOrchestrator {
    source: RandomSource,
    rng: Option<StdRng>,
    state: ScanState,
    session: Option<ScanSession>,
    next_scan_id: u64,
}

impl ScanOrchestrator {
    pub fn new(source: RandomSource) -> Self {
        Self {
            source,
            rng: None,
            state: ScanState::Idle,
            session: None,
            next_scan_id: 1,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    /// Starts a new scan and returns its id.
    ///
    /// An invalid `config` is rejected without touching the current state.
    /// Any scan in progress or completed is discarded. If no random
    /// generator can be opened the orchestrator falls back to `Idle`.
    pub fn start(&mut self, config: ScanConfig) -> Result<u64> {
        config.validate()?;

        if let Some(previous) = self.session.take() {
            if self.state == ScanState::Acquiring {
                warn!(
                    "[SCAN] Scan {} cancelled at step {}/{} by a new start",
                    previous.id, previous.step, previous.config.steps
                );
            }
        }
        self.state = ScanState::Idle;

        let mut rng = self.take_rng()?;
        let buffer = synth::synthesize(&config, &mut rng);
        self.rng = Some(rng);

        let id = self.next_scan_id;
        self.next_scan_id += 1;

        info!(
            "[SCAN] Scan {} started: {} samples at {} Hz, {} steps",
            id,
            buffer.len(),
            config.sample_rate,
            config.steps
        );

        self.session = Some(ScanSession {
            id,
            windows: stream::step_windows(buffer.len(), config.steps),
            buffer: Arc::new(buffer),
            config,
            step: 0,
            outcome: None,
        });
        self.state = ScanState::Acquiring;
        Ok(id)
    }

    /// Performs one reveal step.
    ///
    /// Returns no events unless a scan is acquiring. The last step also
    /// draws the biomarkers, scores them and moves to `Completed`.
    pub fn advance(&mut self) -> Result<Vec<ScanEvent>> {
        if self.state != ScanState::Acquiring {
            return Ok(Vec::new());
        }
        let Some(session) = self.session.as_mut() else {
            self.state = ScanState::Idle;
            return Ok(Vec::new());
        };
        let Some(window) = session.windows.next() else {
            return Ok(Vec::new());
        };
        session.step = window.step + 1;

        let scan_id = session.id;
        let steps = session.config.steps;
        let mut events = Vec::with_capacity(3);

        events.push(ScanEvent::Progress {
            scan_id,
            percent: (session.step * 100 / steps) as u8,
        });
        events.push(ScanEvent::Window {
            scan_id,
            buffer: Arc::clone(&session.buffer),
            window,
        });

        if window.step % session.config.spectrum_interval == 0 {
            let (_, samples) = session.buffer.window(&window);
            let estimate = spectral::estimate(
                samples,
                session.buffer.sample_rate(),
                session.config.segment_length,
            );
            debug!(
                "[SCAN] Step {}: spectrum over {} samples, {} bins",
                window.step,
                samples.len(),
                estimate.len()
            );
            events.push(ScanEvent::Spectrum {
                scan_id,
                step: window.step,
                estimate,
            });
        }

        if session.step == steps {
            let outcome = self.finish()?;
            events.push(ScanEvent::Completed { scan_id, outcome });
        }

        Ok(events)
    }

    /// Runs the remaining steps back to back and collects their events.
    pub fn run_to_completion(&mut self) -> Result<Vec<ScanEvent>> {
        let mut events = Vec::new();
        while self.state == ScanState::Acquiring {
            events.extend(self.advance()?);
        }
        Ok(events)
    }

    /// Drops the current session and returns to `Idle`.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            info!("[SCAN] Scan {} cancelled at step {}", session.id, session.step);
        }
        self.state = ScanState::Idle;
    }

    fn finish(&mut self) -> Result<ScanOutcome> {
        let mut rng = self.take_rng()?;
        let biomarkers = Biomarkers::draw(&mut rng);
        let perturbation = risk::draw_perturbation(&mut rng);
        self.rng = Some(rng);

        let assessment = risk::score(&biomarkers, perturbation);
        let outcome = ScanOutcome {
            biomarkers,
            perturbation,
            assessment,
            advisories: biomarkers.advisories(),
        };

        if let Some(session) = self.session.as_mut() {
            info!(
                "[SCAN] Scan {} complete: score {} ({}, {:?})",
                session.id, assessment.score, assessment.band, assessment.recommendation
            );
            session.outcome = Some(outcome.clone());
        }
        self.state = ScanState::Completed;
        Ok(outcome)
    }

    fn take_rng(&mut self) -> Result<StdRng> {
        if let Some(rng) = self.rng.take() {
            return Ok(rng);
        }
        self.source.open().inspect_err(|e| {
            warn!("[SCAN] Aborting scan: {e}");
            self.session = None;
            self.state = ScanState::Idle;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;

    fn small_config() -> ScanConfig {
        ScanConfig {
            sample_rate: 2000,
            duration_seconds: 1.0,
            ..ScanConfig::default()
        }
    }

    #[test]
    fn starts_idle_and_ignores_advance() {
        let mut orchestrator = ScanOrchestrator::new(RandomSource::Seeded(1));
        assert_eq!(orchestrator.state(), ScanState::Idle);
        assert!(orchestrator.advance().unwrap().is_empty());
    }

    #[test]
    fn invalid_config_keeps_idle() {
        let mut orchestrator = ScanOrchestrator::new(RandomSource::Seeded(1));
        let config = ScanConfig {
            sample_rate: 0,
            ..small_config()
        };
        assert!(matches!(
            orchestrator.start(config),
            Err(ScanError::Configuration { .. })
        ));
        assert_eq!(orchestrator.state(), ScanState::Idle);
        assert!(orchestrator.session().is_none());
    }

    #[test]
    fn unavailable_randomness_aborts_start() {
        let mut orchestrator = ScanOrchestrator::new(RandomSource::Unavailable);
        for _ in 0..2 {
            assert!(matches!(
                orchestrator.start(small_config()),
                Err(ScanError::RandomnessUnavailable(_))
            ));
            assert_eq!(orchestrator.state(), ScanState::Idle);
            assert!(orchestrator.session().is_none());
            assert!(orchestrator.advance().unwrap().is_empty());
        }
    }

    #[test]
    fn full_scan_emits_expected_events() {
        let mut orchestrator = ScanOrchestrator::new(RandomSource::Seeded(2));
        let id = orchestrator.start(small_config()).unwrap();
        assert_eq!(orchestrator.state(), ScanState::Acquiring);

        let events = orchestrator.run_to_completion().unwrap();
        assert_eq!(orchestrator.state(), ScanState::Completed);
        assert!(events.iter().all(|e| e.scan_id() == id));

        let windows: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Window { window, .. } => Some(window.end),
                _ => None,
            })
            .collect();
        assert_eq!(windows.len(), 100);
        assert_eq!(*windows.last().unwrap(), 2000);

        let spectrum_steps: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Spectrum { step, .. } => Some(*step),
                _ => None,
            })
            .collect();
        assert_eq!(spectrum_steps, (0..100).step_by(5).collect::<Vec<_>>());

        let progress: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                ScanEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(progress.first(), Some(&1));
        assert_eq!(progress.last(), Some(&100));

        let completions = events
            .iter()
            .filter(|e| matches!(e, ScanEvent::Completed { .. }))
            .count();
        assert_eq!(completions, 1);
        assert!(orchestrator.session().unwrap().outcome().is_some());

        // Completed is terminal until the next start.
        assert!(orchestrator.advance().unwrap().is_empty());
    }

    #[test]
    fn restart_discards_the_previous_session() {
        let mut orchestrator = ScanOrchestrator::new(RandomSource::Seeded(3));
        let first = orchestrator.start(small_config()).unwrap();
        for _ in 0..10 {
            orchestrator.advance().unwrap();
        }
        let second = orchestrator.start(small_config()).unwrap();
        assert_ne!(first, second);

        let session = orchestrator.session().unwrap();
        assert_eq!(session.id(), second);
        assert_eq!(session.step(), 0);

        let events = orchestrator.advance().unwrap();
        assert!(events.iter().all(|e| e.scan_id() == second));
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut orchestrator = ScanOrchestrator::new(RandomSource::Seeded(4));
        orchestrator.start(small_config()).unwrap();
        orchestrator.advance().unwrap();
        orchestrator.cancel();
        assert_eq!(orchestrator.state(), ScanState::Idle);
        assert!(orchestrator.session().is_none());
        assert!(orchestrator.advance().unwrap().is_empty());
    }

    #[test]
    fn seeded_scans_are_reproducible() {
        let run = |seed| {
            let mut orchestrator = ScanOrchestrator::new(RandomSource::Seeded(seed));
            orchestrator.start(small_config()).unwrap();
            orchestrator.run_to_completion().unwrap();
            orchestrator.session().unwrap().outcome().cloned().unwrap()
        };
        assert_eq!(run(42), run(42));
    }
}
