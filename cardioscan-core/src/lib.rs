// cardioscan-core/src/lib.rs

//! The core logic for the CardioScan acoustic scan simulator.
//! This crate is responsible for signal synthesis, progressive chunked
//! delivery, spectral estimation and risk scoring. It is completely headless
//! and contains no GUI code.

pub mod config;
pub mod error;
pub mod random;
pub mod risk;
pub mod scan;
pub mod spectral;
pub mod stream;
pub mod synth;

pub use config::ScanConfig;
pub use error::{Result, ScanError};
pub use random::RandomSource;
pub use risk::{Biomarkers, Recommendation, RiskAssessment, RiskBand};
pub use scan::{ScanEvent, ScanOrchestrator, ScanOutcome, ScanState};
pub use spectral::SpectralEstimate;
pub use stream::RevealWindow;
pub use synth::SignalBuffer;
