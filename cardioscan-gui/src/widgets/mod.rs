//! # Widgets Module
//!
//! Canvas widgets for the scan display.

pub mod risk_gauge;
pub mod spectrum;
pub mod waveform;
