//! # Storage Module
//!
//! Saves the final scan report as JSON so a completed scan can be attached
//! to the patient record. Settings persistence lives on `ScanConfig` itself.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use cardioscan_core::{ScanConfig, ScanOutcome};
use serde::Serialize;

pub const SETTINGS_PATH: &str = "scan_settings.json";
pub const REPORT_PATH: &str = "scan_report.json";

/// Patient details typed into the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientInfo {
    pub patient_id: String,
    pub age: u8,
}

impl Default for PatientInfo {
    fn default() -> Self {
        Self {
            patient_id: String::new(),
            age: 45,
        }
    }
}

/// Everything worth keeping from one completed scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport<'a> {
    pub scan_id: u64,
    pub patient: &'a PatientInfo,
    /// Scan duration picked in the sidebar; recorded only.
    pub selected_scan_duration: u32,
    pub config: &'a ScanConfig,
    pub outcome: &'a ScanOutcome,
    pub risk_score: String,
    pub risk_band: &'static str,
    pub recommendation: &'static str,
}

impl<'a> ScanReport<'a> {
    pub fn new(
        scan_id: u64,
        patient: &'a PatientInfo,
        selected_scan_duration: u32,
        config: &'a ScanConfig,
        outcome: &'a ScanOutcome,
    ) -> Self {
        Self {
            scan_id,
            patient,
            selected_scan_duration,
            config,
            outcome,
            risk_score: outcome.assessment.score_display(),
            risk_band: outcome.assessment.band.label(),
            recommendation: outcome.assessment.recommendation.headline(),
        }
    }
}

/// Writes `report` to `path` as pretty-printed JSON.
pub fn save_report(report: &ScanReport<'_>, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json_string =
        serde_json::to_string_pretty(report).context("failed to serialize scan report")?;
    let mut file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(json_string.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardioscan_core::{RandomSource, ScanOrchestrator};

    #[test]
    fn report_contains_score_and_patient() {
        let config = ScanConfig {
            sample_rate: 1000,
            duration_seconds: 1.0,
            ..ScanConfig::default()
        };
        let mut orchestrator = ScanOrchestrator::new(RandomSource::Seeded(8));
        let scan_id = orchestrator.start(config.clone()).unwrap();
        orchestrator.run_to_completion().unwrap();
        let outcome = orchestrator.session().unwrap().outcome().unwrap().clone();

        let patient = PatientInfo {
            patient_id: "P-0042".to_string(),
            age: 61,
        };
        let report = ScanReport::new(scan_id, &patient, 15, &config, &outcome);

        let path = std::env::temp_dir().join(format!("cardioscan_report_{}.json", std::process::id()));
        save_report(&report, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["patient"]["patient_id"], "P-0042");
        assert_eq!(value["selected_scan_duration"], 15);
        assert_eq!(
            value["outcome"]["assessment"]["score"],
            u64::from(outcome.assessment.score)
        );
        assert_eq!(value["risk_score"], outcome.assessment.score_display());
    }
}
