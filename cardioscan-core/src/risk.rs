//! # Risk Scoring Module
//!
//! Turns three synthetic biomarkers into a bounded LVNC risk score and the
//! two classification bands shown to the operator.
//!
//! The metric card and the clinical recommendation use different cutoffs
//! (60/40 and 70/45). Both are user-visible and are kept as they are.

use std::fmt;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const NC_RATIO_RANGE: (f64, f64) = (1.5, 2.8);
pub const EJECTION_FRACTION_RANGE: (f64, f64) = (35.0, 65.0);
pub const TRABECULATION_RANGE: (f64, f64) = (0.4, 0.9);
/// Inclusive upper bound of the random perturbation term.
pub const MAX_PERTURBATION: u8 = 15;

const NC_WEIGHT: f64 = 30.0;
const EF_WEIGHT: f64 = 25.0;
const TRABECULATION_WEIGHT: f64 = 20.0;
const EF_REFERENCE: f64 = 65.0;

/// Gauge colour zones as `(low, high, label)` score ranges.
pub const GAUGE_ZONES: [(u8, u8, &str); 3] = [(0, 40, "low"), (40, 60, "moderate"), (60, 100, "high")];

/// Synthetic biomarkers drawn at the end of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Biomarkers {
    pub nc_ratio: f64,
    /// Percent.
    pub ejection_fraction: f64,
    pub trabeculation_score: f64,
}

fn in_range(value: f64, (low, high): (f64, f64)) -> bool {
    (low..=high).contains(&value)
}

impl Biomarkers {
    /// Draws each marker uniformly from its documented range.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            nc_ratio: rng.random_range(NC_RATIO_RANGE.0..NC_RATIO_RANGE.1),
            ejection_fraction: rng.random_range(EJECTION_FRACTION_RANGE.0..EJECTION_FRACTION_RANGE.1),
            trabeculation_score: rng.random_range(TRABECULATION_RANGE.0..TRABECULATION_RANGE.1),
        }
    }

    pub fn is_within_ranges(&self) -> bool {
        in_range(self.nc_ratio, NC_RATIO_RANGE)
            && in_range(self.ejection_fraction, EJECTION_FRACTION_RANGE)
            && in_range(self.trabeculation_score, TRABECULATION_RANGE)
    }

    /// Per-marker advisory flags, independent of the composite score.
    pub fn advisories(&self) -> MarkerAdvisories {
        MarkerAdvisories {
            nc_ratio: if self.nc_ratio > 2.0 { ">2.0 suggests LVNC" } else { "Normal" },
            ejection_fraction: if self.ejection_fraction < 40.0 { "Concern <40%" } else { "Normal" },
            trabeculation_score: if self.trabeculation_score > 0.7 { "High" } else { "Normal" },
        }
    }

    pub fn nc_ratio_display(&self) -> String {
        format!("{:.2}", self.nc_ratio)
    }

    pub fn ejection_fraction_display(&self) -> String {
        format!("{:.1}%", self.ejection_fraction)
    }

    pub fn trabeculation_display(&self) -> String {
        format!("{:.2}", self.trabeculation_score)
    }
}

/// Advisory strings shown under each metric card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerAdvisories {
    pub nc_ratio: &'static str,
    pub ejection_fraction: &'static str,
    pub trabeculation_score: &'static str,
}

/// Coarse band shown on the risk metric card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Moderate,
    High,
}

impl RiskBand {
    /// `> 60` high, `> 40` moderate, otherwise low.
    pub fn from_score(score: u8) -> Self {
        if score > 60 {
            Self::High
        } else if score > 40 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High Risk",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Clinical recommendation band, with its own cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    UrgentReferral,
    ModerateSuspicion,
    LowProbability,
}

impl Recommendation {
    /// `> 70` urgent referral, `> 45` moderate suspicion, otherwise low probability.
    pub fn from_score(score: u8) -> Self {
        if score > 70 {
            Self::UrgentReferral
        } else if score > 45 {
            Self::ModerateSuspicion
        } else {
            Self::LowProbability
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Self::UrgentReferral => "High Probability of LVNC Detected",
            Self::ModerateSuspicion => "Moderate Suspicion for LVNC",
            Self::LowProbability => "Low Probability of LVNC",
        }
    }

    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            Self::UrgentReferral => &[
                "Urgent cardiology referral",
                "Cardiac MRI with contrast",
                "24-hour Holter monitoring",
                "Family screening advised",
            ],
            Self::ModerateSuspicion => &[
                "Echocardiogram with contrast",
                "ECG and clinical evaluation",
                "Consider cardiac MRI if symptoms progress",
            ],
            Self::LowProbability => &[
                "Routine follow-up if symptomatic",
                "Re-evaluate if new symptoms emerge",
            ],
        }
    }
}

/// Composite score with both classification bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Always in `[0, 100]`.
    pub score: u8,
    pub band: RiskBand,
    pub recommendation: Recommendation,
}

impl RiskAssessment {
    pub fn score_display(&self) -> String {
        format!("{}/100", self.score)
    }
}

/// Draws the perturbation term uniformly from `0..=15`.
pub fn draw_perturbation<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.random_range(0..=MAX_PERTURBATION)
}

/// Weighted sum of the markers before flooring and clamping.
pub fn raw_score(markers: &Biomarkers, perturbation: u8) -> f64 {
    NC_WEIGHT * (markers.nc_ratio - NC_RATIO_RANGE.0)
        + EF_WEIGHT * (1.0 - markers.ejection_fraction / EF_REFERENCE)
        + TRABECULATION_WEIGHT * markers.trabeculation_score
        + perturbation as f64
}

/// Scores `markers` and classifies the result.
///
/// `score = clamp(floor(raw), 0, 100)`. Both bands are derived from the score
/// independently of each other.
///
/// Markers outside their documented ranges, or a perturbation above 15, are
/// caller bugs and trip a debug assertion.
pub fn score(markers: &Biomarkers, perturbation: u8) -> RiskAssessment {
    debug_assert!(markers.is_within_ranges(), "biomarkers out of range: {markers:?}");
    debug_assert!(perturbation <= MAX_PERTURBATION, "perturbation out of range: {perturbation}");

    let raw = raw_score(markers, perturbation);
    let score = raw.floor().clamp(0.0, 100.0) as u8;

    debug!("[RISK] raw {raw:.3} -> score {score}");

    RiskAssessment {
        score,
        band: RiskBand::from_score(score),
        recommendation: Recommendation::from_score(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const REFERENCE: Biomarkers = Biomarkers {
        nc_ratio: 2.5,
        ejection_fraction: 35.0,
        trabeculation_score: 0.85,
    };

    #[test]
    fn reference_markers_without_perturbation() {
        assert!((raw_score(&REFERENCE, 0) - 58.538).abs() < 1e-3);
        let assessment = score(&REFERENCE, 0);
        assert_eq!(assessment.score, 58);
        assert_eq!(assessment.band, RiskBand::Moderate);
        assert_eq!(assessment.recommendation, Recommendation::ModerateSuspicion);
    }

    #[test]
    fn reference_markers_with_full_perturbation() {
        let assessment = score(&REFERENCE, 15);
        assert_eq!(assessment.score, 73);
        assert_eq!(assessment.band, RiskBand::High);
        assert_eq!(assessment.band.label(), "High Risk");
        assert_eq!(assessment.recommendation, Recommendation::UrgentReferral);
    }

    #[test]
    fn bands_use_their_own_thresholds() {
        let cases = [
            (40, RiskBand::Low, Recommendation::LowProbability),
            (41, RiskBand::Moderate, Recommendation::LowProbability),
            (45, RiskBand::Moderate, Recommendation::LowProbability),
            (46, RiskBand::Moderate, Recommendation::ModerateSuspicion),
            (60, RiskBand::Moderate, Recommendation::ModerateSuspicion),
            (61, RiskBand::High, Recommendation::ModerateSuspicion),
            (70, RiskBand::High, Recommendation::ModerateSuspicion),
            (71, RiskBand::High, Recommendation::UrgentReferral),
        ];
        for (score, band, recommendation) in cases {
            assert_eq!(RiskBand::from_score(score), band, "score {score}");
            assert_eq!(Recommendation::from_score(score), recommendation, "score {score}");
        }
    }

    #[test]
    fn score_is_monotonic_in_each_marker() {
        let base = Biomarkers {
            nc_ratio: 1.5,
            ejection_fraction: 65.0,
            trabeculation_score: 0.4,
        };
        let mut previous = score(&base, 7).score;
        for i in 1..=25 {
            let markers = Biomarkers { nc_ratio: 1.5 + i as f64 * 0.05, ..base };
            let current = score(&markers, 7).score;
            assert!(current >= previous);
            previous = current;
        }
        let mut previous = score(&base, 7).score;
        for ef in (35..65).rev() {
            let markers = Biomarkers { ejection_fraction: ef as f64, ..base };
            let current = score(&markers, 7).score;
            assert!(current >= previous);
            previous = current;
        }
        let mut previous = score(&base, 7).score;
        for i in 1..=9 {
            let markers = Biomarkers { trabeculation_score: 0.4 + i as f64 * 0.05, ..base };
            let current = score(&markers, 7).score;
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn extreme_markers_stay_in_bounds() {
        let worst = Biomarkers {
            nc_ratio: 2.8,
            ejection_fraction: 35.0,
            trabeculation_score: 0.9,
        };
        let best = Biomarkers {
            nc_ratio: 1.5,
            ejection_fraction: 65.0,
            trabeculation_score: 0.4,
        };
        assert_eq!(score(&worst, 15).score, 83);
        assert_eq!(score(&best, 0).score, 8);
    }

    #[test]
    fn random_draws_respect_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen_max = false;
        for _ in 0..2000 {
            let markers = Biomarkers::draw(&mut rng);
            assert!(markers.is_within_ranges());
            let perturbation = draw_perturbation(&mut rng);
            assert!(perturbation <= MAX_PERTURBATION);
            seen_max |= perturbation == MAX_PERTURBATION;
            assert!(score(&markers, perturbation).score <= 100);
        }
        assert!(seen_max);
    }

    #[test]
    fn advisories_follow_marker_cutoffs() {
        let advisories = REFERENCE.advisories();
        assert_eq!(advisories.nc_ratio, ">2.0 suggests LVNC");
        assert_eq!(advisories.ejection_fraction, "Concern <40%");
        assert_eq!(advisories.trabeculation_score, "High");

        let normal = Biomarkers {
            nc_ratio: 2.0,
            ejection_fraction: 40.0,
            trabeculation_score: 0.7,
        }
        .advisories();
        assert_eq!(normal.nc_ratio, "Normal");
        assert_eq!(normal.ejection_fraction, "Normal");
        assert_eq!(normal.trabeculation_score, "Normal");
    }

    #[test]
    fn display_precision() {
        let markers = Biomarkers {
            nc_ratio: 2.346,
            ejection_fraction: 47.26,
            trabeculation_score: 0.5,
        };
        assert_eq!(markers.nc_ratio_display(), "2.35");
        assert_eq!(markers.ejection_fraction_display(), "47.3%");
        assert_eq!(markers.trabeculation_display(), "0.50");
        assert_eq!(score(&REFERENCE, 0).score_display(), "58/100");
    }

    #[test]
    #[should_panic(expected = "biomarkers out of range")]
    #[cfg(debug_assertions)]
    fn out_of_range_markers_fail_fast() {
        let markers = Biomarkers { nc_ratio: 3.5, ..REFERENCE };
        score(&markers, 0);
    }
}
