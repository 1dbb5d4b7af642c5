//! # Waveform Synthesis Module
//!
//! Produces the synthetic phonocardiogram for one scan: a low-frequency base
//! tone, white background noise and, for a share of scans, a high-frequency
//! "abnormality" segment in the second half of the recording.

use std::f64::consts::PI;

use log::debug;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

use crate::config::ScanConfig;
use crate::stream::RevealWindow;

/// Frequency of the normal heart-sound component in Hz.
pub const BASE_FREQUENCY_HZ: f64 = 25.0;
pub const BASE_AMPLITUDE: f64 = 0.5;
/// Standard deviation of the background noise.
pub const NOISE_STD: f64 = 0.1;

/// Frequency of the injected abnormal component in Hz.
pub const ABNORMAL_FREQUENCY_HZ: f64 = 150.0;
pub const ABNORMAL_AMPLITUDE: f64 = 0.3;
/// The abnormal tone is present for `t > ABNORMAL_TONE_ONSET_S`.
pub const ABNORMAL_TONE_ONSET_S: f64 = 5.0;
/// Extra noise is present for `t > ABNORMAL_NOISE_ONSET_S`.
pub const ABNORMAL_NOISE_ONSET_S: f64 = 7.0;
pub const ABNORMAL_NOISE_STD: f64 = 0.2;

/// A fixed-length synthesized recording and its time index.
///
/// Read-only once created; consumers share it through an `Arc`.
#[derive(Debug, Clone, Serialize)]
pub struct SignalBuffer {
    sample_rate: u32,
    times: Vec<f64>,
    samples: Vec<f64>,
    abnormal: bool,
}

impl SignalBuffer {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Whether the abnormality segment was injected.
    pub fn is_abnormal(&self) -> bool {
        self.abnormal
    }

    /// Time index and amplitudes revealed by `window`.
    pub fn window(&self, window: &RevealWindow) -> (&[f64], &[f64]) {
        let end = window.end.min(self.samples.len());
        (&self.times[..end], &self.samples[..end])
    }
}

/// Synthesizes the signal for one scan.
///
/// `s[i] = base[i] + noise[i] + abnormality[i]` with `t[i] = i / sample_rate`.
/// With probability `abnormality_probability` a 150 Hz tone is added after
/// 5 s and extra Gaussian noise after 7 s.
///
/// The output depends only on `config` and the state of `rng`, so a seeded
/// generator reproduces the same buffer. `config` must have passed
/// [`ScanConfig::validate`].
pub fn synthesize<R: Rng + ?Sized>(config: &ScanConfig, rng: &mut R) -> SignalBuffer {
    debug_assert!(config.validate().is_ok(), "synthesize called with invalid config");

    let sample_count = config.sample_count();
    let sample_rate = config.sample_rate as f64;

    let times: Vec<f64> = (0..sample_count).map(|i| i as f64 / sample_rate).collect();

    let mut samples: Vec<f64> = times
        .iter()
        .map(|&t| {
            let noise: f64 = rng.sample(StandardNormal);
            BASE_AMPLITUDE * (2.0 * PI * BASE_FREQUENCY_HZ * t).sin() + NOISE_STD * noise
        })
        .collect();

    let abnormal = rng.random::<f64>() < config.abnormality_probability;
    if abnormal {
        for (sample, &t) in samples.iter_mut().zip(times.iter()) {
            if t > ABNORMAL_TONE_ONSET_S {
                *sample += ABNORMAL_AMPLITUDE * (2.0 * PI * ABNORMAL_FREQUENCY_HZ * t).sin();
            }
            if t > ABNORMAL_NOISE_ONSET_S {
                let noise: f64 = rng.sample(StandardNormal);
                *sample += ABNORMAL_NOISE_STD * noise;
            }
        }
    }

    debug!(
        "[SYNTH] {} samples at {} Hz, abnormality {}",
        sample_count,
        config.sample_rate,
        if abnormal { "injected" } else { "absent" }
    );

    SignalBuffer {
        sample_rate: config.sample_rate,
        times,
        samples,
        abnormal,
    }
}
