//! # Spectral Estimation Module
//!
//! Welch power spectral density estimation for the revealed part of a scan.
//!
//! ## Features
//! - High-performance FFT using RustFFT
//! - Periodic Hann windowing for reduced spectral leakage
//! - Per-segment DC offset removal
//! - One-sided density scaling, averaged over 50% overlapping segments

use rustfft::{FftPlanner, num_complex::Complex};
use serde::Serialize;

/// Power spectral density estimate, paired by index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralEstimate {
    /// Bin frequencies in Hz, ascending from 0.
    pub frequencies: Vec<f64>,
    /// Power density per bin (units²/Hz).
    pub power: Vec<f64>,
}

impl SpectralEstimate {
    fn empty() -> Self {
        Self {
            frequencies: Vec::new(),
            power: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Returns the bins with `frequency <= max_hz`.
    ///
    /// Display range restriction is up to the consumer; the estimator itself
    /// always yields the full one-sided spectrum.
    pub fn clipped(&self, max_hz: f64) -> SpectralEstimate {
        let keep = self.frequencies.partition_point(|&f| f <= max_hz);
        SpectralEstimate {
            frequencies: self.frequencies[..keep].to_vec(),
            power: self.power[..keep].to_vec(),
        }
    }

    /// Largest power value within `[low_hz, high_hz]`, if any bin falls there.
    pub fn band_power(&self, low_hz: f64, high_hz: f64) -> Option<f64> {
        self.frequencies
            .iter()
            .zip(&self.power)
            .filter(|(f, _)| (low_hz..=high_hz).contains(*f))
            .map(|(_, &p)| p)
            .reduce(f64::max)
    }

    /// Frequency and power of the strongest bin.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequencies
            .iter()
            .copied()
            .zip(self.power.iter().copied())
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

/// Removes the DC offset from a segment by making its average value zero.
fn remove_dc_offset(segment: &mut [f64]) {
    let len = segment.len();
    if len == 0 {
        return;
    }
    let avg = segment.iter().sum::<f64>() / len as f64;
    for sample in segment.iter_mut() {
        *sample -= avg;
    }
}

/// Periodic Hann window of length `n`, as used for spectral analysis.
///
/// A one-point window is `[1.0]` so that its energy is never zero.
fn hann_window(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos())
        .collect()
}

/// Estimates the power spectral density of `samples` with Welch's method.
///
/// The signal is cut into segments of `segment_length` samples with 50%
/// overlap. Each segment is detrended, Hann-windowed and transformed; the
/// squared magnitudes are averaged across segments and scaled to a one-sided
/// density (`1 / (fs * Σw²)`, non-DC/non-Nyquist bins doubled).
///
/// If `samples` is shorter than `segment_length` the whole input is used as
/// a single segment. Empty input yields an empty estimate. The function keeps
/// no state between calls.
///
/// # Arguments
/// * `samples` - Signal to analyse
/// * `sample_rate` - Sample rate in Hz
/// * `segment_length` - Nominal Welch segment length (1024 by default)
pub fn estimate(samples: &[f64], sample_rate: u32, segment_length: usize) -> SpectralEstimate {
    let nperseg = segment_length.min(samples.len());
    if nperseg == 0 || sample_rate == 0 {
        return SpectralEstimate::empty();
    }

    let step = nperseg - nperseg / 2;
    let segment_count = (samples.len() - nperseg) / step + 1;
    let fs = sample_rate as f64;

    let window = hann_window(nperseg);
    let window_energy: f64 = window.iter().map(|w| w * w).sum();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nperseg);

    let bins = nperseg / 2 + 1;
    let mut accumulated = vec![0.0f64; bins];
    let mut buffer: Vec<Complex<f64>> = Vec::with_capacity(nperseg);
    let mut segment = vec![0.0f64; nperseg];

    for index in 0..segment_count {
        let start = index * step;
        segment.copy_from_slice(&samples[start..start + nperseg]);
        remove_dc_offset(&mut segment);

        buffer.clear();
        buffer.extend(
            segment
                .iter()
                .zip(&window)
                .map(|(&sample, &w)| Complex { re: sample * w, im: 0.0 }),
        );
        fft.process(&mut buffer);

        for (acc, c) in accumulated.iter_mut().zip(buffer.iter()) {
            *acc += c.norm_sqr();
        }
    }

    let scale = 1.0 / (fs * window_energy * segment_count as f64);
    let nyquist_bin = if nperseg % 2 == 0 { Some(bins - 1) } else { None };

    let power = accumulated
        .iter()
        .enumerate()
        .map(|(k, &p)| {
            let one_sided = if k == 0 || Some(k) == nyquist_bin { 1.0 } else { 2.0 };
            p * scale * one_sided
        })
        .collect();

    let frequencies = (0..bins).map(|k| k as f64 * fs / nperseg as f64).collect();

    SpectralEstimate { frequencies, power }
}
