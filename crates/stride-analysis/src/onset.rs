//! Streaming onset detection
//!
//! [`OnsetDetector`] turns one analysis window per hop into a single
//! detection-function value; [`PeakPicker`] decides which values are onsets.
//!
//! The peak picker compares each value against its neighbourhood, so it has
//! to wait for `post` later hops before deciding: every onset it reports
//! belongs to the hop `post` hops in the past. That delay is the analyzer's
//! drain latency.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;
use stride_core::lower_median;

/// Onset detection function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum DetectionMethod {
    /// Spectral flux (default, good for most audio)
    #[default]
    SpectralFlux,
    /// High-frequency content (good for percussive material)
    HighFrequencyContent,
    /// Energy-based (simple, fast)
    Energy,
    /// Complex domain (magnitude deviation)
    ComplexDomain,
}

/// Per-window onset detection function
pub struct OnsetDetector {
    method: DetectionMethod,
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    prev_magnitudes: Vec<f32>,
}

impl OnsetDetector {
    /// `fft_size` is rounded up to the next power of two.
    pub fn new(method: DetectionMethod, fft_size: usize) -> Self {
        let fft_size = fft_size.max(2).next_power_of_two();
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        Self {
            method,
            fft_size,
            fft,
            window: Self::create_hann_window(fft_size),
            spectrum: vec![Complex::new(0.0, 0.0); fft_size],
            prev_magnitudes: vec![0.0; fft_size / 2],
        }
    }

    pub fn method(&self) -> DetectionMethod {
        self.method
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn reset(&mut self) {
        self.prev_magnitudes.fill(0.0);
    }

    fn create_hann_window(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| {
                let angle = 2.0 * core::f32::consts::PI * i as f32 / (size - 1) as f32;
                0.5 * (1.0 - angle.cos())
            })
            .collect()
    }

    /// Detection value for the most recent window.
    ///
    /// Frames shorter than the FFT size are zero-padded at the front, so the
    /// newest samples always line up with the end of the window.
    pub fn process(&mut self, frame: &[f32]) -> f32 {
        match self.method {
            DetectionMethod::Energy => {
                let energy: f32 = frame.iter().map(|s| s * s).sum();
                energy.sqrt()
            }
            DetectionMethod::SpectralFlux => {
                self.transform(frame);
                let mut flux = 0.0;
                for (i, c) in self.spectrum[..self.fft_size / 2].iter().enumerate() {
                    let mag = c.norm();
                    let diff = mag - self.prev_magnitudes[i];
                    if diff > 0.0 {
                        flux += diff;
                    }
                    self.prev_magnitudes[i] = mag;
                }
                flux
            }
            DetectionMethod::HighFrequencyContent => {
                self.transform(frame);
                let mut hfc = 0.0;
                for (i, c) in self.spectrum[..self.fft_size / 2].iter().enumerate() {
                    hfc += (i + 1) as f32 * c.norm_sqr();
                }
                hfc.sqrt() * 0.01
            }
            DetectionMethod::ComplexDomain => {
                self.transform(frame);
                let mut value = 0.0;
                for (i, c) in self.spectrum[..self.fft_size / 2].iter().enumerate() {
                    let mag = c.norm();
                    let diff = (mag - self.prev_magnitudes[i]).abs();
                    value += diff * diff;
                    self.prev_magnitudes[i] = mag;
                }
                value.sqrt()
            }
        }
    }

    fn transform(&mut self, frame: &[f32]) {
        let n = frame.len().min(self.fft_size);
        let pad = self.fft_size - n;
        let frame = &frame[frame.len() - n..];

        for (i, slot) in self.spectrum.iter_mut().enumerate() {
            let s = if i < pad { 0.0 } else { frame[i - pad] };
            *slot = Complex::new(s * self.window[i], 0.0);
        }
        self.fft.process(&mut self.spectrum);
    }
}

/// Adaptive-threshold peak picker over a sliding window of detection values
///
/// The window holds `pre + 1 + post` values; the candidate sits `post` values
/// from the newest. It is an onset when it is a strict local maximum and
/// exceeds `median(window) + threshold * mean(window)`.
pub struct PeakPicker {
    threshold: f32,
    pre: usize,
    post: usize,
    values: Vec<f32>,
    scratch: Vec<f32>,
    last_threshold: f32,
}

impl PeakPicker {
    pub fn new(threshold: f32, pre: usize, post: usize) -> Self {
        let len = pre + post + 1;
        Self {
            threshold: threshold.max(0.0),
            pre,
            post,
            values: vec![0.0; len],
            scratch: vec![0.0; len],
            last_threshold: 0.0,
        }
    }

    /// Hops between a detection value and the decision about it.
    pub fn delay(&self) -> usize {
        self.post
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold.max(0.0);
    }

    /// Adaptive threshold computed by the last `push`.
    pub fn last_threshold(&self) -> f32 {
        self.last_threshold
    }

    pub fn reset(&mut self) {
        self.values.fill(0.0);
        self.last_threshold = 0.0;
    }

    /// Push the newest detection value; returns whether the value `delay()`
    /// hops back is an onset.
    pub fn push(&mut self, value: f32) -> bool {
        self.values.copy_within(1.., 0);
        let last = self.values.len() - 1;
        self.values[last] = value;

        let mean = self.values.iter().sum::<f32>() / self.values.len() as f32;
        self.scratch.copy_from_slice(&self.values);
        let median = lower_median(&mut self.scratch);
        self.last_threshold = median + self.threshold * mean;

        let candidate = self.values[self.pre];
        let left = if self.pre > 0 {
            self.values[self.pre - 1]
        } else {
            f32::MIN
        };
        let right = if self.post > 0 {
            self.values[self.pre + 1]
        } else {
            f32::MIN
        };

        candidate > left
            && candidate >= right
            && candidate > self.last_threshold
            && candidate > f32::EPSILON
    }
}
