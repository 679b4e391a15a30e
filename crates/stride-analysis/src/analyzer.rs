//! Onset + pitch + level analysis as a per-hop [`Transform`].

use crate::level::{level_db, SILENCE_FLOOR_DB};
use crate::onset::{DetectionMethod, OnsetDetector, PeakPicker};
use crate::pitch::{PitchDetector, PitchResult};
use stride_core::{Error, FrameBuffer, PipelineConfig, Result, Transform};

/// Analyzer settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AnalyzerConfig {
    /// Onset analysis window in samples (>= hop size).
    pub frame_size: usize,
    /// Pitch window as a multiple of `frame_size`.
    pub pitch_window_factor: usize,
    pub method: DetectionMethod,
    /// Peak-picking threshold (0.0 - 1.0 typical).
    pub threshold: f32,
    /// Hops below this level are flagged silent.
    pub silence_db: f32,
    pub min_freq: f32,
    pub max_freq: f32,
    /// Peak picker look-behind in hops.
    pub peak_pre: usize,
    /// Peak picker look-ahead in hops; also the drain latency.
    pub peak_post: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            frame_size: 512,
            pitch_window_factor: 4,
            method: DetectionMethod::SpectralFlux,
            threshold: 0.3,
            silence_db: -90.0,
            min_freq: 50.0,
            max_freq: 2000.0,
            peak_pre: 1,
            peak_post: 3,
        }
    }
}

/// What the analyzer learned from the last hop.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct HopAnalysis {
    /// An onset was confirmed this hop (it happened `onset_delay_hops` ago).
    pub onset: bool,
    /// Raw pitch estimate in Hz, 0.0 when unvoiced.
    pub pitch_hz: f32,
    pub pitch_confidence: f32,
    pub level_db: f32,
    /// Level fell below the configured silence threshold.
    pub silent: bool,
    pub onset_delay_hops: usize,
}

impl Default for HopAnalysis {
    fn default() -> Self {
        Self {
            onset: false,
            pitch_hz: 0.0,
            pitch_confidence: 0.0,
            level_db: SILENCE_FLOOR_DB,
            silent: true,
            onset_delay_hops: 0,
        }
    }
}

/// Transforms that expose a per-hop [`HopAnalysis`].
pub trait AnalysisOutput {
    fn hop_analysis(&self) -> HopAnalysis;
}

/// Reference analyzer: onset detection, YIN pitch and level gating per hop.
///
/// Output is the input passed through, with an optional click mixed in on
/// every confirmed onset.
pub struct NoteAnalyzer {
    config: AnalyzerConfig,
    hop_size: usize,
    onset: OnsetDetector,
    picker: PeakPicker,
    pitch: PitchDetector,
    /// Sliding mono window, newest samples at the end.
    window: Vec<f32>,
    mono: Vec<f32>,
    click: Option<Vec<f32>>,
    last: HopAnalysis,
    last_pitch: PitchResult,
}

impl NoteAnalyzer {
    pub fn new(sample_rate: u32, hop_size: usize, config: AnalyzerConfig) -> Result<Self> {
        if hop_size == 0 || config.frame_size < hop_size {
            return Err(Error::InvalidConfig(format!(
                "analyzer frame_size {} must be >= hop_size {} > 0",
                config.frame_size, hop_size
            )));
        }
        if sample_rate == 0 {
            return Err(Error::InvalidConfig("sample_rate must be non-zero".into()));
        }
        if !(config.min_freq > 0.0 && config.min_freq < config.max_freq) {
            return Err(Error::InvalidConfig(format!(
                "pitch range {}-{} Hz is empty",
                config.min_freq, config.max_freq
            )));
        }

        let window_len = config.frame_size * config.pitch_window_factor.max(1);

        Ok(Self {
            onset: OnsetDetector::new(config.method, config.frame_size),
            picker: PeakPicker::new(config.threshold, config.peak_pre, config.peak_post),
            pitch: PitchDetector::with_range(sample_rate, config.min_freq, config.max_freq),
            window: vec![0.0; window_len],
            mono: vec![0.0; hop_size],
            click: None,
            last: HopAnalysis {
                onset_delay_hops: config.peak_post,
                ..Default::default()
            },
            last_pitch: PitchResult::default(),
            hop_size,
            config,
        })
    }

    /// Analyzer matching a scheduler's hop geometry: `pipeline.hop_size` per
    /// hop and a `pipeline.frame_size` analysis window, replacing
    /// `config.frame_size`.
    pub fn for_pipeline(
        sample_rate: u32,
        pipeline: &PipelineConfig,
        config: AnalyzerConfig,
    ) -> Result<Self> {
        let config = AnalyzerConfig {
            frame_size: pipeline.frame_size,
            ..config
        };
        Self::new(sample_rate, pipeline.hop_size, config)
    }

    /// Mix `samples` (truncated to one hop) into the output on every onset.
    pub fn with_click(mut self, mut samples: Vec<f32>) -> Self {
        samples.truncate(self.hop_size);
        self.click = Some(samples);
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn last_pitch(&self) -> PitchResult {
        self.last_pitch
    }

    fn push_window(&mut self, hop: usize) {
        let len = self.window.len();
        self.window.copy_within(hop.., 0);
        self.window[len - hop..].copy_from_slice(&self.mono[..hop]);
    }
}

impl Transform for NoteAnalyzer {
    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer, hop_size: usize) {
        let hop = hop_size.min(input.length()).min(self.mono.len());
        input.downmix_into(&mut self.mono[..hop]);
        self.push_window(hop);

        let onset_frame = &self.window[self.window.len() - self.config.frame_size..];
        let value = self.onset.process(onset_frame);
        let onset = self.picker.push(value);

        // Newest samples only, so a fresh note reaches the tracker quickly
        let pitch_len = self.pitch.window_len().min(self.window.len());
        self.last_pitch = self.pitch.detect(&self.window[self.window.len() - pitch_len..]);
        let level = level_db(&self.mono[..hop]);

        self.last = HopAnalysis {
            onset,
            pitch_hz: if self.last_pitch.is_voiced() {
                self.last_pitch.frequency
            } else {
                0.0
            },
            pitch_confidence: self.last_pitch.confidence,
            level_db: level,
            silent: level < self.config.silence_db,
            onset_delay_hops: self.picker.delay(),
        };

        if output.copy_from(input).is_err() {
            output.zero();
        }
        if let (true, Some(click)) = (onset, &self.click) {
            for ch in 0..output.channels() {
                for (o, c) in output.channel_mut(ch).iter_mut().zip(click) {
                    *o += c;
                }
            }
        }
    }

    fn latency_hops(&self) -> usize {
        self.picker.delay()
    }

    fn hop_size(&self) -> Option<usize> {
        Some(self.hop_size)
    }

    fn frame_size(&self) -> Option<usize> {
        Some(self.config.frame_size)
    }
}

impl AnalysisOutput for NoteAnalyzer {
    fn hop_analysis(&self) -> HopAnalysis {
        self.last
    }
}
