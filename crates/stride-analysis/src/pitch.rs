//! YIN fundamental-frequency estimation
//!
//! de Cheveigné & Kawahara (2002). For each lag τ the squared difference
//! between the window and itself shifted by τ is normalized by its running
//! mean; the first dip below the tolerance is the period. A parabola through
//! the dip and its neighbours refines it below one sample.

/// Dips shallower than this are unvoiced even when nothing beats the tolerance.
const MAX_APERIODICITY: f32 = 0.5;

/// Pitch estimate for one window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PitchResult {
    /// Hz, 0.0 when unvoiced.
    pub frequency: f32,
    /// `1 - aperiodicity` of the chosen dip.
    pub confidence: f32,
    pub midi_note: Option<u8>,
}

impl PitchResult {
    pub fn is_voiced(&self) -> bool {
        self.frequency > 0.0 && self.confidence > 0.0
    }
}

/// YIN estimator with reusable lag buffers.
pub struct PitchDetector {
    sample_rate: u32,
    min_lag: usize,
    max_lag: usize,
    tolerance: f32,
    /// Normalized difference d'(τ), index = lag.
    yin: Vec<f32>,
}

impl PitchDetector {
    /// 50 - 2000 Hz.
    pub fn new(sample_rate: u32) -> Self {
        Self::with_range(sample_rate, 50.0, 2000.0)
    }

    pub fn with_range(sample_rate: u32, min_freq: f32, max_freq: f32) -> Self {
        let rate = sample_rate as f32;
        let max_lag = (rate / min_freq.max(1.0)) as usize;
        let min_lag = ((rate / max_freq.max(1.0)) as usize).max(2);
        Self {
            sample_rate,
            min_lag,
            max_lag,
            tolerance: 0.1,
            yin: vec![1.0; max_lag + 2],
        }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Clamped to 0.01 - 0.5. Lower is stricter.
    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance.clamp(0.01, 0.5);
    }

    /// Samples needed to reach the lowest frequency: two periods.
    pub fn window_len(&self) -> usize {
        2 * self.max_lag
    }

    /// Estimate the pitch of `samples`.
    ///
    /// A window shorter than [`window_len`](Self::window_len) raises the
    /// lowest reachable frequency instead of failing.
    pub fn detect(&mut self, samples: &[f32]) -> PitchResult {
        let max_lag = self.max_lag.min(samples.len() / 2);
        if max_lag <= self.min_lag {
            return PitchResult::default();
        }

        self.normalized_difference(samples, max_lag);

        let Some(lag) = self.pick_lag(max_lag) else {
            return PitchResult::default();
        };
        let period = self.refine(lag, max_lag);
        let frequency = (self.sample_rate as f64 / period) as f32;

        PitchResult {
            frequency,
            confidence: (1.0 - self.yin[lag]).max(0.0),
            midi_note: Some(freq_to_midi(frequency)),
        }
    }

    /// d'(τ) = d(τ) · τ / Σ_{k=1..τ} d(k), d'(0) = 1, with
    /// d(τ) = Σ_j (x[j] - x[j + τ])² over the first `len - max_lag` samples.
    fn normalized_difference(&mut self, samples: &[f32], max_lag: usize) {
        let span = samples.len() - max_lag;
        self.yin[0] = 1.0;

        let mut running = 0.0f64;
        for lag in 1..=max_lag {
            let d: f64 = samples[..span]
                .iter()
                .zip(&samples[lag..lag + span])
                .map(|(&a, &b)| {
                    let diff = (a - b) as f64;
                    diff * diff
                })
                .sum();
            running += d;
            self.yin[lag] = if running > 1e-12 {
                (d * lag as f64 / running) as f32
            } else {
                1.0
            };
        }
    }

    /// First dip under the tolerance (followed down to its floor), else the
    /// deepest dip if it is periodic enough. Taking the first dip rather than
    /// the deepest avoids locking onto a subharmonic.
    fn pick_lag(&self, max_lag: usize) -> Option<usize> {
        let range = self.min_lag..max_lag;

        if let Some(mut lag) = range.clone().find(|&l| self.yin[l] < self.tolerance) {
            while lag + 1 < max_lag && self.yin[lag + 1] < self.yin[lag] {
                lag += 1;
            }
            return Some(lag);
        }

        range
            .min_by(|&a, &b| self.yin[a].total_cmp(&self.yin[b]))
            .filter(|&lag| self.yin[lag] < MAX_APERIODICITY)
    }

    fn refine(&self, lag: usize, max_lag: usize) -> f64 {
        if lag == 0 || lag + 1 > max_lag {
            return lag as f64;
        }
        let (a, b, c) = (
            self.yin[lag - 1] as f64,
            self.yin[lag] as f64,
            self.yin[lag + 1] as f64,
        );
        let curvature = a - 2.0 * b + c;
        if curvature.abs() < 1e-12 {
            return lag as f64;
        }
        lag as f64 + 0.5 * (a - c) / curvature
    }
}

/// Nearest MIDI note: `floor(69 + 12 · log2(f / 440) + 0.5)`, clamped to
/// 0..=127. Non-positive frequencies map to 0.
pub fn freq_to_midi(freq: f32) -> u8 {
    if freq <= 0.0 {
        return 0;
    }
    let note = 69.0 + 12.0 * (freq / 440.0).log2();
    (note + 0.5).floor().clamp(0.0, 127.0) as u8
}

pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * ((note as f32 - 69.0) / 12.0).exp2()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    fn tone(freq: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (std::f32::consts::TAU * freq * i as f32 / SR as f32).sin() * 0.8)
            .collect()
    }

    #[test]
    fn test_a440_is_midi_69() {
        let mut detector = PitchDetector::new(SR);
        let result = detector.detect(&tone(440.0, detector.window_len()));

        assert!(result.is_voiced());
        assert!((result.frequency - 440.0).abs() < 2.0, "got {}", result.frequency);
        assert_eq!(result.midi_note, Some(69));
        assert!(result.confidence > 0.9);
    }

    #[test]
    fn test_range_of_tones() {
        let mut detector = PitchDetector::new(SR);
        for freq in [82.4, 196.0, 523.3, 1244.5] {
            let result = detector.detect(&tone(freq, 4096));
            let error = (result.frequency - freq).abs() / freq;
            assert!(error < 0.02, "{} Hz read as {}", freq, result.frequency);
        }
    }

    #[test]
    fn test_short_window_raises_floor() {
        let mut detector = PitchDetector::new(SR);
        // 1024 samples reach down to ~86 Hz, plenty for 330 Hz
        let result = detector.detect(&tone(330.0, 1024));
        assert!((result.frequency - 330.0).abs() / 330.0 < 0.02);

        assert_eq!(detector.detect(&tone(330.0, 20)), PitchResult::default());
    }

    #[test]
    fn test_silence_and_noise_unvoiced() {
        let mut detector = PitchDetector::new(SR);
        assert!(!detector.detect(&[0.0; 2048]).is_voiced());

        let mut state = 0x2545_f491u32;
        let noise: Vec<f32> = (0..2048)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as f32 / u32::MAX as f32 - 0.5
            })
            .collect();
        let result = detector.detect(&noise);
        assert!(!result.is_voiced() || result.confidence < 0.7);
    }

    #[test]
    fn test_tolerance_clamped() {
        let mut detector = PitchDetector::new(SR);
        detector.set_tolerance(2.0);
        assert_eq!(detector.tolerance(), 0.5);
        detector.set_tolerance(0.0);
        assert_eq!(detector.tolerance(), 0.01);
    }

    #[test]
    fn test_midi_mapping() {
        assert_eq!(freq_to_midi(440.0), 69);
        assert_eq!(freq_to_midi(261.63), 60);
        assert_eq!(freq_to_midi(0.0), 0);
        assert_eq!(freq_to_midi(-3.0), 0);
        assert_eq!(freq_to_midi(1.0), 0);
        assert_eq!(freq_to_midi(40000.0), 127);
        for note in [21, 45, 69, 100, 127] {
            assert_eq!(freq_to_midi(midi_to_freq(note)), note);
        }
    }
}
