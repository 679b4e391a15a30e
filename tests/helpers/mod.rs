//! Test helpers and fixtures for stride integration tests
//!
//! Signal generators, WAV fixtures and a recording transform that keeps
//! every input hop it was handed.

#![allow(dead_code)]

use std::path::Path;
use stride::prelude::*;

/// Default test sample rate (matches common hardware)
pub const TEST_SAMPLE_RATE: u32 = 44100;

/// Standard hop size for deterministic testing
pub const TEST_HOP: usize = 256;

/// Exact passthrough through a float path.
pub const FLOAT_EPSILON: f32 = 1e-6;

/// One step of 16-bit quantization.
pub const INT16_EPSILON: f32 = 1.0 / 32768.0;

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: u32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            (0.5 * (2.0 * std::f64::consts::PI * frequency * t).sin()) as f32
        })
        .collect()
}

/// Generate silence (zero samples).
pub fn generate_silence(num_samples: usize) -> Vec<f32> {
    vec![0.0; num_samples]
}

/// Generate an integer staircase signal [1, 2, ..., n] as f32.
///
/// Each sample is non-zero and unique, so any hop handed to a transform can
/// be traced back to its position in the stream.
pub fn generate_staircase(num_samples: usize) -> Vec<f32> {
    (1..=num_samples).map(|i| i as f32).collect()
}

/// Silence, then a tone, then silence again; lengths in hops.
pub fn tone_burst(frequency: f64, lead_hops: usize, tone_hops: usize, tail_hops: usize) -> Vec<f32> {
    let mut samples = generate_silence(lead_hops * TEST_HOP);
    samples.extend(generate_sine(frequency, TEST_SAMPLE_RATE, tone_hops * TEST_HOP));
    samples.extend(generate_silence(tail_hops * TEST_HOP));
    samples
}

/// Write interleaved samples to a 16-bit WAV file.
pub fn write_wav_fixture(path: &Path, interleaved: &[f32], channels: u16, sample_rate: u32) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV fixture");
    for &s in interleaved {
        writer
            .write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .expect("Failed to write WAV sample");
    }
    writer.finalize().expect("Failed to finalize WAV fixture");
}

/// Read every sample of a WAV file, interleaved and scaled to [-1, 1).
pub fn read_wav(path: &Path) -> (hound::WavSpec, Vec<f32>) {
    let mut reader = hound::WavReader::open(path).expect("Failed to open WAV");
    let spec = reader.spec();
    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().map(|s| s.unwrap()).collect(),
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.unwrap() as f32 * scale)
                .collect()
        }
    };
    (spec, samples)
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Transform that records each input hop (first channel) and passes input
/// through, reporting a fixed latency.
#[derive(Default)]
pub struct RecordingTransform {
    pub inputs: Vec<Vec<f32>>,
    pub latency: usize,
}

impl RecordingTransform {
    pub fn with_latency(latency: usize) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.inputs.len()
    }
}

impl Transform for RecordingTransform {
    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer, _hop_size: usize) {
        self.inputs.push(input.channel(0).to_vec());
        output
            .copy_from(input)
            .expect("input and output share a shape");
    }

    fn latency_hops(&self) -> usize {
        self.latency
    }
}
