//! # Stride Analysis
//!
//! Per-hop audio analysis for the stride scheduler.
//!
//! This crate provides:
//! - **Onset detection**: Streaming spectral flux / HFC / energy / complex-domain
//!   detection functions with an adaptive peak picker
//! - **Pitch detection**: Monophonic pitch tracking using the YIN algorithm
//! - **Level gating**: Mean-energy level in dB and silence detection
//! - **NoteAnalyzer**: All of the above packaged as a [`stride_core::Transform`]
//!
//! ## Example
//!
//! ```rust
//! use stride_analysis::{AnalysisOutput, AnalyzerConfig, NoteAnalyzer};
//! use stride_core::{FrameBuffer, Transform};
//!
//! let hop = 256;
//! let mut analyzer = NoteAnalyzer::new(44100, hop, AnalyzerConfig::default()).unwrap();
//!
//! let input = FrameBuffer::allocate(hop, 1).unwrap();
//! let mut output = FrameBuffer::allocate(hop, 1).unwrap();
//! analyzer.process(&input, &mut output, hop);
//!
//! let analysis = analyzer.hop_analysis();
//! assert!(analysis.silent);
//! ```

pub mod analyzer;
pub mod level;
pub mod onset;
pub mod pitch;

pub use analyzer::{AnalysisOutput, AnalyzerConfig, HopAnalysis, NoteAnalyzer};
pub use level::{is_silent, level_db, level_to_velocity, SILENCE_FLOOR_DB};
pub use onset::{DetectionMethod, OnsetDetector, PeakPicker};
pub use pitch::{freq_to_midi, midi_to_freq, PitchDetector, PitchResult};
