//! Core types for hop-based audio analysis.
//!
//! # Primary API
//!
//! - [`FrameBuffer`]: Fixed-size planar sample container moved once per hop
//! - [`PipelineConfig`] / [`Mode`]: Hop geometry and scheduling mode
//! - [`Source`] / [`Sink`]: Pull-side and push-side stream collaborators
//! - [`Transform`]: Per-hop analysis collaborator (closures work too)
//!
//! # Example
//!
//! ```
//! use stride_core::{FrameBuffer, Transform};
//!
//! let input = FrameBuffer::allocate(256, 1).unwrap();
//! let mut output = FrameBuffer::allocate(256, 1).unwrap();
//!
//! let mut gain = |input: &FrameBuffer, output: &mut FrameBuffer, _hop: usize| {
//!     for (o, i) in output.channel_mut(0).iter_mut().zip(input.channel(0)) {
//!         *o = i * 0.5;
//!     }
//! };
//! gain.process(&input, &mut output, 256);
//! ```

pub mod config;
pub mod error;
pub mod frame;
pub mod stats;
pub mod stream;
pub mod transform;

pub use config::{Mode, PipelineConfig, MAX_LATENCY_HOPS};
pub use error::{Error, Result};
pub use frame::FrameBuffer;
pub use stats::lower_median;
pub use stream::{Sink, Source};
pub use transform::Transform;

/// Sample type used throughout the pipeline.
pub type Sample = f32;
