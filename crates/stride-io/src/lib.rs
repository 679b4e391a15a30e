//! # Stride IO
//!
//! [`Source`](stride_core::Source) and [`Sink`](stride_core::Sink)
//! implementations for the stride scheduler:
//! - **WAV**: File-backed source and sink via hound (feature `wav`, default)
//! - **Memory**: Planar in-memory source and a recording sink
//! - **Ring**: Realtime source fed by a device callback through a lock-free SPSC ring
//!
//! ## Feature Flags
//!
//! - `wav` (default): WAV reading/writing via hound (pure Rust)

pub mod memory;
pub mod ring;

#[cfg(feature = "wav")]
pub mod wav;

pub use memory::{MemorySink, MemorySinkHandle, MemorySource};
pub use ring::{ring, RingProducer, RingSource};

#[cfg(feature = "wav")]
pub use wav::{BitDepth, WavSink, WavSource};
