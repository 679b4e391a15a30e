//! # Stride - Streaming Hop Scheduler
//!
//! Drives per-hop audio analysis over a source, one fixed-size hop at a time.
//!
//! ## Architecture
//!
//! Stride is an umbrella crate that coordinates:
//! - **stride-core** - Frame buffers, pipeline config, `Source`/`Sink`/`Transform` traits
//! - **stride-analysis** - Onset detection, YIN pitch tracking, level gating
//! - **stride-io** - WAV, in-memory and realtime ring-buffer collaborators
//!
//! and adds the scheduler itself:
//! - [`Scheduler`] reads hops, runs the transform, reports and persists output
//! - [`drain::LatencyDrain`] flushes look-ahead transforms with zero hops at end-of-stream
//! - [`HistoryBuffer`] and [`NoteEmitter`] turn noisy pitch into note on/off events
//! - [`report`] holds the per-hop observers ([`NoteReporter`], [`OnsetReporter`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use stride::prelude::*;
//!
//! let source = WavSource::open("take.wav")?;
//! let pipeline = PipelineConfig {
//!     hop_size: 256,
//!     frame_size: 1024,
//!     ..Default::default()
//! };
//! let analyzer = NoteAnalyzer::for_pipeline(source.sample_rate(), &pipeline, AnalyzerConfig::default())?;
//! let emitter = NoteEmitter::new(NoteConfig::default(), pipeline.hop_size, source.sample_rate());
//!
//! let mut scheduler = Scheduler::builder(analyzer, NoteReporter::with_writer(emitter, std::io::stdout()))
//!     .config(pipeline)
//!     .source(source)
//!     .build()?;
//!
//! let summary = scheduler.run()?;
//! println!("{} hops, {} drained", summary.hops, summary.drained_hops);
//! # Ok::<(), stride::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `wav` (default) - WAV file source and sink
//! - `serialization` - serde derives on configuration and event types

/// Re-export of stride-core for direct access
pub use stride_core as core;

/// Analysis transforms
pub use stride_analysis as analysis;

/// Sources and sinks
pub use stride_io as io;

pub use stride_core::{
    FrameBuffer, Mode, PipelineConfig, Sample, Sink, Source, Transform, MAX_LATENCY_HOPS,
};

pub use stride_analysis::{AnalysisOutput, AnalyzerConfig, HopAnalysis, NoteAnalyzer};

mod builder;
pub mod drain;
mod emitter;
mod error;
mod history;
pub mod report;
mod scheduler;

pub use builder::SchedulerBuilder;
pub use emitter::{NoteConfig, NoteEmitter, NoteEvent, NoteKind};
pub use error::{Error, Result};
pub use history::HistoryBuffer;
pub use report::{NoteReporter, OnsetReporter, Report};
pub use scheduler::{
    HopInfo, HopPhase, PipelineContext, RunSummary, Scheduler, SchedulerState,
};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{
        HopInfo, NoteConfig, NoteEmitter, NoteEvent, NoteReporter, OnsetReporter, Report,
        RunSummary, Scheduler, SchedulerState,
    };

    pub use crate::core::{FrameBuffer, Mode, PipelineConfig, Sink, Source, Transform};

    pub use crate::analysis::{AnalysisOutput, AnalyzerConfig, NoteAnalyzer};

    pub use crate::io::{MemorySink, MemorySource};

    #[cfg(feature = "wav")]
    pub use crate::io::{BitDepth, WavSink, WavSource};
}
