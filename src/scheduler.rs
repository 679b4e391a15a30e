//! Streaming hop scheduler.
//!
//! Pulls one hop at a time from a [`Source`], runs the [`Transform`], hands
//! the result to a [`Report`] and optionally persists the output to a
//! [`Sink`]. In file mode an exhausted source moves the scheduler into the
//! latency drain before it stops; in device mode it just waits for more input.

use crate::drain::LatencyDrain;
use crate::report::Report;
use crate::{Result, SchedulerBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stride_core::{Error as CoreError, FrameBuffer, Mode, PipelineConfig, Sink, Source, Transform};

/// Scheduler lifecycle. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Draining,
    Stopped,
}

/// Where in the lifecycle a hop was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopPhase {
    /// Real input read from the source.
    Streaming,
    /// Zero input pumped after end-of-stream; `index` counts from 0.
    Draining { index: usize },
    /// Teardown notification, no hop was processed.
    Finished,
}

/// Per-hop context handed to reporters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopInfo {
    /// Full hops read so far. Drained hops report the final position.
    pub hop_count: u64,
    pub hop_size: usize,
    pub sample_rate: u32,
    pub channels: usize,
    pub phase: HopPhase,
}

impl HopInfo {
    /// Stream position in seconds: `hop_count * hop_size / sample_rate`.
    pub fn time_seconds(&self) -> f64 {
        self.time_at(self.hop_count)
    }

    /// Time of an arbitrary hop index at this hop geometry.
    pub fn time_at(&self, hop_count: u64) -> f64 {
        hop_count as f64 * self.hop_size as f64 / self.sample_rate as f64
    }

    pub fn is_draining(&self) -> bool {
        matches!(self.phase, HopPhase::Draining { .. })
    }
}

/// Buffers and stream position owned by one scheduler.
#[derive(Debug)]
pub struct PipelineContext {
    pub(crate) input: FrameBuffer,
    pub(crate) output: FrameBuffer,
    hop_count: u64,
    hop_size: usize,
    sample_rate: u32,
}

impl PipelineContext {
    pub fn new(hop_size: usize, channels: usize, sample_rate: u32) -> Result<Self> {
        Ok(Self {
            input: FrameBuffer::allocate(hop_size, channels)?,
            output: FrameBuffer::allocate(hop_size, channels)?,
            hop_count: 0,
            hop_size,
            sample_rate,
        })
    }

    pub fn input(&self) -> &FrameBuffer {
        &self.input
    }

    pub fn output(&self) -> &FrameBuffer {
        &self.output
    }

    pub fn hop_count(&self) -> u64 {
        self.hop_count
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.input.channels()
    }

    pub fn hop_info(&self, phase: HopPhase) -> HopInfo {
        HopInfo {
            hop_count: self.hop_count,
            hop_size: self.hop_size,
            sample_rate: self.sample_rate,
            channels: self.channels(),
            phase,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.hop_count += 1;
    }
}

/// Outcome of a scheduler run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Full hops read from the source.
    pub hops: u64,
    pub drained_hops: usize,
    /// A partial trailing hop was dropped at end-of-stream.
    pub remainder_discarded: bool,
    /// The stop signal ended the run.
    pub stopped_early: bool,
    /// First sink failure; later hops were not persisted.
    pub sink_error: Option<crate::Error>,
}

/// Hop scheduler driving a transform and a reporter.
///
/// # Example
///
/// ```
/// use stride::io::MemorySource;
/// use stride::{FrameBuffer, Scheduler};
///
/// let source = MemorySource::mono(vec![0.5; 1000], 8000);
/// let gain = |input: &FrameBuffer, output: &mut FrameBuffer, _hop: usize| {
///     for (o, i) in output.channel_mut(0).iter_mut().zip(input.channel(0)) {
///         *o = i * 2.0;
///     }
/// };
///
/// let mut scheduler = Scheduler::builder(gain, ())
///     .hop_size(256)
///     .frame_size(256)
///     .source(source)
///     .build()
///     .unwrap();
///
/// let summary = scheduler.run().unwrap();
/// assert_eq!(summary.hops, 3);
/// assert!(summary.remainder_discarded);
/// ```
pub struct Scheduler<T, R> {
    pub(crate) transform: T,
    pub(crate) reporter: R,
    pub(crate) source: Option<Box<dyn Source>>,
    pub(crate) sink: Option<Box<dyn Sink>>,
    pub(crate) context: PipelineContext,
    pub(crate) config: PipelineConfig,
    pub(crate) drain: LatencyDrain,
    pub(crate) state: SchedulerState,
    pub(crate) stop: Arc<AtomicBool>,
    pub(crate) summary: RunSummary,
}

impl<T, R> Scheduler<T, R>
where
    T: Transform,
    R: Report<T>,
{
    pub fn builder(transform: T, reporter: R) -> SchedulerBuilder<T, R> {
        SchedulerBuilder::new(transform, reporter)
    }

    /// Advance by at most one hop, or run the whole drain.
    ///
    /// In device mode a `Running` result can mean no full hop was available.
    pub fn step(&mut self) -> Result<SchedulerState> {
        match self.state {
            SchedulerState::Stopped => {}
            SchedulerState::Running => {
                if self.stop_requested() {
                    self.summary.stopped_early = true;
                    self.shutdown()?;
                } else {
                    self.read_hop()?;
                }
            }
            SchedulerState::Draining => {
                self.run_drain();
                self.shutdown()?;
            }
        }
        Ok(self.state)
    }

    /// Run a file-backed pipeline to completion.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.config.mode == Mode::DeviceBacked {
            return Err(CoreError::InvalidConfig(
                "run() needs a file-backed pipeline; drive device mode with pump()".into(),
            )
            .into());
        }
        while self.step()? != SchedulerState::Stopped {}
        Ok(std::mem::take(&mut self.summary))
    }

    /// Process every full hop currently available and return how many.
    ///
    /// Meant for device mode, called whenever the device callback has pushed
    /// more input. In file mode it stops at end-of-stream without draining;
    /// follow up with [`step`](Self::step) or [`run`](Self::run).
    pub fn pump(&mut self) -> Result<usize> {
        let mut processed = 0;
        while self.state == SchedulerState::Running {
            if self.stop_requested() {
                self.summary.stopped_early = true;
                self.shutdown()?;
                break;
            }
            if !self.read_hop()? {
                break;
            }
            processed += 1;
        }
        Ok(processed)
    }

    /// Request a stop before the next hop.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Shared flag that stops the scheduler when set, e.g. from another thread.
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn hop_count(&self) -> u64 {
        self.context.hop_count()
    }

    pub fn latency_hops(&self) -> usize {
        self.drain.latency_hops()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Progress so far. [`run`](Self::run) hands this out and resets it.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut R {
        &mut self.reporter
    }

    pub fn into_parts(self) -> (T, R) {
        (self.transform, self.reporter)
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Read and process one hop. Returns whether a hop was processed.
    fn read_hop(&mut self) -> Result<bool> {
        let hop_size = self.context.hop_size();
        let read = match self.source.as_mut() {
            Some(source) => source.read(&mut self.context.input),
            None => Ok(0),
        };
        let read = match read {
            Ok(n) => n,
            Err(source) => {
                let hop = self.context.hop_count();
                tracing::error!("Source read failed at hop {}: {}", hop, source);
                if let Err(e) = self.shutdown() {
                    tracing::warn!("Close after source failure also failed: {}", e);
                }
                return Err(CoreError::SourceRead {
                    hop,
                    requested: hop_size,
                    source,
                }
                .into());
            }
        };

        if read < hop_size {
            if self.config.mode == Mode::FileBacked {
                if read > 0 {
                    tracing::warn!(
                        "Discarding {} trailing samples, less than one hop of {}",
                        read,
                        hop_size
                    );
                    self.summary.remainder_discarded = true;
                }
                tracing::debug!(
                    "Processed {} hops of {} samples, draining {} hops",
                    self.context.hop_count(),
                    hop_size,
                    self.drain.latency_hops()
                );
                self.state = SchedulerState::Draining;
            }
            return Ok(false);
        }

        self.transform
            .process(&self.context.input, &mut self.context.output, hop_size);
        let info = self.context.hop_info(HopPhase::Streaming);
        self.reporter.report(&self.transform, &info);
        write_hop(
            &mut self.sink,
            &mut self.summary,
            &self.context.output,
            info.hop_count,
        );
        self.context.advance();
        self.summary.hops += 1;
        Ok(true)
    }

    fn run_drain(&mut self) {
        let write_drained = self.config.write_drained;
        let sink = &mut self.sink;
        let summary = &mut self.summary;
        let ran = self.drain.run(
            &mut self.transform,
            &mut self.reporter,
            &mut self.context,
            &self.stop,
            |output, hop| {
                if write_drained {
                    write_hop(sink, summary, output, hop);
                }
            },
        );
        self.summary.drained_hops += ran;
        if self.drain.is_finished() {
            tracing::debug!("Drained {} latency hops", self.drain.latency_hops());
        } else {
            self.summary.stopped_early = true;
        }
    }

    /// Notify the reporter, close both collaborators and stop.
    fn shutdown(&mut self) -> Result<()> {
        self.state = SchedulerState::Stopped;
        let info = self.context.hop_info(HopPhase::Finished);
        self.reporter.finish(&self.transform, &info);

        let source_closed = match self.source.take() {
            Some(mut source) => source.close(),
            None => Ok(()),
        };
        let sink_closed = match self.sink.take() {
            Some(mut sink) => sink.close(),
            None => Ok(()),
        };
        source_closed?;
        sink_closed?;
        Ok(())
    }
}

/// Persist one hop. A failed sink is closed and dropped; the first failure
/// is kept in the summary.
fn write_hop(
    sink: &mut Option<Box<dyn Sink>>,
    summary: &mut RunSummary,
    output: &FrameBuffer,
    hop: u64,
) {
    let Some(writer) = sink.as_mut() else {
        return;
    };
    if let Err(source) = writer.write(output) {
        tracing::error!(
            "Sink write failed at hop {}, output is no longer persisted: {}",
            hop,
            source
        );
        if let Err(e) = writer.close() {
            tracing::debug!("Closing failed sink: {}", e);
        }
        *sink = None;
        if summary.sink_error.is_none() {
            summary.sink_error = Some(
                CoreError::SinkWrite {
                    hop,
                    requested: output.length(),
                    source,
                }
                .into(),
            );
        }
    }
}
