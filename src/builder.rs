//! Builder for configuring and constructing a [`Scheduler`].

use crate::drain::LatencyDrain;
use crate::report::Report;
use crate::scheduler::{PipelineContext, RunSummary, SchedulerState};
use crate::{Result, Scheduler};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use stride_core::{Error, Mode, PipelineConfig, Sink, Source, Transform};

/// The transform and reporter are fixed up front; everything else has a
/// default except the source, which is required.
///
/// A transform that reports its own [`Transform::hop_size`] or
/// [`Transform::frame_size`] must agree with the pipeline's, otherwise
/// [`build`](Self::build) fails with `InvalidConfig`. Build such transforms
/// from the same [`PipelineConfig`], e.g. [`NoteAnalyzer::for_pipeline`].
///
/// [`NoteAnalyzer::for_pipeline`]: stride_analysis::NoteAnalyzer::for_pipeline
///
/// Latency defaults to [`Transform::latency_hops`] unless overridden with
/// [`latency_hops`](Self::latency_hops).
///
/// # Example
///
/// ```
/// use stride::analysis::{AnalyzerConfig, NoteAnalyzer};
/// use stride::io::MemorySource;
/// use stride::{NoteConfig, NoteEmitter, NoteReporter, PipelineConfig, Scheduler};
///
/// let pipeline = PipelineConfig {
///     hop_size: 256,
///     frame_size: 1024,
///     ..Default::default()
/// };
/// let analyzer = NoteAnalyzer::for_pipeline(44100, &pipeline, AnalyzerConfig::default()).unwrap();
/// let reporter = NoteReporter::new(NoteEmitter::new(NoteConfig::default(), 256, 44100));
///
/// let mut scheduler = Scheduler::builder(analyzer, reporter)
///     .config(pipeline)
///     .source(MemorySource::mono(vec![0.0; 44100], 44100))
///     .build()
///     .unwrap();
///
/// // The analyzer's peak picker looks three hops ahead
/// assert_eq!(scheduler.latency_hops(), 3);
/// scheduler.run().unwrap();
/// ```
pub struct SchedulerBuilder<T, R> {
    transform: T,
    reporter: R,
    config: PipelineConfig,
    source: Option<Box<dyn Source>>,
    sink: Option<Box<dyn Sink>>,
    stop: Option<Arc<AtomicBool>>,
}

impl<T, R> SchedulerBuilder<T, R>
where
    T: Transform,
    R: Report<T>,
{
    pub fn new(transform: T, reporter: R) -> Self {
        Self {
            transform,
            reporter,
            config: PipelineConfig::default(),
            source: None,
            sink: None,
            stop: None,
        }
    }

    /// Replace the whole pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 256
    pub fn hop_size(mut self, hop_size: usize) -> Self {
        self.config.hop_size = hop_size;
        self
    }

    /// Default: 512
    pub fn frame_size(mut self, frame_size: usize) -> Self {
        self.config.frame_size = frame_size;
        self
    }

    /// Override the transform's reported latency.
    pub fn latency_hops(mut self, hops: usize) -> Self {
        self.config.latency_hops = Some(hops);
        self
    }

    /// Default: [`Mode::FileBacked`]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Also persist drained hops to the sink. Default: false
    pub fn write_drained(mut self, enabled: bool) -> Self {
        self.config.write_drained = enabled;
        self
    }

    pub fn source(mut self, source: impl Source + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn sink(mut self, sink: impl Sink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Share an existing stop flag instead of creating one.
    pub fn stop_signal(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn build(self) -> Result<Scheduler<T, R>> {
        self.config.validate()?;
        if let Some(hop_size) = self.transform.hop_size() {
            if hop_size != self.config.hop_size {
                return Err(Error::InvalidConfig(format!(
                    "transform expects hop_size {}, scheduler uses {}",
                    hop_size, self.config.hop_size
                ))
                .into());
            }
        }
        if let Some(frame_size) = self.transform.frame_size() {
            if frame_size != self.config.frame_size {
                return Err(Error::InvalidConfig(format!(
                    "transform expects frame_size {}, scheduler uses {}",
                    frame_size, self.config.frame_size
                ))
                .into());
            }
        }

        let Some(source) = self.source else {
            return Err(Error::InvalidConfig("scheduler needs a source".into()).into());
        };
        let channels = source.channels();
        let sample_rate = source.sample_rate();
        if channels == 0 {
            return Err(Error::InvalidConfig("source reports zero channels".into()).into());
        }
        if sample_rate == 0 {
            return Err(Error::InvalidConfig("source reports a zero sample rate".into()).into());
        }

        let latency_hops = self
            .config
            .latency_hops
            .unwrap_or_else(|| self.transform.latency_hops());
        let drain = LatencyDrain::new(latency_hops)?;
        let context = PipelineContext::new(self.config.hop_size, channels, sample_rate)?;

        tracing::debug!(
            "Scheduler ready: hop {} frame {} latency {} hops, {} ch @ {} Hz, {:?}",
            self.config.hop_size,
            self.config.frame_size,
            latency_hops,
            channels,
            sample_rate,
            self.config.mode
        );

        Ok(Scheduler {
            transform: self.transform,
            reporter: self.reporter,
            source: Some(source),
            sink: self.sink,
            context,
            config: self.config,
            drain,
            state: SchedulerState::Running,
            stop: self.stop.unwrap_or_default(),
            summary: RunSummary::default(),
        })
    }
}
