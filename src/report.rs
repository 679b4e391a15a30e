//! Per-hop reporters.
//!
//! A [`Report`] is invoked after every processed hop (streaming and drained)
//! with read access to the transform, and once more at teardown.

use crate::emitter::{NoteEmitter, NoteEvent, NoteKind};
use crate::scheduler::HopInfo;
use std::io::{self, Write};
use stride_analysis::AnalysisOutput;

/// Observer of the transform after each hop.
pub trait Report<T: ?Sized> {
    fn report(&mut self, transform: &T, hop: &HopInfo);

    /// Called once when the scheduler stops.
    fn finish(&mut self, transform: &T, hop: &HopInfo) {
        let _ = (transform, hop);
    }
}

impl<T: ?Sized, F> Report<T> for F
where
    F: FnMut(&T, &HopInfo),
{
    fn report(&mut self, transform: &T, hop: &HopInfo) {
        self(transform, hop)
    }
}

/// No-op reporter.
impl<T: ?Sized> Report<T> for () {
    fn report(&mut self, _transform: &T, _hop: &HopInfo) {}
}

/// Optional text output that gives up after the first failed write.
#[derive(Debug)]
struct TextOut<W> {
    out: Option<W>,
}

impl<W: Write> TextOut<W> {
    fn write(&mut self, args: std::fmt::Arguments<'_>) {
        let Some(out) = self.out.as_mut() else {
            return;
        };
        if let Err(e) = out.write_fmt(args) {
            tracing::warn!("Report output failed, further output dropped: {}", e);
            self.out = None;
        }
    }

    fn flush(&mut self) {
        if let Some(out) = self.out.as_mut() {
            if let Err(e) = out.flush() {
                tracing::warn!("Report output flush failed: {}", e);
            }
        }
    }
}

/// Feeds a [`NoteEmitter`] from any transform exposing a per-hop analysis.
///
/// With a writer attached, each note becomes one line: note-on writes the
/// MIDI note and start time, note-off completes the line with the end time
/// (`"69.000000\t0.116100\t0.812698\n"`).
#[derive(Debug)]
pub struct NoteReporter<W = io::Sink> {
    emitter: NoteEmitter,
    text: TextOut<W>,
}

impl NoteReporter<io::Sink> {
    pub fn new(emitter: NoteEmitter) -> Self {
        Self {
            emitter,
            text: TextOut { out: None },
        }
    }
}

impl<W: Write> NoteReporter<W> {
    pub fn with_writer(emitter: NoteEmitter, out: W) -> Self {
        Self {
            emitter,
            text: TextOut { out: Some(out) },
        }
    }

    pub fn emitter(&self) -> &NoteEmitter {
        &self.emitter
    }

    pub fn emitter_mut(&mut self) -> &mut NoteEmitter {
        &mut self.emitter
    }

    /// Writer, if it is still alive.
    pub fn writer(&self) -> Option<&W> {
        self.text.out.as_ref()
    }

    pub fn into_inner(self) -> (NoteEmitter, Option<W>) {
        (self.emitter, self.text.out)
    }

    fn write_events(&mut self) {
        for i in 0..self.emitter.events().len() {
            let NoteEvent {
                kind,
                note,
                time_seconds,
                ..
            } = self.emitter.events()[i];
            match kind {
                NoteKind::On => self.text.write(format_args!(
                    "{:.6}\t{:.6}\t",
                    note.map_or(0.0, f64::from),
                    time_seconds
                )),
                NoteKind::Off => self.text.write(format_args!("{:.6}\n", time_seconds)),
            }
        }
    }
}

impl<T, W> Report<T> for NoteReporter<W>
where
    T: AnalysisOutput + ?Sized,
    W: Write,
{
    fn report(&mut self, transform: &T, hop: &HopInfo) {
        self.emitter
            .observe(&transform.hop_analysis(), hop.hop_count);
        self.write_events();
    }

    fn finish(&mut self, _transform: &T, hop: &HopInfo) {
        self.emitter.finish(hop.hop_count);
        self.write_events();
        self.text.flush();
    }
}

/// Collects onset times, optionally writing one `"{time:.6}\n"` line each.
///
/// Times are corrected by the analyzer's look-ahead (`onset_delay_hops`),
/// clamped at zero. Onsets on silent hops are skipped.
#[derive(Debug)]
pub struct OnsetReporter<W = io::Sink> {
    onsets: Vec<f64>,
    text: TextOut<W>,
}

impl OnsetReporter<io::Sink> {
    pub fn new() -> Self {
        Self {
            onsets: Vec::new(),
            text: TextOut { out: None },
        }
    }
}

impl Default for OnsetReporter<io::Sink> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> OnsetReporter<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            onsets: Vec::new(),
            text: TextOut { out: Some(out) },
        }
    }

    /// Onset times in seconds, in detection order.
    pub fn onsets(&self) -> &[f64] {
        &self.onsets
    }

    pub fn writer(&self) -> Option<&W> {
        self.text.out.as_ref()
    }

    pub fn into_inner(self) -> (Vec<f64>, Option<W>) {
        (self.onsets, self.text.out)
    }
}

impl<T, W> Report<T> for OnsetReporter<W>
where
    T: AnalysisOutput + ?Sized,
    W: Write,
{
    fn report(&mut self, transform: &T, hop: &HopInfo) {
        let analysis = transform.hop_analysis();
        if !analysis.onset || analysis.silent {
            return;
        }
        let onset_hop = hop.hop_count.saturating_sub(analysis.onset_delay_hops as u64);
        let time = hop.time_at(onset_hop);
        self.onsets.push(time);
        self.text.write(format_args!("{:.6}\n", time));
    }

    fn finish(&mut self, _transform: &T, _hop: &HopInfo) {
        self.text.flush();
    }
}
