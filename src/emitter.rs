//! Note on/off events from per-hop onset, pitch and level.
//!
//! Pitch is smoothed through a [`HistoryBuffer`]. After an onset the emitter
//! waits `history_length - 1` hops before trusting the median, so the new
//! note has displaced most of the previous one from the history.

use crate::history::HistoryBuffer;
use stride_analysis::{freq_to_midi, level_to_velocity, HopAnalysis};

/// Event emitter settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NoteConfig {
    /// Median window in hops. 0 disables smoothing.
    pub history_length: usize,
    /// Onsets quieter than this end the sounding note instead of starting one.
    pub silence_db: f32,
    /// Smoothed pitches at or below this are not worth a note-on.
    pub min_pitch_hz: f32,
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            history_length: 6,
            silence_db: -90.0,
            min_pitch_hz: 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum NoteKind {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NoteEvent {
    pub kind: NoteKind,
    /// MIDI note number; `None` for note-off.
    pub note: Option<u8>,
    /// 1..=127 for note-on, 0 for note-off.
    pub velocity: u8,
    pub hop: u64,
    pub time_seconds: f64,
}

impl NoteEvent {
    pub fn is_on(&self) -> bool {
        self.kind == NoteKind::On
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    countdown: usize,
    velocity: u8,
}

/// Turns a stream of [`HopAnalysis`] into note events.
#[derive(Debug, Clone)]
pub struct NoteEmitter {
    config: NoteConfig,
    hop_size: usize,
    sample_rate: u32,
    history: HistoryBuffer,
    smoothed: f32,
    pending: Option<Pending>,
    sounding: Option<u8>,
    events: Vec<NoteEvent>,
    /// Start of the events emitted by the last observed hop.
    last_start: usize,
}

impl NoteEmitter {
    pub fn new(config: NoteConfig, hop_size: usize, sample_rate: u32) -> Self {
        Self {
            history: HistoryBuffer::new(config.history_length),
            config,
            hop_size,
            sample_rate,
            smoothed: 0.0,
            pending: None,
            sounding: None,
            events: Vec::new(),
            last_start: 0,
        }
    }

    pub fn config(&self) -> &NoteConfig {
        &self.config
    }

    /// Feed the analysis of hop `hop_count`.
    pub fn observe(&mut self, analysis: &HopAnalysis, hop_count: u64) {
        self.last_start = self.events.len();

        let smoothing = self.config.history_length > 0;
        self.smoothed = if smoothing {
            self.history.append(analysis.pitch_hz);
            self.history.median()
        } else {
            analysis.pitch_hz
        };

        // Silent onsets use the configured threshold, not the analyzer's
        let silent = analysis.level_db < self.config.silence_db;
        let velocity = level_to_velocity(analysis.level_db);

        if analysis.onset {
            if silent {
                self.pending = None;
                self.note_off(hop_count);
            } else if smoothing {
                self.pending = Some(Pending {
                    countdown: self.config.history_length - 1,
                    velocity,
                });
                self.settle(hop_count);
            } else {
                self.note_off(hop_count);
                self.note_on(self.smoothed, velocity, hop_count);
            }
        } else if let Some(pending) = self.pending.as_mut() {
            pending.countdown = pending.countdown.saturating_sub(1);
            self.settle(hop_count);
        }
    }

    /// Emit the final note-off for a sounding note.
    pub fn finish(&mut self, hop_count: u64) -> Option<NoteEvent> {
        self.last_start = self.events.len();
        self.pending = None;
        self.note_off(hop_count)
    }

    /// Current pitch estimate in Hz (the median when smoothing).
    pub fn smoothed(&self) -> f32 {
        self.smoothed
    }

    /// Note currently sounding.
    pub fn sounding(&self) -> Option<u8> {
        self.sounding
    }

    /// Events emitted by the last observed hop.
    pub fn events(&self) -> &[NoteEvent] {
        &self.events[self.last_start..]
    }

    /// All events not yet taken.
    pub fn take_events(&mut self) -> Vec<NoteEvent> {
        self.last_start = 0;
        std::mem::take(&mut self.events)
    }

    pub fn reset(&mut self) {
        self.history.reset();
        self.smoothed = 0.0;
        self.pending = None;
        self.sounding = None;
        self.events.clear();
        self.last_start = 0;
    }

    fn settle(&mut self, hop_count: u64) {
        let Some(pending) = self.pending else {
            return;
        };
        if pending.countdown > 0 {
            return;
        }
        self.pending = None;
        self.note_off(hop_count);
        self.note_on(self.smoothed, pending.velocity, hop_count);
    }

    fn time_at(&self, hop_count: u64) -> f64 {
        hop_count as f64 * self.hop_size as f64 / self.sample_rate as f64
    }

    fn note_on(&mut self, pitch_hz: f32, velocity: u8, hop_count: u64) {
        if pitch_hz <= self.config.min_pitch_hz {
            return;
        }
        let note = freq_to_midi(pitch_hz);
        self.sounding = Some(note);
        self.push(NoteEvent {
            kind: NoteKind::On,
            note: Some(note),
            velocity,
            hop: hop_count,
            time_seconds: self.time_at(hop_count),
        });
    }

    fn note_off(&mut self, hop_count: u64) -> Option<NoteEvent> {
        self.sounding.take()?;
        let event = NoteEvent {
            kind: NoteKind::Off,
            note: None,
            velocity: 0,
            hop: hop_count,
            time_seconds: self.time_at(hop_count),
        };
        self.push(event);
        Some(event)
    }

    fn push(&mut self, event: NoteEvent) {
        tracing::trace!(
            "{:?} note {:?} vel {} at hop {} ({:.6}s)",
            event.kind,
            event.note,
            event.velocity,
            event.hop,
            event.time_seconds
        );
        self.events.push(event);
    }
}
