//! Realtime source fed through a lock-free ring buffer.
//!
//! A device callback owns the [`RingProducer`] and pushes interleaved
//! samples; the scheduler owns the [`RingSource`] and pulls whole hops.
//! `read` never hands out a partial hop: with less than one hop buffered it
//! returns 0 and keeps the samples for the next call.

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};
use std::io;
use stride_core::{FrameBuffer, Sample, Source};

/// Create a connected producer/source pair holding `capacity_frames`
/// frames of `channels` interleaved samples.
pub fn ring(capacity_frames: usize, channels: usize, sample_rate: u32) -> (RingProducer, RingSource) {
    let channels = channels.max(1);
    let rb = HeapRb::<Sample>::new(capacity_frames.max(1) * channels);
    let (prod, cons) = rb.split();
    (
        RingProducer {
            prod,
            channels,
            dropped_frames: 0,
            overrun: false,
        },
        RingSource {
            cons,
            channels,
            sample_rate,
            pending: Vec::new(),
        },
    )
}

/// Device-callback side of the ring.
pub struct RingProducer {
    prod: HeapProd<Sample>,
    channels: usize,
    dropped_frames: u64,
    /// Inside a stretch of dropped pushes; warn once per stretch.
    overrun: bool,
}

impl RingProducer {
    /// Push whole interleaved frames. Frames that do not fit are dropped and
    /// counted; returns the number of frames accepted.
    pub fn push_interleaved(&mut self, samples: &[Sample]) -> usize {
        let offered = samples.len() / self.channels;
        let room = self.prod.vacant_len() / self.channels;
        let frames = offered.min(room);
        let pushed = self.prod.push_slice(&samples[..frames * self.channels]);
        debug_assert_eq!(pushed, frames * self.channels);
        let dropped = offered - frames;
        if dropped > 0 && !self.overrun {
            tracing::warn!(
                "Ring full, dropping {} of {} frames; the scheduler is falling behind",
                dropped,
                offered
            );
        }
        self.overrun = dropped > 0;
        self.dropped_frames += dropped as u64;
        frames
    }

    /// Frames dropped because the scheduler fell behind.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }
}

/// Scheduler side of the ring.
pub struct RingSource {
    cons: HeapCons<Sample>,
    channels: usize,
    sample_rate: u32,
    /// Samples popped from the ring but not yet a whole hop.
    pending: Vec<Sample>,
}

impl RingSource {
    /// Whole frames currently buffered (a lower bound while the producer is active).
    pub fn available_frames(&self) -> usize {
        (self.pending.len() + self.cons.occupied_len()) / self.channels
    }
}

impl Source for RingSource {
    fn channels(&self) -> usize {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, frame: &mut FrameBuffer) -> io::Result<usize> {
        if frame.channels() != self.channels {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "frame has {} channels, ring carries {}",
                    frame.channels(),
                    self.channels
                ),
            ));
        }
        let needed = frame.length() * self.channels;
        while self.pending.len() < needed {
            let start = self.pending.len();
            self.pending.resize(needed, 0.0);
            let got = self.cons.pop_slice(&mut self.pending[start..]);
            self.pending.truncate(start + got);
            if got == 0 {
                break;
            }
        }
        if self.pending.len() < needed {
            return Ok(0);
        }
        let frames = frame.read_interleaved(&self.pending[..needed]);
        self.pending.drain(..needed);
        Ok(frames)
    }
}
