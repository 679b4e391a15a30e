//! In-memory source and sink.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use stride_core::{Error, FrameBuffer, Result, Sample, Sink, Source};

/// Source over planar sample vectors.
pub struct MemorySource {
    channels: Vec<Vec<Sample>>,
    sample_rate: u32,
    position: usize,
}

impl MemorySource {
    /// All channels must have the same length.
    pub fn new(channels: Vec<Vec<Sample>>, sample_rate: u32) -> Result<Self> {
        let Some(first) = channels.first() else {
            return Err(Error::InvalidConfig("memory source needs at least one channel".into()));
        };
        let len = first.len();
        if channels.iter().any(|c| c.len() != len) {
            return Err(Error::InvalidConfig(
                "memory source channels differ in length".into(),
            ));
        }
        Ok(Self {
            channels,
            sample_rate,
            position: 0,
        })
    }

    pub fn mono(samples: Vec<Sample>, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
            position: 0,
        }
    }

    /// Samples per channel not yet read.
    pub fn remaining(&self) -> usize {
        self.channels[0].len() - self.position
    }
}

impl Source for MemorySource {
    fn channels(&self) -> usize {
        self.channels.len()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, frame: &mut FrameBuffer) -> io::Result<usize> {
        if frame.channels() != self.channels.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "frame has {} channels, source has {}",
                    frame.channels(),
                    self.channels.len()
                ),
            ));
        }
        let n = frame.length().min(self.remaining());
        for (ch, samples) in self.channels.iter().enumerate() {
            frame.channel_mut(ch)[..n].copy_from_slice(&samples[self.position..self.position + n]);
        }
        self.position += n;
        Ok(n)
    }
}

#[derive(Debug, Default)]
struct Recorded {
    channels: Vec<Vec<Sample>>,
    hops: usize,
    closed: bool,
}

/// Sink that records every written hop.
///
/// The sink moves into the scheduler; keep a [`MemorySinkHandle`] to inspect
/// what was written.
#[derive(Default)]
pub struct MemorySink {
    recorded: Arc<Mutex<Recorded>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> MemorySinkHandle {
        MemorySinkHandle {
            recorded: Arc::clone(&self.recorded),
        }
    }
}

impl Sink for MemorySink {
    fn write(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        let mut recorded = self.recorded.lock();
        if recorded.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "memory sink closed"));
        }
        if recorded.channels.is_empty() {
            recorded.channels = vec![Vec::new(); frame.channels()];
        }
        for (ch, out) in recorded.channels.iter_mut().enumerate() {
            out.extend_from_slice(frame.channel(ch));
        }
        recorded.hops += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.recorded.lock().closed = true;
        Ok(())
    }
}

/// Read access to what a [`MemorySink`] recorded.
#[derive(Clone)]
pub struct MemorySinkHandle {
    recorded: Arc<Mutex<Recorded>>,
}

impl MemorySinkHandle {
    pub fn hops(&self) -> usize {
        self.recorded.lock().hops
    }

    pub fn channel(&self, index: usize) -> Vec<Sample> {
        self.recorded
            .lock()
            .channels
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.recorded.lock().closed
    }
}
