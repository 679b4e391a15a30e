//! Fixed-size multi-channel sample container.
//!
//! A [`FrameBuffer`] is allocated once at pipeline setup and reused for every
//! hop. Samples are stored planar: channel `c` occupies
//! `data[c * length..(c + 1) * length]`.

use crate::{Error, Result, Sample};

#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    data: Vec<Sample>,
    length: usize,
    channels: usize,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer of `length` samples per channel.
    ///
    /// Fails with [`Error::Allocation`] when either dimension is zero.
    pub fn allocate(length: usize, channels: usize) -> Result<Self> {
        if length == 0 || channels == 0 {
            return Err(Error::Allocation { length, channels });
        }
        Ok(Self {
            data: vec![0.0; length * channels],
            length,
            channels,
        })
    }

    /// Samples per channel.
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Set every sample to 0.0 in place.
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    #[inline]
    pub fn channel(&self, index: usize) -> &[Sample] {
        let start = index * self.length;
        &self.data[start..start + self.length]
    }

    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [Sample] {
        let start = index * self.length;
        &mut self.data[start..start + self.length]
    }

    /// Iterate over channels in order.
    pub fn iter_channels(&self) -> impl Iterator<Item = &[Sample]> {
        self.data.chunks_exact(self.length)
    }

    pub fn is_silent(&self) -> bool {
        self.data.iter().all(|&s| s == 0.0)
    }

    /// Copy samples from a buffer of identical shape.
    pub fn copy_from(&mut self, other: &FrameBuffer) -> Result<()> {
        if other.length != self.length || other.channels != self.channels {
            return Err(Error::InvalidConfig(format!(
                "frame shape mismatch: {}x{} vs {}x{}",
                self.length, self.channels, other.length, other.channels
            )));
        }
        self.data.copy_from_slice(&other.data);
        Ok(())
    }

    /// Average all channels into `out` (truncated to the shorter length).
    pub fn downmix_into(&self, out: &mut [Sample]) {
        let n = out.len().min(self.length);
        out[..n].copy_from_slice(&self.channel(0)[..n]);
        if self.channels == 1 {
            return;
        }
        for ch in 1..self.channels {
            for (o, s) in out[..n].iter_mut().zip(self.channel(ch)) {
                *o += s;
            }
        }
        let scale = 1.0 / self.channels as Sample;
        for o in &mut out[..n] {
            *o *= scale;
        }
    }

    /// Fill from interleaved samples, returning the number of whole frames
    /// (samples per channel) copied. Unfilled tail samples are left untouched.
    pub fn read_interleaved(&mut self, interleaved: &[Sample]) -> usize {
        let frames = (interleaved.len() / self.channels).min(self.length);
        for (i, frame) in interleaved.chunks_exact(self.channels).take(frames).enumerate() {
            for (ch, &s) in frame.iter().enumerate() {
                self.data[ch * self.length + i] = s;
            }
        }
        frames
    }

    /// Append the first `frames` samples of every channel, interleaved, to `out`.
    pub fn write_interleaved(&self, frames: usize, out: &mut Vec<Sample>) {
        let frames = frames.min(self.length);
        out.reserve(frames * self.channels);
        for i in 0..frames {
            for ch in 0..self.channels {
                out.push(self.data[ch * self.length + i]);
            }
        }
    }
}
