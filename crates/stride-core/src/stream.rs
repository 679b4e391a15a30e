//! Source and sink collaborators.
//!
//! Both traits speak `std::io::Result`; the scheduler attaches hop context
//! when it turns a failure into [`crate::Error::SourceRead`] or
//! [`crate::Error::SinkWrite`].

use crate::FrameBuffer;
use std::io;

/// Pull side of the pipeline.
pub trait Source {
    /// Channels delivered per frame.
    fn channels(&self) -> usize;

    /// Sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Fill `frame` with up to `frame.length()` samples per channel.
    ///
    /// Returns how many samples per channel were written. Anything short of
    /// `frame.length()` signals end-of-stream (file sources) or "no full hop
    /// buffered yet" (device sources). Errors are I/O failures distinct from a
    /// clean end-of-stream.
    fn read(&mut self, frame: &mut FrameBuffer) -> io::Result<usize>;

    /// Release the underlying handle. Called once when the scheduler stops.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Push side of the pipeline.
pub trait Sink {
    /// Persist one full hop.
    fn write(&mut self, frame: &FrameBuffer) -> io::Result<()>;

    /// Flush and release. Called once when the scheduler stops.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn channels(&self) -> usize {
        (**self).channels()
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn read(&mut self, frame: &mut FrameBuffer) -> io::Result<usize> {
        (**self).read(frame)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        (**self).write(frame)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}
