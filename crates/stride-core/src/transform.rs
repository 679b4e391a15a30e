//! Per-hop transform collaborator.

use crate::FrameBuffer;

/// Analysis or processing step invoked once per hop.
///
/// Implementations may keep internal state across calls (sliding windows,
/// previous spectra); the scheduler only guarantees that calls arrive in
/// source order and never overlap.
pub trait Transform {
    /// Process one hop. `input` and `output` both hold `hop_size` samples per channel.
    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer, hop_size: usize);

    /// Hops of look-ahead the transform needs flushed after end-of-stream.
    fn latency_hops(&self) -> usize {
        0
    }

    /// Hop size the transform was built for, if it is fixed.
    ///
    /// The scheduler refuses to build when this disagrees with its own.
    fn hop_size(&self) -> Option<usize> {
        None
    }

    /// Analysis window length the transform was built for, if it has one.
    fn frame_size(&self) -> Option<usize> {
        None
    }
}

impl<F> Transform for F
where
    F: FnMut(&FrameBuffer, &mut FrameBuffer, usize),
{
    fn process(&mut self, input: &FrameBuffer, output: &mut FrameBuffer, hop_size: usize) {
        self(input, output, hop_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_transform() {
        let mut calls = 0;
        let mut passthrough = |input: &FrameBuffer, output: &mut FrameBuffer, hop: usize| {
            assert_eq!(hop, input.length());
            calls += 1;
            let _ = output.copy_from(input);
        };

        let mut input = FrameBuffer::allocate(4, 1).unwrap();
        input.channel_mut(0).fill(0.25);
        let mut output = FrameBuffer::allocate(4, 1).unwrap();

        passthrough.process(&input, &mut output, 4);
        assert_eq!(passthrough.latency_hops(), 0);
        assert_eq!(passthrough.hop_size(), None);
        assert_eq!(passthrough.frame_size(), None);
        assert_eq!(output.channel(0), &[0.25; 4]);
        drop(passthrough);
        assert_eq!(calls, 1);
    }
}
