//! Latency drain: extra zero-input hops after end-of-stream.
//!
//! A transform that looks ahead (a peak picker, an overlap window) holds back
//! results until it has seen later hops. Once the source is exhausted the
//! scheduler feeds it `latency_hops` hops of silence so those results still
//! reach the reporter.

use crate::report::Report;
use crate::scheduler::{HopPhase, PipelineContext};
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use stride_core::{Error, FrameBuffer, Transform, MAX_LATENCY_HOPS};

/// Counts drained hops from 0 up to `latency_hops`; finished once it gets there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyDrain {
    latency_hops: usize,
    completed: usize,
}

impl LatencyDrain {
    pub fn new(latency_hops: usize) -> Result<Self> {
        if latency_hops > MAX_LATENCY_HOPS {
            return Err(Error::InvalidConfig(format!(
                "latency_hops {} out of range (0-{})",
                latency_hops, MAX_LATENCY_HOPS
            ))
            .into());
        }
        Ok(Self {
            latency_hops,
            completed: 0,
        })
    }

    pub fn latency_hops(&self) -> usize {
        self.latency_hops
    }

    /// Drain hops already run.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn remaining(&self) -> usize {
        self.latency_hops - self.completed
    }

    pub fn is_finished(&self) -> bool {
        self.completed == self.latency_hops
    }

    /// Run the remaining drain hops.
    ///
    /// The input buffer is zeroed once and reused unmodified for every
    /// iteration. Each hop runs the transform, then the reporter, then hands
    /// the output to `on_output`. `stop` is checked before every hop.
    /// Returns the number of hops run by this call.
    pub fn run<T, R, F>(
        &mut self,
        transform: &mut T,
        reporter: &mut R,
        context: &mut PipelineContext,
        stop: &AtomicBool,
        mut on_output: F,
    ) -> usize
    where
        T: Transform + ?Sized,
        R: Report<T> + ?Sized,
        F: FnMut(&FrameBuffer, u64),
    {
        context.input.zero();
        let hop_size = context.hop_size();
        let start = self.completed;

        while !self.is_finished() {
            if stop.load(Ordering::Acquire) {
                tracing::debug!(
                    "Drain stopped after {} of {} hops",
                    self.completed,
                    self.latency_hops
                );
                break;
            }
            transform.process(&context.input, &mut context.output, hop_size);
            let info = context.hop_info(HopPhase::Draining {
                index: self.completed,
            });
            reporter.report(transform, &info);
            on_output(&context.output, info.hop_count);
            self.completed += 1;
        }

        self.completed - start
    }
}
