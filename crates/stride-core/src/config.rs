//! Pipeline configuration.

use crate::{Error, Result};

/// Upper bound for drain latency. Larger values indicate a misconfigured transform.
pub const MAX_LATENCY_HOPS: usize = 1024;

/// How the scheduler is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Mode {
    /// Finite source read in a loop; end-of-stream triggers the latency drain.
    #[default]
    FileBacked,
    /// Realtime source fed by a device callback; no end-of-stream, no drain.
    DeviceBacked,
}

/// Hop geometry and scheduling options.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct PipelineConfig {
    /// Samples per channel moved per scheduling step.
    pub hop_size: usize,
    /// Analysis window length (>= hop_size).
    pub frame_size: usize,
    /// Extra zero hops pumped after end-of-stream.
    /// `None` uses the transform's own latency.
    pub latency_hops: Option<usize>,
    pub mode: Mode,
    /// Write drained hops to the sink as well.
    pub write_drained: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hop_size: 256,
            frame_size: 512,
            latency_hops: None,
            mode: Mode::FileBacked,
            write_drained: false,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hop_size == 0 {
            return Err(Error::InvalidConfig("hop_size must be non-zero".into()));
        }
        if self.frame_size < self.hop_size {
            return Err(Error::InvalidConfig(format!(
                "frame_size {} is smaller than hop_size {}",
                self.frame_size, self.hop_size
            )));
        }
        if let Some(latency) = self.latency_hops {
            if latency > MAX_LATENCY_HOPS {
                return Err(Error::InvalidConfig(format!(
                    "latency_hops {} out of range (0-{})",
                    latency, MAX_LATENCY_HOPS
                )));
            }
        }
        Ok(())
    }

    /// Hop duration in seconds at the given sample rate.
    pub fn hop_seconds(&self, sample_rate: u32) -> f64 {
        self.hop_size as f64 / sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.hop_size, 256);
        assert_eq!(config.frame_size, 512);
        assert_eq!(config.mode, Mode::FileBacked);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_hop_rejected() {
        let config = PipelineConfig {
            hop_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_frame_smaller_than_hop_rejected() {
        let config = PipelineConfig {
            hop_size: 512,
            frame_size: 256,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_latency_bound() {
        let config = PipelineConfig {
            latency_hops: Some(MAX_LATENCY_HOPS + 1),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            latency_hops: Some(MAX_LATENCY_HOPS),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hop_seconds() {
        let config = PipelineConfig::default();
        approx::assert_relative_eq!(config.hop_seconds(44100), 256.0 / 44100.0);
    }
}
