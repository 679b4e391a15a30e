//! WAV source and sink using hound
//!
//! Integer formats are scaled to `[-1.0, 1.0)` on read and clamped on write.

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use stride_core::{FrameBuffer, Sample, Sink, Source};

/// Output sample format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    Int16,
    Int24,
    Float32,
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Int24 => 24,
            BitDepth::Float32 => 32,
        }
    }

    fn spec(self, channels: u16, sample_rate: u32) -> WavSpec {
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample: self.bits(),
            sample_format: match self {
                BitDepth::Float32 => SampleFormat::Float,
                _ => SampleFormat::Int,
            },
        }
    }
}

pub(crate) fn hound_to_io(e: hound::Error) -> io::Error {
    match e {
        hound::Error::IoError(e) => e,
        other => io::Error::other(other),
    }
}

/// Hop source reading interleaved WAV samples
pub struct WavSource<R: Read = BufReader<File>> {
    reader: Option<WavReader<R>>,
    spec: WavSpec,
    scratch: Vec<Sample>,
}

impl WavSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path).map_err(hound_to_io)?;
        let source = Self::from_reader(reader);
        tracing::debug!(
            "Opened WAV source {}: {} Hz, {} ch, {} frames",
            path.display(),
            source.spec.sample_rate,
            source.spec.channels,
            source.total_frames()
        );
        Ok(source)
    }
}

impl<R: Read> WavSource<R> {
    pub fn new(reader: R) -> io::Result<Self> {
        Ok(Self::from_reader(
            WavReader::new(reader).map_err(hound_to_io)?,
        ))
    }

    fn from_reader(reader: WavReader<R>) -> Self {
        Self {
            spec: reader.spec(),
            reader: Some(reader),
            scratch: Vec::new(),
        }
    }

    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Frames (samples per channel) in the file.
    pub fn total_frames(&self) -> u32 {
        self.reader.as_ref().map_or(0, |r| r.duration())
    }

    fn fill_scratch(&mut self, wanted: usize) -> io::Result<()> {
        self.scratch.clear();
        let Some(reader) = self.reader.as_mut() else {
            return Ok(());
        };

        match self.spec.sample_format {
            SampleFormat::Float => {
                for sample in reader.samples::<f32>().take(wanted) {
                    self.scratch.push(sample.map_err(hound_to_io)?);
                }
            }
            SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (self.spec.bits_per_sample - 1)) as f32;
                for sample in reader.samples::<i32>().take(wanted) {
                    self.scratch.push(sample.map_err(hound_to_io)? as f32 * scale);
                }
            }
        }
        Ok(())
    }
}

impl<R: Read> Source for WavSource<R> {
    fn channels(&self) -> usize {
        self.spec.channels as usize
    }

    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn read(&mut self, frame: &mut FrameBuffer) -> io::Result<usize> {
        if frame.channels() != self.channels() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "frame has {} channels, file has {}",
                    frame.channels(),
                    self.channels()
                ),
            ));
        }
        self.fill_scratch(frame.length() * frame.channels())?;
        Ok(frame.read_interleaved(&self.scratch))
    }

    fn close(&mut self) -> io::Result<()> {
        self.reader = None;
        Ok(())
    }
}

/// Hop sink writing interleaved WAV samples
pub struct WavSink<W: Write + Seek = BufWriter<File>> {
    writer: Option<WavWriter<W>>,
    bit_depth: BitDepth,
    channels: usize,
    scratch: Vec<Sample>,
}

impl WavSink<BufWriter<File>> {
    pub fn create(
        path: impl AsRef<Path>,
        channels: u16,
        sample_rate: u32,
        bit_depth: BitDepth,
    ) -> io::Result<Self> {
        let spec = bit_depth.spec(channels, sample_rate);
        let writer = WavWriter::create(path.as_ref(), spec).map_err(hound_to_io)?;
        tracing::debug!(
            "Created WAV sink {}: {} Hz, {} ch, {} bit",
            path.as_ref().display(),
            sample_rate,
            channels,
            bit_depth.bits()
        );
        Ok(Self::from_writer(writer, bit_depth, channels))
    }

    /// Sink matching the channel count and sample rate of `source`.
    pub fn like(
        source: &impl Source,
        path: impl AsRef<Path>,
        bit_depth: BitDepth,
    ) -> io::Result<Self> {
        Self::create(
            path,
            source.channels() as u16,
            source.sample_rate(),
            bit_depth,
        )
    }
}

impl<W: Write + Seek> WavSink<W> {
    pub fn new(writer: W, channels: u16, sample_rate: u32, bit_depth: BitDepth) -> io::Result<Self> {
        let writer = WavWriter::new(writer, bit_depth.spec(channels, sample_rate))
            .map_err(hound_to_io)?;
        Ok(Self::from_writer(writer, bit_depth, channels))
    }

    fn from_writer(writer: WavWriter<W>, bit_depth: BitDepth, channels: u16) -> Self {
        Self {
            writer: Some(writer),
            bit_depth,
            channels: channels as usize,
            scratch: Vec::new(),
        }
    }
}

impl<W: Write + Seek> Sink for WavSink<W> {
    fn write(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        if frame.channels() != self.channels {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "frame has {} channels, sink expects {}",
                    frame.channels(),
                    self.channels
                ),
            ));
        }
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "WAV sink already closed"))?;

        self.scratch.clear();
        frame.write_interleaved(frame.length(), &mut self.scratch);

        for &s in &self.scratch {
            let result = match self.bit_depth {
                BitDepth::Int16 => writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16),
                BitDepth::Int24 => writer.write_sample((s.clamp(-1.0, 1.0) * 8388607.0) as i32),
                BitDepth::Float32 => writer.write_sample(s),
            };
            result.map_err(hound_to_io)?;
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(writer) => writer.finalize().map_err(hound_to_io),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_file(path: &Path, samples: &[f32], channels: u16) {
        let spec = WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample((s * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_source_reads_hops_then_short() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.wav");
        // 10 stereo frames
        let samples: Vec<f32> = (0..20).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        write_test_file(&path, &samples, 2);

        let mut source = WavSource::open(&path).unwrap();
        assert_eq!(source.channels(), 2);
        assert_eq!(source.sample_rate(), 16000);
        assert_eq!(source.total_frames(), 10);

        let mut frame = FrameBuffer::allocate(4, 2).unwrap();
        assert_eq!(source.read(&mut frame).unwrap(), 4);
        approx::assert_relative_eq!(frame.channel(0)[0], 0.5, epsilon = 1e-3);
        approx::assert_relative_eq!(frame.channel(1)[0], -0.5, epsilon = 1e-3);
        assert_eq!(source.read(&mut frame).unwrap(), 4);
        assert_eq!(source.read(&mut frame).unwrap(), 2);
        assert_eq!(source.read(&mut frame).unwrap(), 0);
    }

    #[test]
    fn test_source_rejects_channel_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_test_file(&path, &[0.0; 8], 1);

        let mut source = WavSource::open(&path).unwrap();
        let mut frame = FrameBuffer::allocate(4, 2).unwrap();
        assert!(source.read(&mut frame).is_err());
    }

    #[test]
    fn test_sink_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let mut sink = WavSink::create(&path, 1, 22050, BitDepth::Float32).unwrap();
        let mut frame = FrameBuffer::allocate(8, 1).unwrap();
        frame.channel_mut(0).fill(0.25);
        sink.write(&frame).unwrap();
        sink.write(&frame).unwrap();
        sink.close().unwrap();
        // Closing twice is harmless
        sink.close().unwrap();
        assert!(sink.write(&frame).is_err());

        let mut source = WavSource::open(&path).unwrap();
        assert_eq!(source.total_frames(), 16);
        let mut back = FrameBuffer::allocate(16, 1).unwrap();
        assert_eq!(source.read(&mut back).unwrap(), 16);
        assert!(back.channel(0).iter().all(|&s| s == 0.25));
    }

    #[test]
    fn test_sink_clamps_int16() {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut sink = WavSink::new(&mut cursor, 1, 8000, BitDepth::Int16).unwrap();
            let mut frame = FrameBuffer::allocate(2, 1).unwrap();
            frame.channel_mut(0).copy_from_slice(&[2.0, -2.0]);
            sink.write(&frame).unwrap();
            sink.close().unwrap();
        }
        cursor.set_position(0);
        let mut reader = WavReader::new(cursor).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![32767, -32767]);
    }
}
