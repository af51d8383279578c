//! Description of a PCM stream as negotiated between a decoder and an output device.

use std::fmt;
use std::time::Duration;

use num_rational::Ratio;

use crate::common::{ChannelCount, SampleRate};

/// Numeric type of each interleaved element in a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    /// 8-bit unsigned, silence at 128.
    U8,
    /// 16-bit signed.
    S16,
    /// 24-bit signed, packed in three bytes.
    S24,
    /// 32-bit signed.
    S32,
    /// 32-bit float in `[-1.0, 1.0]`.
    Float,
    /// 32-bit signed integer scaled by `2^frac_bits`.
    Fixed {
        /// Width of the fractional part, supplied by the producing decoder.
        frac_bits: u8,
    },
}

impl SampleType {
    /// Width of one element in bytes.
    #[inline]
    pub const fn sample_size(self) -> usize {
        match self {
            SampleType::U8 => 1,
            SampleType::S16 => 2,
            SampleType::S24 => 3,
            SampleType::S32 | SampleType::Float | SampleType::Fixed { .. } => 4,
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleType::U8 => f.write_str("u8"),
            SampleType::S16 => f.write_str("s16"),
            SampleType::S24 => f.write_str("s24"),
            SampleType::S32 => f.write_str("s32"),
            SampleType::Float => f.write_str("f32"),
            SampleType::Fixed { frac_bits } => write!(f, "fixed(q{frac_bits})"),
        }
    }
}

/// Errors that can occur when building a [`SampleFormat`] from raw values.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// The sample rate was zero.
    #[error("Sample rate must be non-zero")]
    ZeroSampleRate,
    /// The channel count was zero.
    #[error("Channel count must be non-zero")]
    ZeroChannels,
}

/// Sample rate, channel layout and element type of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleFormat {
    /// Frames per second.
    pub sample_rate: SampleRate,
    /// Interleaved channels per frame.
    pub channels: ChannelCount,
    /// Element type.
    pub sample_type: SampleType,
}

impl SampleFormat {
    /// Creates a new format.
    #[inline]
    pub const fn new(
        sample_rate: SampleRate,
        channels: ChannelCount,
        sample_type: SampleType,
    ) -> SampleFormat {
        SampleFormat {
            sample_rate,
            channels,
            sample_type,
        }
    }

    /// Creates a new format from values reported by a decoder or device.
    pub fn try_new(
        sample_rate: u32,
        channels: u16,
        sample_type: SampleType,
    ) -> Result<SampleFormat, FormatError> {
        let sample_rate = SampleRate::new(sample_rate).ok_or(FormatError::ZeroSampleRate)?;
        let channels = ChannelCount::new(channels).ok_or(FormatError::ZeroChannels)?;
        Ok(SampleFormat::new(sample_rate, channels, sample_type))
    }

    /// Number of channels as a `usize`, for indexing.
    #[inline]
    pub fn channel_count(&self) -> usize {
        usize::from(self.channels.get())
    }

    /// Size of one interleaved frame in bytes.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.sample_type.sample_size() * self.channel_count()
    }

    /// Bytes of audio per second of playback.
    #[inline]
    pub fn bytes_per_second(&self) -> u64 {
        u64::from(self.sample_rate.get()) * self.frame_size() as u64
    }

    /// Playback time covered by `bytes`, counting whole frames only.
    pub fn duration_of(&self, bytes: usize) -> Duration {
        let frames = (bytes / self.frame_size()) as u64;
        let rate = u64::from(self.sample_rate.get());
        let secs = frames / rate;
        let nanos = (frames % rate) * 1_000_000_000 / rate;
        Duration::new(secs, nanos as u32)
    }

    /// Bytes needed to hold `duration` of audio, rounded down to whole frames.
    pub fn bytes_for(&self, duration: Duration) -> usize {
        let frames = duration.as_nanos() * u128::from(self.sample_rate.get()) / 1_000_000_000;
        frames as usize * self.frame_size()
    }

    /// Exact ratio of this stream's rate to `output`'s rate, in lowest terms.
    pub fn rate_ratio(&self, output: &SampleFormat) -> Ratio<u32> {
        Ratio::new(self.sample_rate.get(), output.sample_rate.get())
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {}",
            self.sample_rate, self.channels, self.sample_type
        )
    }
}
