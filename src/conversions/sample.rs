//! Element types a converter reads from and writes to raw byte buffers.

use dasp_sample::Sample;

use crate::math::{lerp_fixed, lerp_float};

/// A PCM element that can live in a raw, native-endian byte buffer.
///
/// This trait is implemented for the element types a decoder may hand to a converter:
///
/// - `u8`: silence at `128`, interpolated in the signed domain.
/// - `i16`: silence at `0`.
/// - `i32`: 32-bit fixed-point streams, whatever their fractional width.
/// - `f32`: nominal range `[-1.0, 1.0]`, interpolated in floating point.
pub trait PcmSample: Sample + Send + 'static {
    /// Width of the element in bytes.
    const SIZE: usize;

    /// Reads one element from exactly [`Self::SIZE`] bytes.
    fn read(bytes: &[u8]) -> Self;

    /// Writes the element into exactly [`Self::SIZE`] bytes.
    fn write(self, out: &mut [u8]);

    /// Linear interpolation between two samples.
    ///
    /// `frac` is a 16-bit position: 0 yields `first`, 65536 would yield `second`. Integer types
    /// are promoted to a 64-bit accumulator so the difference never overflows.
    fn lerp(first: Self, second: Self, frac: u32) -> Self;
}

impl PcmSample for u8 {
    const SIZE: usize = 1;

    #[inline]
    fn read(bytes: &[u8]) -> u8 {
        bytes[0]
    }

    #[inline]
    fn write(self, out: &mut [u8]) {
        out[0] = self;
    }

    #[inline]
    fn lerp(first: u8, second: u8, frac: u32) -> u8 {
        let a = i64::from(first.to_signed_sample());
        let b = i64::from(second.to_signed_sample());
        (lerp_fixed(a, b, frac) as i8).to_sample::<u8>()
    }
}

macro_rules! impl_signed_pcm {
    ($t:ty) => {
        impl PcmSample for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline]
            fn read(bytes: &[u8]) -> $t {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                <$t>::from_ne_bytes(raw)
            }

            #[inline]
            fn write(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_ne_bytes());
            }

            #[inline]
            fn lerp(first: $t, second: $t, frac: u32) -> $t {
                lerp_fixed(i64::from(first), i64::from(second), frac) as $t
            }
        }
    };
}

impl_signed_pcm!(i16);
impl_signed_pcm!(i32);

impl PcmSample for f32 {
    const SIZE: usize = 4;

    #[inline]
    fn read(bytes: &[u8]) -> f32 {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(bytes);
        f32::from_ne_bytes(raw)
    }

    #[inline]
    fn write(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_ne_bytes());
    }

    #[inline]
    fn lerp(first: f32, second: f32, frac: u32) -> f32 {
        lerp_float(first, second, frac)
    }
}

/// Reads the element for `channel` of the frame at `frame` from an interleaved buffer.
#[inline]
pub(crate) fn read_at<S: PcmSample>(buf: &[u8], frame: usize, channels: usize, channel: usize) -> S {
    let at = (frame * channels + channel) * S::SIZE;
    S::read(&buf[at..at + S::SIZE])
}

/// Writes the element for `channel` of the frame at `frame` into an interleaved buffer.
#[inline]
pub(crate) fn write_at<S: PcmSample>(
    buf: &mut [u8],
    frame: usize,
    channels: usize,
    channel: usize,
    value: S,
) {
    let at = (frame * channels + channel) * S::SIZE;
    value.write(&mut buf[at..at + S::SIZE]);
}
