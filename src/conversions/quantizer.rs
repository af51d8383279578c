//! Per-channel requantization with triangular (TPDF) dither.
//!
//! A quantizer maps one sample from the decoder's numeric domain to the output device's
//! narrower integer domain. Before the bit depth is reduced, the sum of two independent uniform
//! pseudo-random draws is added to the sample. The sum has a triangular probability density,
//! which decorrelates the quantization error from the signal, so low level detail turns into a
//! constant noise floor rather than harmonic distortion.
//!
//! Each channel owns two 32-bit linear congruential generators. They are seeded once, when the
//! quantizer is created, and never shared with another stream.

use std::marker::PhantomData;

use rand::{rngs::SmallRng, Rng, SeedableRng};

use super::factory::UnsupportedConversion;
use super::format::SampleType;
use super::sample::PcmSample;

const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;

/// Widest fractional part a fixed-point stream may declare.
pub const MAX_FRAC_BITS: u8 = 30;

/// Converts a sample of type `I` for `channel` into type `O`.
pub trait Quantizer<I, O>: Send {
    /// Quantizes one sample.
    fn quantize(&mut self, sample: I, channel: usize) -> O;
}

/// An integer output type a dithering quantizer can target.
pub trait QuantizeTarget: PcmSample {
    /// Bits of resolution in the output.
    const BITS: u32;

    /// Format tag of this output type.
    const SAMPLE_TYPE: SampleType;

    /// Builds the output element from a value centered on zero, already clamped to
    /// `[-2^(BITS-1), 2^(BITS-1) - 1]`.
    fn from_centered(value: i32) -> Self;
}

impl QuantizeTarget for u8 {
    const BITS: u32 = 8;
    const SAMPLE_TYPE: SampleType = SampleType::U8;

    #[inline]
    fn from_centered(value: i32) -> u8 {
        (value + 128) as u8
    }
}

impl QuantizeTarget for i16 {
    const BITS: u32 = 16;
    const SAMPLE_TYPE: SampleType = SampleType::S16;

    #[inline]
    fn from_centered(value: i32) -> i16 {
        value as i16
    }
}

/// Passes samples through unchanged. Used when input and output share a numeric type.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<T: PcmSample> Quantizer<T, T> for Identity {
    #[inline]
    fn quantize(&mut self, sample: T, _channel: usize) -> T {
        sample
    }
}

#[inline]
fn lcg(state: u32) -> u32 {
    state
        .wrapping_mul(LCG_MULTIPLIER)
        .wrapping_add(LCG_INCREMENT)
}

/// Two LCG words per channel.
#[derive(Clone, Debug)]
pub struct DitherState {
    seeds: Vec<[u32; 2]>,
}

impl DitherState {
    /// Seeds the generators for `channels` channels.
    ///
    /// With `seed` the sequence is reproducible; without it the words are drawn from system
    /// entropy so independently created streams do not share a noise pattern.
    pub fn new(channels: usize, seed: Option<u64>) -> Self {
        let mut rng: SmallRng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => rand::make_rng(),
        };
        let seeds = (0..channels)
            .map(|_| [rng.next_u32(), rng.next_u32()])
            .collect();
        Self { seeds }
    }

    /// Number of channels this state was seeded for.
    #[inline]
    pub fn channels(&self) -> usize {
        self.seeds.len()
    }

    /// Advances both generators of `channel` and returns their new values.
    #[inline]
    pub fn next(&mut self, channel: usize) -> (u32, u32) {
        let words = &mut self.seeds[channel];
        words[0] = lcg(words[0]);
        words[1] = lcg(words[1]);
        (words[0], words[1])
    }
}

/// Reduces fixed-point samples with `frac_bits` fractional bits to `O`.
#[derive(Clone, Debug)]
pub struct FixedDither<O> {
    dither: DitherState,
    scale_bits: u32,
    mask: u32,
    offset: i64,
    clip: i64,
    output: PhantomData<O>,
}

impl<O: QuantizeTarget> FixedDither<O> {
    /// Creates a quantizer for samples scaled by `2^frac_bits`.
    ///
    /// The input must carry at least `O::BITS - 1` fractional bits, and at most
    /// [`MAX_FRAC_BITS`].
    pub fn new(frac_bits: u8, dither: DitherState) -> Result<Self, UnsupportedConversion> {
        let frac = u32::from(frac_bits);
        if frac_bits > MAX_FRAC_BITS || frac + 1 < O::BITS {
            return Err(UnsupportedConversion::FracBits {
                frac_bits,
                target: O::SAMPLE_TYPE,
            });
        }

        let scale_bits = frac + 1 - O::BITS;
        let mask = (1u32 << scale_bits) - 1;
        // Centers the dither so the mean output equals the undithered value.
        let offset = if scale_bits == 0 {
            0
        } else {
            1i64 << (scale_bits - 1)
        };
        Ok(Self {
            dither,
            scale_bits,
            mask,
            offset,
            clip: 1i64 << frac,
            output: PhantomData,
        })
    }

    /// Bits dropped from every sample.
    #[inline]
    pub fn scale_bits(&self) -> u32 {
        self.scale_bits
    }

    /// Uniform draw in `[0, mask]`.
    ///
    /// Takes the top bits of the generator word: the low bits of a power-of-two LCG repeat with
    /// a period of only `2^(k+1)` for bit `k`.
    #[inline]
    fn draw(&self, word: u32) -> i64 {
        if self.scale_bits == 0 {
            0
        } else {
            i64::from((word >> (32 - self.scale_bits)) & self.mask)
        }
    }
}

impl<O: QuantizeTarget> Quantizer<i32, O> for FixedDither<O> {
    #[inline]
    fn quantize(&mut self, sample: i32, channel: usize) -> O {
        let (a, b) = self.dither.next(channel);
        let noise = self.draw(a) + self.draw(b) - self.offset;
        let value = (i64::from(sample) + noise).clamp(-self.clip, self.clip - 1);
        O::from_centered((value >> self.scale_bits) as i32)
    }
}

/// Reduces floating point samples in `[-1.0, 1.0]` to `O`.
#[derive(Clone, Debug)]
pub struct FloatDither<O> {
    dither: DitherState,
    max: f32,
    output: PhantomData<O>,
}

impl<O: QuantizeTarget> FloatDither<O> {
    /// Creates a new quantizer.
    pub fn new(dither: DitherState) -> Self {
        Self {
            dither,
            max: (1u32 << (O::BITS - 1)) as f32,
            output: PhantomData,
        }
    }
}

#[inline]
fn unit(word: u32) -> f32 {
    // 24 bits fit an f32 mantissa exactly, so the top of the range stays open.
    (word >> 8) as f32 / (1u32 << 24) as f32
}

impl<O: QuantizeTarget> Quantizer<f32, O> for FloatDither<O> {
    #[inline]
    fn quantize(&mut self, sample: f32, channel: usize) -> O {
        let (a, b) = self.dither.next(channel);
        // Two draws in [0, 1) summed and centered give a triangle over (-1, 1) LSB.
        let noise = unit(a) + unit(b) - 1.0;
        let value = (sample * self.max + noise)
            .round()
            .clamp(-self.max, self.max - 1.0);
        O::from_centered(value as i32)
    }
}
