//! Fixed-point helpers shared by the converters.

/// Number of fractional bits in the resampler's phase accumulator.
pub const PHASE_BITS: u32 = 16;

/// `1.0` in 16.16 fixed point.
pub const PHASE_ONE: u64 = 1 << PHASE_BITS;

/// Largest fractional part of a 16.16 value.
pub const PHASE_MASK: u64 = PHASE_ONE - 1;

/// Builds a `NonZero` from a literal, checked at compile time.
///
/// ```
/// use pcm_convert::math::nz;
/// let rate = nz!(44100u32);
/// assert_eq!(rate.get(), 44100);
/// ```
#[macro_export]
macro_rules! nz {
    ($n:literal) => {
        const { ::core::num::NonZero::new($n).unwrap() }
    };
}
pub use nz;

/// Input frames advanced per output frame, in 16.16 fixed point.
#[inline]
pub fn rate_step(from: u32, to: u32) -> u64 {
    (u64::from(from) << PHASE_BITS) / u64::from(to)
}

/// Whole part of a 16.16 value.
#[inline]
pub fn phase_whole(phase: u64) -> u64 {
    phase >> PHASE_BITS
}

/// Fractional part of a 16.16 value.
#[inline]
pub fn phase_frac(phase: u64) -> u32 {
    (phase & PHASE_MASK) as u32
}

/// Rounds a 16.16 value up to the next whole number.
#[inline]
pub fn phase_ceil(phase: u64) -> u64 {
    (phase + PHASE_MASK) >> PHASE_BITS
}

/// Linear interpolation between two integer samples.
///
/// `frac` is the 16-bit position between `first` (0) and `second` (65536).
#[inline]
pub fn lerp_fixed(first: i64, second: i64, frac: u32) -> i64 {
    first + (((second - first) * i64::from(frac)) >> PHASE_BITS)
}

/// Floating point counterpart of [`lerp_fixed`].
#[inline]
pub fn lerp_float(first: f32, second: f32, frac: u32) -> f32 {
    first + (second - first) * (frac as f32 / PHASE_ONE as f32)
}
