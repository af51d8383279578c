/*!
Conversion of decoded PCM streams to the format an output device accepts.

A decoder produces interleaved samples at its own rate and precision. This module picks and
drives the converter that changes the sample rate, reduces the bit depth with dither, or both.
Channel counts are never changed.

Use [`select`] to negotiate a converter for a pair of formats.
*/

pub use self::converter::{Converter, StagingBuffer};
pub use self::decimator::Decimator;
pub use self::factory::{
    select, select_with, ConversionPlan, ConverterSettings, UnsupportedConversion,
    DEFAULT_OUTPUT_BUFFER_SIZE,
};
pub use self::format::{FormatError, SampleFormat, SampleType};
pub use self::quantizer::{
    DitherState, FixedDither, FloatDither, Identity, QuantizeTarget, Quantizer, MAX_FRAC_BITS,
};
pub use self::resampler::Resampler;
pub use self::sample::PcmSample;

mod converter;
mod decimator;
mod factory;
mod format;
mod quantizer;
mod resampler;
pub mod sample;
