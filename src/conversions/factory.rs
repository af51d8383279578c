//! Format negotiation: picks the converter and quantizer for a pair of stream formats.

use std::fmt;

use super::converter::Converter;
use super::decimator::Decimator;
use super::format::{SampleFormat, SampleType};
use super::quantizer::{DitherState, FixedDither, FloatDither, Identity, QuantizeTarget};
use super::resampler::Resampler;
use crate::common::{ChannelCount, SampleRate};
use crate::math::rate_step;

/// Output buffer size used by [`ConverterSettings::default`], in bytes.
pub const DEFAULT_OUTPUT_BUFFER_SIZE: usize = 4096;

/// Reasons a pair of formats cannot be converted.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedConversion {
    /// Channels are converted independently and never remixed.
    #[error("Cannot change the channel count from {from} to {to}")]
    Channels {
        /// Channels in the decoded stream.
        from: ChannelCount,
        /// Channels the output accepts.
        to: ChannelCount,
    },
    /// No converter exists between these element types.
    #[error("No converter from {from} samples to {to} samples")]
    SampleTypes {
        /// Element type of the decoded stream.
        from: SampleType,
        /// Element type the output accepts.
        to: SampleType,
    },
    /// Float input can only be resampled into an integer output.
    #[error("Resampling to float output is not supported")]
    FloatResampling,
    /// The fixed-point input has too few or too many fractional bits for the target.
    #[error("A fixed-point stream with {frac_bits} fractional bits cannot be reduced to {target}")]
    FracBits {
        /// Fractional width declared by the decoder.
        frac_bits: u8,
        /// Element type the output accepts.
        target: SampleType,
    },
    /// The output rate is more than 65536 times the input rate, beyond the resampler's
    /// 16.16 step.
    #[error("Cannot resample from {from} Hz to {to} Hz")]
    RateRatio {
        /// Rate of the decoded stream.
        from: SampleRate,
        /// Rate the output accepts.
        to: SampleRate,
    },
}

/// Outcome of format negotiation.
pub enum ConversionPlan {
    /// Input and output formats are identical; decoded bytes can be played as they are.
    NoConversionNeeded,
    /// The formats cannot be converted. Playback of the stream must be refused or the output
    /// renegotiated.
    Unsupported(UnsupportedConversion),
    /// A converter bound to the negotiated pair of formats.
    Convert(Box<dyn Converter>),
}

impl ConversionPlan {
    /// Returns the converter, if one was built.
    pub fn into_converter(self) -> Option<Box<dyn Converter>> {
        match self {
            ConversionPlan::Convert(converter) => Some(converter),
            _ => None,
        }
    }

    /// Returns `true` if the formats were identical.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, ConversionPlan::NoConversionNeeded)
    }

    /// Returns the reason the formats cannot be converted, if any.
    pub fn unsupported(&self) -> Option<UnsupportedConversion> {
        match self {
            ConversionPlan::Unsupported(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Debug for ConversionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionPlan::NoConversionNeeded => f.write_str("NoConversionNeeded"),
            ConversionPlan::Unsupported(reason) => {
                f.debug_tuple("Unsupported").field(reason).finish()
            }
            ConversionPlan::Convert(converter) => f
                .debug_struct("Convert")
                .field("input", converter.input_format())
                .field("output", converter.output_format())
                .finish(),
        }
    }
}

/// Settings applied to every converter built by [`select_with`].
///
/// # Example
///
/// ```
/// use pcm_convert::conversions::ConverterSettings;
///
/// let settings = ConverterSettings::default()
///     .with_output_buffer_size(8192)
///     .with_dither_seed(42);
/// assert_eq!(settings.output_buffer_size, 8192);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterSettings {
    /// Largest output period, in bytes, the converter must be able to fill in one call.
    pub output_buffer_size: usize,
    /// Seed for the dither generators. `None` seeds from system entropy.
    pub dither_seed: Option<u64>,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            output_buffer_size: DEFAULT_OUTPUT_BUFFER_SIZE,
            dither_seed: None,
        }
    }
}

impl ConverterSettings {
    /// Sets the largest output period in bytes.
    pub fn with_output_buffer_size(mut self, bytes: usize) -> Self {
        self.output_buffer_size = bytes;
        self
    }

    /// Makes the dither sequence reproducible.
    pub fn with_dither_seed(mut self, seed: u64) -> Self {
        self.dither_seed = Some(seed);
        self
    }
}

/// Picks a converter from `input` to `output` able to fill `output_buffer_size` bytes per call.
///
/// Fixed-point sources carry their fractional width in [`SampleType::Fixed`].
pub fn select(
    input: &SampleFormat,
    output: &SampleFormat,
    output_buffer_size: usize,
) -> ConversionPlan {
    let settings = ConverterSettings::default().with_output_buffer_size(output_buffer_size);
    select_with(input, output, &settings)
}

/// Like [`select`], with explicit settings.
pub fn select_with(
    input: &SampleFormat,
    output: &SampleFormat,
    settings: &ConverterSettings,
) -> ConversionPlan {
    let plan = match build(input, output, settings) {
        Ok(Some(converter)) => ConversionPlan::Convert(converter),
        Ok(None) => ConversionPlan::NoConversionNeeded,
        Err(reason) => ConversionPlan::Unsupported(reason),
    };

    #[cfg(feature = "tracing")]
    match &plan {
        ConversionPlan::NoConversionNeeded => {
            tracing::debug!("{input} plays without conversion")
        }
        ConversionPlan::Unsupported(reason) => {
            tracing::warn!("cannot convert {input} to {output}: {reason}")
        }
        ConversionPlan::Convert(_) => tracing::debug!("converting {input} to {output}"),
    }

    plan
}

fn build(
    input: &SampleFormat,
    output: &SampleFormat,
    settings: &ConverterSettings,
) -> Result<Option<Box<dyn Converter>>, UnsupportedConversion> {
    if input == output {
        return Ok(None);
    }
    if input.channels != output.channels {
        return Err(UnsupportedConversion::Channels {
            from: input.channels,
            to: output.channels,
        });
    }

    let resample = input.sample_rate != output.sample_rate;
    if resample && rate_step(input.sample_rate.get(), output.sample_rate.get()) == 0 {
        return Err(UnsupportedConversion::RateRatio {
            from: input.sample_rate,
            to: output.sample_rate,
        });
    }
    let size = settings.output_buffer_size;
    let dither = || DitherState::new(input.channel_count(), settings.dither_seed);

    let converter: Box<dyn Converter> = match (input.sample_type, output.sample_type) {
        (SampleType::U8, SampleType::U8) => {
            Box::new(Resampler::<u8, u8, _>::new(*input, *output, size, Identity))
        }
        (SampleType::S16, SampleType::S16) => {
            Box::new(Resampler::<i16, i16, _>::new(*input, *output, size, Identity))
        }
        (SampleType::Float, SampleType::U8) => {
            from_float::<u8>(input, output, size, resample, dither())
        }
        (SampleType::Float, SampleType::S16) => {
            from_float::<i16>(input, output, size, resample, dither())
        }
        (SampleType::Float, SampleType::Float) => {
            return Err(UnsupportedConversion::FloatResampling)
        }
        (SampleType::Fixed { frac_bits }, SampleType::U8) => {
            from_fixed::<u8>(input, output, size, resample, frac_bits, dither())?
        }
        (SampleType::Fixed { frac_bits }, SampleType::S16) => {
            from_fixed::<i16>(input, output, size, resample, frac_bits, dither())?
        }
        (from, to) => return Err(UnsupportedConversion::SampleTypes { from, to }),
    };
    Ok(Some(converter))
}

fn from_float<O: QuantizeTarget>(
    input: &SampleFormat,
    output: &SampleFormat,
    size: usize,
    resample: bool,
    dither: DitherState,
) -> Box<dyn Converter> {
    let quantizer = FloatDither::<O>::new(dither);
    if resample {
        Box::new(Resampler::<f32, O, _>::new(*input, *output, size, quantizer))
    } else {
        Box::new(Decimator::<f32, O, _>::new(*input, *output, size, quantizer))
    }
}

fn from_fixed<O: QuantizeTarget>(
    input: &SampleFormat,
    output: &SampleFormat,
    size: usize,
    resample: bool,
    frac_bits: u8,
    dither: DitherState,
) -> Result<Box<dyn Converter>, UnsupportedConversion> {
    let quantizer = FixedDither::<O>::new(frac_bits, dither)?;
    Ok(if resample {
        Box::new(Resampler::<i32, O, _>::new(*input, *output, size, quantizer))
    } else {
        Box::new(Decimator::<i32, O, _>::new(*input, *output, size, quantizer))
    })
}
