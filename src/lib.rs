//! PCM format conversion between audio decoders and output devices.
//!
//! A decoder hands out interleaved samples in whatever format the file was encoded in. An
//! output device accepts a handful of formats, usually 8 or 16-bit integers at a fixed rate.
//! This crate bridges the two:
//!
//! - [`select`] compares the decoder's [`SampleFormat`] with the device's and returns a
//!   [`ConversionPlan`]: nothing to do, an unsupported pair, or a boxed [`Converter`].
//! - A [`Converter`] changes the sample rate by linear interpolation and reduces the bit depth
//!   with triangular dither. It works on raw native-endian byte buffers so it can sit between
//!   a decoder and a device callback without any per-sample allocation.
//! - [`Pipeline`](pipeline::Pipeline) wires a converter to any [`std::io::Read`] and produces
//!   one output period per call.
//!
//! Channel counts are never changed and no anti-aliasing filter is applied.
//!
//! # Example
//!
//! ```
//! use pcm_convert::math::nz;
//! use pcm_convert::{select, ConversionPlan, SampleFormat, SampleType};
//!
//! let decoded = SampleFormat::new(nz!(44100), nz!(2), SampleType::Fixed { frac_bits: 28 });
//! let device = SampleFormat::new(nz!(48000), nz!(2), SampleType::S16);
//!
//! let ConversionPlan::Convert(mut converter) = select(&decoded, &device, 4096) else {
//!     panic!("fixed point to s16 is always supported");
//! };
//!
//! // One tick of the audio callback.
//! let needed = converter.input_needed(4096);
//! converter.buffer(4096).fill(0); // decoder output goes here
//! let mut period = vec![0u8; 4096];
//! let written = converter.convert(needed, &mut period);
//! assert_eq!(written, 4096);
//! ```
//!
//! # Optional features
//!
//! - `tracing`: logs format negotiation and end of stream through the `tracing` crate.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

mod common;

pub mod conversions;
pub mod math;
pub mod pipeline;

pub use crate::common::{ChannelCount, SampleRate};
pub use crate::conversions::{
    select, select_with, ConversionPlan, Converter, ConverterSettings, FormatError, SampleFormat,
    SampleType, UnsupportedConversion,
};
pub use crate::pipeline::{PcmSource, Pipeline};
