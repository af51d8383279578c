//! Drives a converter from a byte source, one output period at a time.
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use pcm_convert::math::nz;
//! use pcm_convert::pipeline::Pipeline;
//! use pcm_convert::{ConverterSettings, SampleFormat, SampleType};
//!
//! let input = SampleFormat::new(nz!(44100), nz!(1), SampleType::S16);
//! let output = SampleFormat::new(nz!(22050), nz!(1), SampleType::S16);
//! let samples: Vec<u8> = (0..64i16).flat_map(|s| s.to_ne_bytes()).collect();
//!
//! let mut pipeline = Pipeline::new(Cursor::new(samples), input, output, ConverterSettings::default())?;
//! let mut period = [0u8; 16];
//! let mut total = 0;
//! loop {
//!     let written = pipeline.fill(&mut period)?;
//!     if written == 0 {
//!         break;
//!     }
//!     total += written;
//! }
//! assert_eq!(total, 32 * 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io;

use crate::conversions::{
    select_with, ConversionPlan, Converter, ConverterSettings, SampleFormat,
    UnsupportedConversion,
};

/// A producer of raw PCM bytes, such as a decoder.
pub trait PcmSource {
    /// Reads up to `buf.len()` bytes. Returning `0` marks the end of the stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: io::Read> PcmSource for R {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }
}

enum Stage {
    Passthrough,
    Convert(Box<dyn Converter>),
}

/// Pulls decoded bytes from a [`PcmSource`] and hands out converted output periods.
pub struct Pipeline<S> {
    source: S,
    input: SampleFormat,
    output: SampleFormat,
    stage: Stage,
    drained: bool,
    finished: bool,
}

impl<S: PcmSource> Pipeline<S> {
    /// Negotiates a converter from `input` to `output` and binds it to `source`.
    pub fn new(
        source: S,
        input: SampleFormat,
        output: SampleFormat,
        settings: ConverterSettings,
    ) -> Result<Self, UnsupportedConversion> {
        let stage = match select_with(&input, &output, &settings) {
            ConversionPlan::NoConversionNeeded => Stage::Passthrough,
            ConversionPlan::Unsupported(reason) => return Err(reason),
            ConversionPlan::Convert(converter) => Stage::Convert(converter),
        };
        Ok(Self {
            source,
            input,
            output,
            stage,
            drained: false,
            finished: false,
        })
    }

    /// Produces the next output period into `out` and returns the number of bytes written.
    ///
    /// Less than `out.len()` is written once the source runs dry, and `0` once everything
    /// has been played.
    pub fn fill(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.finished {
            return Ok(0);
        }

        let written = match &mut self.stage {
            Stage::Passthrough => {
                let frame = self.output.frame_size();
                let len = out.len() / frame * frame;
                let filled = read_full(&mut self.source, &mut out[..len])?;
                if filled < len {
                    self.drained = true;
                }
                // A trailing partial frame cannot be played.
                filled / frame * frame
            }
            Stage::Convert(converter) => {
                // The converter caps each call at its negotiated period, so larger requests
                // are filled in several rounds.
                let mut written = 0;
                while written < out.len() {
                    let rest = &mut out[written..];
                    let region = converter.buffer(rest.len());
                    let filled = if self.drained {
                        0
                    } else {
                        read_full(&mut self.source, region)?
                    };
                    if filled < region.len() {
                        self.drained = true;
                    }
                    let converted = converter.convert(filled, rest);
                    if converted == 0 {
                        break;
                    }
                    written += converted;
                }
                written
            }
        };

        if written == 0 && self.drained {
            #[cfg(feature = "tracing")]
            tracing::debug!("end of stream ({})", self.input);
            self.finished = true;
        }
        Ok(written)
    }

    /// Discards buffered input, for instance after the source was repositioned.
    pub fn reset(&mut self) {
        if let Stage::Convert(converter) = &mut self.stage {
            converter.reset();
        }
        self.drained = false;
        self.finished = false;
    }

    /// Returns `true` once the source is exhausted and all its samples were played.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns `true` if bytes are handed out without conversion.
    pub fn is_passthrough(&self) -> bool {
        matches!(self.stage, Stage::Passthrough)
    }

    /// Format of the bytes read from the source.
    pub fn input_format(&self) -> &SampleFormat {
        &self.input
    }

    /// Format of the bytes written by [`fill`](Pipeline::fill).
    pub fn output_format(&self) -> &SampleFormat {
        &self.output
    }

    /// Mutable access to the source, for seeking. Call [`reset`](Pipeline::reset) afterwards.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

/// Reads until `buf` is full or the source ends.
fn read_full<S: PcmSource>(source: &mut S, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
