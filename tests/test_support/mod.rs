#![allow(dead_code)]
/// in separate folder so its not ran as integration test
use std::f32::consts::TAU;

use pcm_convert::conversions::PcmSample;
use pcm_convert::{Converter, SampleFormat, SampleType};

pub fn format(rate: u32, channels: u16, sample_type: SampleType) -> SampleFormat {
    SampleFormat::try_new(rate, channels, sample_type).expect("rate and channels are non-zero")
}

pub fn to_bytes<S: PcmSample>(samples: &[S]) -> Vec<u8> {
    let mut bytes = vec![0u8; samples.len() * S::SIZE];
    for (sample, out) in samples.iter().zip(bytes.chunks_exact_mut(S::SIZE)) {
        sample.write(out);
    }
    bytes
}

pub fn from_bytes<S: PcmSample>(bytes: &[u8]) -> Vec<S> {
    bytes.chunks_exact(S::SIZE).map(S::read).collect()
}

/// Mono ramp starting at zero.
pub fn ramp(len: usize, step: i16) -> Vec<i16> {
    (0..len as i16).map(|n| n * step).collect()
}

/// Interleaved sine with the same phase on every channel.
pub fn sine(freq: f32, rate: u32, frames: usize, channels: usize, amplitude: f32) -> Vec<f32> {
    (0..frames)
        .flat_map(|n| {
            let value = amplitude * (TAU * freq * n as f32 / rate as f32).sin();
            std::iter::repeat_n(value, channels)
        })
        .collect()
}

/// Scales float samples to fixed point with `frac_bits` fractional bits.
pub fn to_fixed(samples: &[f32], frac_bits: u8) -> Vec<i32> {
    let scale = (1u64 << frac_bits) as f64;
    samples
        .iter()
        .map(|s| (f64::from(*s) * scale).round() as i32)
        .collect()
}

/// Feeds `input` through `converter` in periods of `period` bytes until nothing more is
/// written. Panics if a call writes more than it was asked for.
pub fn run(converter: &mut dyn Converter, input: &[u8], period: usize) -> Vec<u8> {
    let mut remaining = input;
    let mut output = Vec::new();
    let mut out = vec![0u8; period];
    loop {
        let take = converter.input_needed(period).min(remaining.len());
        converter.buffer(period)[..take].copy_from_slice(&remaining[..take]);
        remaining = &remaining[take..];

        let written = converter.convert(take, &mut out);
        assert!(written <= period, "wrote {written} bytes into {period}");
        if written == 0 {
            return output;
        }
        output.extend_from_slice(&out[..written]);
    }
}
