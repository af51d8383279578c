use super::Resampler;
use crate::common::{ChannelCount, SampleRate};
use crate::conversions::quantizer::Identity;
use crate::conversions::sample::PcmSample;
use crate::conversions::{Converter, SampleFormat, SampleType};
use crate::math::{phase_whole, PHASE_ONE};
use num_rational::Ratio;
use quickcheck::{quickcheck, TestResult};

fn s16(rate: u32, channels: u16) -> SampleFormat {
    SampleFormat::new(
        SampleRate::new(rate).unwrap(),
        ChannelCount::new(channels).unwrap(),
        SampleType::S16,
    )
}

fn resampler(from: u32, to: u32, channels: u16, out_bytes: usize) -> Resampler<i16, i16, Identity> {
    Resampler::new(s16(from, channels), s16(to, channels), out_bytes, Identity)
}

fn to_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

fn from_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes.chunks_exact(2).map(i16::read).collect()
}

/// Feeds `input` through the converter one period of `out_bytes` at a time until it is
/// drained, checking that no call writes more than it was asked for.
fn drive(conv: &mut impl Converter, input: &[i16], out_bytes: usize) -> Vec<i16> {
    let input = to_bytes(input);
    let mut remaining = &input[..];
    let mut output = Vec::new();
    let mut period = vec![0u8; out_bytes];
    loop {
        let take = conv.input_needed(out_bytes).min(remaining.len());
        conv.buffer(out_bytes)[..take].copy_from_slice(&remaining[..take]);
        remaining = &remaining[take..];

        let written = conv.convert(take, &mut period);
        assert!(written <= out_bytes);
        if written == 0 {
            break;
        }
        output.extend_from_slice(&period[..written]);
    }
    from_bytes(&output)
}

#[test]
fn buffer_size_exact_ratio() {
    let conv = resampler(44100, 22050, 1, 1000);
    assert_eq!(conv.buffer_size(1000), 2000);
}

#[test]
fn buffer_size_rounds_up_partial_frames() {
    // 3 output frames at 2:3 need exactly 2 input frames, 4 need 2.67 -> 3.
    let conv = resampler(2000, 3000, 2, 64);
    assert_eq!(conv.buffer_size(3 * 4), 2 * 4);
    assert_eq!(conv.buffer_size(4 * 4), 3 * 4);
}

#[test]
fn input_needed_keeps_one_frame_of_margin() {
    let conv = resampler(22050, 44100, 1, 2000);
    // 1000 output frames at 1:2 read up to input frame 499 and its successor.
    assert_eq!(conv.input_needed(2000), 501 * 2);
    assert_eq!(conv.buffer_size(2000), 500 * 2);
}

#[test]
fn half_sample_rate() {
    let input = [1i16, 16, 2, 17, 3, 18, 4, 19, 5, 20, 6, 21];
    let mut conv = resampler(44100, 22050, 2, 3 * 4);
    assert_eq!(drive(&mut conv, &input, 3 * 4), [1, 16, 3, 18, 5, 20]);
}

#[test]
fn double_sample_rate() {
    let input = [2i16, 16, 4, 18, 6, 20, 8, 22];
    let mut conv = resampler(22050, 44100, 2, 4 * 4);
    let output = drive(&mut conv, &input, 4 * 4);
    assert_eq!(output[..14], [2, 16, 3, 17, 4, 18, 5, 19, 6, 20, 7, 21, 8, 22]);
    // The last input frame is held once the stream ends.
    assert_eq!(output[14..], [8, 22]);
}

#[test]
fn ramp_is_continuous_across_calls() {
    // Ratio 3:2 on a ramp rising by 8 per frame: output frame j sits on input frame 1.5 * j.
    // An odd period leaves half a frame of phase between calls, so the carry alternates.
    let input: Vec<i16> = (0..400).map(|n| n * 8).collect();
    let input = to_bytes(&input);
    let mut remaining = &input[..];
    let mut conv = resampler(48000, 32000, 1, 51 * 2);
    let mut output = Vec::new();
    for _ in 0..3 {
        let need = conv.input_needed(102);
        let take = need.min(remaining.len());
        assert_eq!(take, need);
        conv.buffer(102).copy_from_slice(&remaining[..take]);
        remaining = &remaining[take..];

        let mut period = [0u8; 102];
        assert_eq!(conv.convert(take, &mut period), 102);
        assert!(conv.carry() <= 2);
        output.extend(from_bytes(&period));
    }
    let expected: Vec<i16> = (0..153).map(|j| j * 12).collect();
    assert_eq!(output, expected);
}

#[test]
fn carry_is_bounded() {
    let input: Vec<i16> = (0..2000).collect();
    let mut conv = resampler(44100, 48000, 1, 256);
    let bytes = to_bytes(&input);
    let mut offset = 0;
    for _ in 0..10 {
        let need = conv.input_needed(256);
        conv.buffer(256).copy_from_slice(&bytes[offset..offset + need]);
        offset += need;
        conv.convert(need, &mut [0u8; 256]);
        assert!(conv.carry() < conv.capacity());
        assert!(conv.carry() <= 2 * 2);
    }
}

#[test]
fn reset_forgets_carry() {
    let mut conv = resampler(22050, 44100, 1, 8);
    let need = conv.input_needed(8);
    conv.buffer(8).fill(1);
    conv.convert(need, &mut [0u8; 8]);
    assert_ne!(conv.carry(), 0);

    conv.reset();
    assert_eq!(conv.carry(), 0);
    assert_eq!(conv.input_needed(8), 3 * 2);
}

#[test]
fn requests_are_clamped_to_negotiated_size() {
    let conv = resampler(44100, 22050, 1, 100);
    assert_eq!(conv.input_needed(10_000), conv.input_needed(100));
}

#[test]
fn ratio_is_exact() {
    let conv = resampler(44100, 48000, 2, 1024);
    assert_eq!(conv.ratio(), Ratio::new(147, 160));
    assert_eq!(conv.step(), (44100 << 16) / 48000);
}

/// Runs `calls` full periods and returns the input frames delivered and output frames produced.
fn steady_state(conv: &mut impl Converter, out_bytes: usize, calls: usize) -> (usize, usize) {
    let frame = conv.input_format().frame_size();
    let mut delivered = 0;
    let mut produced = 0;
    let mut period = vec![0u8; out_bytes];
    for _ in 0..calls {
        let need = conv.input_needed(out_bytes);
        conv.buffer(out_bytes).fill(0);
        delivered += need / frame;
        produced += conv.convert(need, &mut period) / conv.output_format().frame_size();
    }
    (delivered, produced)
}

quickcheck! {
    fn no_overrun(from: u16, to: u16, channels: u8, out_bytes: u16, input: Vec<i16>) -> TestResult {
        if from == 0 || to == 0 || channels == 0 || channels > 8 {
            return TestResult::discard();
        }
        if u32::from(from) > 16 * u32::from(to) || u32::from(to) > 16 * u32::from(from) {
            return TestResult::discard();
        }
        let out_bytes = usize::from(out_bytes % 4096);
        let mut conv = resampler(from.into(), to.into(), channels.into(), out_bytes);
        // `drive` asserts every call stays within the period.
        drive(&mut conv, &input, out_bytes);
        TestResult::passed()
    }

    fn phase_accounts_for_every_frame(from: u16, to: u16, out_frames: u8, calls: u8) -> TestResult {
        if from == 0 || to == 0 || out_frames == 0 {
            return TestResult::discard();
        }
        if u32::from(from) > 8 * u32::from(to) || u32::from(to) > 8 * u32::from(from) {
            return TestResult::discard();
        }
        let out_bytes = usize::from(out_frames) * 2;
        let mut conv = resampler(from.into(), to.into(), 1, out_bytes);
        let (delivered, produced) = steady_state(&mut conv, out_bytes, calls.into());

        // Every produced frame advanced the read position by exactly one step.
        let consumed = (delivered - conv.carry() / 2) as u64;
        let position = consumed * PHASE_ONE + conv.phase;
        TestResult::from_bool(
            produced == usize::from(out_frames) * usize::from(calls)
                && position == produced as u64 * conv.step(),
        )
    }

    fn consumption_tracks_ratio(from: u16, to: u16, calls: u8) -> TestResult {
        if from == 0 || to == 0 || calls == 0 {
            return TestResult::discard();
        }
        if u32::from(from) > 8 * u32::from(to) || u32::from(to) > 8 * u32::from(from) {
            return TestResult::discard();
        }
        let out_bytes = 64 * 2;
        let mut conv = resampler(from.into(), to.into(), 1, out_bytes);
        let (delivered, produced) = steady_state(&mut conv, out_bytes, calls.into());

        let consumed = phase_whole(produced as u64 * conv.step()) as f64;
        let expected = produced as f64 * f64::from(from) / f64::from(to);
        // The 16.16 step truncates by under one frame per 65536 output frames.
        let drift = produced as f64 / PHASE_ONE as f64;
        TestResult::from_bool(
            (consumed - expected).abs() <= 1.0 + drift
                && delivered as f64 <= consumed + 2.0,
        )
    }

    fn divide_sample_rate(to: u16, k: u8, input: Vec<i16>, channels: u8) -> TestResult {
        if k == 0 || k > 16 || channels == 0 || channels > 8 || to == 0 {
            return TestResult::discard();
        }
        let to = u32::from(to);
        let from = to * u32::from(k);

        // Truncate the input, so it contains an integer number of frames.
        let input = {
            let ns = usize::from(channels);
            let mut i = input;
            i.truncate(ns * (i.len() / ns));
            i
        };

        let out_bytes = 16 * usize::from(channels) * 2;
        let mut conv = resampler(from, to, channels.into(), out_bytes);
        let output = drive(&mut conv, &input, out_bytes);

        TestResult::from_bool(
            input
                .chunks_exact(channels.into())
                .step_by(k.into())
                .collect::<Vec<_>>()
                .concat()
                == output,
        )
    }

    fn multiply_sample_rate(from: u16, shift: u8, input: Vec<i16>, channels: u8) -> TestResult {
        // Only powers of two give an exact 16.16 step when upsampling.
        if shift > 3 || channels == 0 || channels > 8 || from == 0 {
            return TestResult::discard();
        }
        let k = 1usize << shift;
        let from = u32::from(from);
        let to = from * k as u32;

        let input = {
            let ns = usize::from(channels);
            let mut i = input;
            i.truncate(ns * (i.len() / ns));
            i
        };

        let out_bytes = 16 * usize::from(channels) * 2;
        let mut conv = resampler(from, to, channels.into(), out_bytes);
        let output = drive(&mut conv, &input, out_bytes);

        TestResult::from_bool(
            input
                == output
                    .chunks_exact(channels.into())
                    .step_by(k)
                    .collect::<Vec<_>>()
                    .concat(),
        )
    }
}
