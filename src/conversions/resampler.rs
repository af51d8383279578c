use std::marker::PhantomData;

use num_rational::Ratio;

use super::converter::{Converter, StagingBuffer};
use super::format::SampleFormat;
use super::quantizer::Quantizer;
use super::sample::{read_at, write_at, PcmSample};
use crate::math::{phase_ceil, phase_frac, phase_whole, rate_step, PHASE_MASK, PHASE_ONE};

#[cfg(test)]
mod test;

/// Converter that changes the sample rate by linear interpolation.
///
/// The read position is a 16.16 fixed-point accumulator advanced by `input_rate / output_rate`
/// for every output frame. Input frames that are still needed once the output is full are
/// moved to the front of the staging buffer, so the next call continues the stream without
/// duplicating or dropping frames.
#[derive(Debug)]
pub struct Resampler<I, O, Q> {
    input: SampleFormat,
    output: SampleFormat,
    /// Input frames per output frame, 16.16.
    step: u64,
    /// Read position relative to the start of the staging buffer, 16.16.
    phase: u64,
    /// Most output frames produced by one call.
    max_frames: usize,
    staging: StagingBuffer,
    quantizer: Q,
    samples: PhantomData<fn(I) -> O>,
}

impl<I, O, Q> Resampler<I, O, Q>
where
    I: PcmSample,
    O: PcmSample,
    Q: Quantizer<I, O>,
{
    /// Creates a resampler producing at most `output_buffer_size` bytes per call.
    ///
    /// # Panic
    ///
    /// Panics if the channel counts differ, the element types do not match `I` and `O`, or the
    /// output rate is too far above the input rate for a 16.16 step.
    pub fn new(
        input: SampleFormat,
        output: SampleFormat,
        output_buffer_size: usize,
        quantizer: Q,
    ) -> Self {
        assert_eq!(input.channels, output.channels);
        assert_eq!(input.sample_type.sample_size(), I::SIZE);
        assert_eq!(output.sample_type.sample_size(), O::SIZE);

        let step = rate_step(input.sample_rate.get(), output.sample_rate.get());
        assert!(step > 0, "rate step truncates to zero");
        let max_frames = (output_buffer_size / output.frame_size()).max(1);

        // Between calls the phase stays below one step plus a frame.
        let capacity = required_frames(step, step + PHASE_MASK, max_frames);

        Self {
            input,
            output,
            step,
            phase: 0,
            max_frames,
            staging: StagingBuffer::new(capacity * input.frame_size()),
            quantizer,
            samples: PhantomData,
        }
    }

    /// The 16.16 rate ratio used to advance the read position.
    #[inline]
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Exact rate ratio the step approximates.
    pub fn ratio(&self) -> Ratio<u32> {
        self.input.rate_ratio(&self.output)
    }

    /// Size of the staging buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.staging.capacity()
    }

    #[inline]
    fn frames_for(&self, output_bytes: usize) -> usize {
        (output_bytes / self.output.frame_size()).min(self.max_frames)
    }
}

/// Input frames that must be present to interpolate `frames` output frames starting at
/// `phase`: the last read position plus the frame after it.
#[inline]
fn required_frames(step: u64, phase: u64, frames: usize) -> usize {
    if frames == 0 {
        return 0;
    }
    phase_whole(phase + (frames as u64 - 1) * step) as usize + 2
}

impl<I, O, Q> Converter for Resampler<I, O, Q>
where
    I: PcmSample,
    O: PcmSample,
    Q: Quantizer<I, O>,
{
    fn input_format(&self) -> &SampleFormat {
        &self.input
    }

    fn output_format(&self) -> &SampleFormat {
        &self.output
    }

    fn buffer_size(&self, output_bytes: usize) -> usize {
        let frames = (output_bytes / self.output.frame_size()) as u64;
        phase_ceil(frames * self.step) as usize * self.input.frame_size()
    }

    fn input_needed(&self, output_bytes: usize) -> usize {
        let frames = self.frames_for(output_bytes);
        let required = required_frames(self.step, self.phase, frames) * self.input.frame_size();
        required.saturating_sub(self.staging.carry())
    }

    fn buffer(&mut self, output_bytes: usize) -> &mut [u8] {
        let len = self.input_needed(output_bytes);
        self.staging.region(len)
    }

    fn convert(&mut self, filled: usize, output: &mut [u8]) -> usize {
        let channels = self.input.channel_count();
        let in_frame = self.input.frame_size();
        let frames = self.frames_for(output.len());

        let data = self.staging.valid(filled);
        let available = data.len() / in_frame;

        let mut phase = self.phase;
        let mut written = 0;
        while written < frames {
            let idx = phase_whole(phase) as usize;
            if idx >= available {
                break;
            }
            // Only reachable at end of stream: hold the last frame.
            let next = if idx + 1 < available { idx + 1 } else { idx };
            let frac = phase_frac(phase);
            for channel in 0..channels {
                let a: I = read_at(data, idx, channels, channel);
                let b: I = read_at(data, next, channels, channel);
                let sample = self.quantizer.quantize(I::lerp(a, b, frac), channel);
                write_at(output, written, channels, channel, sample);
            }
            written += 1;
            phase += self.step;
        }

        // A read position past the end of the input carries over as frames to skip.
        let consumed = (phase_whole(phase) as usize).min(available);
        self.staging.retain(consumed * in_frame, available * in_frame);
        self.phase = phase - consumed as u64 * PHASE_ONE;

        written * self.output.frame_size()
    }

    fn carry(&self) -> usize {
        self.staging.carry()
    }

    fn reset(&mut self) {
        self.staging.clear();
        self.phase = 0;
    }
}
