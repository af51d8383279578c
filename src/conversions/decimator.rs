use std::marker::PhantomData;

use super::converter::{Converter, StagingBuffer};
use super::format::SampleFormat;
use super::quantizer::Quantizer;
use super::sample::{read_at, write_at, PcmSample};

/// Converter for streams whose rate already matches the output: every input frame becomes
/// one output frame, requantized element by element.
#[derive(Debug)]
pub struct Decimator<I, O, Q> {
    input: SampleFormat,
    output: SampleFormat,
    max_frames: usize,
    staging: StagingBuffer,
    quantizer: Q,
    samples: PhantomData<fn(I) -> O>,
}

impl<I, O, Q> Decimator<I, O, Q>
where
    I: PcmSample,
    O: PcmSample,
    Q: Quantizer<I, O>,
{
    /// Creates a converter producing at most `output_buffer_size` bytes per call.
    ///
    /// # Panic
    ///
    /// Panics if the rates or channel counts differ, or the element types do not match `I`
    /// and `O`.
    pub fn new(
        input: SampleFormat,
        output: SampleFormat,
        output_buffer_size: usize,
        quantizer: Q,
    ) -> Self {
        assert_eq!(input.sample_rate, output.sample_rate);
        assert_eq!(input.channels, output.channels);
        assert_eq!(input.sample_type.sample_size(), I::SIZE);
        assert_eq!(output.sample_type.sample_size(), O::SIZE);

        let max_frames = (output_buffer_size / output.frame_size()).max(1);
        Self {
            input,
            output,
            max_frames,
            staging: StagingBuffer::new(max_frames * input.frame_size()),
            quantizer,
            samples: PhantomData,
        }
    }

    #[inline]
    fn frames_for(&self, output_bytes: usize) -> usize {
        (output_bytes / self.output.frame_size()).min(self.max_frames)
    }
}

impl<I, O, Q> Converter for Decimator<I, O, Q>
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
        output_bytes / self.output.frame_size() * self.input.frame_size()
    }

    fn input_needed(&self, output_bytes: usize) -> usize {
        self.frames_for(output_bytes) * self.input.frame_size()
    }

    fn buffer(&mut self, output_bytes: usize) -> &mut [u8] {
        let len = self.input_needed(output_bytes);
        self.staging.region(len)
    }

    fn convert(&mut self, filled: usize, output: &mut [u8]) -> usize {
        let channels = self.input.channel_count();
        let data = self.staging.valid(filled);
        let frames = (data.len() / self.input.frame_size()).min(self.frames_for(output.len()));

        for frame in 0..frames {
            for channel in 0..channels {
                let sample: I = read_at(data, frame, channels, channel);
                let sample = self.quantizer.quantize(sample, channel);
                write_at(output, frame, channels, channel, sample);
            }
        }
        frames * self.output.frame_size()
    }

    fn reset(&mut self) {
        self.staging.clear();
    }
}
