use super::format::SampleFormat;

/// Adapts a decoder's PCM stream to the format an output device accepts.
///
/// A converter is driven in ticks. For each output period the caller:
///
/// 1. asks [`input_needed`](Converter::input_needed) how many fresh input bytes the next
///    period requires,
/// 2. writes that many bytes from the decoder into [`buffer`](Converter::buffer),
/// 3. calls [`convert`](Converter::convert) with the number of bytes actually written.
///
/// Writing fewer bytes than requested signals the end of the stream. The converter then
/// produces a short write and, once its input is drained, writes nothing at all.
///
/// Converters never allocate, block or fail once constructed.
pub trait Converter: Send {
    /// Format of the bytes the caller writes into [`buffer`](Converter::buffer).
    fn input_format(&self) -> &SampleFormat;

    /// Format of the bytes written by [`convert`](Converter::convert).
    fn output_format(&self) -> &SampleFormat;

    /// Nominal number of input bytes consumed while producing `output_bytes` bytes.
    fn buffer_size(&self, output_bytes: usize) -> usize;

    /// Fresh input bytes required before the next call to [`convert`](Converter::convert)
    /// can produce `output_bytes` bytes.
    ///
    /// Accounts for input carried over from the previous call. Requests larger than the
    /// output buffer size the converter was built for are clamped to it.
    fn input_needed(&self, output_bytes: usize) -> usize;

    /// Staging region of exactly [`input_needed`](Converter::input_needed) bytes for the
    /// decoder to write into.
    fn buffer(&mut self, output_bytes: usize) -> &mut [u8];

    /// Converts the staged input into `output`.
    ///
    /// `filled` is how many bytes of the region returned by [`buffer`](Converter::buffer) were
    /// written. Returns the number of bytes written to `output`, never more than its length.
    fn convert(&mut self, filled: usize, output: &mut [u8]) -> usize;

    /// Input bytes carried over from the previous call.
    fn carry(&self) -> usize {
        0
    }

    /// Forgets any carried input, for example after a seek.
    fn reset(&mut self);
}

/// Fixed-capacity input buffer with a carried-over prefix.
///
/// The first [`carry`](StagingBuffer::carry) bytes hold input left unconsumed by the previous
/// conversion; new input is appended right after them. The capacity is decided once and the
/// storage is never reallocated.
#[derive(Debug)]
pub struct StagingBuffer {
    data: Box<[u8]>,
    carry: usize,
}

impl StagingBuffer {
    /// Allocates a zeroed buffer of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            carry: 0,
        }
    }

    /// Total size in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes kept from the previous conversion.
    #[inline]
    pub fn carry(&self) -> usize {
        self.carry
    }

    /// Region of `len` bytes following the carry.
    #[inline]
    pub fn region(&mut self, len: usize) -> &mut [u8] {
        debug_assert!(
            self.carry + len <= self.capacity(),
            "staging request of {len} bytes exceeds capacity"
        );
        let end = (self.carry + len).min(self.capacity());
        &mut self.data[self.carry..end]
    }

    /// Carry plus `filled` freshly written bytes, clamped to the capacity.
    #[inline]
    pub fn valid(&self, filled: usize) -> &[u8] {
        let end = (self.carry + filled).min(self.capacity());
        &self.data[..end]
    }

    /// Moves `range` of the buffer to the front and makes it the new carry.
    #[inline]
    pub fn retain(&mut self, start: usize, end: usize) {
        debug_assert!(start <= end && end <= self.capacity());
        self.data.copy_within(start..end, 0);
        self.carry = end - start;
        debug_assert!(self.carry < self.capacity());
    }

    /// Drops the carry.
    #[inline]
    pub fn clear(&mut self) {
        self.carry = 0;
    }
}
