use std::num::NonZero;

/// Stream sample rate (frames per second).
pub type SampleRate = NonZero<u32>;

/// Number of interleaved channels in a stream.
pub type ChannelCount = NonZero<u16>;
