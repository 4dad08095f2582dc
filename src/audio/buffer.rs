//! Audio input buffers.
//!
//! Audio tasks consume interleaved float PCM. The buffer borrows the
//! caller's samples; nothing is copied until preprocessing.

use crate::core::errors::{TaskError, TaskResult};

/// Sample format of an audio buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Number of interleaved channels.
    pub channels: usize,
    /// Samples per second, per channel.
    pub sample_rate: u32,
}

impl AudioFormat {
    /// Creates a format description.
    pub fn new(channels: usize, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
        }
    }

    /// Single-channel format at the given sample rate.
    pub fn mono(sample_rate: u32) -> Self {
        Self::new(1, sample_rate)
    }
}

/// A borrowed buffer of interleaved float PCM samples.
#[derive(Debug, Clone, Copy)]
pub struct AudioBuffer<'a> {
    samples: &'a [f32],
    format: AudioFormat,
}

impl<'a> AudioBuffer<'a> {
    /// Creates a buffer over the caller's samples.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidArgument` when the format declares no
    /// channels or the sample count is not a multiple of the channel
    /// count.
    pub fn new(samples: &'a [f32], format: AudioFormat) -> TaskResult<Self> {
        if format.channels == 0 {
            return Err(TaskError::invalid_argument(
                "audio format must declare at least one channel",
            ));
        }
        if samples.len() % format.channels != 0 {
            return Err(TaskError::invalid_argument(format!(
                "buffer of {} sample(s) is not a whole number of {}-channel frames",
                samples.len(),
                format.channels
            )));
        }
        Ok(Self { samples, format })
    }

    /// The interleaved samples.
    pub fn samples(&self) -> &[f32] {
        self.samples
    }

    /// The buffer's sample format.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.format.channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count() {
        let samples = [0.0f32; 8];
        let buffer = AudioBuffer::new(&samples, AudioFormat::new(2, 16000)).unwrap();
        assert_eq!(buffer.frames(), 4);
        assert_eq!(buffer.format().sample_rate, 16000);
    }

    #[test]
    fn test_ragged_buffer_rejected() {
        let samples = [0.0f32; 7];
        let err = AudioBuffer::new(&samples, AudioFormat::new(2, 16000)).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_zero_channels_rejected() {
        let samples = [0.0f32; 4];
        let err = AudioBuffer::new(&samples, AudioFormat::new(0, 16000)).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
