//! WFDB format 16 sample decoding
//!
//! The `.dat` stream is a sequence of frames; each frame holds one signed
//! 16-bit little-endian value per channel, in channel order.

use crate::error::DecodeError;
use crate::types::{Metadata, BYTES_PER_SAMPLE};

/// Decoder for interleaved 16-bit sample data
pub struct BinaryDecoder;

impl BinaryDecoder {
    /// Decode `buffer` into calibrated per-channel samples.
    ///
    /// Bytes past [`Metadata::required_bytes`] are ignored.
    pub fn decode(buffer: &[u8], metadata: &Metadata) -> Result<Vec<Vec<f64>>, DecodeError> {
        let num_signals = metadata.num_signals;
        let num_samples = metadata.num_samples;

        if metadata.signals.len() < num_signals {
            return Err(DecodeError::MetadataMismatch {
                declared: num_signals,
                available: metadata.signals.len(),
            });
        }

        let required = metadata.required_bytes();
        if buffer.len() < required {
            return Err(DecodeError::InsufficientData {
                expected: required,
                actual: buffer.len(),
            });
        }

        let mut samples: Vec<Vec<f64>> = (0..num_signals)
            .map(|_| Vec::with_capacity(num_samples))
            .collect();

        if num_signals == 0 {
            return Ok(samples);
        }

        let signals = &metadata.signals[..num_signals];
        for frame in buffer[..required].chunks_exact(metadata.frame_bytes()) {
            for ((raw, signal), channel) in frame
                .chunks_exact(BYTES_PER_SAMPLE)
                .zip(signals)
                .zip(samples.iter_mut())
            {
                let value = i16::from_le_bytes([raw[0], raw[1]]);
                channel.push(signal.calibrate(value));
            }
        }

        log::debug!(
            "Decoded {} samples x {} channels from {} bytes ({} trailing)",
            num_samples,
            num_signals,
            buffer.len(),
            buffer.len() - required
        );

        Ok(samples)
    }

    /// Reject channels whose gain would make calibration non-finite
    pub fn validate_gains(metadata: &Metadata) -> Result<(), DecodeError> {
        match metadata
            .signals
            .iter()
            .take(metadata.num_signals)
            .position(|s| s.gain == 0.0 || !s.gain.is_finite())
        {
            Some(channel) => Err(DecodeError::InvalidGain {
                channel,
                gain: metadata.signals[channel].gain,
            }),
            None => Ok(()),
        }
    }
}
