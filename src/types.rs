//! Core types for WFDB Holter recordings
//!
//! A decoded recording is a [`Metadata`] block parsed from the `.hea` header
//! plus one calibrated sample series per channel from the `.dat` stream.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Bytes per stored sample (16-bit little-endian, WFDB format 16)
pub const BYTES_PER_SAMPLE: usize = 2;

/// Per-channel calibration descriptor from one signal line of the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Source file label as written in the header
    pub filename: String,
    /// Storage format token (e.g. "16"), kept verbatim
    pub format: String,
    /// ADC units per physical unit
    pub gain: f64,
    /// ADC value corresponding to zero physical units
    pub baseline: i32,
    /// Physical unit label (e.g. "mV")
    pub units: String,
}

impl Signal {
    /// Convert one raw ADC value into physical units
    pub fn calibrate(&self, raw: i16) -> f64 {
        (f64::from(raw) - f64::from(self.baseline)) / self.gain
    }
}

/// Recording metadata parsed from the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub record_name: String,
    /// Channel count declared on the record line
    pub num_signals: usize,
    /// Samples per second, per channel
    pub sample_rate: u32,
    /// Samples per channel
    pub num_samples: usize,
    /// Start of the recording (naive local time, no timezone applied)
    pub initial_date: NaiveDateTime,
    /// Channel descriptors in stream order
    pub signals: Vec<Signal>,
}

impl Metadata {
    /// Size of one interleaved frame in bytes
    pub fn frame_bytes(&self) -> usize {
        self.num_signals.saturating_mul(BYTES_PER_SAMPLE)
    }

    /// Minimum `.dat` length needed to hold every declared sample
    pub fn required_bytes(&self) -> usize {
        self.frame_bytes().saturating_mul(self.num_samples)
    }

    /// Total recording length
    pub fn duration(&self) -> Duration {
        sample_offset(self.num_samples, self.sample_rate).unwrap_or_else(Duration::zero)
    }
}

/// A fully decoded recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolterData {
    pub metadata: Metadata,
    /// `samples[channel][index]`, calibrated to physical units
    #[serde(with = "sample_serde")]
    pub samples: Vec<Vec<f64>>,
}

impl HolterData {
    /// Samples of a single channel
    pub fn channel(&self, channel: usize) -> Option<&[f64]> {
        self.samples.get(channel).map(Vec::as_slice)
    }

    /// Wall-clock time of sample `index`
    ///
    /// Returns `None` past the end of the recording or when the sample rate is zero.
    pub fn timestamp_at(&self, index: usize) -> Option<NaiveDateTime> {
        if index >= self.metadata.num_samples {
            return None;
        }
        let offset = sample_offset(index, self.metadata.sample_rate)?;
        self.metadata.initial_date.checked_add_signed(offset)
    }

    /// Seconds from the start of the recording for sample `index`
    pub fn elapsed_seconds(&self, index: usize) -> Option<f64> {
        if self.metadata.sample_rate == 0 {
            return None;
        }
        Some(index as f64 / f64::from(self.metadata.sample_rate))
    }
}

/// JSON encoding for sample values.
///
/// JSON has no literal for non-finite numbers, so `NaN`, `inf` and `-inf`
/// are written as strings and read back from the same strings.
pub(crate) mod sample_serde {
    use serde::de::{self, Deserializer};
    use serde::ser::{SerializeSeq, Serializer};
    use serde::{Deserialize, Serialize};

    /// One sample, serialized as a number or a non-finite marker string
    pub(crate) struct JsonSample(pub f64);

    impl Serialize for JsonSample {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let v = self.0;
            if v.is_nan() {
                serializer.serialize_str("NaN")
            } else if v == f64::INFINITY {
                serializer.serialize_str("inf")
            } else if v == f64::NEG_INFINITY {
                serializer.serialize_str("-inf")
            } else {
                serializer.serialize_f64(v)
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    impl<'de> Deserialize<'de> for JsonSample {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            match Repr::deserialize(deserializer)? {
                Repr::Number(v) => Ok(JsonSample(v)),
                Repr::Text(text) => match text.as_str() {
                    "NaN" => Ok(JsonSample(f64::NAN)),
                    "inf" => Ok(JsonSample(f64::INFINITY)),
                    "-inf" => Ok(JsonSample(f64::NEG_INFINITY)),
                    other => Err(de::Error::invalid_value(
                        de::Unexpected::Str(other),
                        &"a number, \"NaN\", \"inf\" or \"-inf\"",
                    )),
                },
            }
        }
    }

    /// Serialize one channel (or one frame) of samples
    pub(crate) fn serialize_row<S: Serializer>(
        row: &[f64],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(row.len()))?;
        for &v in row {
            seq.serialize_element(&JsonSample(v))?;
        }
        seq.end()
    }

    struct Row<'a>(&'a [f64]);

    impl Serialize for Row<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serialize_row(self.0, serializer)
        }
    }

    pub fn serialize<S: Serializer>(
        samples: &[Vec<f64>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(samples.len()))?;
        for channel in samples {
            seq.serialize_element(&Row(channel))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<f64>>, D::Error> {
        let rows = Vec::<Vec<JsonSample>>::deserialize(deserializer)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_iter().map(|s| s.0).collect())
            .collect())
    }
}

fn sample_offset(index: usize, sample_rate: u32) -> Option<Duration> {
    if sample_rate == 0 {
        return None;
    }
    let nanos = (index as i128 * 1_000_000_000) / i128::from(sample_rate);
    i64::try_from(nanos).ok().map(Duration::nanoseconds)
}
