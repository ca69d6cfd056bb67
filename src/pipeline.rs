//! Pipeline orchestration
//!
//! This module provides the public API for decoding a recording.
//! It sequences header parsing and sample decoding and tags any failure
//! with the stage that produced it.

use serde::{Deserialize, Serialize};

use crate::decoder::BinaryDecoder;
use crate::error::{DecodeError, HeaderFormatError, HolterError};
use crate::header::HeaderParser;
use crate::types::{HolterData, Metadata};

/// Decode a WFDB record from its `.dat` bytes and `.hea` text.
///
/// # Arguments
/// * `buffer` - Raw contents of the `.dat` file
/// * `header_text` - Contents of the `.hea` file
///
/// # Example
/// ```ignore
/// let data = wfdb_holter::parse(&dat_bytes, &header_text)?;
/// println!("{} channels", data.samples.len());
/// ```
pub fn parse(buffer: &[u8], header_text: &str) -> Result<HolterData, HolterError> {
    HolterParser::new().parse(buffer, header_text)
}

/// Parse only the header text.
pub fn parse_header(header_text: &str) -> Result<Metadata, HeaderFormatError> {
    HeaderParser::parse(header_text)
}

/// Decode sample data against already-parsed metadata.
pub fn parse_binary_data(buffer: &[u8], metadata: &Metadata) -> Result<Vec<Vec<f64>>, DecodeError> {
    BinaryDecoder::decode(buffer, metadata)
}

/// Parser settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Reject channels with zero or non-finite gain instead of producing
    /// non-finite samples
    pub strict_gain: bool,
}

/// Configurable parser.
///
/// Holds no state between calls; the same instance can decode any number of
/// records.
#[derive(Debug, Clone, Default)]
pub struct HolterParser {
    config: ParserConfig,
}

impl HolterParser {
    /// Create a parser with default (permissive) settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Enable or disable gain validation
    pub fn with_strict_gain(mut self, strict_gain: bool) -> Self {
        self.config.strict_gain = strict_gain;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse header then samples.
    ///
    /// Pipeline stages:
    /// 1. HeaderParser - Tokenize the record and signal lines
    /// 2. BinaryDecoder - Validate buffer size and calibrate samples
    pub fn parse(&self, buffer: &[u8], header_text: &str) -> Result<HolterData, HolterError> {
        let result = self.run(buffer, header_text);
        if let Err(e) = &result {
            log::warn!("Error parsing WFDB record ({} stage): {}", e.stage().as_str(), e);
        }
        result
    }

    fn run(&self, buffer: &[u8], header_text: &str) -> Result<HolterData, HolterError> {
        // Stage 1: header
        let metadata = HeaderParser::parse(header_text)?;
        log::debug!(
            "Parsed header for record {}: {} signals at {} Hz, {} samples",
            metadata.record_name,
            metadata.num_signals,
            metadata.sample_rate,
            metadata.num_samples
        );

        // Stage 2: samples
        self.decode_samples(buffer, metadata)
    }

    /// Decode samples against metadata that was parsed separately.
    pub fn decode(&self, buffer: &[u8], metadata: Metadata) -> Result<HolterData, HolterError> {
        let result = self.decode_samples(buffer, metadata);
        if let Err(e) = &result {
            log::warn!("Error parsing WFDB record ({} stage): {}", e.stage().as_str(), e);
        }
        result
    }

    fn decode_samples(&self, buffer: &[u8], metadata: Metadata) -> Result<HolterData, HolterError> {
        if self.config.strict_gain {
            BinaryDecoder::validate_gains(&metadata)?;
        }
        let samples = BinaryDecoder::decode(buffer, &metadata)?;

        Ok(HolterData { metadata, samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ParseStage};
    use pretty_assertions::assert_eq;

    const HEADER: &str = "REC01 2 250 3 09:00:00 01/01/2024
REC01.dat 16 200(0)/mV
REC01.dat 16 100(10)/mV
";

    fn sample_buffer() -> Vec<u8> {
        [200i16, 110, 400, 210, 600, 310]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    #[test]
    fn test_parse_scenario() {
        let data = parse(&sample_buffer(), HEADER).unwrap();

        assert_eq!(data.metadata.num_signals, 2);
        assert_eq!(data.metadata.num_samples, 3);
        assert_eq!(data.metadata.signals[0].gain, 200.0);
        assert_eq!(data.metadata.signals[1].baseline, 10);
        assert_eq!(data.samples[0], vec![1.0, 2.0, 3.0]);
        assert_eq!(data.samples[1], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let buffer = sample_buffer();
        assert_eq!(parse(&buffer, HEADER), parse(&buffer, HEADER));
    }

    #[test]
    fn test_header_failure_is_tagged() {
        let header = "REC01 1 250 3 09:00:00 01/01/2024\nREC01.dat 16 200mV\n";
        let err = parse(&sample_buffer(), header).unwrap_err();

        assert_eq!(err.stage(), ParseStage::Header);
        assert_eq!(err.kind(), ErrorKind::HeaderFormat);
        assert!(err.to_string().contains("200mV"));
    }

    #[test]
    fn test_decode_failure_is_tagged() {
        let buffer = sample_buffer();
        let err = parse(&buffer[..buffer.len() - 1], HEADER).unwrap_err();

        assert_eq!(err.stage(), ParseStage::Decode);
        assert_eq!(
            err,
            HolterError::Decode(DecodeError::InsufficientData {
                expected: 12,
                actual: 11,
            })
        );
    }

    #[test]
    fn test_metadata_mismatch() {
        let header = "REC01 2 250 3 09:00:00 01/01/2024\nREC01.dat 16 200(0)/mV\n";
        let err = parse(&sample_buffer(), header).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MetadataMismatch);
    }

    #[test]
    fn test_strict_gain() {
        let header = "REC01 2 250 3 09:00:00 01/01/2024
REC01.dat 16 200(0)/mV
REC01.dat 16 0(10)/mV
";
        let permissive = HolterParser::new().parse(&sample_buffer(), header).unwrap();
        assert!(permissive.samples[1].iter().all(|v| v.is_infinite()));

        let strict = HolterParser::new().with_strict_gain(true);
        let err = strict.parse(&sample_buffer(), header).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidGain);
    }

    #[test]
    fn test_config_from_json() {
        let config: ParserConfig = serde_json::from_str(r#"{"strict_gain": true}"#).unwrap();
        assert!(HolterParser::with_config(config).config().strict_gain);

        let config: ParserConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ParserConfig::default());
    }

    #[test]
    fn test_decode_with_separate_metadata() {
        let meta = parse_header(HEADER).unwrap();
        let parser = HolterParser::new();

        let data = parser.decode(&sample_buffer(), meta.clone()).unwrap();
        assert_eq!(data, parse(&sample_buffer(), HEADER).unwrap());

        let err = parser.decode(&sample_buffer()[..4], meta).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_stage_helpers() {
        let meta = parse_header(HEADER).unwrap();
        let samples = parse_binary_data(&sample_buffer(), &meta).unwrap();
        assert_eq!(samples.len(), 2);
    }
}
