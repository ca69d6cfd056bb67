//! Error types for WFDB Holter decoding

use std::io;

use thiserror::Error;

/// Errors raised while tokenizing the `.hea` header text
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HeaderFormatError {
    #[error("Header contains no record line")]
    EmptyHeader,

    #[error("Line {line}: missing required field `{field}`")]
    MissingField { line: usize, field: &'static str },

    #[error("Line {line}: unexpected extra field {token:?}")]
    UnexpectedField { line: usize, token: String },

    #[error("Line {line}: field `{field}` is not a valid number: {token:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        token: String,
    },

    #[error("Line {line}: malformed calibration token {token:?} ({reason})")]
    InvalidCalibration {
        line: usize,
        token: String,
        reason: &'static str,
    },

    #[error("Invalid start timestamp {value:?}, expected HH:MM:SS DD/MM/YYYY")]
    InvalidTimestamp { value: String },

    #[error("Signal count must be positive, got {value}")]
    InvalidSignalCount { value: usize },
}

/// Errors raised while decoding the `.dat` sample stream
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("Insufficient data in .dat buffer. Expected {expected} bytes but found {actual} bytes")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Header declares {declared} signals but only {available} signal descriptors were parsed")]
    MetadataMismatch { declared: usize, available: usize },

    #[error("Channel {channel} has unusable gain {gain}")]
    InvalidGain { channel: usize, gain: f64 },
}

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Header,
    Decode,
}

impl ParseStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseStage::Header => "header",
            ParseStage::Decode => "decode",
        }
    }
}

/// Coarse error classification for callers that only need to branch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    HeaderFormat,
    InsufficientData,
    MetadataMismatch,
    InvalidGain,
}

/// Errors returned by [`crate::parse`] and [`crate::HolterParser`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HolterError {
    #[error("Failed to parse WFDB header: {0}")]
    Header(#[from] HeaderFormatError),

    #[error("Failed to decode WFDB samples: {0}")]
    Decode(#[from] DecodeError),
}

/// Errors raised while rendering decoded data
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Channel {channel} has {actual} samples, metadata declares {expected}")]
    ChannelLength {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Channel {channel} not found (record has {available} channels)")]
    ChannelNotFound { channel: usize, available: usize },
}

impl HolterError {
    /// Which stage failed
    pub fn stage(&self) -> ParseStage {
        match self {
            HolterError::Header(_) => ParseStage::Header,
            HolterError::Decode(_) => ParseStage::Decode,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HolterError::Header(_) => ErrorKind::HeaderFormat,
            HolterError::Decode(DecodeError::InsufficientData { .. }) => {
                ErrorKind::InsufficientData
            }
            HolterError::Decode(DecodeError::MetadataMismatch { .. }) => {
                ErrorKind::MetadataMismatch
            }
            HolterError::Decode(DecodeError::InvalidGain { .. }) => ErrorKind::InvalidGain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_message_reports_both_counts() {
        let err = DecodeError::InsufficientData {
            expected: 12,
            actual: 11,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("11"));
    }

    #[test]
    fn test_stage_and_kind() {
        let err = HolterError::from(HeaderFormatError::EmptyHeader);
        assert_eq!(err.stage(), ParseStage::Header);
        assert_eq!(err.kind(), ErrorKind::HeaderFormat);

        let err = HolterError::from(DecodeError::MetadataMismatch {
            declared: 2,
            available: 1,
        });
        assert_eq!(err.stage(), ParseStage::Decode);
        assert_eq!(err.kind(), ErrorKind::MetadataMismatch);
        assert!(err.to_string().starts_with("Failed to decode WFDB samples"));
    }
}
