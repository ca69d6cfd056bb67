//! WFDB Holter - Decoder for WFDB-style Holter ECG recordings
//!
//! A record is a `.hea` text header describing the recording and the
//! calibration of each channel, paired with a `.dat` file of interleaved
//! 16-bit little-endian samples. Decoding runs two stages:
//! header parsing → sample decoding and calibration.
//!
//! ## Modules
//!
//! - **Header**: positional tokenizer for the record and signal lines
//! - **Decoder**: frame-interleaved sample decoding with per-channel calibration
//! - **Export**: CSV / JSON / NDJSON rendering of decoded recordings

pub mod decoder;
pub mod error;
pub mod export;
pub mod header;
pub mod pipeline;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::{DecodeError, ErrorKind, ExportError, HeaderFormatError, HolterError, ParseStage};
pub use pipeline::{parse, parse_binary_data, parse_header, HolterParser, ParserConfig};
pub use types::{HolterData, Metadata, Signal};

/// Crate version
pub const HOLTER_VERSION: &str = env!("CARGO_PKG_VERSION");
