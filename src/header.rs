//! WFDB header (`.hea`) parsing
//!
//! The header is line-positional: one record line followed by one signal line
//! per channel. Every field is checked for presence and type, so a short or
//! malformed line produces a [`HeaderFormatError`] instead of a half-filled
//! [`Metadata`].

use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::error::HeaderFormatError;
use crate::types::{Metadata, Signal};

/// `HH:MM:SS[.fff] DD/MM/YYYY`
const TIMESTAMP_FORMAT: &str = "%H:%M:%S%.f %d/%m/%Y";

/// Header parser for single-segment WFDB records
pub struct HeaderParser;

impl HeaderParser {
    /// Parse header text into recording metadata
    pub fn parse(header_text: &str) -> Result<Metadata, HeaderFormatError> {
        let mut lines = header_text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        let (record_line_no, record_line) = lines.next().ok_or(HeaderFormatError::EmptyHeader)?;
        let record = parse_record_line(record_line_no, record_line)?;

        let signals = lines
            .map(|(line_no, line)| parse_signal_line(line_no, line))
            .collect::<Result<Vec<_>, _>>()?;

        if signals.len() != record.num_signals {
            log::warn!(
                "Record {} declares {} signals but header lists {}",
                record.record_name,
                record.num_signals,
                signals.len()
            );
        }

        Ok(Metadata {
            record_name: record.record_name,
            num_signals: record.num_signals,
            sample_rate: record.sample_rate,
            num_samples: record.num_samples,
            initial_date: record.initial_date,
            signals,
        })
    }
}

/// Fields of the record line
struct RecordLine {
    record_name: String,
    num_signals: usize,
    sample_rate: u32,
    num_samples: usize,
    initial_date: NaiveDateTime,
}

fn parse_record_line(line_no: usize, line: &str) -> Result<RecordLine, HeaderFormatError> {
    let mut fields = Fields::new(line_no, line);

    let record_name = fields.next("record_name")?.to_string();
    let num_signals: usize = fields.next_number("num_signals")?;
    if num_signals == 0 {
        return Err(HeaderFormatError::InvalidSignalCount { value: num_signals });
    }
    let sample_rate: u32 = fields.next_number("sample_rate")?;
    let num_samples: usize = fields.next_number("num_samples")?;
    let start_time = fields.next("start_time")?;
    let start_date = fields.next("start_date")?;
    fields.finish()?;

    let initial_date = parse_timestamp(start_time, start_date)?;

    Ok(RecordLine {
        record_name,
        num_signals,
        sample_rate,
        num_samples,
        initial_date,
    })
}

fn parse_signal_line(line_no: usize, line: &str) -> Result<Signal, HeaderFormatError> {
    let mut fields = Fields::new(line_no, line);

    let filename = fields.next("filename")?.to_string();
    let format = fields.next("format")?.to_string();
    let calibration = fields.next("gain")?;

    let (gain, baseline, units) = parse_calibration(line_no, calibration)?;

    Ok(Signal {
        filename,
        format,
        gain,
        baseline,
        units,
    })
}

/// Split a `<gain>(<baseline>)/<units>` token, e.g. `200(0)/mV`
fn parse_calibration(
    line_no: usize,
    token: &str,
) -> Result<(f64, i32, String), HeaderFormatError> {
    let malformed = |reason| HeaderFormatError::InvalidCalibration {
        line: line_no,
        token: token.to_string(),
        reason,
    };

    let open = token.find('(').ok_or_else(|| malformed("missing '('"))?;
    let close = token[open..]
        .find(')')
        .map(|pos| open + pos)
        .ok_or_else(|| malformed("missing ')'"))?;
    let slash = token[close..]
        .find('/')
        .map(|pos| close + pos)
        .ok_or_else(|| malformed("missing '/'"))?;

    let gain = token[..open]
        .parse::<f64>()
        .map_err(|_| malformed("gain is not a number"))?;
    if !gain.is_finite() {
        return Err(malformed("gain is not finite"));
    }
    let baseline = token[open + 1..close]
        .trim()
        .parse::<i32>()
        .map_err(|_| malformed("baseline is not an integer"))?;
    // Units end at the next '/', if any
    let units = token[slash + 1..].split('/').next().unwrap_or_default().to_string();

    Ok((gain, baseline, units))
}

fn parse_timestamp(time: &str, date: &str) -> Result<NaiveDateTime, HeaderFormatError> {
    let value = format!("{} {}", time, date);
    NaiveDateTime::parse_from_str(&value, TIMESTAMP_FORMAT)
        .map_err(|_| HeaderFormatError::InvalidTimestamp { value })
}

/// Whitespace tokenizer that reports missing and non-numeric fields by name
struct Fields<'a> {
    line_no: usize,
    tokens: std::str::SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn new(line_no: usize, line: &'a str) -> Self {
        Self {
            line_no,
            tokens: line.split_whitespace(),
        }
    }

    fn next(&mut self, field: &'static str) -> Result<&'a str, HeaderFormatError> {
        self.tokens.next().ok_or(HeaderFormatError::MissingField {
            line: self.line_no,
            field,
        })
    }

    /// Fail if any token is left on the line
    fn finish(&mut self) -> Result<(), HeaderFormatError> {
        match self.tokens.next() {
            Some(token) => Err(HeaderFormatError::UnexpectedField {
                line: self.line_no,
                token: token.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn next_number<T: FromStr>(&mut self, field: &'static str) -> Result<T, HeaderFormatError> {
        let token = self.next(field)?;
        token.parse().map_err(|_| HeaderFormatError::InvalidNumber {
            line: self.line_no,
            field,
            token: token.to_string(),
        })
    }
}
