//! Rendering decoded recordings as CSV, JSON or NDJSON

use std::io::Write;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::ExportError;
use crate::types::{sample_serde, HolterData};

/// Output encodings supported by [`export`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One row per frame: index, elapsed seconds, one column per channel
    Csv,
    /// The whole [`HolterData`] as a single JSON document
    Json,
    /// Same as `Json`, indented
    JsonPretty,
    /// One JSON object per frame
    Ndjson,
}

/// One frame of an NDJSON export
#[derive(Debug, Serialize)]
struct FrameRecord<'a> {
    index: usize,
    timestamp: Option<NaiveDateTime>,
    #[serde(serialize_with = "sample_serde::serialize_row")]
    values: &'a [f64],
}

/// Write `data` to `writer` in the requested format
pub fn export<W: Write>(
    data: &HolterData,
    format: ExportFormat,
    writer: &mut W,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Csv => write_csv(data, writer),
        ExportFormat::Json => {
            serde_json::to_writer(&mut *writer, data)?;
            writeln!(writer)?;
            writer.flush()?;
            Ok(())
        }
        ExportFormat::JsonPretty => {
            serde_json::to_writer_pretty(&mut *writer, data)?;
            writeln!(writer)?;
            writer.flush()?;
            Ok(())
        }
        ExportFormat::Ndjson => write_ndjson(data, writer),
    }
}

/// Every channel must hold `num_samples` values for row-wise output
fn check_channel_lengths(data: &HolterData) -> Result<(), ExportError> {
    let expected = data.metadata.num_samples;
    match data.samples.iter().position(|channel| channel.len() < expected) {
        Some(channel) => Err(ExportError::ChannelLength {
            channel,
            expected,
            actual: data.samples[channel].len(),
        }),
        None => Ok(()),
    }
}

/// Write all channels as CSV columns
pub fn write_csv<W: Write>(data: &HolterData, writer: &mut W) -> Result<(), ExportError> {
    check_channel_lengths(data)?;

    write!(writer, "index,time_s")?;
    for (c, signal) in data.metadata.signals.iter().take(data.samples.len()).enumerate() {
        write!(writer, ",ch{}_{}", c, signal.units)?;
    }
    writeln!(writer)?;

    for i in 0..data.metadata.num_samples {
        write!(writer, "{}", i)?;
        match data.elapsed_seconds(i) {
            Some(t) => write!(writer, ",{}", t)?,
            None => write!(writer, ",")?,
        }
        for channel in &data.samples {
            write!(writer, ",{}", channel[i])?;
        }
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write one JSON object per frame
pub fn write_ndjson<W: Write>(data: &HolterData, writer: &mut W) -> Result<(), ExportError> {
    check_channel_lengths(data)?;

    let mut values = Vec::with_capacity(data.samples.len());
    for i in 0..data.metadata.num_samples {
        values.clear();
        values.extend(data.samples.iter().map(|channel| channel[i]));

        let record = FrameRecord {
            index: i,
            timestamp: data.timestamp_at(i),
            values: &values,
        };
        serde_json::to_writer(&mut *writer, &record)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write a single channel as `time_s,value` lines
pub fn write_channel<W: Write>(
    data: &HolterData,
    channel: usize,
    writer: &mut W,
) -> Result<(), ExportError> {
    let samples = data.channel(channel).ok_or(ExportError::ChannelNotFound {
        channel,
        available: data.samples.len(),
    })?;

    for (i, value) in samples.iter().enumerate() {
        let t = data.elapsed_seconds(i).unwrap_or(i as f64);
        writeln!(writer, "{:.6},{:.6}", t, value)?;
    }

    writer.flush()?;
    Ok(())
}
