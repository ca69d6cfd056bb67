//! End-to-end decoding through the public API.

use pretty_assertions::assert_eq;
use wfdb_holter::{parse, ErrorKind, HolterParser, ParseStage};

/// Deterministic pseudo-random i16 stream
fn raw_samples(count: usize, seed: u32) -> Vec<i16> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 16) as u16 as i16
        })
        .collect()
}

fn encode(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn header(num_signals: usize, num_samples: usize, calibrations: &[&str]) -> String {
    let mut text = format!("HOLTER {} 200 {} 22:10:05 31/12/2023\n", num_signals, num_samples);
    for cal in calibrations {
        text.push_str(&format!("HOLTER.dat 16 {} 0 0 0 0 0 ECG\n", cal));
    }
    text
}

#[test]
fn shape_matches_metadata() {
    for (num_signals, num_samples) in [(1, 0), (1, 7), (2, 10), (3, 64)] {
        let cals = vec!["200(0)/mV"; num_signals];
        let text = header(num_signals, num_samples, &cals);
        let buffer = encode(&raw_samples(num_signals * num_samples, 7));

        let data = parse(&buffer, &text).unwrap();

        assert_eq!(data.samples.len(), data.metadata.num_signals);
        for channel in &data.samples {
            assert_eq!(channel.len(), data.metadata.num_samples);
        }
    }
}

#[test]
fn values_follow_calibration_formula() {
    let cals = ["200(0)/mV", "204.8(-12)/mV", "50(1024)/uV"];
    let gains = [200.0, 204.8, 50.0];
    let baselines = [0i32, -12, 1024];
    let num_samples = 128;

    let raw = raw_samples(cals.len() * num_samples, 42);
    let data = parse(&encode(&raw), &header(cals.len(), num_samples, &cals)).unwrap();

    for c in 0..cals.len() {
        for i in 0..num_samples {
            let r = raw[i * cals.len() + c];
            let expected = (f64::from(r) - f64::from(baselines[c])) / gains[c];
            assert_eq!(data.samples[c][i], expected, "channel {} sample {}", c, i);
        }
    }
}

#[test]
fn one_byte_short_fails_with_both_counts() {
    let text = header(2, 50, &["200(0)/mV", "200(0)/mV"]);
    let buffer = encode(&raw_samples(100, 1));
    let required = buffer.len();

    let err = parse(&buffer[..required - 1], &text).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InsufficientData);
    assert_eq!(err.stage(), ParseStage::Decode);
    let msg = err.to_string();
    assert!(msg.contains(&required.to_string()));
    assert!(msg.contains(&(required - 1).to_string()));
}

#[test]
fn trailing_bytes_do_not_change_result() {
    let text = header(2, 20, &["100(5)/mV", "250(-5)/mV"]);
    let buffer = encode(&raw_samples(40, 9));
    let mut padded = buffer.clone();
    padded.extend(encode(&raw_samples(13, 3)));
    padded.push(0xff);

    assert_eq!(parse(&buffer, &text).unwrap(), parse(&padded, &text).unwrap());
}

#[test]
fn malformed_calibration_returns_no_metadata() {
    for bad in ["200/mV", "200(0)mV", "(0)/mV", "200(0/mV"] {
        let text = header(1, 1, &[bad]);
        let err = parse(&encode(&[1]), &text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HeaderFormat, "token {}", bad);
        assert!(err.to_string().contains(bad));
    }
}

#[test]
fn sample_timestamps_cross_midnight() {
    let text = header(1, 1_400_000, &["200(0)/mV"]);
    let buffer = encode(&raw_samples(1_400_000, 5));
    let data = parse(&buffer, &text).unwrap();

    assert_eq!(data.timestamp_at(0).unwrap().to_string(), "2023-12-31 22:10:05");
    // 200 Hz: 1h49m55s later is midnight
    let midnight = (49 * 60 + 55 + 3600) * 200;
    assert_eq!(
        data.timestamp_at(midnight).unwrap().to_string(),
        "2024-01-01 00:00:00"
    );
    assert_eq!(data.metadata.duration().num_seconds(), 7000);
}

#[test]
fn extreme_baseline_decodes_without_overflow() {
    let text = header(1, 1, &["200(-2147483648)/mV"]);
    let data = parse(&encode(&[1]), &text).unwrap();
    assert_eq!(data.samples[0], vec![2_147_483_649.0 / 200.0]);
}

#[test]
fn record_line_with_extra_tokens_is_rejected() {
    let text = "R 1 250 1 09:00:00 01/01/2024 EXTRA junk\nR.dat 16 200(0)/mV\n";
    let err = parse(&encode(&[1]), text).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderFormat);
    assert!(err.to_string().contains("EXTRA"));
}

#[test]
fn strict_parser_accepts_valid_gains() {
    let text = header(2, 3, &["200(0)/mV", "100(10)/mV"]);
    let buffer = encode(&[200, 110, 400, 210, 600, 310]);

    let data = HolterParser::new()
        .with_strict_gain(true)
        .parse(&buffer, &text)
        .unwrap();

    assert_eq!(data.samples, vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]]);
}
