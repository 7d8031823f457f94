//! Integration tests for gha-cli.
//!
//! Runs the built `gha` binary against raw PCM fixtures written to temporary
//! files and checks its reports and exit status.

use std::f64::consts::TAU;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;

/// Helper to get the path to the `gha` binary built by cargo.
fn gha_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gha"))
}

/// Write signed 8-bit samples.
fn raw_8bit(samples: &[f64]) -> NamedTempFile {
    let bytes: Vec<u8> = samples
        .iter()
        .map(|x| (x * 128.0).round().clamp(-128.0, 127.0) as i8 as u8)
        .collect();
    write_fixture(&bytes)
}

/// Write signed 24-bit little-endian samples.
fn raw_24bit(samples: &[f64]) -> NamedTempFile {
    let scale = f64::from(1 << 23);
    let bytes: Vec<u8> = samples
        .iter()
        .flat_map(|x| {
            let v = (x * scale).round().clamp(-scale, scale - 1.0) as i32;
            let b = v.to_le_bytes();
            [b[0], b[1], b[2]]
        })
        .collect();
    write_fixture(&bytes)
}

fn write_fixture(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// 697 Hz + 1209 Hz ("1" key) at 8 kHz.
fn dtmf_one(n: usize) -> Vec<f64> {
    let (low, high) = (TAU * 697.0 / 8000.0, TAU * 1209.0 / 8000.0);
    (0..n)
        .map(|i| {
            let t = i as f64;
            0.3 * (low * t + 0.4).sin() + 0.25 * (high * t + 1.1).sin()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// gha analyze
// ---------------------------------------------------------------------------

#[test]
fn cli_analyze_reports_tone() {
    let samples: Vec<f64> = (0..600).map(|i| 0.5 * (0.7 * i as f64 + 1.2).sin()).collect();
    let file = raw_24bit(&samples);

    let output = gha_bin()
        .args(["analyze", path_arg(file.path()), "--len", "512", "--json"])
        .output()
        .expect("failed to run gha analyze");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tone = &report["tones"][0];
    assert!((tone["frequency"].as_f64().unwrap() - 0.7).abs() < 1e-3);
    assert!((tone["magnitude"].as_f64().unwrap() - 0.5).abs() < 1e-3);
}

#[test]
fn cli_analyze_expectation() {
    let samples: Vec<f64> = (0..512).map(|i| 0.5 * (0.7 * i as f64 + 1.2).sin()).collect();
    let file = raw_24bit(&samples);

    let ok = gha_bin()
        .args(["analyze", path_arg(file.path()), "--expect", "0.7", "1.2", "0.5"])
        .output()
        .expect("failed to run gha analyze");
    assert!(ok.status.success(), "{}", String::from_utf8_lossy(&ok.stderr));

    let mismatch = gha_bin()
        .args(["analyze", path_arg(file.path()), "--expect", "0.8", "1.2", "0.5"])
        .output()
        .expect("failed to run gha analyze");
    assert!(!mismatch.status.success());
}

#[test]
fn cli_analyze_rejects_odd_frame() {
    let file = raw_24bit(&[0.1; 9]);
    let output = gha_bin()
        .args(["analyze", path_arg(file.path())])
        .output()
        .expect("failed to run gha analyze");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("even"));
}

#[test]
fn cli_missing_file_fails() {
    let output = gha_bin()
        .args(["analyze", "/nonexistent/input.raw"])
        .output()
        .expect("failed to run gha analyze");
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// gha extract
// ---------------------------------------------------------------------------

#[test]
fn cli_extract_adjusted_is_sorted() {
    let samples: Vec<f64> = (0..256)
        .map(|i| {
            let t = i as f64;
            0.3 * (1.4 * t + 2.0).sin() + 0.4 * (0.6 * t + 1.0).sin()
        })
        .collect();
    let file = raw_24bit(&samples);

    let output = gha_bin()
        .args(["extract", path_arg(file.path()), "-k", "2", "--adjust", "--json"])
        .output()
        .expect("failed to run gha extract");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tones = report["tones"].as_array().unwrap();
    assert_eq!(tones.len(), 2);
    let low = tones[0]["frequency"].as_f64().unwrap();
    let high = tones[1]["frequency"].as_f64().unwrap();
    assert!((low - 0.6).abs() < 1e-4, "low {low}");
    assert!((high - 1.4).abs() < 1e-4, "high {high}");
    assert!(report["residual_rms"].as_f64().unwrap() < 1e-5);
}

#[test]
fn cli_extract_text_output() {
    let samples: Vec<f64> = (0..128).map(|i| 0.5 * (0.9 * i as f64).sin()).collect();
    let file = raw_24bit(&samples);

    let output = gha_bin()
        .args(["extract", path_arg(file.path()), "-k", "1"])
        .output()
        .expect("failed to run gha extract");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tone 0:"));
    assert!(stdout.contains("residual rms:"));
}

// ---------------------------------------------------------------------------
// gha dtmf
// ---------------------------------------------------------------------------

#[test]
fn cli_dtmf_matches_expected_pair() {
    let file = raw_8bit(&dtmf_one(400));
    let low = format!("{:.6}", TAU * 697.0 / 8000.0);
    let high = format!("{:.6}", TAU * 1209.0 / 8000.0);

    let output = gha_bin()
        .args([
            "dtmf",
            path_arg(file.path()),
            "--offset",
            "100",
            "--len",
            "256",
            "--expect",
            &low,
            "0.3",
            &high,
            "0.25",
        ])
        .output()
        .expect("failed to run gha dtmf");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn cli_dtmf_wrong_expectation_fails() {
    let file = raw_8bit(&dtmf_one(256));
    let output = gha_bin()
        .args([
            "dtmf",
            path_arg(file.path()),
            "--expect",
            "0.6",
            "0.3",
            "0.95",
            "0.25",
        ])
        .output()
        .expect("failed to run gha dtmf");
    assert!(!output.status.success());
}

#[test]
fn cli_dtmf_uses_config_file() {
    let file = raw_8bit(&dtmf_one(256));
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "analysis_loops = 10\nadjust_loops = 10").unwrap();

    let output = gha_bin()
        .args([
            "dtmf",
            path_arg(file.path()),
            "--config",
            path_arg(config.path()),
            "--sample-rate",
            "8000",
            "--json",
        ])
        .output()
        .expect("failed to run gha dtmf");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let hz: Vec<f64> = report["tones"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["frequency_hz"].as_f64().unwrap())
        .collect();
    assert!((hz[0] - 697.0).abs() < 1.0, "{hz:?}");
    assert!((hz[1] - 1209.0).abs() < 1.0, "{hz:?}");
}

#[test]
fn cli_rejects_invalid_config() {
    let file = raw_8bit(&dtmf_one(256));
    let mut config = NamedTempFile::new().unwrap();
    writeln!(config, "damping = 3.0").unwrap();

    let output = gha_bin()
        .args(["dtmf", path_arg(file.path()), "--config", path_arg(config.path())])
        .output()
        .expect("failed to run gha dtmf");
    assert!(!output.status.success());
}
