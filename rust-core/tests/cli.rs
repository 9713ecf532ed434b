//! Exit codes and output of the hopscan binary

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn hopscan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hopscan"))
        .args(args)
        .output()
        .unwrap()
}

fn write_tone(dir: &Path) -> String {
    let path = dir.join("tone.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for n in 0..8000 {
        let s = 10000.0 * (2.0 * std::f64::consts::PI * 1000.0 * n as f64 / 8000.0).sin();
        writer.write_sample(s.round() as i16).unwrap();
    }
    writer.finalize().unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_missing_argument_exits_1() {
    let output = hopscan(&[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_extra_argument_exits_1() {
    let output = hopscan(&["a.mp3", "b.mp3"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_zero_hop_size_exits_1() {
    let output = hopscan(&["a.mp3", "--hop-size", "0"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_exits_0() {
    let output = hopscan(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--hop-size"));
}

#[test]
fn test_unreadable_file_exits_1() {
    let output = hopscan(&["/definitely/not/here.mp3"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_reports_timing() {
    let dir = TempDir::new().unwrap();
    let path = write_tone(dir.path());

    let output = hopscan(&[&path, "--hop-size", "800"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Sample rate: 8000 Hz"));
    assert!(stdout.contains("Successfully extracted 8000 samples"));
    assert!(stdout.contains("bluestein strategy, 401 bins per hop"));
    assert!(stdout.contains("Hops analyzed: 10"));
    assert!(stdout.contains("Processing loop took"));
}
