//! End-to-end harness runs with every external tool unavailable.

use eclipsera::{AnalyzeConfig, ToolPaths};
use image::{Rgba, RgbaImage};
use roundtrip_harness::{GOLDEN_MESSAGE, RoundtripRunner, write_json, write_markdown};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn offline_config() -> AnalyzeConfig {
    let ghost = |name: &str| Some(PathBuf::from(format!("/nonexistent/{}", name)));
    AnalyzeConfig {
        tools: ToolPaths {
            binwalk: ghost("binwalk"),
            exiftool: ghost("exiftool"),
            foremost: ghost("foremost"),
            zsteg: ghost("zsteg"),
            steghide: ghost("steghide"),
            outguess: ghost("outguess"),
        },
        ..Default::default()
    }
}

fn write_cover(dir: &Path, name: &str, width: u32, height: u32) {
    let image = RgbaImage::from_fn(width, height, |x, y| Rgba([(x * 7) as u8, (y * 5) as u8, 128, 255]));
    image.save(dir.join(name)).unwrap();
}

#[tokio::test]
async fn test_roundtrip_finds_message_in_every_scenario() {
    let covers = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_cover(covers.path(), "gradient.png", 32, 32);

    let runner = RoundtripRunner::new(covers.path(), output.path()).with_analyze_config(offline_config());
    let report = runner.run().await.unwrap();

    assert_eq!(report.total_runs, 3);
    assert!(report.overall_pass, "{:#?}", report.runs);
    for run in &report.runs {
        assert_eq!(run.cover_image, "gradient.png");
        assert_eq!(run.plane, "RGB");
        assert_eq!(run.recovered_message.as_deref(), Some(GOLDEN_MESSAGE));
        assert!(output.path().join(&run.encoded_image).is_file());
    }

    let run_dir = output.path().join("runs").join("gradient__overall");
    let summary = fs::read_to_string(run_dir.join("summary.txt")).unwrap();
    assert!(summary.contains("Message detected: yes"));
    assert!(summary.contains("- decomposer: ok"));
    assert!(run_dir.join("01_Alpha__Alpha_bit_0.png").is_file());

    write_json(&report, &output.path().join("report.json")).unwrap();
    write_markdown(&report, &output.path().join("report.md")).unwrap();
    let markdown = fs::read_to_string(output.path().join("report.md")).unwrap();
    assert!(markdown.contains("Overall status: ✅ PASS"));
    assert!(markdown.contains("| gradient.png | rgb_zlib_deep | ✅ |"));
}

#[tokio::test]
async fn test_roundtrip_records_encoding_failures() {
    let covers = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_cover(covers.path(), "tiny.png", 2, 2);

    let runner = RoundtripRunner::new(covers.path(), output.path()).with_analyze_config(offline_config());
    let report = runner.run().await.unwrap();

    assert_eq!(report.total_runs, 3);
    assert_eq!(report.successful_runs, 0);
    assert!(!report.overall_pass);
    assert!(report.runs[0].decode_summary.starts_with("Encoding failed: "));
}

#[tokio::test]
async fn test_roundtrip_without_covers_fails() {
    let covers = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let runner = RoundtripRunner::new(covers.path(), output.path());
    assert!(runner.run().await.is_err());
}
