//! Output writers for round-trip results
//!
//! The aggregate report is written as JSON and as a Markdown table; each run
//! also gets a folder with the analysis' plane images, artifacts and text.

use crate::Result;
use crate::types::RoundtripReport;
use eclipsera::AggregatedReport;
use std::fs;
use std::path::Path;

/// Characters of recovered text shown in the Markdown table.
const PREVIEW_CHARS: usize = 50;

/// Write the report to a JSON file
pub fn write_json(report: &RoundtripReport, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(output_path, json)?;
    Ok(())
}

/// Write the report as a Markdown table
pub fn write_markdown(report: &RoundtripReport, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, render_markdown(report))?;
    Ok(())
}

pub fn render_markdown(report: &RoundtripReport) -> String {
    let mut lines = vec![
        "# Eclipsera Encode→Decode Report".to_string(),
        String::new(),
        format!("Generated: {}", report.generated_at),
        format!(
            "Overall status: {}",
            if report.overall_pass { "✅ PASS" } else { "❌ FAIL" }
        ),
        format!("Successful runs: {} / {}", report.successful_runs, report.total_runs),
        String::new(),
        "| Cover | Variant | Message Found | Recovered Text | Notes |".to_string(),
        "| --- | --- | --- | --- | --- |".to_string(),
    ];

    for run in &report.runs {
        let status = if run.message_found { "✅" } else { "⚠️" };
        let recovered = run
            .recovered_from_zsteg
            .as_deref()
            .filter(|text| !text.is_empty())
            .or(run.recovered_message.as_deref())
            .unwrap_or_default();
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            run.cover_image,
            run.scenario.label,
            status,
            preview(recovered),
            run.decode_summary
        ));
    }

    lines.join("\n")
}

fn preview(text: &str) -> String {
    if text.is_empty() {
        return "(none)".to_string();
    }
    let mut shown: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        shown.push_str("...");
    }
    shown.replace('|', "\\|")
}

fn sanitize_filename(label: &str) -> String {
    label.replace([' ', ':', '/'], "_")
}

/// Recreate `run_dir` and fill it from one analysis.
pub fn write_run_folder(run_dir: &Path, report: &AggregatedReport, message_found: bool) -> Result<()> {
    if run_dir.exists() {
        fs::remove_dir_all(run_dir)?;
    }
    fs::create_dir_all(run_dir)?;

    for (index, plane) in report.planes.iter().enumerate() {
        let name = format!("{:02}_{}", index + 1, sanitize_filename(&plane.label));
        fs::write(run_dir.join(name), &plane.bytes)?;
    }
    for artifact in &report.artifacts {
        fs::write(run_dir.join(sanitize_filename(&artifact.name)), &artifact.bytes)?;
    }

    let text_lines: Vec<&str> = report
        .text_lines
        .iter()
        .map(String::as_str)
        .filter(|line| !line.is_empty())
        .collect();
    if !text_lines.is_empty() {
        fs::write(run_dir.join("text_lines.txt"), text_lines.join("\n"))?;
    }

    let mut summary = vec![
        report.summary.clone(),
        String::new(),
        format!("Message detected: {}", if message_found { "yes" } else { "no" }),
        String::new(),
        "Analyzer statuses:".to_string(),
    ];
    summary.extend(
        report
            .results
            .iter()
            .map(|(name, result)| format!("- {}: {}", name, result.status)),
    );
    fs::write(run_dir.join("summary.txt"), summary.join("\n"))?;

    Ok(())
}
