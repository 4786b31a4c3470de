//! Assembly of the final [`AggregatedReport`].
//!
//! Everything that has to be read from the run workspace (plane images,
//! archives, capture files) is read here, before the workspace is removed.

use crate::Result;
use crate::aggregate::{deduplicate, select_best, selectors_hit};
use crate::collaborators::recovered_candidates;
use crate::core::io::persist_log;
use crate::types::{
    AggregatedReport, AnalyzerDetail, AnalyzerStatus, Artifact, Candidate, ImageMeta, PlaneImage, ToolReport,
};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Output lines quoted per collaborator in the log.
const LOG_PREVIEW_LINES: usize = 3;

/// Build the report for one run.
///
/// `sweep` holds the sweep candidates in discovery order; `results` is the
/// merged collaborator map. Text recovered by collaborators joins the pool
/// after the sweep candidates, so a sweep hit wins over the same text found
/// by a tool. When `log_dir` is given, capture files are copied
/// there and the analyzer details point at the copies.
pub fn assemble_report(
    meta: ImageMeta,
    sweep: Vec<Candidate>,
    results: BTreeMap<String, ToolReport>,
    output_dir: &Path,
    log_dir: Option<&Path>,
) -> Result<AggregatedReport> {
    let mut pool = sweep.clone();
    pool.extend(recovered_candidates(&results));
    let candidates = deduplicate(&pool);
    let best_candidate = select_best(&candidates).cloned();
    let selectors_hit = selectors_hit(&candidates);

    Ok(AggregatedReport {
        meta,
        best_candidate,
        selectors_hit,
        candidates,
        analyzers: analyzer_details(&results, output_dir, log_dir)?,
        summary: summarize(&results),
        planes: collect_planes(&results, output_dir),
        artifacts: collect_artifacts(&results, output_dir),
        logs: log_lines(&results),
        text_lines: pooled_output(&results),
        results,
        recovered_texts: sweep,
    })
}

/// `"name: status; ..."` in name order, or a fixed notice when nothing ran.
pub fn summarize(results: &BTreeMap<String, ToolReport>) -> String {
    if results.is_empty() {
        return "No analyzers executed".to_string();
    }
    results
        .iter()
        .map(|(name, report)| format!("{}: {}", name, report.status))
        .collect::<Vec<_>>()
        .join("; ")
}

/// One human-readable line per collaborator.
pub fn log_lines(results: &BTreeMap<String, ToolReport>) -> Vec<String> {
    results
        .iter()
        .map(|(name, report)| match report.status {
            AnalyzerStatus::Ok => {
                let preview = report
                    .output
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .take(LOG_PREVIEW_LINES)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{}] ok {}", name, preview).trim_end().to_string()
            }
            AnalyzerStatus::Skipped => format!(
                "[{}] skipped: {}",
                name,
                report.reason.as_deref().unwrap_or("Not applicable")
            ),
            status => format!(
                "[{}] {}: {}",
                name,
                status,
                report.error.as_deref().or(report.reason.as_deref()).unwrap_or_default()
            ),
        })
        .collect()
}

/// Every collaborator's output lines, in name order.
pub fn pooled_output(results: &BTreeMap<String, ToolReport>) -> Vec<String> {
    results
        .values()
        .filter_map(|report| report.output.as_ref())
        .flatten()
        .cloned()
        .collect()
}

fn analyzer_details(
    results: &BTreeMap<String, ToolReport>,
    output_dir: &Path,
    log_dir: Option<&Path>,
) -> Result<Vec<AnalyzerDetail>> {
    let mut details = Vec::with_capacity(results.len());
    for (name, report) in results {
        let (stdout_path, stderr_path) = match log_dir {
            Some(log_dir) => (
                persisted_capture(output_dir, name, "stdout", log_dir)?,
                persisted_capture(output_dir, name, "stderr", log_dir)?,
            ),
            None => (None, None),
        };
        details.push(AnalyzerDetail {
            name: name.clone(),
            status: report.status,
            reason: report.reason.clone().or_else(|| report.error.clone()).unwrap_or_default(),
            stdout_path,
            stderr_path,
        });
    }
    Ok(details)
}

fn persisted_capture(output_dir: &Path, name: &str, stream: &str, log_dir: &Path) -> Result<Option<String>> {
    let capture = output_dir.join(format!("{}.{}", name, stream));
    if !capture.is_file() {
        return Ok(None);
    }
    let copy = persist_log(&capture, log_dir)?;
    Ok(Some(copy.to_string_lossy().into_owned()))
}

fn collect_planes(results: &BTreeMap<String, ToolReport>, output_dir: &Path) -> Vec<PlaneImage> {
    let mut planes = Vec::new();
    for images in results.values().filter_map(|report| report.images.as_ref()) {
        for (group, names) in images {
            for name in names {
                match fs::read(output_dir.join(name)) {
                    Ok(bytes) => planes.push(PlaneImage {
                        label: format!("{}: {}", group, name),
                        bytes,
                    }),
                    Err(e) => tracing::warn!("Plane image {} unreadable: {}", name, e),
                }
            }
        }
    }
    planes
}

fn collect_artifacts(results: &BTreeMap<String, ToolReport>, output_dir: &Path) -> Vec<Artifact> {
    let mut artifacts = Vec::new();
    for (source, report) in results {
        let Some(stem) = report.download.as_deref() else {
            continue;
        };
        let name = format!("{}.zip", stem);
        match fs::read(output_dir.join(&name)) {
            Ok(bytes) => artifacts.push(Artifact {
                source: source.clone(),
                name,
                bytes,
            }),
            Err(e) => tracing::warn!("Artifact {} from {} unreadable: {}", name, source, e),
        }
    }
    artifacts
}
