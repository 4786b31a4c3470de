//! Round-trip execution.

use crate::output::write_run_folder;
use crate::scenario::{GOLDEN_MESSAGE, Scenario, default_scenarios};
use crate::types::{RoundtripReport, RunRecord, ScenarioRecord};
use crate::{Error, Result};
use eclipsera::{AggregatedReport, AnalyzeConfig, AnalyzeOptions, analyze_image, decode_text_from_image, encode_text_to_image};
use std::fs;
use std::path::{Path, PathBuf};

const COVER_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Cover images directly inside `dir`, sorted by path.
pub fn discover_covers(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut covers = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_cover = path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| COVER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if is_cover {
            covers.push(path);
        }
    }
    if covers.is_empty() {
        return Err(Error::NoCovers(dir.to_path_buf()));
    }
    covers.sort();
    Ok(covers)
}

/// First sweep candidate that carries the golden message.
fn recovered_from_sweep(report: &AggregatedReport) -> Option<String> {
    report
        .recovered_texts
        .iter()
        .find(|candidate| candidate.text.contains(GOLDEN_MESSAGE))
        .map(|candidate| candidate.text.clone())
}

/// Whether a run counts as a success.
///
/// Any collaborator output line, the log text, the reference decode (exactly,
/// or containing the message minus its final period) or a sweep candidate
/// may carry the message.
pub fn message_found(report: &AggregatedReport, recovered_message: Option<&str>, recovered_from_sweep: Option<&str>) -> bool {
    let core = GOLDEN_MESSAGE.trim_end_matches('.');
    report.text_lines.iter().any(|line| line.contains(GOLDEN_MESSAGE))
        || report.logs_text().contains(GOLDEN_MESSAGE)
        || recovered_message.is_some_and(|text| text == GOLDEN_MESSAGE || text.contains(core))
        || recovered_from_sweep.is_some()
}

/// Runs every scenario against every cover in a directory.
pub struct RoundtripRunner {
    covers_dir: PathBuf,
    output_dir: PathBuf,
    scenarios: Vec<Scenario>,
    analyze_config: AnalyzeConfig,
}

impl RoundtripRunner {
    pub fn new(covers_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            covers_dir: covers_dir.into(),
            output_dir: output_dir.into(),
            scenarios: default_scenarios(),
            analyze_config: AnalyzeConfig::default(),
        }
    }

    pub fn with_scenarios(mut self, scenarios: Vec<Scenario>) -> Self {
        self.scenarios = scenarios;
        self
    }

    pub fn with_analyze_config(mut self, config: AnalyzeConfig) -> Self {
        self.analyze_config = config;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Encode and analyze every cover × scenario pair in order.
    ///
    /// Covers are processed one at a time; each analysis already runs its
    /// collaborators concurrently.
    pub async fn run(&self) -> Result<RoundtripReport> {
        let covers = discover_covers(&self.covers_dir)?;
        fs::create_dir_all(self.output_dir.join("encoded"))?;

        let mut runs = Vec::with_capacity(covers.len() * self.scenarios.len());
        for cover in &covers {
            let cover_bytes = fs::read(cover)?;
            for scenario in &self.scenarios {
                let record = self.run_one(cover, &cover_bytes, scenario).await?;
                tracing::info!(
                    "{} / {}: {}",
                    record.cover_image,
                    scenario.label,
                    if record.message_found { "found" } else { "missing" }
                );
                runs.push(record);
            }
        }

        let generated_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        Ok(RoundtripReport::new(generated_at, runs))
    }

    async fn run_one(&self, cover: &Path, cover_bytes: &[u8], scenario: &Scenario) -> Result<RunRecord> {
        let stem = cover.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let encoded_name = format!("{}__{}.png", stem, scenario.label);
        let cover_name = cover
            .strip_prefix(&self.covers_dir)
            .unwrap_or(cover)
            .to_string_lossy()
            .into_owned();

        let mut record = RunRecord {
            cover_image: cover_name,
            encoded_image: format!("encoded/{}", encoded_name),
            scenario: ScenarioRecord {
                label: scenario.label.clone(),
                use_all_channels: scenario.encode.use_all_channels,
                channels: scenario.encode.channels.clone(),
                compress: scenario.encode.compress,
                reduce_size: scenario.encode.reduce_size,
                deep_analysis: scenario.deep,
            },
            decode_summary: String::new(),
            message_found: false,
            plane: scenario.plane().to_string(),
            recovered_message: None,
            recovered_from_zsteg: None,
            recovered_texts_count: 0,
        };

        let outcome = match encode_text_to_image(cover_bytes, GOLDEN_MESSAGE, &scenario.encode) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Encoding {} failed: {}", encoded_name, e);
                record.decode_summary = format!("Encoding failed: {}", e);
                return Ok(record);
            }
        };
        fs::write(self.output_dir.join(&record.encoded_image), &outcome.image_bytes)?;
        record.plane = outcome.plane.to_string();

        record.recovered_message = decode_text_from_image(&outcome.image_bytes, &outcome.plane, scenario.encode.compress)
            .unwrap_or_else(|e| {
                tracing::warn!("Reference decode of {} failed: {}", encoded_name, e);
                None
            });

        let options = AnalyzeOptions {
            filename: encoded_name.clone(),
            password: scenario.password.clone(),
            deep: scenario.deep,
            log_dir: None,
        };
        let report = match analyze_image(&outcome.image_bytes, &options, &self.analyze_config).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("Analyzing {} failed: {}", encoded_name, e);
                record.decode_summary = format!("Analysis failed: {}", e);
                return Ok(record);
            }
        };

        record.recovered_from_zsteg = recovered_from_sweep(&report);
        record.recovered_texts_count = report.recovered_texts.len();
        record.message_found = message_found(
            &report,
            record.recovered_message.as_deref(),
            record.recovered_from_zsteg.as_deref(),
        );
        record.decode_summary = report.summary.clone();

        let run_dir = self.output_dir.join("runs").join(Path::new(&encoded_name).with_extension(""));
        write_run_folder(&run_dir, &report, record.message_found)?;

        Ok(record)
    }
}
