//! Report types written by the harness.

use serde::{Deserialize, Serialize};

/// Scenario as recorded in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub label: String,
    pub use_all_channels: bool,
    pub channels: Option<Vec<String>>,
    pub compress: bool,
    pub reduce_size: bool,
    pub deep_analysis: bool,
}

/// Outcome of one cover × scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Cover path relative to the covers directory
    pub cover_image: String,
    /// Encoded image path relative to the output directory
    pub encoded_image: String,
    pub scenario: ScenarioRecord,
    /// Analyzer summary, or the failure that stopped the run
    pub decode_summary: String,
    pub message_found: bool,
    pub plane: String,
    pub recovered_message: Option<String>,
    pub recovered_from_zsteg: Option<String>,
    pub recovered_texts_count: usize,
}

/// Full harness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundtripReport {
    /// UTC timestamp, seconds precision
    pub generated_at: String,
    pub overall_pass: bool,
    pub total_runs: usize,
    pub successful_runs: usize,
    pub runs: Vec<RunRecord>,
}

impl RoundtripReport {
    pub fn new(generated_at: String, runs: Vec<RunRecord>) -> Self {
        let successful_runs = runs.iter().filter(|run| run.message_found).count();
        Self {
            generated_at,
            overall_pass: successful_runs == runs.len(),
            total_runs: runs.len(),
            successful_runs,
            runs,
        }
    }
}
