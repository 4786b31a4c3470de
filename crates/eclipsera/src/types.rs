//! Result types shared across the encoder and the analysis pipeline.
//!
//! Every value here is built once and never mutated afterwards. All of them
//! serialize with serde; raw image and archive bytes are written as base64.

use crate::core::config::EncodeOptions;
use crate::core::format::ImageFormat;
use crate::stego::PlaneSelection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: AsRef<[u8]>, S: Serializer>(bytes: T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Format, dimensions and size of an analysed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

/// A piece of text some extraction strategy recovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Strategy that produced the text, e.g. `zsteg`.
    pub source: String,
    /// Probe selector, e.g. `b1,rgb,lsb,xy`.
    pub selector: String,
    pub label: String,
    pub text: String,
    /// UTF-8 length of `text`.
    pub bytes_len: usize,
    /// First 64 bytes of `text` as space separated lowercase hex pairs.
    pub hex_preview: String,
}

impl Candidate {
    pub fn new(source: impl Into<String>, selector: impl Into<String>, label: impl Into<String>, text: String) -> Self {
        let bytes_len = text.len();
        let hex_preview = hex_preview(text.as_bytes());
        Self {
            source: source.into(),
            selector: selector.into(),
            label: label.into(),
            text,
            bytes_len,
            hex_preview,
        }
    }
}

/// Lowercase hex pairs of the first 64 bytes, separated by spaces.
pub fn hex_preview(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take(64)
        .map(|byte| format!("{:02x}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outcome of one collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerStatus {
    Ok,
    Skipped,
    Error,
    #[serde(other)]
    Unknown,
}

impl AnalyzerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerStatus::Ok => "ok",
            AnalyzerStatus::Skipped => "skipped",
            AnalyzerStatus::Error => "error",
            AnalyzerStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AnalyzerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One collaborator's entry in the shared results map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReport {
    pub status: AnalyzerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stem of a downloadable archive (`<stem>.zip`) in the output directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,
    /// Group name to image file names relative to the output directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<BTreeMap<String, Vec<String>>>,
}

impl ToolReport {
    pub fn ok(output: Vec<String>) -> Self {
        Self {
            status: AnalyzerStatus::Ok,
            output: Some(output),
            reason: None,
            error: None,
            download: None,
            images: None,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: AnalyzerStatus::Skipped,
            output: None,
            reason: Some(reason.into()),
            error: None,
            download: None,
            images: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: AnalyzerStatus::Error,
            output: None,
            reason: None,
            error: Some(message.into()),
            download: None,
            images: None,
        }
    }

    pub fn with_download(mut self, stem: impl Into<String>) -> Self {
        self.download = Some(stem.into());
        self
    }

    pub fn with_images(mut self, images: BTreeMap<String, Vec<String>>) -> Self {
        self.images = Some(images);
        self
    }
}

/// Status table row for one collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerDetail {
    pub name: String,
    pub status: AnalyzerStatus,
    /// Skip reason or error text; empty when the tool succeeded.
    pub reason: String,
    pub stdout_path: Option<String>,
    pub stderr_path: Option<String>,
}

/// Which probe produced a surviving candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorHit {
    pub tool: String,
    pub selector: String,
    pub bytes_len: usize,
}

/// An archive bundled by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub source: String,
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

/// A rendered bit plane, PNG encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneImage {
    pub label: String,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

/// Everything one analysis run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub meta: ImageMeta,
    pub best_candidate: Option<Candidate>,
    /// Deduplicated candidates in discovery order.
    pub candidates: Vec<Candidate>,
    pub analyzers: Vec<AnalyzerDetail>,
    pub selectors_hit: Vec<SelectorHit>,
    pub summary: String,
    pub planes: Vec<PlaneImage>,
    pub artifacts: Vec<Artifact>,
    pub logs: Vec<String>,
    /// Raw per-collaborator results, keyed by collaborator name.
    pub results: BTreeMap<String, ToolReport>,
    pub text_lines: Vec<String>,
    /// Sweep candidates before deduplication.
    pub recovered_texts: Vec<Candidate>,
}

impl AggregatedReport {
    /// Log lines joined with newlines.
    pub fn logs_text(&self) -> String {
        self.logs.join("\n")
    }
}

/// A cover with an embedded payload, ready to be written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodeOutcome {
    pub filename: String,
    #[serde(with = "base64_bytes")]
    pub image_bytes: Vec<u8>,
    pub plane: PlaneSelection,
    pub width: u32,
    pub height: u32,
    pub capacity_bytes: u64,
    /// Embedded payload size after optional compression.
    pub payload_bytes: usize,
    pub options_applied: EncodeOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_new_computes_len_and_preview() {
        let candidate = Candidate::new("zsteg", "b1,rgb,lsb,xy", "LSB RGB", "moon☾".to_string());
        assert_eq!(candidate.bytes_len, 7);
        assert_eq!(candidate.hex_preview, "6d 6f 6f 6e e2 98 be");
    }

    #[test]
    fn test_hex_preview_caps_at_64_bytes() {
        let preview = hex_preview(&[0xAB; 100]);
        assert_eq!(preview.split(' ').count(), 64);
        assert!(preview.starts_with("ab ab"));
    }

    #[test]
    fn test_tool_report_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ToolReport::skipped("not applicable")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "skipped", "reason": "not applicable"}));
    }

    #[test]
    fn test_unknown_status_loads() {
        let report: ToolReport = serde_json::from_str(r#"{"status": "running"}"#).unwrap();
        assert_eq!(report.status, AnalyzerStatus::Unknown);
    }

    #[test]
    fn test_artifact_bytes_base64() {
        let artifact = Artifact {
            source: "binwalk".to_string(),
            name: "binwalk.zip".to_string(),
            bytes: b"PK\x03\x04".to_vec(),
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["bytes"], "UEsDBA==");

        let back: Artifact = serde_json::from_value(json).unwrap();
        assert_eq!(back, artifact);
    }
}
