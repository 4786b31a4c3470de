//! Forensic collaborators.
//!
//! A collaborator inspects the workspace image and records one
//! [`ToolReport`] under its name in the run's [`ResultsStore`]. Most wrap an
//! external binary; the bit-plane decomposer and the strings scan run
//! in-process. Which collaborators run for a given cover is decided by
//! [`plan_roster`], and [`run_collaborators`] executes the plan with bounded
//! concurrency, turning every failure into a status entry.

mod binwalk;
mod decomposer;
mod exiftool;
mod foremost;
mod orchestrator;
mod outguess;
mod steghide;
pub mod store;
mod strings;
pub mod subprocess;
mod zsteg;

pub use orchestrator::run_collaborators;
pub use store::ResultsStore;

use crate::Result;
use crate::core::config::ToolPaths;
use crate::core::format::ImageFormat;
use crate::core::io::bundle_directory;
use crate::sweep::is_printable_text;
use crate::types::{AnalyzerStatus, Candidate, ToolReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collaborator {
    Binwalk,
    Decomposer,
    Exiftool,
    Foremost,
    Strings,
    Zsteg,
    Steghide,
    Outguess,
}

impl Collaborator {
    /// Collaborators run for every analysis.
    pub const STANDARD: [Collaborator; 7] = [
        Collaborator::Binwalk,
        Collaborator::Decomposer,
        Collaborator::Exiftool,
        Collaborator::Foremost,
        Collaborator::Strings,
        Collaborator::Zsteg,
        Collaborator::Steghide,
    ];

    /// Collaborators added by deep analysis.
    pub const DEEP: [Collaborator; 1] = [Collaborator::Outguess];

    pub fn name(self) -> &'static str {
        match self {
            Collaborator::Binwalk => "binwalk",
            Collaborator::Decomposer => "decomposer",
            Collaborator::Exiftool => "exiftool",
            Collaborator::Foremost => "foremost",
            Collaborator::Strings => "strings",
            Collaborator::Zsteg => "zsteg",
            Collaborator::Steghide => "steghide",
            Collaborator::Outguess => "outguess",
        }
    }

    /// Why this collaborator cannot handle `format`, if it cannot.
    pub fn unsupported_reason(self, format: ImageFormat) -> Option<&'static str> {
        match (self, format) {
            (Collaborator::Steghide, ImageFormat::Png) => Some("PNG not supported by steghide (JPEG/BMP only)"),
            (Collaborator::Outguess, ImageFormat::Png) => Some("PNG not supported by outguess (JPEG-centric)"),
            _ => None,
        }
    }

    /// Run the collaborator and record its report in `ctx.store`.
    ///
    /// Errors are returned to the caller unrecorded.
    pub async fn run(self, ctx: &CollaboratorContext) -> Result<ToolReport> {
        tracing::debug!("Starting collaborator {}", self.name());
        let report = match self {
            Collaborator::Binwalk => binwalk::run(ctx).await?,
            Collaborator::Decomposer => decomposer::run(ctx).await?,
            Collaborator::Exiftool => exiftool::run(ctx).await?,
            Collaborator::Foremost => foremost::run(ctx).await?,
            Collaborator::Strings => strings::run(ctx).await?,
            Collaborator::Zsteg => zsteg::run(ctx).await?,
            Collaborator::Steghide => steghide::run(ctx).await?,
            Collaborator::Outguess => outguess::run(ctx).await?,
        };
        ctx.store.record(self.name(), report.clone()).await?;
        tracing::debug!("Collaborator {} finished with status {}", self.name(), report.status);
        Ok(report)
    }
}

impl std::fmt::Display for Collaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a collaborator needs for one run.
#[derive(Debug, Clone)]
pub struct CollaboratorContext {
    pub image_path: PathBuf,
    pub output_dir: PathBuf,
    pub password: Option<String>,
    pub tools: ToolPaths,
    pub timeout_secs: u64,
    pub store: ResultsStore,
}

impl CollaboratorContext {
    fn image_name(&self) -> String {
        self.image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn tool_override(&self, tool: Collaborator) -> Option<&Path> {
        self.tools.get(tool.name())
    }
}

/// Collaborators to run plus those skipped up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterPlan {
    pub active: Vec<Collaborator>,
    pub skipped: Vec<(Collaborator, &'static str)>,
}

/// Decide the roster for a cover of `format`.
///
/// The deep-only collaborators are considered only when `deep` is set.
pub fn plan_roster(format: ImageFormat, deep: bool) -> RosterPlan {
    let mut plan = RosterPlan {
        active: Vec::new(),
        skipped: Vec::new(),
    };

    let deep_roster: &[Collaborator] = if deep { &Collaborator::DEEP } else { &[] };
    for &collaborator in Collaborator::STANDARD.iter().chain(deep_roster) {
        match collaborator.unsupported_reason(format) {
            Some(reason) => plan.skipped.push((collaborator, reason)),
            None => plan.active.push(collaborator),
        }
    }
    plan
}

/// Text recovered by collaborators, as candidates.
///
/// zsteg contributes one candidate per `text:` hit, steghide and outguess one
/// each for the payload they extracted. Only `ok` entries are read, in the
/// order zsteg, steghide, outguess; text failing the printable filter is
/// dropped.
pub fn recovered_candidates(results: &BTreeMap<String, ToolReport>) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let mut push = |source: &str, selector: &str, text: &str| {
        let text = text.trim();
        if !text.is_empty() && is_printable_text(text) {
            candidates.push(Candidate::new(source, selector, source, text.to_string()));
        }
    };

    for collaborator in [Collaborator::Zsteg, Collaborator::Steghide, Collaborator::Outguess] {
        let name = collaborator.name();
        let Some(output) = results
            .get(name)
            .filter(|report| report.status == AnalyzerStatus::Ok)
            .and_then(|report| report.output.as_deref())
        else {
            continue;
        };

        match collaborator {
            Collaborator::Zsteg => {
                for (selector, text) in zsteg::text_hits(output) {
                    push(name, &selector, &text);
                }
            }
            Collaborator::Steghide => push(name, name, &steghide::recovered_text(output)),
            Collaborator::Outguess => push(name, name, &output.join("\n")),
            _ => {}
        }
    }
    candidates
}

/// Zip `src_dir` into `<output_dir>/<stem>.zip` off the async runtime.
///
/// Returns whether an archive was written.
async fn bundle(src_dir: PathBuf, output_dir: &Path, stem: &str) -> Result<bool> {
    if !src_dir.is_dir() {
        return Ok(false);
    }
    let dest = output_dir.join(format!("{}.zip", stem));
    let written = tokio::task::spawn_blocking(move || bundle_directory(&src_dir, &dest))
        .await
        .map_err(|e| crate::EclipseraError::Other(format!("Archive task failed: {}", e)))??;
    Ok(written > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_roster_skips_keyed_tools() {
        let plan = plan_roster(ImageFormat::Png, true);
        assert!(!plan.active.contains(&Collaborator::Steghide));
        assert!(!plan.active.contains(&Collaborator::Outguess));
        assert_eq!(
            plan.skipped,
            vec![
                (Collaborator::Steghide, "PNG not supported by steghide (JPEG/BMP only)"),
                (Collaborator::Outguess, "PNG not supported by outguess (JPEG-centric)"),
            ]
        );
        assert_eq!(plan.active.len(), 6);
    }

    #[test]
    fn test_outguess_only_in_deep_mode() {
        let shallow = plan_roster(ImageFormat::Jpeg, false);
        assert!(!shallow.active.contains(&Collaborator::Outguess));
        assert!(shallow.skipped.is_empty());
        assert_eq!(shallow.active.len(), 7);

        let deep = plan_roster(ImageFormat::Jpeg, true);
        assert_eq!(deep.active.last(), Some(&Collaborator::Outguess));

        let png_shallow = plan_roster(ImageFormat::Png, false);
        assert_eq!(png_shallow.skipped.len(), 1);
    }

    #[test]
    fn test_recovered_candidates() {
        let mut results = BTreeMap::new();
        results.insert(
            "zsteg".to_string(),
            ToolReport::ok(vec![
                "imagedata .. file: data".into(),
                "b1,rgb,lsb,xy .. text: \"hello, moon.\"".into(),
            ]),
        );
        results.insert(
            "steghide".to_string(),
            ToolReport::ok(vec!["wrote extracted data to \"s.txt\".".into(), "from steghide".into()]),
        );
        results.insert("outguess".to_string(), ToolReport::ok(vec!["attack".into(), "at dawn".into()]));
        results.insert("binwalk".to_string(), ToolReport::ok(vec!["0 0x0 PNG image".into()]));

        let candidates = recovered_candidates(&results);
        let found: Vec<(&str, &str, &str)> = candidates
            .iter()
            .map(|c| (c.source.as_str(), c.selector.as_str(), c.text.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("zsteg", "b1,rgb,lsb,xy", "hello, moon."),
                ("steghide", "steghide", "from steghide"),
                ("outguess", "outguess", "attack\nat dawn"),
            ]
        );
    }

    #[test]
    fn test_recovered_candidates_ignore_failed_and_empty_entries() {
        let mut results = BTreeMap::new();
        results.insert("zsteg".to_string(), ToolReport::error("Dependency missing: zsteg"));
        results.insert("outguess".to_string(), ToolReport::ok(Vec::new()));
        results.insert(
            "steghide".to_string(),
            ToolReport::ok(vec!["wrote extracted data to \"s.bin\".".into()]),
        );
        assert!(recovered_candidates(&results).is_empty());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = Collaborator::STANDARD
            .iter()
            .chain(Collaborator::DEEP.iter())
            .map(|c| c.name())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 8);
    }
}
