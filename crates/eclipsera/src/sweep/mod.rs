//! Selector sweep extraction.
//!
//! A fixed battery of bit-plane probes is run against lossless covers. Each
//! probe reads one bit of one or more channels in raster order and yields the
//! resulting bytes as text. Output that is empty or mostly unprintable is
//! discarded; the rest becomes a [`Candidate`].
//!
//! Probes are executed by [`ProbeRunner`] backends: [`ZstegProbeRunner`]
//! shells out to `zsteg -E`, [`NativeProbeRunner`] reads the same bit stream
//! in-process. A failing probe (missing binary, timeout, non-zero exit) simply
//! yields no candidate.

mod native;
mod zsteg;

pub use native::NativeProbeRunner;
pub use zsteg::ZstegProbeRunner;

use crate::Result;
use crate::core::config::AnalyzeConfig;
use crate::core::format::ImageFormat;
use crate::stego::Channel;
use crate::types::Candidate;
use async_trait::async_trait;
use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Leading characters inspected by the printable-text filter.
pub const PRINTABLE_WINDOW: usize = 200;

/// Share of printable characters a candidate needs (strictly more than this).
pub const PRINTABLE_THRESHOLD: f64 = 0.7;

/// One bit-plane probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// zsteg selector syntax, e.g. `b1,r,lsb,xy`
    pub selector: &'static str,
    pub label: &'static str,
    pub channels: &'static [Channel],
    /// Bit index read from every channel (0 = least significant)
    pub bit: u8,
}

/// The probe battery, in execution and reporting order.
pub static PROBES: [Probe; 5] = [
    Probe {
        selector: "b1,r,lsb,xy",
        label: "LSB Red",
        channels: &[Channel::Red],
        bit: 0,
    },
    Probe {
        selector: "b1,r,msb,xy",
        label: "MSB Red",
        channels: &[Channel::Red],
        bit: 7,
    },
    Probe {
        selector: "b1,g,lsb,xy",
        label: "LSB Green",
        channels: &[Channel::Green],
        bit: 0,
    },
    Probe {
        selector: "b1,b,lsb,xy",
        label: "LSB Blue",
        channels: &[Channel::Blue],
        bit: 0,
    },
    Probe {
        selector: "b1,rgb,lsb,xy",
        label: "LSB RGB",
        channels: &[Channel::Red, Channel::Green, Channel::Blue],
        bit: 0,
    },
];

/// A backend able to run a [`Probe`] against an image file.
#[async_trait]
pub trait ProbeRunner: Send + Sync {
    /// Identifier recorded as the candidate source.
    fn source(&self) -> &str;

    /// Raw probe output, or `None` when the probe produced nothing usable.
    async fn run(&self, probe: &Probe, image_path: &Path) -> Result<Option<String>>;
}

fn is_printable(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\t') || (!c.is_control() && c != char::REPLACEMENT_CHARACTER)
}

/// Whether more than 70% of the first 200 characters are printable.
///
/// Replacement characters left by lossy UTF-8 decoding count as unprintable.
pub fn is_printable_text(text: &str) -> bool {
    let window: Vec<char> = text.chars().take(PRINTABLE_WINDOW).collect();
    if window.is_empty() {
        return false;
    }
    let printable = window.iter().filter(|&&c| is_printable(c)).count();
    printable as f64 / window.len() as f64 > PRINTABLE_THRESHOLD
}

/// Turn raw probe output into a candidate, applying the printable filter.
pub fn candidate_from_output(source: &str, probe: &Probe, raw: &str) -> Option<Candidate> {
    let text = raw.trim();
    if text.is_empty() || !is_printable_text(text) {
        return None;
    }
    Some(Candidate::new(source, probe.selector, probe.label, text.to_string()))
}

/// Run every probe on every runner concurrently.
///
/// Candidates are ordered by runner, then by probe battery order, no matter
/// which probe finished first.
pub async fn sweep_with_runners(runners: Vec<Arc<dyn ProbeRunner>>, image_path: &Path) -> Vec<Candidate> {
    let image_path: Arc<PathBuf> = Arc::new(image_path.to_path_buf());
    let mut tasks = JoinSet::new();

    for (runner_index, runner) in runners.into_iter().enumerate() {
        for (probe_index, probe) in PROBES.iter().enumerate() {
            let runner = Arc::clone(&runner);
            let path = Arc::clone(&image_path);
            tasks.spawn(async move {
                let outcome = runner.run(probe, &path).await;
                let candidate = match outcome {
                    Ok(Some(raw)) => candidate_from_output(runner.source(), probe, &raw),
                    Ok(None) => None,
                    Err(e) => {
                        tracing::debug!("Probe {} via {} produced no result: {}", probe.selector, runner.source(), e);
                        None
                    }
                };
                ((runner_index, probe_index), candidate)
            });
        }
    }

    let mut collected = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((key, Some(candidate))) => collected.push((key, candidate)),
            Ok((_, None)) => {}
            Err(e) => tracing::warn!("Sweep probe task failed: {}", e),
        }
    }

    collected.sort_by_key(|(key, _)| *key);
    collected.into_iter().map(|(_, candidate)| candidate).collect()
}

/// Run the selector sweep for one image.
///
/// Only lossless covers are probed; anything else yields no candidates. The
/// native backend needs the decoded pixels and is skipped without them.
pub async fn run_sweep(
    image_path: &Path,
    format: ImageFormat,
    pixels: Option<Arc<RgbaImage>>,
    config: &AnalyzeConfig,
) -> Vec<Candidate> {
    if !config.sweep_enabled || !format.is_lossless_bitmap() {
        tracing::debug!("Selector sweep skipped for {} cover", format);
        return Vec::new();
    }

    let mut runners: Vec<Arc<dyn ProbeRunner>> = vec![Arc::new(ZstegProbeRunner::new(
        config.tools.get("zsteg").map(Path::to_path_buf),
        config.probe_timeout_secs,
    ))];

    if config.native_probes
        && let Some(pixels) = pixels
    {
        runners.push(Arc::new(NativeProbeRunner::new(pixels)));
    }

    let candidates = sweep_with_runners(runners, image_path).await;
    tracing::debug!("Selector sweep produced {} candidate(s)", candidates.len());
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EclipseraError;

    struct CannedRunner {
        source: &'static str,
        outputs: Vec<(&'static str, Result<Option<String>>)>,
    }

    #[async_trait]
    impl ProbeRunner for CannedRunner {
        fn source(&self) -> &str {
            self.source
        }

        async fn run(&self, probe: &Probe, _image_path: &Path) -> Result<Option<String>> {
            if probe.selector == "b1,r,lsb,xy" {
                // Finish last to check ordering.
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
            match self.outputs.iter().find(|(selector, _)| *selector == probe.selector) {
                Some((_, Ok(out))) => Ok(out.clone()),
                Some((_, Err(_))) => Err(EclipseraError::MissingDependency("zsteg".to_string())),
                None => Ok(None),
            }
        }
    }

    #[test]
    fn test_printable_filter() {
        assert!(is_printable_text("hello, moon.\n"));
        assert!(!is_printable_text(""));
        assert!(!is_printable_text("\u{0}\u{1}\u{2}ab"));
        assert!(!is_printable_text("ab\u{FFFD}\u{FFFD}\u{FFFD}"));
        // 7 of 10 printable is not strictly more than 70%.
        assert!(!is_printable_text("abcdefg\u{1}\u{2}\u{3}"));
        assert!(is_printable_text("abcdefgh\u{1}\u{2}"));
    }

    #[test]
    fn test_printable_window_only_covers_prefix() {
        let text = format!("{}{}", "a".repeat(200), "\u{1}".repeat(500));
        assert!(is_printable_text(&text));
    }

    #[test]
    fn test_candidate_from_output_trims_and_filters() {
        let probe = PROBES[4];
        let candidate = candidate_from_output("zsteg", &probe, "  hello, moon.\n\n").unwrap();
        assert_eq!(candidate.text, "hello, moon.");
        assert_eq!(candidate.bytes_len, 12);
        assert_eq!(candidate.selector, "b1,rgb,lsb,xy");
        assert_eq!(candidate.label, "LSB RGB");
        assert!(candidate.hex_preview.starts_with("68 65 6c 6c 6f"));

        assert!(candidate_from_output("zsteg", &probe, " \n\t ").is_none());
        assert!(candidate_from_output("zsteg", &probe, "\u{1}\u{2}\u{3}\u{4}x").is_none());
    }

    #[tokio::test]
    async fn test_sweep_orders_by_runner_then_probe() {
        let first: Arc<dyn ProbeRunner> = Arc::new(CannedRunner {
            source: "first",
            outputs: vec![
                ("b1,rgb,lsb,xy", Ok(Some("rgb text".to_string()))),
                ("b1,r,lsb,xy", Ok(Some("red text".to_string()))),
                ("b1,g,lsb,xy", Err(EclipseraError::Other(String::new()))),
            ],
        });
        let second: Arc<dyn ProbeRunner> = Arc::new(CannedRunner {
            source: "second",
            outputs: vec![("b1,b,lsb,xy", Ok(Some("blue text".to_string())))],
        });

        let candidates = sweep_with_runners(vec![first, second], Path::new("unused.png")).await;
        let seen: Vec<(&str, &str)> = candidates
            .iter()
            .map(|c| (c.source.as_str(), c.text.as_str()))
            .collect();
        assert_eq!(
            seen,
            vec![("first", "red text"), ("first", "rgb text"), ("second", "blue text")]
        );
    }

    #[tokio::test]
    async fn test_run_sweep_skips_lossy_formats() {
        let pixels = Arc::new(RgbaImage::new(4, 4));
        let candidates = run_sweep(
            Path::new("cover.jpg"),
            ImageFormat::Jpeg,
            Some(pixels),
            &AnalyzeConfig::default(),
        )
        .await;
        assert!(candidates.is_empty());
    }
}
