//! Analysis entry points.
//!
//! One call = one run: the image is written into a fresh [`RunWorkspace`],
//! the selector sweep and the collaborators run side by side over it, and
//! their findings are merged into an [`AggregatedReport`]. The workspace is
//! removed before the call returns, whatever the outcome.

use crate::collaborators::run_collaborators;
use crate::core::config::{AnalyzeConfig, AnalyzeOptions};
use crate::core::format::{ImageFormat, extract_meta};
use crate::core::io::RunWorkspace;
use crate::report::assemble_report;
use crate::sweep::run_sweep;
use crate::types::AggregatedReport;
use crate::{EclipseraError, Result};
use image::RgbaImage;
use once_cell::sync::Lazy;
use std::sync::Arc;

static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

/// Analyze an image for hidden payloads.
///
/// # Errors
///
/// - `Validation` when `image_bytes` is empty, or is neither a recognised
///   format nor decodable as an image
/// - `Io` when the run workspace cannot be created
///
/// Collaborator and probe failures never surface here; they are reported in
/// the returned report.
///
/// # Example
///
/// ```rust,no_run
/// use eclipsera::{AnalyzeConfig, AnalyzeOptions, analyze_image};
///
/// # async fn example() -> eclipsera::Result<()> {
/// let bytes = std::fs::read("suspect.png")?;
/// let report = analyze_image(&bytes, &AnalyzeOptions::default(), &AnalyzeConfig::default()).await?;
/// println!("{}", report.summary);
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(skip_all, fields(image.size_bytes = image_bytes.len(), deep = options.deep))]
pub async fn analyze_image(
    image_bytes: &[u8],
    options: &AnalyzeOptions,
    config: &AnalyzeConfig,
) -> Result<AggregatedReport> {
    if image_bytes.is_empty() {
        return Err(EclipseraError::validation("An image is required for analysis."));
    }

    let format = ImageFormat::detect(image_bytes);
    let meta = extract_meta(image_bytes);
    let pixels = decode_pixels(image_bytes.to_vec(), format).await?;

    let workspace = RunWorkspace::create(&options.filename, image_bytes)?;
    tracing::debug!("Analyzing {} cover in {}", format, workspace.root().display());

    let (candidates, results) = tokio::join!(
        run_sweep(workspace.image_path(), format, pixels, config),
        run_collaborators(workspace.image_path(), workspace.output_dir(), format, options, config),
    );

    let output_dir = workspace.output_dir().to_path_buf();
    let log_dir = options.log_dir.clone();
    let report = tokio::task::spawn_blocking(move || {
        assemble_report(meta, candidates, results, &output_dir, log_dir.as_deref())
    })
    .await
    .map_err(|e| EclipseraError::Other(format!("Report assembly task failed: {}", e)))??;

    tracing::debug!("Analysis finished: {}", report.summary);
    Ok(report)
}

/// Synchronous wrapper for [`analyze_image`] on a shared global runtime.
///
/// Must not be called from inside an async context.
pub fn analyze_image_sync(
    image_bytes: &[u8],
    options: &AnalyzeOptions,
    config: &AnalyzeConfig,
) -> Result<AggregatedReport> {
    GLOBAL_RUNTIME.block_on(analyze_image(image_bytes, options, config))
}

/// Decode the pixels for the in-process probes.
///
/// Input in a known container that fails to decode is still analysed by the
/// collaborators; anything else is rejected.
async fn decode_pixels(bytes: Vec<u8>, format: ImageFormat) -> Result<Option<Arc<RgbaImage>>> {
    let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes).map(|img| img.to_rgba8()))
        .await
        .map_err(|e| EclipseraError::Other(format!("Image decode task failed: {}", e)))?;

    match decoded {
        Ok(pixels) => Ok(Some(Arc::new(pixels))),
        Err(e) if format == ImageFormat::Unknown => Err(EclipseraError::validation_with_source(
            "Input is not a supported image",
            e,
        )),
        Err(e) => {
            tracing::warn!("{} cover could not be decoded, continuing without pixels: {}", format, e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ToolPaths;
    use crate::types::AnalyzerStatus;
    use std::path::PathBuf;

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

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let err = analyze_image(&[], &AnalyzeOptions::default(), &offline_config())
            .await
            .unwrap_err();
        assert!(matches!(err, EclipseraError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_garbage_input_is_rejected() {
        let err = analyze_image(b"definitely not an image", &AnalyzeOptions::default(), &offline_config())
            .await
            .unwrap_err();
        assert!(matches!(err, EclipseraError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_truncated_png_is_still_analyzed() {
        let bytes = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR".to_vec();
        let report = analyze_image(&bytes, &AnalyzeOptions::default(), &offline_config())
            .await
            .unwrap();

        assert_eq!(report.meta.format, ImageFormat::Unknown);
        assert_eq!(report.meta.size_bytes, bytes.len() as u64);
        assert!(report.candidates.is_empty());
        assert_eq!(report.results["decomposer"].status, AnalyzerStatus::Error);
        assert_eq!(report.results["strings"].status, AnalyzerStatus::Ok);
    }

    #[test]
    fn test_sync_wrapper() {
        let err = analyze_image_sync(&[], &AnalyzeOptions::default(), &offline_config()).unwrap_err();
        assert!(matches!(err, EclipseraError::Validation { .. }));
    }
}
