//! `binwalk -e`: embedded file signatures and extraction.

use super::subprocess::{locate_binary, run_tool, write_captures};
use super::{Collaborator, CollaboratorContext, bundle};
use crate::types::ToolReport;
use crate::{EclipseraError, Result};
use std::ffi::OsStr;

pub(super) async fn run(ctx: &CollaboratorContext) -> Result<ToolReport> {
    let name = Collaborator::Binwalk.name();
    let binary = locate_binary(name, ctx.tool_override(Collaborator::Binwalk))?;
    let extract_dir = ctx.output_dir.join(name);
    tokio::fs::create_dir_all(&extract_dir).await?;

    let output = run_tool(
        name,
        &binary,
        [
            OsStr::new("-e"),
            OsStr::new("-C"),
            extract_dir.as_os_str(),
            ctx.image_path.as_os_str(),
        ],
        Some(&ctx.output_dir),
        ctx.timeout_secs,
    )
    .await?;
    write_captures(&ctx.output_dir, name, &output.stdout, &output.stderr).await?;

    if !output.success {
        return Err(EclipseraError::collaborator(name, output.failure_message()));
    }

    let mut report = ToolReport::ok(signature_rows(&output.stdout_text()));
    if bundle(extract_dir, &ctx.output_dir, name).await? {
        report = report.with_download(name);
    }
    Ok(report)
}

/// Rows of the signature table, i.e. lines starting with a decimal offset.
fn signature_rows(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.split_whitespace().next().is_some_and(|col| col.parse::<u64>().is_ok()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_rows() {
        let stdout = "\nDECIMAL       HEXADECIMAL     DESCRIPTION\n\
                      --------------------------------------------------------------------------------\n\
                      0             0x0             PNG image, 64 x 64, 8-bit/color RGBA, non-interlaced\n\
                      41            0x29            Zlib compressed data, default compression\n";
        let rows = signature_rows(stdout);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("0 "));
        assert!(rows[1].contains("Zlib"));
    }
}
