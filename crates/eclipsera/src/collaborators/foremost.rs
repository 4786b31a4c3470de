//! `foremost`: header/footer file carving.

use super::subprocess::{locate_binary, run_tool, write_captures};
use super::{Collaborator, CollaboratorContext, bundle};
use crate::core::io::traverse_directory;
use crate::types::ToolReport;
use crate::{EclipseraError, Result};
use std::ffi::OsStr;
use std::path::Path;

/// Run summary foremost always writes, carved files or not.
const AUDIT_FILE: &str = "audit.txt";

pub(super) async fn run(ctx: &CollaboratorContext) -> Result<ToolReport> {
    let name = Collaborator::Foremost.name();
    let binary = locate_binary(name, ctx.tool_override(Collaborator::Foremost))?;
    let carve_dir = ctx.output_dir.join(name);

    let output = run_tool(
        name,
        &binary,
        [
            OsStr::new("-o"),
            carve_dir.as_os_str(),
            OsStr::new("-i"),
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

    let carved = if carve_dir.is_dir() {
        carved_files(&carve_dir)?
    } else {
        Vec::new()
    };
    if carved.is_empty() {
        return Ok(ToolReport::ok(Vec::new()));
    }

    let mut report = ToolReport::ok(carved);
    if bundle(carve_dir, &ctx.output_dir, name).await? {
        report = report.with_download(name);
    }
    Ok(report)
}

/// Carved files relative to `carve_dir`, without the audit log.
fn carved_files(carve_dir: &Path) -> Result<Vec<String>> {
    Ok(traverse_directory(carve_dir)?
        .iter()
        .filter_map(|path| path.strip_prefix(carve_dir).ok())
        .filter(|relative| *relative != Path::new(AUDIT_FILE))
        .map(|relative| {
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_carved_files_excludes_audit() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("png")).unwrap();
        std::fs::write(dir.path().join(AUDIT_FILE), b"Foremost version 1.5.7").unwrap();
        std::fs::write(dir.path().join("png/00000000.png"), b"png").unwrap();

        assert_eq!(carved_files(dir.path()).unwrap(), vec!["png/00000000.png"]);
    }
}
