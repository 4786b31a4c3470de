//! `exiftool`: metadata dump, one `Tag : Value` line per entry.

use super::subprocess::{locate_binary, run_tool, write_captures};
use super::{Collaborator, CollaboratorContext};
use crate::types::ToolReport;
use crate::{EclipseraError, Result};

pub(super) async fn run(ctx: &CollaboratorContext) -> Result<ToolReport> {
    let name = Collaborator::Exiftool.name();
    let binary = locate_binary(name, ctx.tool_override(Collaborator::Exiftool))?;

    let output = run_tool(
        name,
        &binary,
        [ctx.image_path.as_os_str()],
        Some(&ctx.output_dir),
        ctx.timeout_secs,
    )
    .await?;
    write_captures(&ctx.output_dir, name, &output.stdout, &output.stderr).await?;

    if !output.success {
        return Err(EclipseraError::collaborator(name, output.failure_message()));
    }
    Ok(ToolReport::ok(output.stdout_lines()))
}
