//! `outguess -r`: payload retrieval from JPEG covers, deep analysis only.

use super::subprocess::{locate_binary, non_empty_lines, run_tool, write_captures};
use super::{Collaborator, CollaboratorContext, bundle};
use crate::types::ToolReport;
use crate::{EclipseraError, Result};
use std::ffi::OsString;

/// File the retrieved payload is written to.
const RETRIEVED_FILE: &str = "outguess.out";

pub(super) async fn run(ctx: &CollaboratorContext) -> Result<ToolReport> {
    let name = Collaborator::Outguess.name();
    let binary = locate_binary(name, ctx.tool_override(Collaborator::Outguess))?;
    let retrieve_dir = ctx.output_dir.join(name);
    tokio::fs::create_dir_all(&retrieve_dir).await?;
    let retrieved = retrieve_dir.join(RETRIEVED_FILE);

    let mut args: Vec<OsString> = Vec::new();
    if let Some(key) = ctx.password.as_deref().filter(|k| !k.is_empty()) {
        args.push("-k".into());
        args.push(key.into());
    }
    args.push("-r".into());
    args.push(ctx.image_path.clone().into_os_string());
    args.push(retrieved.clone().into_os_string());

    let output = run_tool(name, &binary, &args, Some(&ctx.output_dir), ctx.timeout_secs).await?;
    write_captures(&ctx.output_dir, name, &output.stdout, &output.stderr).await?;

    if !output.success {
        return Err(EclipseraError::collaborator(name, output.failure_message()));
    }

    let data = match tokio::fs::read(&retrieved).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    if data.is_empty() {
        return Ok(ToolReport::ok(Vec::new()));
    }

    let lines = non_empty_lines(&String::from_utf8_lossy(&data));
    let report = ToolReport::ok(lines);
    Ok(if bundle(retrieve_dir, &ctx.output_dir, name).await? {
        report.with_download(name)
    } else {
        report
    })
}
