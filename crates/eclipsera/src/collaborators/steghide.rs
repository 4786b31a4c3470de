//! `steghide`: passphrase-protected payloads in JPEG/BMP covers.
//!
//! `steghide info` checks the passphrase and names the embedded file; only
//! then is `steghide extract` run and its result bundled as `steghide.zip`.
//! A textual payload is also reported line by line after the extraction log.
//! Steghide itself failing is recorded as an error entry, not raised.

use super::subprocess::{locate_binary, non_empty_lines, run_tool, write_captures};
use super::{Collaborator, CollaboratorContext, bundle};
use crate::Result;
use crate::sweep::is_printable_text;
use crate::types::ToolReport;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static EMBEDDED_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"embedded file "([^"]+)""#).expect("Embedded file regex pattern is valid and should compile"));

const EXTRACTED_PREFIX: &str = "wrote extracted data to \"";

pub(super) async fn run(ctx: &CollaboratorContext) -> Result<ToolReport> {
    let name = Collaborator::Steghide.name();
    let binary = locate_binary(name, ctx.tool_override(Collaborator::Steghide))?;
    let image_name = ctx.image_name();
    let passphrase = ctx.password.as_deref().unwrap_or("");

    // The image sits next to the output directory; refer to it relatively so
    // diagnostics never carry the workspace path.
    let relative_image = format!("../{}", image_name);
    let info = run_tool(
        name,
        &binary,
        ["info", relative_image.as_str(), "-p", passphrase],
        Some(&ctx.output_dir),
        ctx.timeout_secs,
    )
    .await?;
    write_captures(&ctx.output_dir, name, &info.stdout, &info.stderr).await?;

    let embedded = embedded_file_name(&info.stdout_text());
    let Some(embedded) = embedded.filter(|_| info.success) else {
        return Ok(ToolReport::error(redact_image_name(&info.stderr_text(), &image_name)));
    };

    let extract_dir = ctx.output_dir.join(name);
    tokio::fs::create_dir_all(&extract_dir).await?;
    let nested_image = format!("../../{}", image_name);
    let extract = run_tool(
        name,
        &binary,
        [
            "extract",
            "-sf",
            nested_image.as_str(),
            "-xf",
            embedded.as_str(),
            "-p",
            passphrase,
            "-f",
        ],
        Some(&extract_dir),
        ctx.timeout_secs,
    )
    .await?;
    write_captures(
        &ctx.output_dir,
        name,
        &[info.stdout.as_slice(), extract.stdout.as_slice()].concat(),
        &[info.stderr.as_slice(), extract.stderr.as_slice()].concat(),
    )
    .await?;

    let (mut written, mut problems) = split_extract_log(&extract.stderr_text());
    if !extract.success && problems.is_empty() {
        problems = extract.failure_message();
    }
    if !problems.is_empty() {
        return Ok(ToolReport::error(problems));
    }

    written.extend(extracted_text_lines(&extract_dir.join(&embedded)).await?);
    let bundled = bundle(extract_dir.clone(), &ctx.output_dir, name).await?;
    tokio::fs::remove_dir_all(&extract_dir).await?;

    let report = ToolReport::ok(written);
    Ok(if bundled { report.with_download(name) } else { report })
}

/// Lines of the extracted payload when it reads as text.
async fn extracted_text_lines(path: &Path) -> Result<Vec<String>> {
    let data = match tokio::fs::read(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let text = String::from_utf8_lossy(&data);
    if !is_printable_text(text.trim()) {
        return Ok(Vec::new());
    }
    Ok(non_empty_lines(&text))
}

/// Recovered payload text in a steghide report, without the extraction log.
pub(super) fn recovered_text(output: &[String]) -> String {
    output
        .iter()
        .filter(|line| !line.starts_with(EXTRACTED_PREFIX))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Basename of the embedded file announced by `steghide info`.
///
/// Only the final path component is kept so extraction stays inside the
/// output directory.
fn embedded_file_name(info_stdout: &str) -> Option<String> {
    let captured = EMBEDDED_FILE.captures(info_stdout)?.get(1)?.as_str();
    Path::new(captured)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}

fn redact_image_name(stderr: &str, image_name: &str) -> String {
    stderr.replace(&format!("\"../{}\" ", image_name), "")
}

/// Split extract diagnostics into success lines and everything else.
fn split_extract_log(stderr: &str) -> (Vec<String>, String) {
    let mut written = Vec::new();
    let mut problems = String::new();
    for line in stderr.lines() {
        if line.starts_with(EXTRACTED_PREFIX) {
            written.push(line.to_string());
        } else if !line.is_empty() {
            problems.push_str(line);
            problems.push('\n');
        }
    }
    (written, problems)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_file_name() {
        let stdout = "\"cover.jpg\":\n  format: jpeg\n  capacity: 3.1 KB\n  embedded file \"secret.txt\":\n    size: 12.0 Byte\n";
        assert_eq!(embedded_file_name(stdout).as_deref(), Some("secret.txt"));
        assert_eq!(
            embedded_file_name("embedded file \"../../etc/passwd\":").as_deref(),
            Some("passwd")
        );
        assert_eq!(embedded_file_name("could not extract any data"), None);
    }

    #[test]
    fn test_recovered_text_skips_extraction_log() {
        let output = vec![
            "wrote extracted data to \"secret.txt\".".to_string(),
            "attack at dawn".to_string(),
            "bring snacks".to_string(),
        ];
        assert_eq!(recovered_text(&output), "attack at dawn\nbring snacks");
        assert!(recovered_text(&output[..1]).is_empty());
    }

    #[tokio::test]
    async fn test_extracted_text_lines() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("secret.txt");
        tokio::fs::write(&text, b"attack at dawn\n\n").await.unwrap();
        assert_eq!(extracted_text_lines(&text).await.unwrap(), vec!["attack at dawn"]);

        let binary = dir.path().join("secret.bin");
        tokio::fs::write(&binary, [0u8, 1, 2, 3, 0xff, 0xfe, 7, 8]).await.unwrap();
        assert!(extracted_text_lines(&binary).await.unwrap().is_empty());
        assert!(extracted_text_lines(&dir.path().join("absent")).await.unwrap().is_empty());
    }

    #[test]
    fn test_redact_image_name() {
        let stderr = "steghide: the file format of the file \"../upload.png\" is not supported.\n";
        assert_eq!(
            redact_image_name(stderr, "upload.png"),
            "steghide: the file format of the file is not supported.\n"
        );
    }

    #[test]
    fn test_split_extract_log() {
        let (written, problems) = split_extract_log("wrote extracted data to \"secret.txt\".\n\n");
        assert_eq!(written, vec!["wrote extracted data to \"secret.txt\"."]);
        assert!(problems.is_empty());

        let (written, problems) = split_extract_log("steghide: could not extract any data with that passphrase!\n");
        assert!(written.is_empty());
        assert!(problems.contains("passphrase"));
    }
}
