//! `zsteg`: full default scan of a PNG/BMP cover.

use super::subprocess::{locate_binary, non_empty_lines, run_tool, write_captures};
use super::{Collaborator, CollaboratorContext};
use crate::types::ToolReport;
use crate::{EclipseraError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// `<selector> .. text: "<text>"` as printed for every textual hit.
static TEXT_HIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\S+)\s+\.\.\s+text:\s+"(.*)"\s*$"#).expect("Text hit regex pattern is valid and should compile")
});

pub(super) async fn run(ctx: &CollaboratorContext) -> Result<ToolReport> {
    let name = Collaborator::Zsteg.name();
    let binary = locate_binary(name, ctx.tool_override(Collaborator::Zsteg))?;

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
    Ok(ToolReport::ok(scan_lines(&output.stdout_text())))
}

/// zsteg redraws its progress line with carriage returns; keep only the
/// final text of every line.
fn scan_lines(stdout: &str) -> Vec<String> {
    let settled: String = stdout
        .lines()
        .map(|line| line.rsplit('\r').find(|part| !part.trim().is_empty()).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");
    non_empty_lines(&settled)
}

/// Selector and text of every `text:` hit in a zsteg listing.
pub(super) fn text_hits(lines: &[String]) -> Vec<(String, String)> {
    lines
        .iter()
        .filter_map(|line| {
            let captures = TEXT_HIT.captures(line)?;
            Some((captures[1].to_string(), unescape(&captures[2])))
        })
        .collect()
}

/// Undo the backslash escapes zsteg applies to quoted text.
fn unescape(quoted: &str) -> String {
    let mut text = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('r') => text.push('\r'),
            Some(other) => text.push(other),
            None => text.push('\\'),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_lines_drops_progress_redraws() {
        let stdout = "imagedata .. text: \"abc\"\r\nb1,r,lsb,xy .. \rb1,rgb,lsb,xy .. text: \"hello, moon.\"\n\n";
        assert_eq!(
            scan_lines(stdout),
            vec!["imagedata .. text: \"abc\"", "b1,rgb,lsb,xy .. text: \"hello, moon.\""]
        );
    }

    #[test]
    fn test_text_hits() {
        let lines = vec![
            "imagedata           .. text: \"abc\"".to_string(),
            "b1,rgb,lsb,xy       .. text: \"say \\\"hi\\\"\\nbye\"".to_string(),
            "b1,r,msb,xy         .. file: PGP Secret Key -".to_string(),
        ];
        assert_eq!(
            text_hits(&lines),
            vec![
                ("imagedata".to_string(), "abc".to_string()),
                ("b1,rgb,lsb,xy".to_string(), "say \"hi\"\nbye".to_string()),
            ]
        );
    }
}
