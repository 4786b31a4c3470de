//! Printable string scan over the raw image bytes.
//!
//! Reports runs of at least six printable ASCII characters (space through
//! tilde, plus tab), like `strings -n 6`.

use super::{Collaborator, CollaboratorContext};
use crate::Result;
use crate::types::ToolReport;

/// Shortest run reported.
pub const MIN_RUN_LEN: usize = 6;

pub(super) async fn run(ctx: &CollaboratorContext) -> Result<ToolReport> {
    let bytes = tokio::fs::read(&ctx.image_path).await?;
    let runs = printable_runs(&bytes, MIN_RUN_LEN);

    let listing = runs.join("\n");
    super::subprocess::write_captures(&ctx.output_dir, Collaborator::Strings.name(), listing.as_bytes(), b"").await?;

    Ok(ToolReport::ok(runs))
}

fn is_string_byte(byte: u8) -> bool {
    byte == b'\t' || (0x20..=0x7e).contains(&byte)
}

/// Every run of printable ASCII of at least `min_len` bytes, in file order.
pub fn printable_runs(bytes: &[u8], min_len: usize) -> Vec<String> {
    bytes
        .split(|&b| !is_string_byte(b))
        .filter(|run| run.len() >= min_len)
        .map(|run| String::from_utf8_lossy(run).into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_runs() {
        let bytes = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00tEXtComment\x00hello, moon.\xffab\x00";
        assert_eq!(printable_runs(bytes, MIN_RUN_LEN), vec!["tEXtComment", "hello, moon."]);
    }

    #[test]
    fn test_short_runs_dropped() {
        assert!(printable_runs(b"abcde\x00IHDR\x01f", MIN_RUN_LEN).is_empty());
        assert_eq!(printable_runs(b"a\tb cd", MIN_RUN_LEN), vec!["a\tb cd"]);
    }
}
