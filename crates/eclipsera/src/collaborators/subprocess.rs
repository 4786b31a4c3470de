//! External tool invocation.
//!
//! Tools are located via an explicit override or on `PATH`, run with piped
//! output under a timeout, and killed when the timeout fires. A binary that
//! cannot be found or spawned is a `MissingDependency`, a timeout is a
//! `Timeout`; neither is fatal to an analysis run.

use crate::{EclipseraError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Non-empty, trimmed stdout lines.
    pub fn stdout_lines(&self) -> Vec<String> {
        non_empty_lines(&self.stdout_text())
    }

    /// Best description of a failed run: stderr, else stdout, else the exit code.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr_text();
        if !stderr.trim().is_empty() {
            return stderr.trim().to_string();
        }
        let stdout = self.stdout_text();
        if !stdout.trim().is_empty() {
            return stdout.trim().to_string();
        }
        match self.code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Trimmed, non-empty lines of `text`.
pub fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve the binary for `tool`, honouring an explicit override.
pub fn locate_binary(tool: &str, override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(EclipseraError::MissingDependency(format!(
            "{} not found at configured path {}",
            tool,
            path.display()
        )));
    }

    which::which(tool)
        .map_err(|_| EclipseraError::MissingDependency(format!("{} is not installed or not on PATH", tool)))
}

/// Run `binary` with `args` and capture its output.
///
/// The child is killed when `timeout_secs` elapses. A non-zero exit status is
/// not an error; callers inspect [`ToolOutput::success`].
pub async fn run_tool<I, S>(
    name: &str,
    binary: &Path,
    args: I,
    cwd: Option<&Path>,
    timeout_secs: u64,
) -> Result<ToolOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(binary);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            EclipseraError::MissingDependency(format!("{} could not be executed at {}: {}", name, binary.display(), e))
        } else {
            EclipseraError::Io(e)
        }
    })?;
    let child_id = child.id();

    match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }),
        Ok(Err(e)) => Err(EclipseraError::Io(e)),
        Err(_) => {
            // wait_with_output was cancelled; kill_on_drop reaps the child
            tracing::debug!("{} (PID {:?}) exceeded {}s, killed", name, child_id, timeout_secs);
            Err(EclipseraError::Timeout {
                name: name.to_string(),
                seconds: timeout_secs,
            })
        }
    }
}

/// Write `<name>.stdout` and `<name>.stderr` into `output_dir`.
pub async fn write_captures(output_dir: &Path, name: &str, stdout: &[u8], stderr: &[u8]) -> Result<()> {
    tokio::fs::write(output_dir.join(format!("{}.stdout", name)), stdout).await?;
    tokio::fs::write(output_dir.join(format!("{}.stderr", name)), stderr).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_locate_binary_override_missing() {
        let err = locate_binary("zsteg", Some(Path::new("/nonexistent/zsteg"))).unwrap_err();
        assert!(matches!(err, EclipseraError::MissingDependency(_)));
        assert!(err.to_string().contains("/nonexistent/zsteg"));
    }

    #[test]
    fn test_locate_binary_not_on_path() {
        let err = locate_binary("eclipsera-no-such-tool", None).unwrap_err();
        assert!(matches!(err, EclipseraError::MissingDependency(_)));
    }

    #[test]
    fn test_non_empty_lines() {
        assert_eq!(non_empty_lines("a\n\n  b  \r\n\t\n"), vec!["a", "b"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tool_captures_output() {
        let Ok(sh) = which::which("sh") else {
            return;
        };
        let output = run_tool("sh", &sh, ["-c", "echo out; echo err >&2; exit 3"], None, 5)
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout_lines(), vec!["out"]);
        assert_eq!(output.stderr_text().trim(), "err");
        assert_eq!(output.failure_message(), "err");
    }

    #[test]
    fn test_failure_message_fallbacks() {
        let silent = ToolOutput {
            code: Some(2),
            ..Default::default()
        };
        assert_eq!(silent.failure_message(), "exited with status 2");

        let chatty = ToolOutput {
            stdout: b"  usage: foremost\n".to_vec(),
            ..Default::default()
        };
        assert_eq!(chatty.failure_message(), "usage: foremost");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tool_timeout() {
        let Ok(sh) = which::which("sh") else {
            return;
        };
        let err = run_tool("sleeper", &sh, ["-c", "sleep 5"], None, 1).await.unwrap_err();
        assert!(matches!(err, EclipseraError::Timeout { seconds: 1, .. }));
    }

    #[tokio::test]
    async fn test_run_tool_missing_binary() {
        let err = run_tool("ghost", Path::new("/nonexistent/ghost"), ["--version"], None, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, EclipseraError::MissingDependency(_)));
    }

    #[tokio::test]
    async fn test_write_captures() {
        let dir = tempdir().unwrap();
        write_captures(dir.path(), "exiftool", b"Image Width : 4", b"").await.unwrap();
        assert_eq!(
            std::fs::read(dir.path().join("exiftool.stdout")).unwrap(),
            b"Image Width : 4"
        );
        assert!(dir.path().join("exiftool.stderr").exists());
    }
}
