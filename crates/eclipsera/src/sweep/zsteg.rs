use super::{Probe, ProbeRunner};
use crate::Result;
use crate::collaborators::subprocess::{locate_binary, run_tool};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Runs probes through `zsteg -E <selector> <image>`.
#[derive(Debug, Clone)]
pub struct ZstegProbeRunner {
    binary: Option<PathBuf>,
    timeout_secs: u64,
}

impl ZstegProbeRunner {
    pub fn new(binary: Option<PathBuf>, timeout_secs: u64) -> Self {
        Self { binary, timeout_secs }
    }
}

#[async_trait]
impl ProbeRunner for ZstegProbeRunner {
    fn source(&self) -> &str {
        "zsteg"
    }

    async fn run(&self, probe: &Probe, image_path: &Path) -> Result<Option<String>> {
        let binary = locate_binary("zsteg", self.binary.as_deref())?;
        let output = run_tool(
            "zsteg",
            &binary,
            [OsStr::new("-E"), OsStr::new(probe.selector), image_path.as_os_str()],
            None,
            self.timeout_secs,
        )
        .await?;

        if !output.success || output.stdout.is_empty() {
            return Ok(None);
        }
        Ok(Some(output.stdout_text()))
    }
}
