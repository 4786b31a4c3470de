use super::{Probe, ProbeRunner};
use crate::stego::read_bit_stream;
use crate::{EclipseraError, Result};
use async_trait::async_trait;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;

/// Runs probes in-process over already decoded pixels.
///
/// The probe's bit stream is cut at the first zero byte, matching the
/// terminator the encoder writes, and decoded as lossy UTF-8.
#[derive(Debug, Clone)]
pub struct NativeProbeRunner {
    pixels: Arc<RgbaImage>,
}

impl NativeProbeRunner {
    pub fn new(pixels: Arc<RgbaImage>) -> Self {
        Self { pixels }
    }
}

#[async_trait]
impl ProbeRunner for NativeProbeRunner {
    fn source(&self) -> &str {
        "eclipsera"
    }

    async fn run(&self, probe: &Probe, _image_path: &Path) -> Result<Option<String>> {
        let pixels = Arc::clone(&self.pixels);
        let (channels, bit) = (probe.channels, probe.bit);

        let bytes = tokio::task::spawn_blocking(move || {
            let mut stream = read_bit_stream(&pixels, channels, bit);
            if let Some(end) = stream.iter().position(|&byte| byte == 0) {
                stream.truncate(end);
            }
            stream
        })
        .await
        .map_err(|e| EclipseraError::Other(format!("Native probe task failed: {}", e)))?;

        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}
