//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use eclipsera::{AnalyzeConfig, ToolPaths};
use image::{Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

pub const GOLDEN_MESSAGE: &str = "Eclipsera golden vector v1: hello, moon.";

/// PNG bytes of `image`.
pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// A blank (opaque black) lossless cover.
pub fn blank_cover(width: u32, height: u32) -> Vec<u8> {
    png_bytes(&RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])))
}

/// A cover with a gradient and a varying alpha channel.
pub fn gradient_cover(width: u32, height: u32) -> Vec<u8> {
    png_bytes(&RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 3) as u8, (y * 5) as u8, (x ^ y) as u8, (200 + (x % 50)) as u8])
    }))
}

/// Tool paths that all point at binaries that do not exist.
pub fn missing_tools() -> ToolPaths {
    let ghost = |name: &str| Some(PathBuf::from(format!("/nonexistent/{}", name)));
    ToolPaths {
        binwalk: ghost("binwalk"),
        exiftool: ghost("exiftool"),
        foremost: ghost("foremost"),
        zsteg: ghost("zsteg"),
        steghide: ghost("steghide"),
        outguess: ghost("outguess"),
    }
}

/// Analysis config that never touches an installed forensic tool.
pub fn offline_config() -> AnalyzeConfig {
    AnalyzeConfig {
        tools: missing_tools(),
        ..Default::default()
    }
}

/// Write an executable shell script named `name` into `dir`.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}
