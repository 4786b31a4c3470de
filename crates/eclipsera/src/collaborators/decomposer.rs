//! In-process bit-plane decomposition.
//!
//! Writes one black/white PNG per channel and bit (`Red_bit_0.png` ..) and,
//! for colour covers, eight RGB composites (`superimposed_bit_0.png` ..) into
//! the output directory. The report lists them per group.

use super::{Collaborator, CollaboratorContext};
use crate::stego::Channel;
use crate::stego::planes::{bit_plane, luma_bit_plane, superimposed_plane};
use crate::types::ToolReport;
use crate::{EclipseraError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Group holding the RGB composites.
pub const SUPERIMPOSED_GROUP: &str = "Superimposed";

const GRAYSCALE_GROUP: &str = "Grayscale";

pub(super) async fn run(ctx: &CollaboratorContext) -> Result<ToolReport> {
    let image_path = ctx.image_path.clone();
    let output_dir = ctx.output_dir.clone();

    let images = tokio::task::spawn_blocking(move || decompose(&image_path, &output_dir))
        .await
        .map_err(|e| EclipseraError::collaborator(Collaborator::Decomposer.name(), e.to_string()))??;

    Ok(ToolReport {
        output: None,
        ..ToolReport::ok(Vec::new())
    }
    .with_images(images))
}

/// Write every plane image for `image_path` into `output_dir`.
pub fn decompose(image_path: &Path, output_dir: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let decoded = image::open(image_path)?;
    let channel_count = decoded.color().channel_count();
    let mut images = BTreeMap::new();

    if channel_count >= 3 {
        let rgba = decoded.to_rgba8();
        let mut composites = Vec::with_capacity(8);
        for bit in 0..8 {
            let name = format!("superimposed_bit_{}.png", bit);
            superimposed_plane(&rgba, bit).save(output_dir.join(&name))?;
            composites.push(name);
        }
        images.insert(SUPERIMPOSED_GROUP.to_string(), composites);

        let channels: &[Channel] = if channel_count == 4 {
            &Channel::ALL
        } else {
            &Channel::ALL[..3]
        };
        for &channel in channels {
            let names = save_planes(output_dir, channel.name(), |bit| bit_plane(&rgba, channel, bit))?;
            images.insert(channel.name().to_string(), names);
        }
    } else {
        let luma = decoded.to_luma8();
        let names = save_planes(output_dir, GRAYSCALE_GROUP, |bit| luma_bit_plane(&luma, bit))?;
        images.insert(GRAYSCALE_GROUP.to_string(), names);

        if channel_count == 2 {
            let rgba = decoded.to_rgba8();
            let names = save_planes(output_dir, Channel::Alpha.name(), |bit| {
                bit_plane(&rgba, Channel::Alpha, bit)
            })?;
            images.insert(Channel::Alpha.name().to_string(), names);
        }
    }

    Ok(images)
}

fn save_planes<F>(output_dir: &Path, label: &str, plane: F) -> Result<Vec<String>>
where
    F: Fn(u8) -> image::GrayImage,
{
    let mut names = Vec::with_capacity(8);
    for bit in 0..8 {
        let name = format!("{}_bit_{}.png", label, bit);
        let path: PathBuf = output_dir.join(&name);
        plane(bit).save(&path)?;
        names.push(name);
    }
    Ok(names)
}
