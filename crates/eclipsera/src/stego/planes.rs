//! Bit plane rendering.
//!
//! A bit plane maps one bit of one channel to black (0) or white (255). They
//! make LSB payloads visible as noise over the top rows of an image.

use crate::stego::channel::Channel;
use image::{GrayImage, Luma, Rgb, RgbImage, RgbaImage};

fn expand(value: u8, bit: u8) -> u8 {
    ((value >> bit) & 1) * 255
}

/// Render bit `bit` of `channel` as a grayscale image.
pub fn bit_plane(image: &RgbaImage, channel: Channel, bit: u8) -> GrayImage {
    let index = channel.index();
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([expand(image.get_pixel(x, y).0[index], bit)])
    })
}

/// Render bit `bit` of a single-channel image.
pub fn luma_bit_plane(image: &GrayImage, bit: u8) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([expand(image.get_pixel(x, y).0[0], bit)])
    })
}

/// Render bit `bit` of R, G and B superimposed into one colour image.
pub fn superimposed_plane(image: &RgbaImage, bit: u8) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        Rgb([expand(r, bit), expand(g, bit), expand(b, bit)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_bit_plane_isolates_channel() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([0b0000_0001, 0b1000_0000, 0, 255]));
        assert!(bit_plane(&img, Channel::Red, 0).pixels().all(|p| p.0[0] == 255));
        assert!(bit_plane(&img, Channel::Red, 7).pixels().all(|p| p.0[0] == 0));
        assert!(bit_plane(&img, Channel::Green, 7).pixels().all(|p| p.0[0] == 255));
        assert!(bit_plane(&img, Channel::Alpha, 3).pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_superimposed_plane() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([1, 0, 1, 0]));
        assert_eq!(superimposed_plane(&img, 0).get_pixel(0, 0).0, [255, 0, 255]);
    }

    #[test]
    fn test_luma_bit_plane() {
        let img = GrayImage::from_pixel(3, 1, Luma([0b0000_0100]));
        assert!(luma_bit_plane(&img, 2).pixels().all(|p| p.0[0] == 255));
        assert!(luma_bit_plane(&img, 1).pixels().all(|p| p.0[0] == 0));
    }
}
