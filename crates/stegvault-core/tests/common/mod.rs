#![allow(dead_code)]

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, RgbImage, RgbaImage};
use stegvault_core::{EngineOptions, KdfParams, RasterOptions};

/// Cheap key derivation so tests stay fast.
pub fn options() -> EngineOptions {
    EngineOptions::default().with_kdf(KdfParams::new(64, 1, 1))
}

/// Options where every pixel contributes exactly one slot.
pub fn one_slot_per_pixel() -> EngineOptions {
    options().with_raster(RasterOptions {
        channels_per_pixel: Some(1),
        ..Default::default()
    })
}

fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..len).map(|_| rng.u8(..)).collect()
}

/// Uncompressed 24 bit bottom-up bitmap filled with noise.
pub fn bitmap(width: u32, height: u32) -> Vec<u8> {
    let stride = (width as usize * 3).div_ceil(4) * 4;
    let pixel_bytes = stride * height as usize;
    let size = 54 + pixel_bytes;

    let mut data = Vec::with_capacity(size);
    data.extend_from_slice(b"BM");
    data.extend_from_slice(&(size as u32).to_le_bytes());
    data.extend_from_slice(&[0; 4]);
    data.extend_from_slice(&54u32.to_le_bytes());
    data.extend_from_slice(&40u32.to_le_bytes());
    data.extend_from_slice(&(width as i32).to_le_bytes());
    data.extend_from_slice(&(height as i32).to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&24u16.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&(pixel_bytes as u32).to_le_bytes());
    data.extend_from_slice(&[0; 16]);
    data.extend(noise(pixel_bytes, u64::from(width * 31 + height)));
    data
}

pub fn png_rgba(width: u32, height: u32) -> Vec<u8> {
    let pixels = noise((width * height * 4) as usize, 7);
    let image = RgbaImage::from_raw(width, height, pixels).unwrap();
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn png_rgb(width: u32, height: u32) -> Vec<u8> {
    let pixels = noise((width * height * 3) as usize, 9);
    let image = RgbImage::from_raw(width, height, pixels).unwrap();
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// Baseline JPEG of a noisy gradient, rich in non-trivial AC coefficients.
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(3);
    let pixels: Vec<u8> = (0..width * height * 3)
        .map(|i| ((i / 3 % width) * 255 / width) as u8 ^ rng.u8(..96))
        .collect();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 90)
        .encode(&pixels, width, height, ColorType::Rgb8)
        .unwrap();
    out
}
