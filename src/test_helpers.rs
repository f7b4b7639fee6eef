//! Shared test utilities.
//!
//! Writes small synthetic images to disk so codec and session tests can run
//! without fixture files.

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;

/// Write a solid-color RGBA PNG.
pub fn create_test_png(path: &Path, width: u32, height: u32, color: [u8; 4]) {
    let img = RgbaImage::from_pixel(width, height, image::Rgba(color));
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

/// Write an RGB gradient JPEG.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Number of records in the history document at `path`.
pub fn history_len(path: &Path) -> usize {
    let content = std::fs::read_to_string(path).unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
    records.len()
}
