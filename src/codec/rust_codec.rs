//! Pure Rust codec built on the `image` crate.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, BMP, GIF, TIFF) | `image::ImageReader`, then converted to RGBA8 |
//! | Probe | `ImageReader::into_decoder` (header only) |
//! | Encode | `DynamicImage::write_to` in memory, then rename over the target |
//! | Resize | `DynamicImage::resize_exact` with the configured filter |
//! | Grayscale | ITU-R 601 luma, back to opaque RGBA8 |
//! | Blur | `DynamicImage::blur` (Gaussian, sigma = radius) |
//! | Brightness / contrast | per-channel blend on RGBA8, alpha untouched |
//!
//! JPEG goes through `JpegEncoder::new_with_quality`. Grayscale and the
//! contrast pivot use ITU-R 601 luma weights.
//!
//! Every decoded image is held as RGBA8, the working representation. Only
//! grayscale (which returns opaque pixels) and [`ImageCodec::remove_alpha`]
//! drop alpha.

use super::backend::{CodecError, ImageCodec, ImageInfo};
use super::params::{ColorMode, FileFormat, Quality, ResizeFilter};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::{Cursor, Write};
use std::path::Path;

/// Codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCodec {
    filter: ResizeFilter,
    jpeg_quality: Quality,
}

impl RustCodec {
    pub fn new(filter: ResizeFilter, jpeg_quality: Quality) -> Self {
        Self {
            filter,
            jpeg_quality,
        }
    }
}

fn filter_type(filter: ResizeFilter) -> FilterType {
    match filter {
        ResizeFilter::Nearest => FilterType::Nearest,
        ResizeFilter::Triangle => FilterType::Triangle,
        ResizeFilter::CatmullRom => FilterType::CatmullRom,
        ResizeFilter::Gaussian => FilterType::Gaussian,
        ResizeFilter::Lanczos3 => FilterType::Lanczos3,
    }
}

fn image_format(format: FileFormat) -> ImageFormat {
    match format {
        FileFormat::Png => ImageFormat::Png,
        FileFormat::Jpeg => ImageFormat::Jpeg,
        FileFormat::Bmp => ImageFormat::Bmp,
        FileFormat::Gif => ImageFormat::Gif,
        FileFormat::Tiff => ImageFormat::Tiff,
    }
}

fn color_mode(color: ColorType) -> ColorMode {
    match (color.has_color(), color.has_alpha()) {
        (false, false) => ColorMode::L,
        (false, true) => ColorMode::LA,
        (true, false) => ColorMode::RGB,
        (true, true) => ColorMode::RGBA,
    }
}

fn decode_error(path: &Path, e: impl std::fmt::Display) -> CodecError {
    CodecError::Decode {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn encode_error(path: &Path, e: impl std::fmt::Display) -> CodecError {
    CodecError::Encode {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

/// Apply `f` to the three color channels of every pixel, leaving alpha alone.
fn map_color_channels(image: &DynamicImage, f: impl Fn(f32) -> f32) -> DynamicImage {
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = f(*channel as f32).round().clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

/// ITU-R 601 luma in 16-bit fixed point (299/587/114), rounded.
fn luma_601([r, g, b]: [u8; 3]) -> u8 {
    let weighted = u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000;
    (weighted >> 16) as u8
}

/// Mean 601 luma rounded to the nearest integer level. Alpha is ignored.
fn mean_luma(image: &DynamicImage) -> f32 {
    let rgba = image.to_rgba8();
    let count = u64::from(rgba.width()) * u64::from(rgba.height());
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = rgba
        .pixels()
        .map(|p| u64::from(luma_601([p.0[0], p.0[1], p.0[2]])))
        .sum();
    (sum as f64 / count as f64).round() as f32
}

/// `path.png` → `path.png.tmp`, next to the target.
fn temp_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to a sibling temp file and rename it over `path`.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), CodecError> {
    let temp_path = temp_path_for(path);
    let written = std::fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| std::fs::rename(&temp_path, path)) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(CodecError::Io(e));
    }
    Ok(())
}

impl ImageCodec for RustCodec {
    type Image = DynamicImage;

    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError> {
        let img = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_error(path, e))?;
        Ok(DynamicImage::ImageRgba8(img.to_rgba8()))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        path: &Path,
        format: FileFormat,
    ) -> Result<(), CodecError> {
        // Encode fully in memory so a failure never touches an existing target.
        let mut writer = Cursor::new(Vec::new());
        match format {
            FileFormat::Jpeg => {
                let encoder =
                    JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality.value() as u8);
                image
                    .write_with_encoder(encoder)
                    .map_err(|e| encode_error(path, e))?;
            }
            other => image
                .write_to(&mut writer, image_format(other))
                .map_err(|e| encode_error(path, e))?,
        }
        replace_file(path, writer.get_ref())
    }

    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::Processing(format!(
                "Cannot resize to {width}x{height}"
            )));
        }
        Ok(image.resize_exact(width, height, filter_type(self.filter)))
    }

    fn grayscale(&self, image: &DynamicImage) -> Result<DynamicImage, CodecError> {
        let mut rgba = image.to_rgba8();
        for pixel in rgba.pixels_mut() {
            let [r, g, b, _] = pixel.0;
            let l = luma_601([r, g, b]);
            pixel.0 = [l, l, l, 255];
        }
        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn blur(&self, image: &DynamicImage, radius: f32) -> Result<DynamicImage, CodecError> {
        if radius <= 0.0 {
            return Ok(image.clone());
        }
        Ok(image.blur(radius))
    }

    fn adjust_brightness(
        &self,
        image: &DynamicImage,
        factor: f32,
    ) -> Result<DynamicImage, CodecError> {
        Ok(map_color_channels(image, |c| c * factor))
    }

    fn adjust_contrast(
        &self,
        image: &DynamicImage,
        factor: f32,
    ) -> Result<DynamicImage, CodecError> {
        let mean = mean_luma(image);
        Ok(map_color_channels(image, |c| mean + factor * (c - mean)))
    }

    fn remove_alpha(&self, image: &DynamicImage) -> Result<DynamicImage, CodecError> {
        Ok(if image.color().has_color() {
            DynamicImage::ImageRgb8(image.to_rgb8())
        } else {
            DynamicImage::ImageLuma8(image.to_luma8())
        })
    }

    fn describe(&self, image: &DynamicImage) -> ImageInfo {
        ImageInfo {
            width: image.width(),
            height: image.height(),
            mode: color_mode(image.color()),
        }
    }

    fn probe(&self, path: &Path) -> Result<ImageInfo, CodecError> {
        let decoder = ImageReader::open(path)?
            .with_guessed_format()?
            .into_decoder()
            .map_err(|e| decode_error(path, e))?;
        let (width, height) = decoder.dimensions();
        Ok(ImageInfo {
            width,
            height,
            mode: color_mode(decoder.color_type()),
        })
    }
}
