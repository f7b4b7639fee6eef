//! Parameter types shared by the engine and codec implementations.
//!
//! These describe *what* an image is or should become, never *how* pixels are
//! produced. The engine reasons about them (alpha-free targets, supported
//! sources) without looking inside an image.
//!
//! ## Types
//!
//! - [`FileFormat`]: The closed set of editable on-disk formats.
//! - [`ColorMode`]: Channel layout of an image (`L`, `LA`, `RGB`, `RGBA`).
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`ResizeFilter`]: Resampling kernel used by resize.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// On-disk image formats the editor can load and save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Png,
    Jpeg,
    Bmp,
    Gif,
    Tiff,
}

/// Extension → format. Matching is case-insensitive.
const EXTENSIONS: &[(&str, FileFormat)] = &[
    ("png", FileFormat::Png),
    ("jpg", FileFormat::Jpeg),
    ("jpeg", FileFormat::Jpeg),
    ("bmp", FileFormat::Bmp),
    ("gif", FileFormat::Gif),
    ("tiff", FileFormat::Tiff),
];

/// Lowercase extensions (without the dot) accepted by `load`.
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    EXTENSIONS.iter().map(|(ext, _)| *ext)
}

impl FileFormat {
    /// Format implied by a path's extension, if it is one we support.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        EXTENSIONS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
            .map(|(_, format)| *format)
    }

    /// Parse a format name such as `"png"` or `"JPEG"`. `JPG` is accepted as
    /// an alias for JPEG, `TIF` for TIFF.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "PNG" => Some(Self::Png),
            "JPEG" | "JPG" => Some(Self::Jpeg),
            "BMP" => Some(Self::Bmp),
            "GIF" => Some(Self::Gif),
            "TIFF" | "TIF" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Canonical upper-case name, as written to the history log.
    pub fn name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Bmp => "BMP",
            Self::Gif => "GIF",
            Self::Tiff => "TIFF",
        }
    }

    /// Whether the encoded file can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Channel layout of an image, named the way image tools conventionally do.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorMode {
    L,
    LA,
    RGB,
    RGBA,
}

impl ColorMode {
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::LA | Self::RGBA)
    }

    /// The same layout without its alpha channel.
    pub fn without_alpha(self) -> Self {
        match self {
            Self::L | Self::LA => Self::L,
            Self::RGB | Self::RGBA => Self::RGB,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::L => "L",
            Self::LA => "LA",
            Self::RGB => "RGB",
            Self::RGBA => "RGBA",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Resampling kernel for resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    /// Bicubic.
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}
