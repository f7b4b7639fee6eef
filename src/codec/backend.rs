//! Codec capability trait and shared types.
//!
//! The [`ImageCodec`] trait is everything the editing engine needs from a
//! pixel library: decode, encode, the five transforms, alpha removal, and
//! metadata. The engine treats [`ImageCodec::Image`] as opaque; it only ever
//! clones it, hands it back to the codec, or asks the codec to describe it.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec), built on the `image` crate.

use super::params::{ColorMode, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("Failed to encode {path}: {reason}")]
    Encode { path: String, reason: String },
    #[error("Processing failed: {0}")]
    Processing(String),
}

/// Read-only description of an image: pixel grid and channel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
}

/// Pixel-level capability consumed by the editing engine.
///
/// Transforms take the image by reference and return a new one; the engine
/// decides whether the result replaces its current state.
pub trait ImageCodec {
    /// Decoded in-memory image in the codec's working representation.
    type Image: Clone;

    fn decode(&self, path: &Path) -> Result<Self::Image, CodecError>;

    fn encode(
        &self,
        image: &Self::Image,
        path: &Path,
        format: FileFormat,
    ) -> Result<(), CodecError>;

    /// Resample to exactly `width` x `height`.
    fn resize(
        &self,
        image: &Self::Image,
        width: u32,
        height: u32,
    ) -> Result<Self::Image, CodecError>;

    /// Luminance-only image, returned in the working representation so that
    /// later color operations still apply.
    fn grayscale(&self, image: &Self::Image) -> Result<Self::Image, CodecError>;

    fn blur(&self, image: &Self::Image, radius: f32) -> Result<Self::Image, CodecError>;

    fn adjust_brightness(
        &self,
        image: &Self::Image,
        factor: f32,
    ) -> Result<Self::Image, CodecError>;

    fn adjust_contrast(
        &self,
        image: &Self::Image,
        factor: f32,
    ) -> Result<Self::Image, CodecError>;

    /// Copy of the image with its alpha channel dropped.
    fn remove_alpha(&self, image: &Self::Image) -> Result<Self::Image, CodecError>;

    fn describe(&self, image: &Self::Image) -> ImageInfo;

    /// Metadata of an on-disk image without a full decode.
    fn probe(&self, path: &Path) -> Result<ImageInfo, CodecError>;
}
