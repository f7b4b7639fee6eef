//! Image decoding, encoding, and pixel transforms.
//!
//! The module is split into:
//! - **Parameters**: file formats, color modes, and encoder settings
//! - **Backend**: the [`ImageCodec`] trait the editing session is generic over
//! - **RustCodec**: the production implementation on top of the `image` crate
//!
//! Sessions never touch pixel data directly. Tests swap in a recording mock
//! codec so they can assert on the exact sequence of codec calls.

pub mod backend;
mod params;
pub mod rust_codec;

pub use backend::{CodecError, ImageCodec, ImageInfo};
pub use params::{ColorMode, FileFormat, Quality, ResizeFilter, supported_extensions};
pub use rust_codec::RustCodec;
