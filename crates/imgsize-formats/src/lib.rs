//! Header-level metadata extraction for PNG, JPEG, WebP, HEIF and AVIF.
//!
//! Each walker reads through a [`ByteCursor`] and never fails: a structure
//! it cannot make sense of yields that attribute's default.

pub mod cursor;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod heif;
pub mod icc;
pub mod jpeg;
pub mod metadata;
pub mod png;
pub mod sniff;
pub mod webp;

pub use cursor::ByteCursor;
pub use heif::HeifMetadata;
pub use icc::IccClass;
pub use jpeg::{JpegSampling, StartOfFrame};
pub use metadata::{
    ChromaSubsampling, ColorModel, ColorSpace, CompressionType, HdrKind, ImageMetadata,
};
pub use png::PngHeader;
pub use sniff::{ColorHint, DimensionSniffer, ImageSniffer, SniffedImage};
pub use webp::WebpKind;
