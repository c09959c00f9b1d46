//! Bytes-per-pixel of the decoded buffer.
//!
//! Mirrors how the `image` crate lays decoded pixels out:
//! one sample per channel, 1 byte up to 8 bits and 2 bytes up to 16.
//! Known gaps against real decoders:
//! * YCbCr is counted as 3 full channels whatever the subsampling, matching
//!   an RGB decode. A planar 4:2:0 buffer would be 1.5 bytes/pixel.
//! * Indexed images count the palette index only. The `image` crate
//!   expands palettes to RGB(A), so its buffer is 3-4x larger.

use imgsize_common::{Error, Result};
use imgsize_formats::ColorModel;

/// Fallback for color models we cannot reason about: RGBA8
const UNKNOWN_BYTES_PER_PIXEL: u32 = 4;

pub fn bytes_per_pixel(model: ColorModel, bit_depth: u8, has_alpha: bool) -> u32 {
    let bytes_per_channel = u32::from(bit_depth).div_ceil(8);

    match model {
        ColorModel::Grayscale if has_alpha => 2 * bytes_per_channel,
        ColorModel::Grayscale => bytes_per_channel,
        ColorModel::Indexed => 1,
        ColorModel::Rgb if has_alpha => 4 * bytes_per_channel,
        ColorModel::Rgb => 3 * bytes_per_channel,
        ColorModel::YCbCr => 3 * bytes_per_channel,
        ColorModel::Unknown => UNKNOWN_BYTES_PER_PIXEL,
    }
}

/// `width * height * bytes_per_pixel` in 64 bits, overflow is an error
pub fn decoded_size(width: u32, height: u32, bytes_per_pixel: u32) -> Result<u64> {
    u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|pixels| pixels.checked_mul(u64::from(bytes_per_pixel)))
        .ok_or(Error::SizeOverflow {
            width,
            height,
            bytes_per_pixel,
        })
}
