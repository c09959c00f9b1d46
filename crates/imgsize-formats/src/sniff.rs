use crate::cursor::ByteCursor;
use crate::heif::{for_each_box, primary_extents};
use crate::metadata::ColorModel;
use image::{ImageDecoder, ImageError, ImageReader};
use imgsize_common::{Error, MediaFormat, Result};
use std::io::{BufRead, Seek};

/// Prefix read when looking for the `ispe` property of HEIF/AVIF files
const SNIFF_WINDOW: usize = 64 * 1024;

const AVIF_BRANDS: &[&[u8; 4]] = &[b"avif", b"avis"];
const HEIF_BRANDS: &[&[u8; 4]] = &[b"heic", b"heix", b"heim", b"heis", b"hevc", b"hevx"];
/// Generic image brands, HEIF unless an AVIF brand is also listed
const MIAF_BRANDS: &[&[u8; 4]] = &[b"mif1", b"msf1"];

/// Color layout as the `image` crate would decode it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorHint {
    pub model: ColorModel,
    pub has_alpha: bool,
    pub bytes_per_pixel: u8,
}

impl ColorHint {
    pub fn from_color_type(color: image::ColorType) -> Self {
        use image::ColorType;

        let (model, has_alpha) = match color {
            ColorType::L8 | ColorType::L16 => (ColorModel::Grayscale, false),
            ColorType::La8 | ColorType::La16 => (ColorModel::Grayscale, true),
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => (ColorModel::Rgb, false),
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => (ColorModel::Rgb, true),
            _ => (ColorModel::Unknown, color.has_alpha()),
        };

        Self {
            model,
            has_alpha,
            bytes_per_pixel: color.bytes_per_pixel(),
        }
    }
}

/// Format tag and dimensions, read without decoding pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SniffedImage {
    pub format: MediaFormat,
    pub width: u32,
    pub height: u32,
    /// Absent for containers the `image` crate cannot open
    pub color: Option<ColorHint>,
}

/// Identifies an image and its dimensions.
///
/// Implementations may leave the reader at any position.
pub trait DimensionSniffer {
    fn sniff<R: BufRead + Seek>(&self, reader: &mut R) -> Result<SniffedImage>;
}

/// Header-only sniffing through the `image` crate, with a small ISO-BMFF
/// probe for HEIF/AVIF which it cannot open.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageSniffer;

impl DimensionSniffer for ImageSniffer {
    fn sniff<R: BufRead + Seek>(&self, reader: &mut R) -> Result<SniffedImage> {
        let prefix = {
            let mut cursor = ByteCursor::new(&mut *reader);
            cursor.rewind()?;
            cursor.read_up_to(SNIFF_WINDOW)?
        };

        let sniffed = match bmff_format(&prefix) {
            Some(format) => sniff_bmff(format, &prefix)?,
            None => {
                reader.rewind()?;
                sniff_with_image(reader)?
            }
        };

        if sniffed.width == 0 || sniffed.height == 0 {
            return Err(Error::UnsupportedFormat(format!(
                "{} image with zero dimension ({}x{})",
                sniffed.format, sniffed.width, sniffed.height
            )));
        }

        tracing::debug!(
            "Sniffed {} {}x{}",
            sniffed.format,
            sniffed.width,
            sniffed.height
        );
        Ok(sniffed)
    }
}

fn sniff_with_image<R: BufRead + Seek>(reader: &mut R) -> Result<SniffedImage> {
    let image_reader = ImageReader::new(reader).with_guessed_format()?;
    let format = image_reader
        .format()
        .ok_or_else(|| Error::UnsupportedFormat("unrecognized image signature".into()))?;

    let decoder = image_reader.into_decoder().map_err(header_error)?;
    let (width, height) = decoder.dimensions();

    Ok(SniffedImage {
        format: MediaFormat::from_image_format(format),
        width,
        height,
        color: Some(ColorHint::from_color_type(decoder.color_type())),
    })
}

fn header_error(err: ImageError) -> Error {
    match err {
        ImageError::IoError(e) if e.kind() != std::io::ErrorKind::UnexpectedEof => Error::Io(e),
        other => Error::UnsupportedFormat(other.to_string()),
    }
}

/// Classify an `ftyp` box by major brand, then compatible brands
fn bmff_format(prefix: &[u8]) -> Option<MediaFormat> {
    // ftyp must be the first box
    if prefix.get(4..8) != Some(b"ftyp".as_slice()) {
        return None;
    }

    let mut brands: Vec<[u8; 4]> = Vec::new();
    for_each_box(prefix, true, |kind, payload| {
        if brands.is_empty() && kind == b"ftyp" && payload.len() >= 4 {
            brands.push([payload[0], payload[1], payload[2], payload[3]]);
            // skip minor version
            brands.extend(
                payload
                    .get(8..)
                    .unwrap_or_default()
                    .chunks_exact(4)
                    .map(|c| [c[0], c[1], c[2], c[3]]),
            );
        }
    });

    let is_in = |set: &[&[u8; 4]], brand: &[u8; 4]| set.iter().any(|b| *b == brand);

    let major = brands.first()?;
    if is_in(AVIF_BRANDS, major) {
        return Some(MediaFormat::Avif);
    }
    if is_in(HEIF_BRANDS, major) {
        return Some(MediaFormat::Heif);
    }
    if brands.iter().any(|b| is_in(AVIF_BRANDS, b)) {
        return Some(MediaFormat::Avif);
    }
    if brands
        .iter()
        .any(|b| is_in(HEIF_BRANDS, b) || is_in(MIAF_BRANDS, b))
    {
        return Some(MediaFormat::Heif);
    }
    None
}

fn sniff_bmff(format: MediaFormat, prefix: &[u8]) -> Result<SniffedImage> {
    let (width, height) = primary_extents(prefix).ok_or_else(|| {
        Error::UnsupportedFormat(format!("{format} file has no image spatial extents"))
    })?;

    Ok(SniffedImage {
        format,
        width,
        height,
        color: None,
    })
}
