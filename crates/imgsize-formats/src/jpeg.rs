//! JPEG marker walking: frame precision, sampling factors, APP2 ICC payload.
//!
//! All queries share one segment loop. Anything malformed (missing SOI, a
//! marker without its 0xFF prefix, a short segment) ends the walk and the
//! caller gets the default for that query.

use crate::cursor::ByteCursor;
use crate::metadata::{ChromaSubsampling, ColorModel};
use imgsize_common::Result;
use std::fmt;
use std::io::{Read, Seek};

const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP2: u8 = 0xE2;
/// Baseline, extended sequential, progressive
const SOF_MARKERS: [u8; 3] = [0xC0, 0xC1, 0xC2];

const ICC_SIGNATURE: &[u8; 12] = b"ICC_PROFILE\0";
/// Chunk sequence number and chunk count follow the signature
const ICC_CHUNK_HEADER: usize = 2;

/// What the visitor did with a segment's payload
enum Visit<T> {
    Skip,
    Consumed,
    Found(T),
}

/// Walk marker segments until `visit` finds something, EOI/SOS is reached
/// or the stream turns out to be malformed.
fn walk_segments<R, T, F>(cursor: &mut ByteCursor<R>, mut visit: F) -> Result<Option<T>>
where
    R: Read + Seek,
    F: FnMut(u8, usize, &mut ByteCursor<R>) -> Result<Visit<T>>,
{
    cursor.rewind()?;

    if cursor.read_array::<2>()? != [0xFF, SOI] {
        tracing::debug!("JPEG stream does not start with SOI");
        return Ok(None);
    }

    loop {
        let [prefix, marker] = cursor.read_array::<2>()?;
        if prefix != 0xFF {
            tracing::debug!("expected marker prefix, found {prefix:#04x}");
            return Ok(None);
        }
        if marker == EOI || marker == SOS {
            return Ok(None);
        }

        let length = cursor.read_u16_be()?;
        if length < 2 {
            tracing::debug!("marker {marker:#04x} declares impossible length {length}");
            return Ok(None);
        }
        let payload = usize::from(length - 2);

        match visit(marker, payload, cursor)? {
            Visit::Skip => cursor.skip(payload as i64)?,
            Visit::Consumed => {}
            Visit::Found(value) => return Ok(Some(value)),
        }
    }
}

/// Body of the first Start-Of-Frame segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOfFrame {
    pub marker: u8,
    body: Vec<u8>,
}

impl StartOfFrame {
    pub fn new(marker: u8, body: Vec<u8>) -> Self {
        Self { marker, body }
    }

    /// Sample precision in bits
    pub fn precision(&self) -> Option<u8> {
        self.body.first().copied()
    }

    pub fn bit_depth(&self) -> u8 {
        if self.is_12_bit() {
            12
        } else {
            8
        }
    }

    pub fn is_12_bit(&self) -> bool {
        self.precision() == Some(12)
    }

    /// (width, height) as declared in the frame header
    pub fn dimensions(&self) -> Option<(u16, u16)> {
        if self.body.len() < 5 {
            return None;
        }
        let height = u16::from_be_bytes([self.body[1], self.body[2]]);
        let width = u16::from_be_bytes([self.body[3], self.body[4]]);
        Some((width, height))
    }

    pub fn component_count(&self) -> Option<u8> {
        self.body.get(5).copied()
    }

    pub fn sampling(&self) -> JpegSampling {
        let Some(count) = self.component_count() else {
            return JpegSampling::Unknown;
        };
        if count < 3 {
            return JpegSampling::Grayscale;
        }
        // each component: id, sampling factors, quant table
        if self.body.len() < 6 + usize::from(count) * 3 {
            return JpegSampling::Unknown;
        }

        let luma = self.body[7];
        let chroma = self.body[10];
        JpegSampling::from_factors(luma >> 4, luma & 0x0F, chroma >> 4, chroma & 0x0F)
    }
}

/// Chroma layout recovered from the SOF sampling factors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegSampling {
    Standard(ChromaSubsampling),
    Grayscale,
    /// Factors that match none of the common ratios
    Custom {
        luma_h: u8,
        luma_v: u8,
        chroma_h: u8,
        chroma_v: u8,
    },
    Unknown,
}

impl JpegSampling {
    pub fn from_factors(luma_h: u8, luma_v: u8, chroma_h: u8, chroma_v: u8) -> Self {
        match (luma_h, luma_v, chroma_h, chroma_v) {
            (1, 1, 1, 1) => Self::Standard(ChromaSubsampling::Yuv444),
            (2, 1, 1, 1) => Self::Standard(ChromaSubsampling::Yuv422),
            (2, 2, 1, 1) => Self::Standard(ChromaSubsampling::Yuv420),
            _ => Self::Custom {
                luma_h,
                luma_v,
                chroma_h,
                chroma_v,
            },
        }
    }

    /// Color model and subsampling to record for this layout
    pub fn classify(&self) -> (ColorModel, ChromaSubsampling) {
        match self {
            Self::Standard(ratio) => (ColorModel::YCbCr, *ratio),
            Self::Grayscale => (ColorModel::Grayscale, ChromaSubsampling::NotApplicable),
            Self::Custom { .. } | Self::Unknown => (ColorModel::YCbCr, ChromaSubsampling::Unknown),
        }
    }
}

impl fmt::Display for JpegSampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(ratio) => write!(f, "{ratio}"),
            Self::Grayscale => f.write_str("Grayscale"),
            Self::Custom {
                luma_h,
                luma_v,
                chroma_h,
                chroma_v,
            } => write!(f, "Custom ({luma_h}x{luma_v}:{chroma_h}x{chroma_v})"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// First SOF0/1/2 segment, if the walk reaches one
pub fn read_frame<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Option<StartOfFrame> {
    let walk = walk_segments(cursor, |marker, len, cursor| {
        if SOF_MARKERS.contains(&marker) {
            let body = cursor.read_bytes(len)?;
            Ok(Visit::Found(StartOfFrame::new(marker, body)))
        } else {
            Ok(Visit::Skip)
        }
    });

    walk.unwrap_or_else(|e| {
        tracing::debug!("JPEG frame search stopped: {e}");
        None
    })
}

pub fn is_12_bit<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> bool {
    read_frame(cursor).is_some_and(|sof| sof.is_12_bit())
}

/// 12 for extended-precision frames, 8 otherwise
pub fn bit_depth<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> u8 {
    if is_12_bit(cursor) {
        12
    } else {
        8
    }
}

pub fn subsampling<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> JpegSampling {
    read_frame(cursor)
        .map(|sof| sof.sampling())
        .unwrap_or(JpegSampling::Unknown)
}

/// Payload of the first APP2 segment tagged `ICC_PROFILE`.
///
/// Only the first chunk is returned; multi-segment profiles are not joined.
pub fn icc_profile<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Option<Vec<u8>> {
    let walk = walk_segments(cursor, |marker, len, cursor| {
        if marker != APP2 {
            return Ok(Visit::Skip);
        }

        let data = cursor.read_bytes(len)?;
        if data.len() >= ICC_SIGNATURE.len() + ICC_CHUNK_HEADER && data.starts_with(ICC_SIGNATURE) {
            let payload = data[ICC_SIGNATURE.len() + ICC_CHUNK_HEADER..].to_vec();
            return Ok(Visit::Found(payload));
        }
        Ok(Visit::Consumed)
    });

    walk.unwrap_or_else(|e| {
        tracing::debug!("JPEG ICC search stopped: {e}");
        None
    })
}
