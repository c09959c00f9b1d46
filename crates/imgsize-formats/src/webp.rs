//! WebP container sniffing: lossy vs lossless from the first chunk FourCC.

use crate::cursor::ByteCursor;
use crate::metadata::ChromaSubsampling;
use imgsize_common::Result;
use std::io::{Read, Seek};

/// Encoding of the first chunk after the RIFF header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebpKind {
    /// `VP8 `
    Lossy,
    /// `VP8L`
    Lossless,
    /// `VP8X` or anything unexpected; feature bits are not inspected
    Extended,
    /// Not a RIFF/WEBP stream at all
    Invalid,
}

impl WebpKind {
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Lossless)
    }

    /// Lossy VP8 is always 4:2:0, so this is a fixed fact rather than parsed
    pub fn subsampling(&self) -> ChromaSubsampling {
        match self {
            Self::Lossless => ChromaSubsampling::NotApplicable,
            Self::Lossy => ChromaSubsampling::Yuv420,
            Self::Extended | Self::Invalid => ChromaSubsampling::Unknown,
        }
    }
}

pub fn detect<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> WebpKind {
    try_detect(cursor).unwrap_or_else(|e| {
        tracing::debug!("WebP header unreadable: {e}");
        WebpKind::Invalid
    })
}

fn try_detect<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<WebpKind> {
    cursor.rewind()?;

    let header = cursor.read_array::<12>()?;
    if &header[0..4] != b"RIFF" || &header[8..12] != b"WEBP" {
        return Ok(WebpKind::Invalid);
    }

    let kind = match &cursor.read_array::<4>()? {
        b"VP8L" => WebpKind::Lossless,
        b"VP8 " => WebpKind::Lossy,
        _ => WebpKind::Extended,
    };
    Ok(kind)
}
