//! PNG chunk walking: IHDR fields and the raw `iCCP` payload.

use crate::cursor::ByteCursor;
use crate::metadata::ColorModel;
use imgsize_common::Result;
use std::io::{Read, Seek};

/// First chunk starts right after the 8-byte signature
const FIRST_CHUNK_OFFSET: u64 = 8;
const IHDR_LEN: u32 = 13;
const DEFAULT_BIT_DEPTH: u8 = 8;

/// The IHDR fields the analyzer cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngHeader {
    pub bit_depth: u8,
    pub color_type: u8,
}

impl PngHeader {
    /// Color model and alpha implied by the IHDR color type
    pub fn color_model(&self) -> Option<(ColorModel, bool)> {
        match self.color_type {
            0 => Some((ColorModel::Grayscale, false)),
            2 => Some((ColorModel::Rgb, false)),
            3 => Some((ColorModel::Indexed, false)),
            4 => Some((ColorModel::Grayscale, true)),
            6 => Some((ColorModel::Rgb, true)),
            _ => None,
        }
    }
}

struct ChunkHeader {
    length: u32,
    kind: [u8; 4],
}

fn read_chunk_header<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<ChunkHeader> {
    let length = cursor.read_u32_be()?;
    let kind = cursor.read_array::<4>()?;
    Ok(ChunkHeader { length, kind })
}

/// Read the IHDR chunk, if the first chunk is a well-formed one
pub fn read_header<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Option<PngHeader> {
    match try_read_header(cursor) {
        Ok(header) => header,
        Err(e) => {
            tracing::debug!("PNG IHDR unreadable: {e}");
            None
        }
    }
}

fn try_read_header<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Option<PngHeader>> {
    cursor.seek_to(FIRST_CHUNK_OFFSET)?;

    let chunk = read_chunk_header(cursor)?;
    if &chunk.kind != b"IHDR" || chunk.length != IHDR_LEN {
        tracing::debug!("first PNG chunk is not a 13-byte IHDR");
        return Ok(None);
    }

    let body = cursor.read_array::<13>()?;
    Ok(Some(PngHeader {
        bit_depth: body[8],
        color_type: body[9],
    }))
}

/// Bit depth from IHDR, 8 when the header cannot be trusted
pub fn bit_depth<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> u8 {
    read_header(cursor)
        .map(|h| h.bit_depth)
        .unwrap_or(DEFAULT_BIT_DEPTH)
}

/// Raw `iCCP` chunk data.
///
/// Returned as stored on disk: profile name, NUL, compression method, then
/// the still-compressed profile. Any read failure means "no profile".
pub fn icc_profile<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Option<Vec<u8>> {
    match try_icc_profile(cursor) {
        Ok(profile) => profile,
        Err(e) => {
            tracing::debug!("PNG chunk walk stopped: {e}");
            None
        }
    }
}

fn try_icc_profile<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> Result<Option<Vec<u8>>> {
    cursor.seek_to(FIRST_CHUNK_OFFSET)?;

    loop {
        let chunk = read_chunk_header(cursor)?;
        match &chunk.kind {
            b"iCCP" => return cursor.read_bytes(chunk.length as usize).map(Some),
            b"IEND" => return Ok(None),
            // data plus trailing CRC
            _ => cursor.skip(i64::from(chunk.length) + 4)?,
        }
    }
}
