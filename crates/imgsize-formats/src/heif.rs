//! ISO base media box walking for HEIF/HEIC and AVIF.
//!
//! Only the property boxes that carry color and depth information are
//! visited: `meta → iprp → ipco → {pixi, colr, auxC}`. The walk reads a
//! bounded prefix of the file; metadata stored past it is not seen and the
//! defaults stand.

use crate::cursor::ByteCursor;
use crate::icc::contains;
use crate::metadata::{ChromaSubsampling, ColorModel, ColorSpace, HdrKind};
use imgsize_common::Result;
use std::io::{Cursor, Read, Seek};

/// How much of the file is scanned for metadata boxes
pub const SCAN_LIMIT: usize = 16 * 1024;

const BOX_HEADER_LEN: usize = 8;
/// Version and flags of a FullBox
const FULL_BOX_HEADER_LEN: usize = 4;
const ALPHA_URN: &[u8] = b"urn:mpeg:mpegB:cicp:systems:auxiliary:alpha";

/// Attributes recovered from the box tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeifMetadata {
    pub color_model: ColorModel,
    pub has_alpha: bool,
    pub bit_depth: u8,
    pub color_space: ColorSpace,
    pub chroma_subsampling: ChromaSubsampling,
    pub hdr: HdrKind,
}

impl Default for HeifMetadata {
    fn default() -> Self {
        Self {
            color_model: ColorModel::YCbCr,
            has_alpha: false,
            bit_depth: 8,
            color_space: ColorSpace::Bt709,
            chroma_subsampling: ChromaSubsampling::Yuv420,
            hdr: HdrKind::None,
        }
    }
}

impl HeifMetadata {
    /// `pixi` inside `ipco`: channel count at 1, first channel depth at 2
    fn apply_pixi(&mut self, payload: &[u8]) {
        if payload.len() < 3 {
            return;
        }
        let channels = usize::from(payload[1]);
        if channels > 0 && payload.len() >= 2 + channels {
            self.bit_depth = payload[2];
        }
    }

    /// Older writers put a bare `pixi` outside the property container
    fn apply_legacy_pixi(&mut self, payload: &[u8]) {
        if let Some(&depth) = payload.get(2) {
            self.bit_depth = depth;
        }
    }

    /// NCLX color primaries and transfer characteristics
    fn apply_colr(&mut self, payload: &[u8]) {
        if payload.len() < 8 || &payload[0..4] != b"nclx" {
            return;
        }

        let primaries = u16::from_be_bytes([payload[4], payload[5]]);
        let transfer = u16::from_be_bytes([payload[6], payload[7]]);

        match primaries {
            1 => self.color_space = ColorSpace::Bt709,
            9 => self.color_space = ColorSpace::Bt2020,
            12 => self.color_space = ColorSpace::DisplayP3,
            _ => {}
        }

        match transfer {
            16 => self.hdr = HdrKind::Pq,
            18 => self.hdr = HdrKind::Hlg,
            _ => {}
        }
    }

    fn apply_aux(&mut self, payload: &[u8]) {
        if contains(payload, ALPHA_URN) {
            self.has_alpha = true;
        }
    }
}

/// Nesting level of the box currently being walked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    File,
    Meta,
    Iprp,
    Ipco,
}

impl Level {
    /// Top-level boxes running past the buffer are clamped; nested ones end
    /// their level's loop.
    fn clamps_oversize(self) -> bool {
        matches!(self, Self::File)
    }
}

/// Call `visit(type, payload)` for each box in `data`.
///
/// A size below 8 (including 0, "extends to end of file") stops the loop.
pub(crate) fn for_each_box<'a, F>(data: &'a [u8], clamp_oversize: bool, mut visit: F)
where
    F: FnMut(&[u8; 4], &'a [u8]),
{
    let mut offset = 0usize;

    while offset + BOX_HEADER_LEN < data.len() {
        let size = u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]) as usize;
        let kind = [
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ];

        if size < BOX_HEADER_LEN {
            break;
        }

        let remaining = data.len() - offset;
        let size = if size <= remaining {
            size
        } else if clamp_oversize {
            remaining
        } else {
            break;
        };

        visit(&kind, &data[offset + BOX_HEADER_LEN..offset + size]);
        offset += size;
    }
}

fn walk(data: &[u8], level: Level, meta: &mut HeifMetadata) {
    for_each_box(data, level.clamps_oversize(), |kind, payload| {
        match (level, kind) {
            (Level::File, b"meta") => {
                if let Some(children) = payload.get(FULL_BOX_HEADER_LEN..) {
                    walk(children, Level::Meta, meta);
                }
            }
            (Level::Meta, b"iprp") => walk(payload, Level::Iprp, meta),
            (Level::Iprp, b"ipco") => walk(payload, Level::Ipco, meta),
            (Level::Ipco, b"pixi") => meta.apply_pixi(payload),
            (Level::File | Level::Meta, b"pixi") => meta.apply_legacy_pixi(payload),
            (Level::File | Level::Ipco, b"colr") => meta.apply_colr(payload),
            (Level::File | Level::Ipco, b"auxC") => meta.apply_aux(payload),
            _ => {}
        }
    });
}

/// Walk an in-memory prefix of the file
pub fn parse_bytes(data: &[u8]) -> HeifMetadata {
    let mut meta = HeifMetadata::default();

    if data.len() < 12 || &data[4..8] != b"ftyp" {
        tracing::debug!("no leading ftyp box, using HEIF defaults");
        return meta;
    }

    walk(data, Level::File, &mut meta);
    meta
}

/// Read up to [`SCAN_LIMIT`] bytes from the start of the stream and walk them
pub fn parse<R: Read + Seek>(cursor: &mut ByteCursor<R>) -> HeifMetadata {
    let prefix = cursor
        .rewind()
        .and_then(|_| cursor.read_up_to(SCAN_LIMIT));

    match prefix {
        Ok(data) => parse_bytes(&data),
        Err(e) => {
            tracing::debug!("HEIF prefix unreadable: {e}");
            HeifMetadata::default()
        }
    }
}

/// Follow `path` box by box, skipping the FullBox header of `meta`.
/// Returns the payload of the last box on the path.
pub(crate) fn find_box_path<'a>(data: &'a [u8], path: &[&[u8; 4]]) -> Option<&'a [u8]> {
    let (first, rest) = path.split_first()?;

    let mut found = None;
    for_each_box(data, true, |kind, payload| {
        if found.is_none() && kind == *first {
            found = Some(payload);
        }
    });
    let payload = found?;

    if rest.is_empty() {
        return Some(payload);
    }

    let children = if *first == b"meta" {
        payload.get(FULL_BOX_HEADER_LEN..)?
    } else {
        payload
    };
    find_box_path(children, rest)
}

/// Width and height of the primary item.
///
/// Tiled images carry one `ispe` per tile ahead of the full-image one, so
/// the primary item's `ipma` associations pick the property. Without a
/// usable `pitm`/`ipma` pair the first `ispe` in `ipco` stands.
pub(crate) fn primary_extents(data: &[u8]) -> Option<(u32, u32)> {
    let ipco = find_box_path(data, &[b"meta", b"iprp", b"ipco"])?;
    let mut properties: Vec<([u8; 4], &[u8])> = Vec::new();
    for_each_box(ipco, false, |kind, payload| properties.push((*kind, payload)));

    let associated = primary_item(data)
        .and_then(|item| item_properties(find_box_path(data, &[b"meta", b"iprp"])?, item))
        .and_then(|indices| {
            indices
                .into_iter()
                .filter_map(|index| properties.get(usize::from(index).checked_sub(1)?))
                .find(|(kind, _)| kind == b"ispe")
                .map(|(_, payload)| *payload)
        });

    let ispe = match associated {
        Some(payload) => payload,
        None => {
            tracing::debug!("no ispe associated with a primary item, using the first one");
            properties
                .iter()
                .find(|(kind, _)| kind == b"ispe")
                .map(|(_, payload)| *payload)?
        }
    };

    if ispe.len() < 12 {
        return None;
    }
    let width = u32::from_be_bytes([ispe[4], ispe[5], ispe[6], ispe[7]]);
    let height = u32::from_be_bytes([ispe[8], ispe[9], ispe[10], ispe[11]]);
    Some((width, height))
}

/// Item ID from `pitm`: 16-bit in version 0, 32-bit after
fn primary_item(data: &[u8]) -> Option<u32> {
    let pitm = find_box_path(data, &[b"meta", b"pitm"])?;
    let mut cursor = ByteCursor::new(Cursor::new(pitm));

    let item = cursor.read_u8().and_then(|version| {
        cursor.skip(3)?;
        if version == 0 {
            cursor.read_u16_be().map(u32::from)
        } else {
            cursor.read_u32_be()
        }
    });
    item.map_err(|e| tracing::debug!("pitm unreadable: {e}")).ok()
}

/// Property indices the first `ipma` entry for `item` lists
fn item_properties(iprp: &[u8], item: u32) -> Option<Vec<u16>> {
    let mut found = None;
    for_each_box(iprp, false, |kind, payload| {
        if found.is_none() && kind == b"ipma" {
            found = ipma_entry(payload, item).unwrap_or_else(|e| {
                tracing::debug!("ipma unreadable: {e}");
                None
            });
        }
    });
    found
}

fn ipma_entry(payload: &[u8], item: u32) -> Result<Option<Vec<u16>>> {
    let mut cursor = ByteCursor::new(Cursor::new(payload));
    let version = cursor.read_u8()?;
    let flags = cursor.read_array::<3>()?;
    let wide_indices = flags[2] & 1 != 0;
    let entry_count = cursor.read_u32_be()?;

    for _ in 0..entry_count {
        let id = if version == 0 {
            u32::from(cursor.read_u16_be()?)
        } else {
            cursor.read_u32_be()?
        };

        let count = cursor.read_u8()?;
        let mut indices = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            // top bit is the essential flag
            let index = if wide_indices {
                cursor.read_u16_be()? & 0x7FFF
            } else {
                u16::from(cursor.read_u8()? & 0x7F)
            };
            indices.push(index);
        }

        if id == item {
            return Ok(Some(indices));
        }
    }
    Ok(None)
}
