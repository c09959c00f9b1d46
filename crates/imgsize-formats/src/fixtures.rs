//! Byte builders for synthetic ISO-BMFF and PNG files, shared with downstream tests.

use crc32fast::Hasher;

pub fn bmff_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&((payload.len() + 8) as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

pub fn ftyp(brand: &[u8; 4]) -> Vec<u8> {
    let mut payload = brand.to_vec();
    payload.extend_from_slice(&0u32.to_be_bytes());
    payload.extend_from_slice(brand);
    payload.extend_from_slice(b"mif1");
    bmff_box(b"ftyp", &payload)
}

pub fn nclx(primaries: u16, transfer: u16) -> Vec<u8> {
    let mut payload = b"nclx".to_vec();
    payload.extend_from_slice(&primaries.to_be_bytes());
    payload.extend_from_slice(&transfer.to_be_bytes());
    payload.extend_from_slice(&1u16.to_be_bytes());
    payload.push(0x80);
    bmff_box(b"colr", &payload)
}

pub fn ispe(width: u32, height: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&width.to_be_bytes());
    payload.extend_from_slice(&height.to_be_bytes());
    bmff_box(b"ispe", &payload)
}

/// `pitm` version 0
pub fn pitm(item: u16) -> Vec<u8> {
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&item.to_be_bytes());
    bmff_box(b"pitm", &payload)
}

/// `ipma` version 0 with 7-bit property indices, one entry per item
pub fn ipma(entries: &[(u16, &[u8])]) -> Vec<u8> {
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for (item, indices) in entries {
        payload.extend_from_slice(&item.to_be_bytes());
        payload.push(indices.len() as u8);
        payload.extend_from_slice(indices);
    }
    bmff_box(b"ipma", &payload)
}

fn with_meta(brand: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let mut meta_payload = vec![0u8; 4];
    meta_payload.extend_from_slice(&bmff_box(b"hdlr", &[0u8; 24]));
    meta_payload.extend_from_slice(&children.concat());

    let mut out = ftyp(brand);
    out.extend_from_slice(&bmff_box(b"meta", &meta_payload));
    out
}

/// ftyp + meta(hdlr, iprp(ipco(properties)))
pub fn heif_file(brand: &[u8; 4], properties: &[Vec<u8>]) -> Vec<u8> {
    let ipco = bmff_box(b"ipco", &properties.concat());
    with_meta(brand, &[bmff_box(b"iprp", &ipco)])
}

/// ftyp + meta(hdlr, pitm, iprp(ipco(properties), ipma))
pub fn heif_file_with_items(
    brand: &[u8; 4],
    properties: &[Vec<u8>],
    primary: u16,
    associations: &[(u16, &[u8])],
) -> Vec<u8> {
    let mut iprp = bmff_box(b"ipco", &properties.concat());
    iprp.extend_from_slice(&ipma(associations));
    with_meta(brand, &[pitm(primary), bmff_box(b"iprp", &iprp)])
}

/// `pixi` with three channels of `depth` bits
pub fn pixi(depth: u8) -> Vec<u8> {
    bmff_box(b"pixi", &[0, 3, depth, depth, depth])
}

/// `auxC` marking an alpha plane
pub fn alpha_aux() -> Vec<u8> {
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(b"urn:mpeg:mpegB:cicp:systems:auxiliary:alpha\0");
    bmff_box(b"auxC", &payload)
}

/// PNG chunk with a valid CRC
pub fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);

    let mut hasher = Hasher::new();
    hasher.update(kind);
    hasher.update(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
    out
}

/// Splice a chunk in right after IHDR of an encoded PNG
pub fn insert_png_chunk(mut png: Vec<u8>, kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    // signature + IHDR(4 length, 4 type, 13 body, 4 crc)
    let after_ihdr = 8 + 25;
    png.splice(after_ihdr..after_ihdr, png_chunk(kind, data));
    png
}
