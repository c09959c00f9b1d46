use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use imgsize_common::{Error, MediaFormat};
use imgsize_core::Analyzer;
use imgsize_formats::fixtures::{
    alpha_aux, heif_file, heif_file_with_items, insert_png_chunk, ispe, nclx, pixi, png_chunk,
};
use imgsize_formats::{ChromaSubsampling, ColorModel, ColorSpace, CompressionType, HdrKind};
use std::io::Cursor;
use tempfile::TempDir;

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// Size of the buffer the `image` crate produces when fully decoding
fn actual_decoded_size(data: &[u8]) -> u64 {
    image::load_from_memory(data).unwrap().as_bytes().len() as u64
}

/// zlib stream holding `data` in one stored block
fn zlib_stored(data: &[u8]) -> Vec<u8> {
    let len = data.len() as u16;
    let mut out = vec![0x78, 0x01, 0x01];
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&(!len).to_le_bytes());
    out.extend_from_slice(data);

    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
        a = (a + u32::from(byte)) % 65521;
        b = (b + a) % 65521;
    }
    out.extend_from_slice(&((b << 16) | a).to_be_bytes());
    out
}

/// 2x2 palette PNG, every pixel index 0
fn indexed_png() -> Vec<u8> {
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&2u32.to_be_bytes());
    ihdr.extend_from_slice(&2u32.to_be_bytes());
    ihdr.extend_from_slice(&[8, 3, 0, 0, 0]);

    // two scanlines of filter byte + 2 indices
    let idat = zlib_stored(&[0; 6]);

    let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
    out.extend(png_chunk(b"IHDR", &ihdr));
    out.extend(png_chunk(b"PLTE", &[255, 0, 0]));
    out.extend(png_chunk(b"IDAT", &idat));
    out.extend(png_chunk(b"IEND", &[]));
    out
}

#[test]
fn test_png_rgba_500() {
    let data = encode(&DynamicImage::new_rgba8(500, 500), ImageFormat::Png);
    let meta = Analyzer::new().analyze_bytes(&data).unwrap();

    assert_eq!(meta.decoded_size, 500 * 500 * 4);
    assert_eq!(meta.decoded_size, actual_decoded_size(&data));
    assert_eq!(meta.compression_type, CompressionType::Lossless);
    assert_eq!(meta.chroma_subsampling, ChromaSubsampling::NotApplicable);
}

#[test]
fn test_png_variants_match_image_decode() {
    let cases = [
        (DynamicImage::new_luma8(64, 48), ColorModel::Grayscale, 8, false),
        (DynamicImage::new_luma16(64, 48), ColorModel::Grayscale, 16, false),
        (DynamicImage::new_luma_a8(64, 48), ColorModel::Grayscale, 8, true),
        (DynamicImage::new_rgb8(64, 48), ColorModel::Rgb, 8, false),
        (DynamicImage::new_rgb16(64, 48), ColorModel::Rgb, 16, false),
        (DynamicImage::new_rgba16(64, 48), ColorModel::Rgb, 16, true),
    ];

    for (img, model, depth, alpha) in cases {
        let data = encode(&img, ImageFormat::Png);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();

        assert_eq!(meta.color_model, model, "{:?}", img.color());
        assert_eq!(meta.bit_depth, depth, "{:?}", img.color());
        assert_eq!(meta.has_alpha, alpha, "{:?}", img.color());
        assert_eq!(meta.decoded_size, actual_decoded_size(&data), "{:?}", img.color());

        let expected_hdr = if depth == 16 {
            HdrKind::Limited
        } else {
            HdrKind::None
        };
        assert_eq!(meta.hdr_type, expected_hdr);
    }
}

#[test]
fn test_png_palette_counts_index_bytes() {
    let data = indexed_png();
    let meta = Analyzer::new().analyze_bytes(&data).unwrap();

    assert_eq!(meta.format, MediaFormat::Png);
    assert_eq!(meta.color_model, ColorModel::Indexed);
    assert_eq!(meta.bit_depth, 8);
    assert_eq!(meta.decoded_size, 4);
}

#[test]
fn test_png_transparency_chunk_matches_image_decode() {
    let cases = [
        (DynamicImage::new_rgb8(10, 10), vec![0u8; 6], ColorModel::Rgb),
        (DynamicImage::new_luma8(10, 10), vec![0u8; 2], ColorModel::Grayscale),
        (DynamicImage::new_rgb16(10, 10), vec![0u8; 6], ColorModel::Rgb),
    ];

    for (img, trns, model) in cases {
        let data = insert_png_chunk(encode(&img, ImageFormat::Png), b"tRNS", &trns);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();

        assert_eq!(meta.color_model, model, "{:?}", img.color());
        assert!(meta.has_alpha, "{:?}", img.color());
        assert_eq!(meta.decoded_size, actual_decoded_size(&data), "{:?}", img.color());
    }
}

#[test]
fn test_png_icc_profile_classified() {
    let mut profile = vec![0u8; 200];
    profile[48..58].copy_from_slice(b"Display P3");

    let mut iccp = b"ICC\0\0".to_vec();
    iccp.extend(zlib_stored(&profile));

    let png = encode(&DynamicImage::new_rgb8(12, 12), ImageFormat::Png);
    let data = insert_png_chunk(png, b"iCCP", &iccp);
    let meta = Analyzer::new().analyze_bytes(&data).unwrap();

    assert!(meta.has_icc_profile);
    // raw chunk data: name, NUL, method and the deflated profile
    assert_eq!(meta.icc_profile_size, Some(iccp.len()));
    assert_eq!(meta.color_space, ColorSpace::DisplayP3);
    assert_eq!(meta.decoded_size, actual_decoded_size(&data));
}

#[test]
fn test_jpeg_matches_image_decode() {
    for img in [DynamicImage::new_rgb8(128, 96), DynamicImage::new_luma8(128, 96)] {
        let data = encode(&img, ImageFormat::Jpeg);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();

        assert_eq!(meta.format, MediaFormat::Jpeg);
        assert_eq!(meta.bit_depth, 8);
        assert_eq!(meta.compression_type, CompressionType::Lossy);
        assert_eq!(meta.decoded_size, actual_decoded_size(&data));
    }
}

#[test]
fn test_jpeg_icc_profile_classified() {
    let mut profile = vec![0u8; 200];
    profile[40..49].copy_from_slice(b"Rec. 2020");

    let mut data = Vec::new();
    let mut encoder = JpegEncoder::new(&mut data);
    encoder.set_icc_profile(profile).unwrap();
    encoder
        .write_image(&[128u8; 16 * 16 * 3], 16, 16, ExtendedColorType::Rgb8)
        .unwrap();

    let meta = Analyzer::new().analyze_bytes(&data).unwrap();
    assert!(meta.has_icc_profile);
    assert_eq!(meta.icc_profile_size, Some(200));
    assert_eq!(meta.color_space, ColorSpace::Bt2020);
}

#[test]
fn test_webp_lossless() {
    let data = encode(&DynamicImage::new_rgb8(40, 20), ImageFormat::WebP);
    let meta = Analyzer::new().analyze_bytes(&data).unwrap();

    assert_eq!(meta.format, MediaFormat::Webp);
    assert_eq!(meta.color_model, ColorModel::Rgb);
    assert_eq!(meta.compression_type, CompressionType::Lossless);
    assert_eq!(meta.chroma_subsampling, ChromaSubsampling::NotApplicable);
    assert_eq!(meta.color_space, ColorSpace::Srgb);
    assert_eq!(meta.bit_depth, 8);
    assert_eq!(meta.decoded_size, actual_decoded_size(&data));
}

#[test]
fn test_webp_lossy() {
    // VP8 key frame header: frame tag, start code, 14-bit width and height
    let mut vp8 = vec![0x10, 0x02, 0x00, 0x9D, 0x01, 0x2A];
    vp8.extend_from_slice(&48u16.to_le_bytes());
    vp8.extend_from_slice(&32u16.to_le_bytes());
    vp8.resize(20, 0);

    let mut data = b"RIFF".to_vec();
    data.extend_from_slice(&(4 + 8 + vp8.len() as u32).to_le_bytes());
    data.extend_from_slice(b"WEBPVP8 ");
    data.extend_from_slice(&(vp8.len() as u32).to_le_bytes());
    data.extend_from_slice(&vp8);

    let meta = Analyzer::new().analyze_bytes(&data).unwrap();
    assert_eq!(meta.format, MediaFormat::Webp);
    assert_eq!((meta.width, meta.height), (48, 32));
    assert_eq!(meta.color_model, ColorModel::YCbCr);
    assert!(!meta.has_alpha);
    assert_eq!(meta.chroma_subsampling, ChromaSubsampling::Yuv420);
    assert_eq!(meta.compression_type, CompressionType::Lossy);
    assert_eq!(meta.color_space, ColorSpace::Srgb);
    assert_eq!(meta.decoded_size, 48 * 32 * 3);
}

#[test]
fn test_tiled_heic_uses_primary_item() {
    let data = heif_file_with_items(
        b"heic",
        &[ispe(512, 512), ispe(4032, 3024), nclx(1, 1)],
        1,
        &[(2, &[1]), (1, &[2, 3])],
    );
    let meta = Analyzer::new().analyze_bytes(&data).unwrap();

    assert_eq!((meta.width, meta.height), (4032, 3024));
    assert_eq!(meta.decoded_size, 4032 * 3024 * 3);
}

#[test]
fn test_heif_hdr_with_alpha() {
    let data = heif_file(
        b"heic",
        &[ispe(3840, 2160), pixi(10), nclx(9, 18), alpha_aux()],
    );
    let meta = Analyzer::new().analyze_bytes(&data).unwrap();

    assert_eq!(meta.format, MediaFormat::Heif);
    assert_eq!(meta.color_model, ColorModel::YCbCr);
    assert_eq!(meta.bit_depth, 10);
    assert!(meta.has_alpha);
    assert_eq!(meta.color_space, ColorSpace::Bt2020);
    assert_eq!(meta.hdr_type, HdrKind::Hlg);
    assert_eq!(meta.chroma_subsampling, ChromaSubsampling::Yuv420);
    assert_eq!(meta.decoded_size, 3840 * 2160 * 6);

    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["format"], "heif");
    assert_eq!(json["color_space"], "BT.2020");
    assert_eq!(json["hdr_type"], "HLG (ARIB STD-B67)");
    assert_eq!(json["compression_type"], "Lossy/Lossless");
    assert_eq!(json["chroma_subsampling"], "4:2:0");
    assert_eq!(json["has_icc_profile"], false);
    assert!(json.get("icc_profile_size").is_none());
    assert!(json.get("filename").is_none());
    assert!(json["decoded_size_bytes"].is_u64());
}

#[test]
fn test_avif_defaults() {
    let data = heif_file(b"avif", &[ispe(64, 64)]);
    let meta = Analyzer::new().analyze_bytes(&data).unwrap();

    assert_eq!(meta.format, MediaFormat::Avif);
    assert_eq!(meta.bit_depth, 8);
    assert_eq!(meta.color_space, ColorSpace::Bt709);
    assert_eq!(meta.hdr_type, HdrKind::None);
    assert_eq!(meta.decoded_size, 64 * 64 * 3);
}

#[test]
fn test_large_file_is_memory_mapped() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("padded.png");

    // trailing bytes after IEND push the file past the mmap threshold
    let mut data = encode(&DynamicImage::new_rgb8(100, 100), ImageFormat::Png);
    data.resize(data.len() + 11 * 1024 * 1024, 0);
    std::fs::write(&path, &data).unwrap();

    let meta = Analyzer::new().analyze_path(&path).unwrap();
    assert_eq!(meta.original_size, data.len() as u64);
    assert_eq!(meta.decoded_size, 100 * 100 * 3);
    assert!(meta.compression_ratio < 1.0);
}

#[test]
fn test_reanalysis_is_identical() {
    let data = encode(&DynamicImage::new_rgb8(33, 17), ImageFormat::Jpeg);
    let analyzer = Analyzer::new();
    let mut reader = Cursor::new(data);

    let first = analyzer.analyze_reader(&mut reader).unwrap();
    let second = analyzer.analyze_reader(&mut reader).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unusable_inputs_are_errors() {
    let temp_dir = TempDir::new().unwrap();
    let analyzer = Analyzer::new();

    let empty = temp_dir.path().join("empty.png");
    std::fs::write(&empty, b"").unwrap();
    assert!(analyzer.analyze_path(&empty).unwrap_err().is_format_error());

    let text = temp_dir.path().join("notes.jpg");
    std::fs::write(&text, b"shopping list: eggs, milk").unwrap();
    assert!(analyzer.analyze_path(&text).unwrap_err().is_format_error());

    let png = encode(&DynamicImage::new_rgb8(10, 10), ImageFormat::Png);
    let truncated = temp_dir.path().join("cut.png");
    std::fs::write(&truncated, &png[..12]).unwrap();
    assert!(analyzer.analyze_path(&truncated).unwrap_err().is_format_error());

    assert!(matches!(
        analyzer.analyze_path(temp_dir.path()),
        Err(Error::InvalidPath(_))
    ));
}
