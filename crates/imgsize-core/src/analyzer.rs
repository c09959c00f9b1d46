use crate::pixel_model::{bytes_per_pixel, decoded_size};
use imgsize_common::{validate_input, Error, MediaFormat, Result};
use imgsize_formats::{
    heif, icc, jpeg, png, webp, ByteCursor, ChromaSubsampling, ColorHint, ColorModel, ColorSpace,
    CompressionType, DimensionSniffer, HdrKind, ImageMetadata, ImageSniffer, JpegSampling,
    SniffedImage, WebpKind,
};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek, SeekFrom};
use std::path::Path;

const TEN_MB_IN_BYTES: u64 = 10 * 1024 * 1024;

/// Everything the format walkers contribute to a record
#[derive(Debug, Clone, Copy)]
struct Attributes {
    color_model: ColorModel,
    color_space: ColorSpace,
    bit_depth: u8,
    has_alpha: bool,
    icc_profile_size: Option<usize>,
    hdr: HdrKind,
    subsampling: ChromaSubsampling,
    compression: CompressionType,
    /// Set when the model table cannot describe the decoded buffer
    bytes_per_pixel: Option<u32>,
}

impl Attributes {
    fn new(color_model: ColorModel, has_alpha: bool) -> Self {
        Self {
            color_model,
            color_space: ColorSpace::Srgb,
            bit_depth: 8,
            has_alpha,
            icc_profile_size: None,
            hdr: HdrKind::None,
            subsampling: ChromaSubsampling::NotApplicable,
            compression: CompressionType::Unknown,
            bytes_per_pixel: None,
        }
    }

    /// Classify an embedded profile; an empty one counts as absent
    fn apply_icc(&mut self, profile: Option<Vec<u8>>) {
        let Some(profile) = profile.filter(|p| !p.is_empty()) else {
            return;
        };

        let class = icc::classify(&profile);
        tracing::debug!("ICC profile of {} bytes: {}", profile.len(), class.label());
        self.color_space = class.color_space();
        self.icc_profile_size = Some(profile.len());
    }
}

/// Turns an image byte source into an [`ImageMetadata`] record.
///
/// The sniffer identifies the format and dimensions, then the matching
/// header walkers fill in everything else. Nothing is decoded.
#[derive(Debug, Default, Clone, Copy)]
pub struct Analyzer<S = ImageSniffer> {
    sniffer: S,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: DimensionSniffer> Analyzer<S> {
    pub fn with_sniffer(sniffer: S) -> Self {
        Self { sniffer }
    }

    /// Analyze a file on disk.
    ///
    /// Files over 10 MiB are memory-mapped instead of buffered.
    pub fn analyze_path(&self, path: &Path) -> Result<ImageMetadata> {
        validate_input(path)?;

        let file = File::open(path)?;
        let original_size = file.metadata()?.len();

        let metadata = if original_size > TEN_MB_IN_BYTES {
            tracing::debug!("Memory-mapping {} ({} bytes)", path.display(), original_size);
            // SAFETY: the map is read-only and dropped before returning;
            // concurrent truncation by another process is not guarded against
            let mmap = unsafe { Mmap::map(&file)? };
            self.analyze_source(&mut Cursor::new(&mmap[..]), original_size)?
        } else {
            self.analyze_source(&mut BufReader::new(file), original_size)?
        };

        tracing::debug!(
            "Analyzed {}: {} {}x{}, {} bytes decoded",
            path.display(),
            metadata.format,
            metadata.width,
            metadata.height,
            metadata.decoded_size
        );
        Ok(metadata)
    }

    /// Analyze an in-memory encoded image
    pub fn analyze_bytes(&self, data: &[u8]) -> Result<ImageMetadata> {
        self.analyze_source(&mut Cursor::new(data), data.len() as u64)
    }

    /// Analyze any seekable stream; its length is the original size
    pub fn analyze_reader<R: BufRead + Seek>(&self, mut reader: R) -> Result<ImageMetadata> {
        let original_size = reader.seek(SeekFrom::End(0))?;
        reader.rewind()?;
        self.analyze_source(&mut reader, original_size)
    }

    fn analyze_source<R: BufRead + Seek>(
        &self,
        reader: &mut R,
        original_size: u64,
    ) -> Result<ImageMetadata> {
        reader.rewind()?;
        let sniffed = self.sniffer.sniff(reader)?;
        reader.rewind()?;

        let mut cursor = ByteCursor::new(reader);
        let attrs = match sniffed.format {
            MediaFormat::Png => png_attributes(&mut cursor, sniffed.color),
            MediaFormat::Jpeg => jpeg_attributes(&mut cursor, &sniffed),
            MediaFormat::Webp => webp_attributes(&mut cursor, sniffed.color),
            MediaFormat::Heif | MediaFormat::Avif => heif_attributes(&mut cursor),
            MediaFormat::Other(_) => other_attributes(sniffed.color),
        };

        let bytes_per_pixel = attrs.bytes_per_pixel.unwrap_or_else(|| {
            bytes_per_pixel(attrs.color_model, attrs.bit_depth, attrs.has_alpha)
        });
        let decoded_size = decoded_size(sniffed.width, sniffed.height, bytes_per_pixel)?;

        if original_size == 0 {
            return Err(Error::EmptySource);
        }
        let compression_ratio = decoded_size as f64 / original_size as f64;

        Ok(ImageMetadata {
            format: sniffed.format,
            width: sniffed.width,
            height: sniffed.height,
            color_model: attrs.color_model,
            color_space: attrs.color_space,
            bit_depth: attrs.bit_depth,
            has_alpha: attrs.has_alpha,
            has_icc_profile: attrs.icc_profile_size.is_some(),
            icc_profile_size: attrs.icc_profile_size,
            hdr_type: attrs.hdr,
            chroma_subsampling: attrs.subsampling,
            compression_type: attrs.compression,
            original_size,
            decoded_size,
            compression_ratio,
            filename: None,
        })
    }
}

fn hinted(hint: Option<ColorHint>) -> (ColorModel, bool) {
    hint.map_or((ColorModel::Unknown, false), |h| (h.model, h.has_alpha))
}

fn png_attributes<R: BufRead + Seek>(
    cursor: &mut ByteCursor<R>,
    hint: Option<ColorHint>,
) -> Attributes {
    let header = png::read_header(cursor);
    let (model, mut has_alpha) = header
        .and_then(|h| h.color_model())
        .unwrap_or_else(|| hinted(hint));

    // tRNS on gray or truecolor decodes with an alpha channel
    if model != ColorModel::Indexed && hint.is_some_and(|h| h.has_alpha) {
        has_alpha = true;
    }

    let mut attrs = Attributes::new(model, has_alpha);
    attrs.compression = CompressionType::Lossless;
    attrs.bit_depth = png::bit_depth(cursor);
    if attrs.bit_depth == 16 {
        attrs.hdr = HdrKind::Limited;
    }
    attrs.apply_icc(png::icc_profile(cursor));
    attrs
}

fn jpeg_attributes<R: BufRead + Seek>(
    cursor: &mut ByteCursor<R>,
    sniffed: &SniffedImage,
) -> Attributes {
    let frame = jpeg::read_frame(cursor);
    let sampling = frame
        .as_ref()
        .map_or(JpegSampling::Unknown, |sof| sof.sampling());

    if let JpegSampling::Custom { .. } = sampling {
        tracing::debug!("JPEG uses non-standard sampling {sampling}");
    }
    if let Some((width, height)) = frame.as_ref().and_then(|sof| sof.dimensions()) {
        if (u32::from(width), u32::from(height)) != (sniffed.width, sniffed.height) {
            tracing::debug!(
                "SOF declares {width}x{height}, sniffer reported {}x{}",
                sniffed.width,
                sniffed.height
            );
        }
    }

    let (model, subsampling) = sampling.classify();
    let mut attrs = Attributes::new(model, false);
    attrs.subsampling = subsampling;
    attrs.compression = CompressionType::Lossy;
    attrs.bit_depth = frame.as_ref().map_or(8, |sof| sof.bit_depth());
    attrs.apply_icc(jpeg::icc_profile(cursor));
    attrs
}

fn webp_attributes<R: BufRead + Seek>(
    cursor: &mut ByteCursor<R>,
    hint: Option<ColorHint>,
) -> Attributes {
    let kind = webp::detect(cursor);

    let mut attrs = match kind {
        WebpKind::Lossy => Attributes::new(ColorModel::YCbCr, false),
        WebpKind::Lossless | WebpKind::Extended | WebpKind::Invalid => {
            let (model, has_alpha) = hinted(hint);
            Attributes::new(model, has_alpha)
        }
    };
    attrs.subsampling = kind.subsampling();
    attrs.compression = if kind.is_lossless() {
        CompressionType::Lossless
    } else {
        CompressionType::Lossy
    };
    attrs
}

fn heif_attributes<R: BufRead + Seek>(cursor: &mut ByteCursor<R>) -> Attributes {
    let heif = heif::parse(cursor);

    let mut attrs = Attributes::new(heif.color_model, heif.has_alpha);
    attrs.color_space = heif.color_space;
    attrs.bit_depth = heif.bit_depth;
    attrs.hdr = heif.hdr;
    attrs.subsampling = heif.chroma_subsampling;
    attrs.compression = CompressionType::Hybrid;
    attrs
}

/// Formats without a walker: only the sniffer's buffer size is trusted
fn other_attributes(hint: Option<ColorHint>) -> Attributes {
    let mut attrs = Attributes::new(ColorModel::Unknown, hint.is_some_and(|h| h.has_alpha));
    attrs.color_space = ColorSpace::Unknown;
    attrs.bytes_per_pixel = hint.map(|h| u32::from(h.bytes_per_pixel));
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    /// Reports fixed dimensions for any input
    struct FixedSniffer(SniffedImage);

    impl DimensionSniffer for FixedSniffer {
        fn sniff<R: BufRead + Seek>(&self, _reader: &mut R) -> Result<SniffedImage> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_png_rgba() {
        let data = encode(&DynamicImage::new_rgba8(500, 500), ImageFormat::Png);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();

        assert_eq!(meta.format, MediaFormat::Png);
        assert_eq!(meta.color_model, ColorModel::Rgb);
        assert!(meta.has_alpha);
        assert_eq!(meta.bit_depth, 8);
        assert_eq!(meta.color_space, ColorSpace::Srgb);
        assert_eq!(meta.hdr_type, HdrKind::None);
        assert_eq!(meta.chroma_subsampling, ChromaSubsampling::NotApplicable);
        assert_eq!(meta.compression_type, CompressionType::Lossless);
        assert_eq!(meta.decoded_size, 1_000_000);
        assert_eq!(meta.original_size, data.len() as u64);
        assert!(meta.compression_ratio > 1.0);
    }

    #[test]
    fn test_png_16_bit_is_limited_hdr() {
        let data = encode(&DynamicImage::new_luma16(10, 10), ImageFormat::Png);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();

        assert_eq!(meta.color_model, ColorModel::Grayscale);
        assert_eq!(meta.bit_depth, 16);
        assert_eq!(meta.hdr_type, HdrKind::Limited);
        assert_eq!(meta.decoded_size, 200);
    }

    #[test]
    fn test_png_trns_adds_alpha() {
        use imgsize_formats::fixtures::insert_png_chunk;

        let rgb = encode(&DynamicImage::new_rgb8(10, 10), ImageFormat::Png);
        let data = insert_png_chunk(rgb, b"tRNS", &[0, 0, 0, 0, 0, 0]);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();
        assert_eq!(meta.color_model, ColorModel::Rgb);
        assert!(meta.has_alpha);
        assert_eq!(meta.decoded_size, 400);

        let gray = encode(&DynamicImage::new_luma8(10, 10), ImageFormat::Png);
        let data = insert_png_chunk(gray, b"tRNS", &[0, 0]);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();
        assert_eq!(meta.color_model, ColorModel::Grayscale);
        assert!(meta.has_alpha);
        assert_eq!(meta.decoded_size, 200);
    }

    #[test]
    fn test_webp_extended_uses_hint() {
        let mut data = b"RIFF".to_vec();
        data.extend_from_slice(&22u32.to_le_bytes());
        data.extend_from_slice(b"WEBPVP8X");
        data.extend_from_slice(&[0u8; 14]);

        let sniffer = FixedSniffer(SniffedImage {
            format: MediaFormat::Webp,
            width: 8,
            height: 8,
            color: Some(ColorHint::from_color_type(image::ColorType::Rgba8)),
        });
        let meta = Analyzer::with_sniffer(sniffer).analyze_bytes(&data).unwrap();

        assert_eq!(meta.color_model, ColorModel::Rgb);
        assert!(meta.has_alpha);
        assert_eq!(meta.chroma_subsampling, ChromaSubsampling::Unknown);
        assert_eq!(meta.compression_type, CompressionType::Lossy);
        assert_eq!(meta.decoded_size, 8 * 8 * 4);
    }

    #[test]
    fn test_jpeg_gray() {
        let data = encode(&DynamicImage::new_luma8(64, 32), ImageFormat::Jpeg);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();

        assert_eq!(meta.format, MediaFormat::Jpeg);
        assert_eq!(meta.color_model, ColorModel::Grayscale);
        assert_eq!(meta.chroma_subsampling, ChromaSubsampling::NotApplicable);
        assert_eq!(meta.compression_type, CompressionType::Lossy);
        assert_eq!(meta.decoded_size, 64 * 32);
        assert!(!meta.has_icc_profile);
    }

    #[test]
    fn test_jpeg_color_is_ycbcr() {
        let data = encode(&DynamicImage::new_rgb8(32, 32), ImageFormat::Jpeg);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();

        assert_eq!(meta.color_model, ColorModel::YCbCr);
        assert_ne!(meta.chroma_subsampling, ChromaSubsampling::NotApplicable);
        assert_eq!(meta.decoded_size, 32 * 32 * 3);
    }

    #[test]
    fn test_heif_from_boxes() {
        use imgsize_formats::fixtures::{heif_file, ispe, nclx};

        let data = heif_file(b"heic", &[ispe(200, 100), nclx(9, 16)]);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();

        assert_eq!(meta.format, MediaFormat::Heif);
        assert_eq!((meta.width, meta.height), (200, 100));
        assert_eq!(meta.color_space, ColorSpace::Bt2020);
        assert_eq!(meta.hdr_type, HdrKind::Pq);
        assert_eq!(meta.compression_type, CompressionType::Hybrid);
        assert_eq!(meta.decoded_size, 200 * 100 * 3);
    }

    #[test]
    fn test_idempotent() {
        let data = encode(&DynamicImage::new_rgb8(40, 30), ImageFormat::Png);
        let analyzer = Analyzer::new();
        let mut reader = Cursor::new(data);

        let first = analyzer.analyze_reader(&mut reader).unwrap();
        let second = analyzer.analyze_reader(&mut reader).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_and_garbage_are_hard_errors() {
        let analyzer = Analyzer::new();
        for data in [&b""[..], b"definitely not an image"] {
            let err = analyzer.analyze_bytes(data).unwrap_err();
            assert!(err.is_format_error(), "unexpected error: {err}");
        }
    }

    #[test]
    fn test_empty_source_rejected() {
        let sniffer = FixedSniffer(SniffedImage {
            format: MediaFormat::Png,
            width: 1,
            height: 1,
            color: None,
        });
        let err = Analyzer::with_sniffer(sniffer).analyze_bytes(&[]).unwrap_err();
        assert!(matches!(err, Error::EmptySource));
    }

    #[test]
    fn test_overflow_rejected() {
        let sniffer = FixedSniffer(SniffedImage {
            format: MediaFormat::Other(ImageFormat::Bmp),
            width: u32::MAX,
            height: u32::MAX,
            color: Some(ColorHint::from_color_type(image::ColorType::Rgba16)),
        });
        let err = Analyzer::with_sniffer(sniffer)
            .analyze_bytes(b"BM")
            .unwrap_err();
        assert!(matches!(err, Error::SizeOverflow { .. }));
    }

    #[test]
    fn test_other_format_uses_hint() {
        let data = encode(&DynamicImage::new_rgb8(10, 10), ImageFormat::Bmp);
        let meta = Analyzer::new().analyze_bytes(&data).unwrap();

        assert_eq!(meta.format, MediaFormat::Other(ImageFormat::Bmp));
        assert_eq!(meta.color_model, ColorModel::Unknown);
        assert_eq!(meta.color_space, ColorSpace::Unknown);
        assert_eq!(meta.compression_type, CompressionType::Unknown);
        assert_eq!(meta.bit_depth, 8);
        assert_eq!(meta.decoded_size, 300);
    }

    #[test]
    fn test_missing_file() {
        let err = Analyzer::new()
            .analyze_path(Path::new("/nonexistent/photo.png"))
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_analyze_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        DynamicImage::new_rgb8(20, 10).save(&path).unwrap();

        let meta = Analyzer::new().analyze_path(&path).unwrap();
        assert_eq!(meta.original_size, std::fs::metadata(&path).unwrap().len());
        assert_eq!(meta.decoded_size, 600);
    }
}
