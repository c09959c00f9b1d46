use imgsize_common::MediaFormat;
use serde::Serialize;
use std::fmt;

/// How pixels are represented once decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ColorModel {
    #[default]
    Unknown,
    #[serde(rename = "RGB")]
    Rgb,
    YCbCr,
    Grayscale,
    Indexed,
}

impl ColorModel {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::YCbCr => "YCbCr",
            Self::Grayscale => "Grayscale",
            Self::Indexed => "Indexed",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ColorSpace {
    #[default]
    Unknown,
    #[serde(rename = "sRGB")]
    Srgb,
    #[serde(rename = "Adobe RGB")]
    AdobeRgb,
    #[serde(rename = "BT.709")]
    Bt709,
    #[serde(rename = "BT.2020")]
    Bt2020,
    #[serde(rename = "Display P3")]
    DisplayP3,
}

impl ColorSpace {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Srgb => "sRGB",
            Self::AdobeRgb => "Adobe RGB",
            Self::Bt709 => "BT.709",
            Self::Bt2020 => "BT.2020",
            Self::DisplayP3 => "Display P3",
            Self::Unknown => "Unknown",
        }
    }
}

/// HDR transfer characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum HdrKind {
    #[default]
    None,
    #[serde(rename = "PQ (SMPTE ST 2084)")]
    Pq,
    #[serde(rename = "HLG (ARIB STD-B67)")]
    Hlg,
    /// 16-bit PNG: wide range, no signalled transfer function
    Limited,
}

impl HdrKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Pq => "PQ (SMPTE ST 2084)",
            Self::Hlg => "HLG (ARIB STD-B67)",
            Self::Limited => "Limited",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ChromaSubsampling {
    /// Not a YCbCr image
    #[default]
    #[serde(rename = "N/A")]
    NotApplicable,
    #[serde(rename = "4:4:4")]
    Yuv444,
    #[serde(rename = "4:2:2")]
    Yuv422,
    #[serde(rename = "4:2:0")]
    Yuv420,
    Unknown,
}

impl ChromaSubsampling {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotApplicable => "N/A",
            Self::Yuv444 => "4:4:4",
            Self::Yuv422 => "4:2:2",
            Self::Yuv420 => "4:2:0",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CompressionType {
    #[default]
    Unknown,
    Lossless,
    Lossy,
    /// HEIF/AVIF carry either
    #[serde(rename = "Lossy/Lossless")]
    Hybrid,
}

impl CompressionType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Lossless => "Lossless",
            Self::Lossy => "Lossy",
            Self::Hybrid => "Lossy/Lossless",
            Self::Unknown => "Unknown",
        }
    }
}

macro_rules! display_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_label!(ColorModel, ColorSpace, HdrKind, ChromaSubsampling, CompressionType);

/// Everything the analyzer learned about one image, plus the size estimate.
///
/// Built once per file by the analyzer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageMetadata {
    pub format: MediaFormat,
    pub width: u32,
    pub height: u32,
    pub color_model: ColorModel,
    pub color_space: ColorSpace,
    pub bit_depth: u8,
    pub has_alpha: bool,
    pub has_icc_profile: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icc_profile_size: Option<usize>,
    pub hdr_type: HdrKind,
    pub chroma_subsampling: ChromaSubsampling,
    pub compression_type: CompressionType,
    #[serde(rename = "original_size_bytes")]
    pub original_size: u64,
    #[serde(rename = "decoded_size_bytes")]
    pub decoded_size: u64,
    pub compression_ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ImageMetadata {
    pub fn original_size_mb(&self) -> f64 {
        self.original_size as f64 / (1024.0 * 1024.0)
    }

    pub fn decoded_size_mb(&self) -> f64 {
        self.decoded_size as f64 / (1024.0 * 1024.0)
    }
}
