use serde::{Serialize, Serializer};

/// Image container formats the analyzer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaFormat {
    Png,
    Jpeg,
    Webp,
    Heif,
    Avif,
    /// Anything else the `image` crate can read a header for (BMP, TIFF, ...)
    Other(image::ImageFormat),
}

impl MediaFormat {
    /// Map the `image` crate's format tag onto ours
    pub fn from_image_format(format: image::ImageFormat) -> Self {
        match format {
            image::ImageFormat::Png => Self::Png,
            image::ImageFormat::Jpeg => Self::Jpeg,
            image::ImageFormat::WebP => Self::Webp,
            image::ImageFormat::Avif => Self::Avif,
            other => Self::Other(other),
        }
    }

    /// Stable lowercase label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Heif => "heif",
            Self::Avif => "avif",
            Self::Other(format) => format.extensions_str().first().copied().unwrap_or("unknown"),
        }
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for MediaFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}
