//! Color-space labelling for embedded ICC profiles.
//!
//! This does not parse the profile. It looks for well-known description
//! strings in the raw bytes, which is enough to tell the common wide-gamut
//! profiles apart from plain sRGB.

use crate::metadata::ColorSpace;

/// Standard ICC header size; anything shorter cannot be a real profile.
pub const ICC_HEADER_LEN: usize = 128;

/// Result of classifying a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IccClass {
    /// Too short to classify
    Srgb,
    /// A profile was present but none of the known names matched
    SrgbIcc,
    DisplayP3,
    Bt2020,
    Bt709,
    AdobeRgb,
}

impl IccClass {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Srgb => "sRGB",
            Self::SrgbIcc => "sRGB (ICC)",
            Self::DisplayP3 => "Display P3",
            Self::Bt2020 => "BT.2020",
            Self::Bt709 => "BT.709",
            Self::AdobeRgb => "Adobe RGB",
        }
    }

    pub fn color_space(&self) -> ColorSpace {
        match self {
            Self::Srgb | Self::SrgbIcc => ColorSpace::Srgb,
            Self::DisplayP3 => ColorSpace::DisplayP3,
            Self::Bt2020 => ColorSpace::Bt2020,
            Self::Bt709 => ColorSpace::Bt709,
            Self::AdobeRgb => ColorSpace::AdobeRgb,
        }
    }
}

// Order matters: "P3" is short enough to show up inside other names, so it
// is tested first and wins.
const RULES: &[(&[&[u8]], IccClass)] = &[
    (&[b"Display P3", b"P3"], IccClass::DisplayP3),
    (&[b"BT.2020", b"Rec. 2020"], IccClass::Bt2020),
    (&[b"BT.709", b"Rec. 709"], IccClass::Bt709),
    (&[b"Adobe RGB"], IccClass::AdobeRgb),
];

/// Classify raw profile bytes
pub fn classify(profile: &[u8]) -> IccClass {
    if profile.len() < ICC_HEADER_LEN {
        return IccClass::Srgb;
    }

    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| contains(profile, n)))
        .map(|(_, class)| *class)
        .unwrap_or(IccClass::SrgbIcc)
}

pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}
