//! Supported output formats.

use crate::utils::mime::types;

/// An image format the worker can encode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Webp,
    Avif,
    Jpeg,
    Png,
}

impl ImageFormat {
    pub const ALL: [Self; 4] = [Self::Webp, Self::Avif, Self::Jpeg, Self::Png];

    /// Look up a request's `format` field. `None` means unsupported.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            types::WEBP => Some(Self::Webp),
            types::AVIF => Some(Self::Avif),
            types::JPEG => Some(Self::Jpeg),
            types::PNG => Some(Self::Png),
            _ => None,
        }
    }

    pub const fn mime(self) -> &'static str {
        match self {
            Self::Webp => types::WEBP,
            Self::Avif => types::AVIF,
            Self::Jpeg => types::JPEG,
            Self::Png => types::PNG,
        }
    }

    /// Name of the codec module that encodes this format.
    pub const fn codec_name(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    /// File extension for encoded output.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}
