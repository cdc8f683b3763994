//! Per-format encoder parameters.
//!
//! Every codec gets a fixed translation of the caller's options. The
//! constants are tuned trade-offs carried over as-is; change them only
//! together with a visual comparison.
//!
//! | format | from caller           | fixed                                      |
//! |--------|-----------------------|--------------------------------------------|
//! | webp   | quality               | method 3                                   |
//! | avif   | quality → speed 0–10  | cqLevel 33, subsample 4:2:0 (advisory)     |
//! | jpeg   | quality               | optimized coding, smoothing 0, YCbCr       |
//! | png    | -                     | level 2, no interlace                      |
//!
//! The AVIF backend chooses its own chroma layout, so `AvifParams::subsample`
//! records the intended mode without enforcing it.

use super::format::ImageFormat;
use super::message::EncodeOptions;

/// Quality used when a request carries none.
pub const DEFAULT_QUALITY: f32 = 75.0;

/// WebP encoder effort (0 = fastest, 6 = slowest).
pub const WEBP_METHOD: u8 = 3;

/// AVIF constant quantizer level (0 = lossless, 63 = worst).
pub const AVIF_CQ_LEVEL: u8 = 33;
/// Highest AVIF speed setting.
pub const AVIF_MAX_SPEED: u8 = 10;
/// AVIF speed used when a request carries no quality value.
pub const AVIF_DEFAULT_SPEED: u8 = 6;
/// Forced 4:2:0; other modes produced black-and-white output.
pub const AVIF_SUBSAMPLE: ChromaSubsampling = ChromaSubsampling::Yuv420;

pub const JPEG_OPTIMIZE_CODING: bool = true;
pub const JPEG_SMOOTHING: u8 = 0;
pub const JPEG_COLOR_SPACE: JpegColorSpace = JpegColorSpace::YCbCr;

/// PNG compression level (0 = none, 9 = max). Kept low for speed.
pub const PNG_LEVEL: u8 = 2;
pub const PNG_INTERLACE: bool = false;

/// Chroma subsampling modes, numbered as the AVIF codec expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaSubsampling {
    Yuv400 = 0,
    Yuv420 = 1,
    Yuv422 = 2,
    Yuv444 = 3,
}

impl ChromaSubsampling {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// JPEG output color spaces, numbered as the JPEG codec expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JpegColorSpace {
    Grayscale = 1,
    Rgb = 2,
    YCbCr = 3,
}

impl JpegColorSpace {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebpParams {
    pub quality: f32,
    pub method: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvifParams {
    pub cq_level: u8,
    pub speed: u8,
    /// Intended chroma layout. Not applied by the `ravif` backend.
    pub subsample: ChromaSubsampling,
}

impl AvifParams {
    /// The quantizer level on a 0–100 quality scale (higher is better).
    pub fn quality(&self) -> f32 {
        100.0 - f32::from(self.cq_level.min(63)) * 100.0 / 63.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegParams {
    pub quality: u8,
    pub optimize_coding: bool,
    pub smoothing: u8,
    pub color_space: JpegColorSpace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngParams {
    pub level: u8,
    pub interlace: bool,
}

/// Native parameters for one codec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodeParams {
    Webp(WebpParams),
    Avif(AvifParams),
    Jpeg(JpegParams),
    Png(PngParams),
}

impl EncodeParams {
    /// Translate caller options into `format`'s native parameters.
    pub fn map(format: ImageFormat, options: &EncodeOptions) -> Self {
        match format {
            ImageFormat::Webp => Self::Webp(WebpParams {
                quality: percent(options.quality),
                method: WEBP_METHOD,
            }),
            ImageFormat::Avif => Self::Avif(AvifParams {
                cq_level: AVIF_CQ_LEVEL,
                speed: options.quality.map_or(AVIF_DEFAULT_SPEED, |q| {
                    q.round().clamp(0.0, f32::from(AVIF_MAX_SPEED)) as u8
                }),
                subsample: AVIF_SUBSAMPLE,
            }),
            ImageFormat::Jpeg => Self::Jpeg(JpegParams {
                quality: percent(options.quality).round() as u8,
                optimize_coding: JPEG_OPTIMIZE_CODING,
                smoothing: JPEG_SMOOTHING,
                color_space: JPEG_COLOR_SPACE,
            }),
            ImageFormat::Png => Self::Png(PngParams {
                level: PNG_LEVEL,
                interlace: PNG_INTERLACE,
            }),
        }
    }

    pub fn format(&self) -> ImageFormat {
        match self {
            Self::Webp(_) => ImageFormat::Webp,
            Self::Avif(_) => ImageFormat::Avif,
            Self::Jpeg(_) => ImageFormat::Jpeg,
            Self::Png(_) => ImageFormat::Png,
        }
    }
}

fn percent(quality: Option<f32>) -> f32 {
    quality.unwrap_or(DEFAULT_QUALITY).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(quality: f32) -> EncodeOptions {
        EncodeOptions {
            quality: Some(quality),
        }
    }

    #[test]
    fn test_avif_quality_is_speed() {
        let params = EncodeParams::map(ImageFormat::Avif, &options(7.0));
        assert_eq!(
            params,
            EncodeParams::Avif(AvifParams {
                cq_level: 33,
                speed: 7,
                subsample: ChromaSubsampling::Yuv420,
            })
        );
        let EncodeParams::Avif(avif) = params else {
            unreachable!()
        };
        assert_eq!(avif.subsample.code(), 1);
    }

    #[test]
    fn test_avif_fixed_cq_regardless_of_quality() {
        for q in [0.0, 3.0, 10.0, 90.0] {
            let EncodeParams::Avif(avif) = EncodeParams::map(ImageFormat::Avif, &options(q)) else {
                unreachable!()
            };
            assert_eq!(avif.cq_level, AVIF_CQ_LEVEL);
            assert_eq!(avif.subsample, ChromaSubsampling::Yuv420);
            assert!(avif.speed <= AVIF_MAX_SPEED);
        }
    }

    #[test]
    fn test_webp_and_jpeg_pass_quality() {
        assert_eq!(
            EncodeParams::map(ImageFormat::Webp, &options(80.0)),
            EncodeParams::Webp(WebpParams {
                quality: 80.0,
                method: 3
            })
        );
        assert_eq!(
            EncodeParams::map(ImageFormat::Jpeg, &options(62.0)),
            EncodeParams::Jpeg(JpegParams {
                quality: 62,
                optimize_coding: true,
                smoothing: 0,
                color_space: JpegColorSpace::YCbCr,
            })
        );
        assert_eq!(JpegColorSpace::YCbCr.code(), 3);
    }

    #[test]
    fn test_png_ignores_quality() {
        let expected = EncodeParams::Png(PngParams {
            level: 2,
            interlace: false,
        });
        assert_eq!(EncodeParams::map(ImageFormat::Png, &options(5.0)), expected);
        assert_eq!(EncodeParams::map(ImageFormat::Png, &EncodeOptions::default()), expected);
    }

    #[test]
    fn test_defaults_without_quality() {
        let none = EncodeOptions::default();
        let EncodeParams::Avif(avif) = EncodeParams::map(ImageFormat::Avif, &none) else {
            unreachable!()
        };
        assert_eq!(avif.speed, AVIF_DEFAULT_SPEED);
        let EncodeParams::Jpeg(jpeg) = EncodeParams::map(ImageFormat::Jpeg, &none) else {
            unreachable!()
        };
        assert_eq!(jpeg.quality, 75);
    }

    #[test]
    fn test_avif_quality_scale() {
        let params = AvifParams {
            cq_level: 0,
            speed: 6,
            subsample: AVIF_SUBSAMPLE,
        };
        assert_eq!(params.quality(), 100.0);
        let params = AvifParams {
            cq_level: 63,
            ..params
        };
        assert_eq!(params.quality(), 0.0);
    }
}
