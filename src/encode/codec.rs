//! Native encoders, one per format.
//!
//! | format | backend   | parameters applied                              |
//! |--------|-----------|-------------------------------------------------|
//! | webp   | `webp`    | quality, method (lossy)                         |
//! | avif   | `ravif`   | cq level as quality, speed                      |
//! | jpeg   | `mozjpeg` | quality, optimized coding, smoothing, color space |
//! | png    | `image`   | level (bucketed), interlace must be off         |
//!
//! `AvifParams::subsample` is not applied: `ravif` picks the chroma layout.
//! PNG level 0–3 maps to fast deflate, 4–6 to default, higher to best.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use super::format::ImageFormat;
use super::message::ImageData;
use super::params::{
    AvifParams, EncodeParams, JpegColorSpace, JpegParams, PngParams, WebpParams,
};

/// An encoder failure, message relayed to the caller as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CodecError(String);

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<image::ImageError> for CodecError {
    fn from(err: image::ImageError) -> Self {
        Self(err.to_string())
    }
}

/// A loaded, ready-to-use encoder for one format.
pub trait Codec: Send + Sync {
    fn format(&self) -> ImageFormat;

    /// Compress `image`. CPU-bound; call from a blocking context.
    fn encode(&self, image: &ImageData, params: &EncodeParams) -> Result<Vec<u8>, CodecError>;
}

/// The built-in codec for `format`.
pub fn builtin(format: ImageFormat) -> Box<dyn Codec> {
    match format {
        ImageFormat::Webp => Box::new(WebpCodec),
        ImageFormat::Avif => Box::new(AvifCodec),
        ImageFormat::Jpeg => Box::new(JpegCodec),
        ImageFormat::Png => Box::new(PngCodec),
    }
}

fn mismatch(codec: ImageFormat, params: &EncodeParams) -> CodecError {
    CodecError::new(format!(
        "{} codec received {} parameters",
        codec.codec_name(),
        params.format().codec_name()
    ))
}

// =============================================================================
// WebP
// =============================================================================

pub struct WebpCodec;

impl WebpCodec {
    fn encode_webp(image: &ImageData, params: &WebpParams) -> Result<Vec<u8>, CodecError> {
        let mut config = webp::WebPConfig::new()
            .map_err(|()| CodecError::new("failed to initialize webp encoder config"))?;
        config.lossless = 0;
        config.quality = params.quality;
        config.method = i32::from(params.method);

        let encoded = webp::Encoder::from_rgba(&image.data, image.width, image.height)
            .encode_advanced(&config)
            .map_err(|e| CodecError::new(format!("webp encoding failed: {e:?}")))?;
        Ok(encoded.to_vec())
    }
}

impl Codec for WebpCodec {
    fn format(&self) -> ImageFormat {
        ImageFormat::Webp
    }

    fn encode(&self, image: &ImageData, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        let EncodeParams::Webp(params) = params else {
            return Err(mismatch(self.format(), params));
        };
        image.validate()?;
        Self::encode_webp(image, params)
    }
}

// =============================================================================
// AVIF
// =============================================================================

pub struct AvifCodec;

impl AvifCodec {
    fn encode_avif(image: &ImageData, params: &AvifParams) -> Result<Vec<u8>, CodecError> {
        use ravif::{Encoder, Img, RGBA8};

        let pixels: Vec<RGBA8> = image
            .data
            .chunks_exact(ImageData::CHANNELS)
            .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        let quality = params.quality();

        let encoded = Encoder::new()
            .with_quality(quality)
            .with_alpha_quality(quality)
            // ravif's scale starts at 1
            .with_speed(params.speed.clamp(1, 10))
            .encode_rgba(Img::new(
                &pixels[..],
                image.width as usize,
                image.height as usize,
            ))
            .map_err(|e| CodecError::new(e.to_string()))?;

        Ok(encoded.avif_file)
    }
}

impl Codec for AvifCodec {
    fn format(&self) -> ImageFormat {
        ImageFormat::Avif
    }

    fn encode(&self, image: &ImageData, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        let EncodeParams::Avif(params) = params else {
            return Err(mismatch(self.format(), params));
        };
        image.validate()?;
        Self::encode_avif(image, params)
    }
}

// =============================================================================
// JPEG
// =============================================================================

pub struct JpegCodec;

impl JpegCodec {
    fn color_space(space: JpegColorSpace) -> mozjpeg::ColorSpace {
        match space {
            JpegColorSpace::Grayscale => mozjpeg::ColorSpace::JCS_GRAYSCALE,
            JpegColorSpace::Rgb => mozjpeg::ColorSpace::JCS_RGB,
            JpegColorSpace::YCbCr => mozjpeg::ColorSpace::JCS_YCbCr,
        }
    }

    fn encode_jpeg(image: &ImageData, params: &JpegParams) -> Result<Vec<u8>, CodecError> {
        // JPEG has no alpha channel
        let rgb: Vec<u8> = image
            .data
            .chunks_exact(ImageData::CHANNELS)
            .flat_map(|p| [p[0], p[1], p[2]])
            .collect();
        let (width, height) = (image.width as usize, image.height as usize);
        let params = *params;

        // libjpeg reports fatal errors by unwinding
        let result = std::panic::catch_unwind(move || -> std::io::Result<Vec<u8>> {
            let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
            comp.set_size(width, height);
            comp.set_quality(f32::from(params.quality.clamp(1, 100)));
            comp.set_color_space(Self::color_space(params.color_space));
            comp.set_optimize_coding(params.optimize_coding);
            comp.set_smoothing_factor(params.smoothing);

            let mut started = comp.start_compress(Vec::new())?;
            started.write_scanlines(&rgb)?;
            started.finish()
        });

        match result {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(CodecError::new(format!("jpeg encoding failed: {e}"))),
            Err(_) => Err(CodecError::new("jpeg encoding failed")),
        }
    }
}

impl Codec for JpegCodec {
    fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    fn encode(&self, image: &ImageData, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        let EncodeParams::Jpeg(params) = params else {
            return Err(mismatch(self.format(), params));
        };
        image.validate()?;
        Self::encode_jpeg(image, params)
    }
}

// =============================================================================
// PNG
// =============================================================================

pub struct PngCodec;

impl PngCodec {
    fn compression(level: u8) -> CompressionType {
        match level {
            0..=3 => CompressionType::Fast,
            4..=6 => CompressionType::Default,
            _ => CompressionType::Best,
        }
    }

    fn encode_png(image: &ImageData, params: &PngParams) -> Result<Vec<u8>, CodecError> {
        if params.interlace {
            return Err(CodecError::new("interlaced PNG output is not supported"));
        }
        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, Self::compression(params.level), FilterType::Adaptive)
            .write_image(
                &image.data,
                image.width,
                image.height,
                ExtendedColorType::Rgba8,
            )?;
        Ok(out)
    }
}

impl Codec for PngCodec {
    fn format(&self) -> ImageFormat {
        ImageFormat::Png
    }

    fn encode(&self, image: &ImageData, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        let EncodeParams::Png(params) = params else {
            return Err(mismatch(self.format(), params));
        };
        image.validate()?;
        Self::encode_png(image, params)
    }
}
