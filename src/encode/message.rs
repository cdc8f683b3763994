//! Request and response messages exchanged with the worker.
//!
//! Wire shape (JSON, camelCase):
//!
//! ```text
//! → { "id": "a", "imageData": { "width": 2, "height": 1, "data": [..8 bytes..] },
//!     "format": "image/webp", "options": { "quality": 75 } }
//! ← { "id": "a", "success": true,  "buffer": [..] }
//! ← { "id": "a", "success": false, "error": "Unsupported format: image/tiff" }
//! ```

use serde::{Deserialize, Serialize};

use super::codec::CodecError;

/// Raw RGBA8 pixels, row-major, no padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageData {
    pub const CHANNELS: usize = 4;

    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Check that dimensions are non-zero and the buffer length matches.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.width == 0 || self.height == 0 {
            return Err(CodecError::new(format!(
                "Invalid image dimensions: {}x{}",
                self.width, self.height
            )));
        }
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|n| n.checked_mul(Self::CHANNELS));
        if expected != Some(self.data.len()) {
            return Err(CodecError::new(format!(
                "Pixel buffer of {} bytes does not match {}x{} RGBA",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

/// Caller options. `quality` means different things per format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodeOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,
}

/// One-shot encode request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeRequest {
    /// Caller-chosen correlation token.
    pub id: String,
    pub image_data: ImageData,
    /// MIME type, e.g. `image/webp`.
    pub format: String,
    #[serde(default)]
    pub options: EncodeOptions,
}

impl EncodeRequest {
    pub fn new(
        id: impl Into<String>,
        image_data: ImageData,
        format: impl Into<String>,
        quality: Option<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            image_data,
            format: format.into(),
            options: EncodeOptions { quality },
        }
    }
}

/// The single response to one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeResponse {
    pub id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EncodeResponse {
    pub fn ok(id: impl Into<String>, buffer: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            success: true,
            buffer: Some(buffer),
            error: None,
        }
    }

    pub fn fail(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            buffer: None,
            error: Some(error.into()),
        }
    }

    /// Take the buffer or the error message.
    pub fn into_result(self) -> Result<Vec<u8>, String> {
        match (self.success, self.buffer, self.error) {
            (true, Some(buffer), _) => Ok(buffer),
            (_, _, Some(error)) => Err(error),
            _ => Err("malformed response".to_string()),
        }
    }
}
