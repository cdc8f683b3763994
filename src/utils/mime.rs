//! MIME type helpers.

use std::path::Path;

/// MIME type constants.
pub mod types {
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const JSON: &str = "application/json";
    pub const OCTET_STREAM: &str = "application/octet-stream";

    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";
}

/// Guess an image MIME type from a file extension (case-insensitive).
pub fn from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    from_extension(ext.as_deref())
}

pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext {
        Some("png") => types::PNG,
        Some("jpg" | "jpeg") => types::JPEG,
        Some("webp") => types::WEBP,
        Some("avif") => types::AVIF,
        Some("json") => types::JSON,
        Some("txt") => types::PLAIN,
        _ => types::OCTET_STREAM,
    }
}
