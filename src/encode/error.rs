//! Encoding failures. The display strings are what callers receive.

use thiserror::Error;

use super::codec::CodecError;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    #[error("Failed to load codec {codec}: {message}")]
    Load { codec: &'static str, message: String },

    /// Relayed verbatim from the codec.
    #[error(transparent)]
    Encoder(#[from] CodecError),

    #[error("encode task aborted: {0}")]
    Task(String),
}
