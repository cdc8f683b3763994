//! Off-thread image encoding.
//!
//! Callers post raw RGBA pixels with a target MIME type and get back the
//! compressed bytes, correlated by request id.
//!
//! # Module Structure
//!
//! - `format` - supported MIME types
//! - `params` - caller options to native encoder parameters
//! - `codec` - the encoders themselves
//! - `registry` - lazy, shared codec loading
//! - `worker` - request/response actor

pub mod codec;
pub mod error;
pub mod format;
pub mod message;
pub mod params;
pub mod registry;
pub mod worker;

pub use format::ImageFormat;
pub use message::{EncodeRequest, EncodeResponse, ImageData};
pub use registry::BuiltinLoader;
pub use worker::spawn_worker;
