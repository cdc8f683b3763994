//! Command-line interface module.

mod args;
pub mod cache;
pub mod encode;
pub mod serve;
pub mod worker;

pub use args::{CacheAction, Cli, Commands, EncodeArgs};
