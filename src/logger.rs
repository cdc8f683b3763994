//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro, only shown with `--verbose`
//! - a process-wide switch that routes everything to stderr (worker mode,
//!   where stdout carries the response stream)
//!
//! # Example
//!
//! ```ignore
//! log!("cache"; "installed {} assets", count);
//! debug!("fetch"; "hit {}", key);
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Stream};
use std::{
    io::{Write, stderr, stdout},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Route log output to stderr instead of stdout
static TO_STDERR: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Send all log lines to stderr.
pub fn use_stderr(v: bool) {
    TO_STDERR.store(v, Ordering::SeqCst);
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    if TO_STDERR.load(Ordering::SeqCst) {
        let mut out = stderr().lock();
        writeln!(out, "{prefix} {message}").ok();
        out.flush().ok();
        return;
    }

    let mut out = stdout().lock();
    execute!(out, Clear(ClearType::UntilNewLine)).ok();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

/// Apply color to a module prefix based on module type
///
/// Styling honors `--color` and whether the target stream is a terminal.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    let stream = if TO_STDERR.load(Ordering::SeqCst) {
        Stream::Stderr
    } else {
        Stream::Stdout
    };
    match module_lower {
        "serve" => prefix
            .if_supports_color(stream, |p| p.bright_blue().bold().to_string())
            .to_string(),
        "cache" | "install" | "activate" => prefix
            .if_supports_color(stream, |p| p.bright_green().bold().to_string())
            .to_string(),
        "error" => prefix
            .if_supports_color(stream, |p| p.bright_red().bold().to_string())
            .to_string(),
        _ => prefix
            .if_supports_color(stream, |p| p.bright_yellow().bold().to_string())
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_plain_when_color_disabled() {
        owo_colors::set_override(false);
        assert_eq!(colorize_prefix("fetch", "fetch"), "[fetch]");
        assert_eq!(colorize_prefix("Error", "error"), "[Error]");
        assert_eq!(colorize_prefix("serve", "serve"), "[serve]");
    }

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
