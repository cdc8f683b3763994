//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Offline asset cache and off-thread image encoder
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: ll-toolbox.toml)
    #[arg(short = 'C', long, global = true, default_value = "ll-toolbox.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Encode an image file
    #[command(visible_alias = "e")]
    Encode {
        #[command(flatten)]
        args: EncodeArgs,
    },

    /// Run the encode worker over stdin/stdout (one JSON message per line)
    #[command(visible_alias = "w")]
    Worker,

    /// Serve an origin through the offline cache
    #[command(visible_alias = "s")]
    Serve {
        /// Origin to proxy and cache (e.g., https://example.com/)
        #[arg(short, long, value_hint = clap::ValueHint::Url)]
        origin: Option<String>,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Inspect or clear the offline cache
    #[command(visible_alias = "c")]
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// List cache generations and their entry counts
    Status,
    /// Delete every cache generation
    Clear,
}

/// Encode command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct EncodeArgs {
    /// Source image (any format the decoder understands)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Target MIME type (image/webp, image/avif, image/jpeg, image/png).
    /// Guessed from the output extension when omitted.
    #[arg(short, long)]
    pub format: Option<String>,

    /// Encoder quality. For image/avif this is the speed setting (0-10).
    #[arg(short, long)]
    pub quality: Option<f32>,

    /// Output path (default: input with the target extension)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

impl Cli {
    pub const fn is_worker(&self) -> bool {
        matches!(self.command, Commands::Worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_and_verbose_flags() {
        let err = Cli::try_parse_from(["ll-toolbox", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);

        let cli = Cli::parse_from(["ll-toolbox", "-v", "worker"]);
        assert!(cli.verbose);
        assert!(cli.is_worker());
    }

    #[test]
    fn test_parse_encode() {
        let cli = Cli::parse_from([
            "ll-toolbox", "encode", "in.png", "--format", "image/avif", "-q", "7",
        ]);
        let Commands::Encode { args } = cli.command else {
            panic!("expected encode");
        };
        assert_eq!(args.input, PathBuf::from("in.png"));
        assert_eq!(args.format.as_deref(), Some("image/avif"));
        assert_eq!(args.quality, Some(7.0));
        assert_eq!(args.output, None);
    }

    #[test]
    fn test_parse_serve_and_globals() {
        let cli = Cli::parse_from([
            "ll-toolbox", "serve", "-p", "9000", "--origin", "https://a.example/", "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("ll-toolbox.toml"));
        assert!(matches!(
            cli.command,
            Commands::Serve { port: Some(9000), interface: None, .. }
        ));
    }

    #[test]
    fn test_parse_cache() {
        let cli = Cli::parse_from(["ll-toolbox", "cache", "clear"]);
        assert!(matches!(cli.command, Commands::Cache { action: CacheAction::Clear }));
        assert!(!cli.is_worker());
    }
}
