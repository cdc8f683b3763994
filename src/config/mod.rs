//! Toolbox configuration from `ll-toolbox.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── cache      # [cache]
//! │   └── serve      # [serve]
//! ├── error          # ConfigError
//! └── mod.rs         # ToolboxConfig (this file)
//! ```
//!
//! The file is optional. Every field has a default, and command-line flags
//! take precedence over file values.
//!
//! | Section   | Purpose                                         |
//! |-----------|-------------------------------------------------|
//! | `[serve]` | Offline-first server (interface, port, origin)  |
//! | `[cache]` | Where and how cache generations are stored      |

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{CacheBackend, CacheConfig, ServeConfig};

use crate::{
    cli::{Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

/// Root configuration structure representing ll-toolbox.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolboxConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl ToolboxConfig {
    /// Load configuration for a parsed command line.
    ///
    /// Searches upward from cwd for the config file; a missing file means
    /// defaults, with cwd as the root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = Some(path);
                config
            }
            None => Self {
                root: cwd,
                ..Self::default()
            },
        };

        config.apply_command_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// CLI flags override file values.
    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Serve {
            origin,
            interface,
            port,
        } = &cli.command
        {
            Self::update_option(&mut self.serve.origin, origin.as_ref());
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }
    }

    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.origin()?;
        if self.serve.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "[serve] timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// The origin as a URL, always ending in `/` so relative paths join under it.
    pub fn origin(&self) -> Result<Url, ConfigError> {
        let mut url = Url::parse(&self.serve.origin).map_err(|e| {
            ConfigError::Validation(format!("invalid origin `{}`: {e}", self.serve.origin))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "origin `{}` must be http or https",
                self.serve.origin
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// The cache directory, resolved against the config root.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.cache.dir)
    }
}

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
pub fn test_parse_config(content: &str) -> ToolboxConfig {
    let (parsed, ignored) = ToolboxConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_fields_collected() {
        let (config, mut ignored) =
            ToolboxConfig::parse_with_ignored("[serve]\nport = 1\nwatch = true\n[extra]\nx = 1")
                .unwrap();
        ignored.sort();
        assert_eq!(config.serve.port, 1);
        assert_eq!(ignored, vec!["extra".to_string(), "serve.watch".to_string()]);
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = Cli::parse_from([
            "ll-toolbox", "serve", "--origin", "https://b.example/app", "-p", "9000",
        ]);
        let mut config = test_parse_config("[serve]\nport = 8080\norigin = \"https://a.example/\"");
        config.apply_command_options(&cli);

        assert_eq!(config.serve.port, 9000);
        assert_eq!(config.origin().unwrap().as_str(), "https://b.example/app/");
    }

    #[test]
    fn test_origin_validation() {
        let mut config = ToolboxConfig::default();
        config.serve.origin = "ftp://a.example/".into();
        assert!(config.validate().is_err());

        config.serve.origin = "not a url".into();
        assert!(config.validate().is_err());

        config.serve.origin = "https://a.example".into();
        assert_eq!(config.origin().unwrap().as_str(), "https://a.example/");
    }

    #[test]
    fn test_cache_dir_resolves_against_root() {
        let dir = TempDir::new().unwrap();
        let mut config = ToolboxConfig {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert_eq!(config.cache_dir(), dir.path().join(".ll-toolbox/cache"));

        config.cache.dir = PathBuf::from("/abs/cache");
        assert_eq!(config.cache_dir(), PathBuf::from("/abs/cache"));
    }

    #[test]
    fn test_load_from_absolute_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[cache]\nbackend = \"memory\"\n").unwrap();

        let cli = Cli::parse_from([
            "ll-toolbox".to_string(),
            "-C".to_string(),
            path.display().to_string(),
            "cache".to_string(),
            "status".to_string(),
        ]);
        let config = ToolboxConfig::load(&cli).unwrap();
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.root, dir.path());
        assert_eq!(config.config_path, Some(path));
    }
}
